//! Codec for `#dump002` field dump files.
//!
//! A file is the packed [`DumpHeader`], then `comp*sx*sy*sz` f32 samples in
//! row-major `(comp, sx, sy, sz)` order, then an 8-byte trailer. Every
//! multi-byte value is little-endian and there is no padding between sections.

pub mod header;
pub mod payload;
pub mod trailer;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::LittleEndian;
use tracing::debug;

pub use header::{DumpHeader, HEADER_SIZE, Label};
pub use payload::{decode_payload, encode_payload};
pub use trailer::{PLACEHOLDER_TRAILER, decode_trailer, encode_trailer};

use crate::error::{DumpError, FormatError, Result};
use crate::field::FieldArray;

/// Format revision tag at offset 0.
pub const MAGIC: &str = "#dump002";

/// Only 4-byte (f32) samples are supported.
pub const SUPPORTED_PRECISION: u64 = 4;

/// Byte order of every header field, sample and trailer.
pub type DumpEndian = LittleEndian;

/// A fully decoded dump file.
#[derive(Debug, Clone)]
pub struct DumpFile {
    pub header: DumpHeader,
    pub field: FieldArray,
    /// Stored trailer value. Not verified against the payload.
    pub trailer: u64,
}

impl DumpFile {
    pub fn into_parts(self) -> (DumpHeader, FieldArray) {
        (self.header, self.field)
    }
}

/// Reads `len` bytes or reports how many were actually there.
pub(crate) fn read_section<R: Read>(
    reader: &mut R,
    len: usize,
    section: &'static str,
) -> Result<Vec<u8>> {
    // a corrupt header can promise far more than the file holds
    let mut buf = Vec::with_capacity(len.min(1 << 24));
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() < len {
        return Err(DumpError::Truncated {
            section,
            expected: len as u64,
            found: buf.len() as u64,
        });
    }
    Ok(buf)
}

/// Header, payload, trailer from any byte stream.
pub fn read_dump<R: Read>(reader: &mut R) -> Result<DumpFile> {
    let header = DumpHeader::read_from(reader)?;
    let field = decode_payload(reader, &header)?;
    let trailer = decode_trailer(reader)?;
    debug!(trailer = format_args!("{trailer:#018x}"), "read dump trailer");
    Ok(DumpFile {
        header,
        field,
        trailer,
    })
}

/// Fails with `ShapeMismatch` unless the header describes `field` exactly.
pub fn check_shape(
    header: &DumpHeader,
    field: &FieldArray,
) -> std::result::Result<(), FormatError> {
    let expected = header.shape();
    let actual = field.shape();
    let matches = expected
        .iter()
        .zip(actual.iter())
        .all(|(&h, &a)| u64::try_from(a).is_ok_and(|a| a == h));
    if !matches {
        return Err(FormatError::ShapeMismatch {
            header: expected,
            array: actual,
        });
    }
    Ok(())
}

/// Validates `header` against `field`, then writes header, payload and a
/// placeholder trailer.
pub fn write_dump<W: Write>(
    writer: &mut W,
    header: &DumpHeader,
    field: &FieldArray,
) -> Result<()> {
    header.validate()?;
    check_shape(header, field)?;
    writer.write_all(&header.encode())?;
    encode_payload(writer, field)?;
    encode_trailer(writer, PLACEHOLDER_TRAILER)?;
    Ok(())
}

/// Loads a dump file from disk.
pub fn load<P: AsRef<Path>>(path: P) -> Result<DumpFile> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let dump = read_dump(&mut reader)?;
    debug!(path = %path.display(), shape = ?dump.field.shape(), "loaded dump");
    Ok(dump)
}

/// Writes a dump file to disk, replacing any existing file.
///
/// Nothing is created when `header` is invalid or disagrees with `field`.
pub fn save<P: AsRef<Path>>(path: P, header: &DumpHeader, field: &FieldArray) -> Result<()> {
    let path = path.as_ref();
    header.validate()?;
    check_shape(header, field)?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_dump(&mut writer, header, field)?;
    writer.flush()?;
    debug!(path = %path.display(), shape = ?field.shape(), "saved dump");
    Ok(())
}
