//! Dump header record: layout table, text labels and the packed codec.
//!
//! The header is a single 112-byte block. Every field is 8 bytes wide and
//! multi-byte values use [`DumpEndian`] regardless of the host.

use std::borrow::Cow;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

use byteorder::ByteOrder;
use serde::{Serialize, Serializer};

use super::{DumpEndian, MAGIC, SUPPORTED_PRECISION, read_section};
use crate::error::{DumpError, FormatError, Result};

/// Width in bytes of every text slot in the header.
pub const LABEL_LEN: usize = 8;

/// Binary kind of one header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// NUL-padded ASCII text
    Text,
    /// unsigned 64-bit integer
    Unsigned,
    /// 64-bit IEEE float
    Float,
}

impl FieldKind {
    pub const fn width(self) -> usize {
        match self {
            Self::Text => LABEL_LEN,
            Self::Unsigned => std::mem::size_of::<u64>(),
            Self::Float => std::mem::size_of::<f64>(),
        }
    }
}

/// Field order and kinds of the on-disk header.
pub const HEADER_LAYOUT: [(&str, FieldKind); 14] = [
    ("magic", FieldKind::Text),
    ("comp", FieldKind::Unsigned),
    ("sx", FieldKind::Unsigned),
    ("sy", FieldKind::Unsigned),
    ("sz", FieldKind::Unsigned),
    ("csx", FieldKind::Float),
    ("csy", FieldKind::Float),
    ("csz", FieldKind::Float),
    ("meshunit", FieldKind::Text),
    ("arg", FieldKind::Float),
    ("argunit", FieldKind::Text),
    ("quant", FieldKind::Text),
    ("quantunit", FieldKind::Text),
    ("prec", FieldKind::Unsigned),
];

const fn layout_size(layout: &[(&str, FieldKind)]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < layout.len() {
        total += layout[i].1.width();
        i += 1;
    }
    total
}

/// Packed size of the header block.
pub const HEADER_SIZE: usize = layout_size(&HEADER_LAYOUT);

/// Byte offset of a named field within the header block.
pub fn field_offset(name: &str) -> Option<usize> {
    let mut offset = 0;
    for (field, kind) in HEADER_LAYOUT {
        if field == name {
            return Some(offset);
        }
        offset += kind.width();
    }
    None
}

/// Fixed 8-byte text slot (units, quantity name, magic tag).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Label([u8; LABEL_LEN]);

impl Label {
    /// Builds a label from text, padding with NULs.
    pub fn new(text: &str) -> std::result::Result<Self, FormatError> {
        let bytes = text.as_bytes();
        if bytes.len() > LABEL_LEN {
            return Err(FormatError::LabelTooLong {
                label: text.to_string(),
                len: bytes.len(),
            });
        }
        let mut raw = [0u8; LABEL_LEN];
        raw[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(raw))
    }

    pub const fn from_bytes(raw: [u8; LABEL_LEN]) -> Self {
        Self(raw)
    }

    pub fn as_bytes(&self) -> &[u8; LABEL_LEN] {
        &self.0
    }

    /// Text with trailing NUL padding removed.
    pub fn as_str(&self) -> Cow<'_, str> {
        let end = self
            .0
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);
        String::from_utf8_lossy(&self.0[..end])
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl FromStr for Label {
    type Err = FormatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}

/// The magic tag as a header label.
pub const MAGIC_LABEL: Label = {
    let src = MAGIC.as_bytes();
    let mut raw = [0u8; LABEL_LEN];
    let mut i = 0;
    while i < LABEL_LEN {
        raw[i] = src[i];
        i += 1;
    }
    Label::from_bytes(raw)
};

/// Metadata record at the start of every dump file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DumpHeader {
    pub magic: Label,
    /// number of field components (1 scalar, 3 vector)
    pub comp: u64,
    pub sx: u64,
    pub sy: u64,
    pub sz: u64,
    /// physical cell size per axis
    pub csx: f64,
    pub csy: f64,
    pub csz: f64,
    pub meshunit: Label,
    /// auxiliary scalar, usually simulation time
    pub arg: f64,
    pub argunit: Label,
    pub quant: Label,
    pub quantunit: Label,
    /// bytes per stored sample
    pub prec: u64,
}

impl DumpHeader {
    /// Creates a header for a `comp`-component field on a `grid` of cells.
    ///
    /// Magic and precision are set to the supported values, cell sizes to 1
    /// and every label is empty. Fails if any extent is zero.
    pub fn new(comp: u64, grid: [u64; 3]) -> std::result::Result<Self, FormatError> {
        let header = Self {
            magic: MAGIC_LABEL,
            comp,
            sx: grid[0],
            sy: grid[1],
            sz: grid[2],
            csx: 1.0,
            csy: 1.0,
            csz: 1.0,
            meshunit: Label::default(),
            arg: 0.0,
            argunit: Label::default(),
            quant: Label::default(),
            quantunit: Label::default(),
            prec: SUPPORTED_PRECISION,
        };
        header.check_dimensions()?;
        Ok(header)
    }

    pub fn with_cell_size(mut self, cell: [f64; 3]) -> Self {
        [self.csx, self.csy, self.csz] = cell;
        self
    }

    pub fn with_mesh_unit(mut self, unit: Label) -> Self {
        self.meshunit = unit;
        self
    }

    pub fn with_arg(mut self, arg: f64, unit: Label) -> Self {
        self.arg = arg;
        self.argunit = unit;
        self
    }

    pub fn with_quantity(mut self, name: Label, unit: Label) -> Self {
        self.quant = name;
        self.quantunit = unit;
        self
    }

    /// `[comp, sx, sy, sz]`
    pub fn shape(&self) -> [u64; 4] {
        [self.comp, self.sx, self.sy, self.sz]
    }

    /// Number of f32 samples in the payload.
    pub fn sample_count(&self) -> std::result::Result<usize, FormatError> {
        self.check_dimensions()?;
        let too_large = || FormatError::PayloadTooLarge {
            comp: self.comp,
            sx: self.sx,
            sy: self.sy,
            sz: self.sz,
        };
        self.shape()
            .iter()
            .try_fold(1usize, |acc, &dim| {
                usize::try_from(dim).ok().and_then(|d| acc.checked_mul(d))
            })
            .ok_or_else(too_large)
    }

    /// Payload length in bytes.
    pub fn payload_len(&self) -> std::result::Result<usize, FormatError> {
        let count = self.sample_count()?;
        count
            .checked_mul(SUPPORTED_PRECISION as usize)
            .ok_or(FormatError::PayloadTooLarge {
                comp: self.comp,
                sx: self.sx,
                sy: self.sy,
                sz: self.sz,
            })
    }

    fn check_dimensions(&self) -> std::result::Result<(), FormatError> {
        if self.shape().contains(&0) {
            return Err(FormatError::InvalidDimensions {
                comp: self.comp,
                sx: self.sx,
                sy: self.sy,
                sz: self.sz,
            });
        }
        Ok(())
    }

    /// Checks magic, then precision, then dimensions.
    pub fn validate(&self) -> std::result::Result<(), FormatError> {
        if self.magic != MAGIC_LABEL {
            return Err(FormatError::BadMagic {
                found: String::from_utf8_lossy(self.magic.as_bytes()).into_owned(),
                expected: MAGIC,
            });
        }
        if self.prec != SUPPORTED_PRECISION {
            return Err(FormatError::UnsupportedPrecision {
                found: self.prec,
                expected: SUPPORTED_PRECISION,
            });
        }
        self.check_dimensions()
    }

    /// Unpacks and validates a header block of exactly [`HEADER_SIZE`] bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(DumpError::Truncated {
                section: "header",
                expected: HEADER_SIZE as u64,
                found: bytes.len() as u64,
            });
        }
        if bytes.len() > HEADER_SIZE {
            return Err(FormatError::HeaderLength {
                found: bytes.len(),
                expected: HEADER_SIZE,
            }
            .into());
        }

        let mut r = FieldReader::new(bytes);
        let header = Self {
            magic: r.label(),
            comp: r.unsigned(),
            sx: r.unsigned(),
            sy: r.unsigned(),
            sz: r.unsigned(),
            csx: r.float(),
            csy: r.float(),
            csz: r.float(),
            meshunit: r.label(),
            arg: r.float(),
            argunit: r.label(),
            quant: r.label(),
            quantunit: r.label(),
            prec: r.unsigned(),
        };
        debug_assert_eq!(r.pos, HEADER_SIZE);

        header.validate()?;
        Ok(header)
    }

    /// Packs the header without validating it.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut w = FieldWriter::new();
        w.label(&self.magic);
        w.unsigned(self.comp);
        w.unsigned(self.sx);
        w.unsigned(self.sy);
        w.unsigned(self.sz);
        w.float(self.csx);
        w.float(self.csy);
        w.float(self.csz);
        w.label(&self.meshunit);
        w.float(self.arg);
        w.label(&self.argunit);
        w.label(&self.quant);
        w.label(&self.quantunit);
        w.unsigned(self.prec);
        debug_assert_eq!(w.pos, HEADER_SIZE);
        w.buf
    }

    /// Reads exactly one header block from `reader` and decodes it.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let bytes = read_section(reader, HEADER_SIZE, "header")?;
        Self::decode(&bytes)
    }
}

struct FieldReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, kind: FieldKind) -> &'a [u8] {
        let bytes = self.bytes;
        let start = self.pos;
        self.pos += kind.width();
        &bytes[start..self.pos]
    }

    fn label(&mut self) -> Label {
        let mut raw = [0u8; LABEL_LEN];
        raw.copy_from_slice(self.take(FieldKind::Text));
        Label(raw)
    }

    fn unsigned(&mut self) -> u64 {
        DumpEndian::read_u64(self.take(FieldKind::Unsigned))
    }

    fn float(&mut self) -> f64 {
        DumpEndian::read_f64(self.take(FieldKind::Float))
    }
}

struct FieldWriter {
    buf: [u8; HEADER_SIZE],
    pos: usize,
}

impl FieldWriter {
    fn new() -> Self {
        Self {
            buf: [0u8; HEADER_SIZE],
            pos: 0,
        }
    }

    fn slot(&mut self, kind: FieldKind) -> &mut [u8] {
        let start = self.pos;
        self.pos += kind.width();
        &mut self.buf[start..self.pos]
    }

    fn label(&mut self, label: &Label) {
        self.slot(FieldKind::Text).copy_from_slice(label.as_bytes());
    }

    fn unsigned(&mut self, value: u64) {
        DumpEndian::write_u64(self.slot(FieldKind::Unsigned), value);
    }

    fn float(&mut self, value: f64) {
        DumpEndian::write_f64(self.slot(FieldKind::Float), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> DumpHeader {
        DumpHeader::new(3, [4, 5, 6])
            .unwrap()
            .with_cell_size([1e-9, 2e-9, 3e-9])
            .with_mesh_unit(Label::new("m").unwrap())
            .with_arg(1.5e-12, Label::new("s").unwrap())
            .with_quantity(Label::new("m").unwrap(), Label::new("").unwrap())
    }

    fn patch_u64(bytes: &mut [u8], field: &str, value: u64) {
        let off = field_offset(field).unwrap();
        DumpEndian::write_u64(&mut bytes[off..off + 8], value);
    }

    #[test]
    fn header_size_matches_packed_layout() {
        assert_eq!(HEADER_SIZE, 112);
        assert_eq!(field_offset("magic"), Some(0));
        assert_eq!(field_offset("comp"), Some(8));
        assert_eq!(field_offset("csx"), Some(40));
        assert_eq!(field_offset("meshunit"), Some(64));
        assert_eq!(field_offset("prec"), Some(104));
        assert_eq!(field_offset("nope"), None);
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample_header();
        let bytes = header.encode();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[..8], MAGIC.as_bytes());
        assert_eq!(DumpHeader::decode(&bytes).unwrap(), header);
    }

    #[test]
    fn encode_writes_little_endian_fields() {
        let bytes = sample_header().encode();
        let off = field_offset("sy").unwrap();
        assert_eq!(&bytes[off..off + 8], &[5, 0, 0, 0, 0, 0, 0, 0]);
        let off = field_offset("prec").unwrap();
        assert_eq!(&bytes[off..off + 8], &[4, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = sample_header().encode();
        bytes[..8].copy_from_slice(b"#dump001");
        match DumpHeader::decode(&bytes) {
            Err(DumpError::Format(FormatError::BadMagic { found, expected })) => {
                assert_eq!(found, "#dump001");
                assert_eq!(expected, MAGIC);
            }
            other => panic!("expected BadMagic, got {other:?}"),
        }

        bytes[..8].fill(0);
        assert!(matches!(
            DumpHeader::decode(&bytes),
            Err(DumpError::Format(FormatError::BadMagic { .. }))
        ));
    }

    #[test]
    fn test_unsupported_precision_rejected() {
        let mut bytes = sample_header().encode();
        patch_u64(&mut bytes, "prec", 8);
        match DumpHeader::decode(&bytes) {
            Err(DumpError::Format(FormatError::UnsupportedPrecision { found, expected })) => {
                assert_eq!(found, 8);
                assert_eq!(expected, 4);
            }
            other => panic!("expected UnsupportedPrecision, got {other:?}"),
        }
    }

    #[test]
    fn magic_is_checked_before_precision() {
        let mut bytes = sample_header().encode();
        bytes[0] = b'!';
        patch_u64(&mut bytes, "prec", 2);
        assert!(matches!(
            DumpHeader::decode(&bytes),
            Err(DumpError::Format(FormatError::BadMagic { .. }))
        ));
    }

    #[test]
    fn test_zero_dimension_rejected_on_decode() {
        let mut bytes = sample_header().encode();
        patch_u64(&mut bytes, "sx", 0);
        assert!(matches!(
            DumpHeader::decode(&bytes),
            Err(DumpError::Format(FormatError::InvalidDimensions { sx: 0, .. }))
        ));
        assert!(DumpHeader::new(0, [1, 1, 1]).is_err());
    }

    #[test]
    fn short_block_is_truncated() {
        let bytes = sample_header().encode();
        assert!(matches!(
            DumpHeader::decode(&bytes[..50]),
            Err(DumpError::Truncated { section: "header", expected: 112, found: 50 })
        ));
    }

    #[test]
    fn oversized_block_is_rejected() {
        let mut bytes = sample_header().encode().to_vec();
        bytes.push(0);
        assert!(matches!(
            DumpHeader::decode(&bytes),
            Err(DumpError::Format(FormatError::HeaderLength { found: 113, expected: 112 }))
        ));
    }

    #[test]
    fn encode_places_each_field_at_its_layout_offset() {
        let header = DumpHeader {
            magic: MAGIC_LABEL,
            comp: 11,
            sx: 12,
            sy: 13,
            sz: 14,
            csx: 1.5,
            csy: 2.5,
            csz: 3.5,
            meshunit: Label::new("mesh").unwrap(),
            arg: 4.5,
            argunit: Label::new("argu").unwrap(),
            quant: Label::new("quant").unwrap(),
            quantunit: Label::new("qunit").unwrap(),
            prec: SUPPORTED_PRECISION,
        };
        let expected: Vec<(&str, [u8; 8])> = vec![
            ("magic", *MAGIC_LABEL.as_bytes()),
            ("comp", 11u64.to_le_bytes()),
            ("sx", 12u64.to_le_bytes()),
            ("sy", 13u64.to_le_bytes()),
            ("sz", 14u64.to_le_bytes()),
            ("csx", 1.5f64.to_le_bytes()),
            ("csy", 2.5f64.to_le_bytes()),
            ("csz", 3.5f64.to_le_bytes()),
            ("meshunit", *header.meshunit.as_bytes()),
            ("arg", 4.5f64.to_le_bytes()),
            ("argunit", *header.argunit.as_bytes()),
            ("quant", *header.quant.as_bytes()),
            ("quantunit", *header.quantunit.as_bytes()),
            ("prec", 4u64.to_le_bytes()),
        ];
        assert_eq!(expected.len(), HEADER_LAYOUT.len());

        let bytes = header.encode();
        for ((name, value), (layout_name, kind)) in expected.iter().zip(HEADER_LAYOUT) {
            assert_eq!(name, &layout_name);
            let off = field_offset(name).unwrap();
            assert_eq!(&bytes[off..off + kind.width()], value, "field {name}");
        }
        assert_eq!(DumpHeader::decode(&bytes).unwrap(), header);
    }

    #[test]
    fn test_label_padding() {
        let label = Label::new("T").unwrap();
        assert_eq!(label.as_bytes(), b"T\0\0\0\0\0\0\0");
        assert_eq!(label.as_str(), "T");
        assert_eq!(Label::default().as_str(), "");
        assert_eq!(Label::new("12345678").unwrap().as_str(), "12345678");
        assert!(matches!(
            Label::new("toolonglabel"),
            Err(FormatError::LabelTooLong { len: 12, .. })
        ));
    }

    #[test]
    fn test_sample_count() {
        let header = sample_header();
        assert_eq!(header.sample_count().unwrap(), 3 * 4 * 5 * 6);
        assert_eq!(header.payload_len().unwrap(), 3 * 4 * 5 * 6 * 4);

        let mut huge = header.clone();
        huge.sx = u64::MAX;
        assert!(matches!(
            huge.sample_count(),
            Err(FormatError::PayloadTooLarge { .. })
        ));
    }
}
