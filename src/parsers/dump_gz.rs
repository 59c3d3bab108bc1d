use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::dump::{self, DumpFile, DumpHeader};
use crate::error::Result;
use crate::utils::parser::FieldParser;

/// Gzip-compressed dumps (`m000001.dump.gz`).
/// The decompressed stream is an ordinary dump file.
pub struct GzDumpParser;

impl GzDumpParser {
    pub fn new() -> Self {
        GzDumpParser
    }

    fn open(file_path: &Path) -> Result<GzDecoder<BufReader<File>>> {
        let file = File::open(file_path)?;
        Ok(GzDecoder::new(BufReader::new(file)))
    }
}

impl Default for GzDumpParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldParser for GzDumpParser {
    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["gz"]
    }

    fn name(&self) -> &'static str {
        "Gzip Dump Parser"
    }

    fn parse_from_file(&self, file_path: &Path) -> Result<DumpFile> {
        let mut reader = Self::open(file_path)?;
        let dump = dump::read_dump(&mut reader)?;
        debug!(path = %file_path.display(), shape = ?dump.field.shape(), "loaded gzip dump");
        Ok(dump)
    }

    fn read_header(&self, file_path: &Path) -> Result<DumpHeader> {
        let mut reader = Self::open(file_path)?;
        DumpHeader::read_from(&mut reader)
    }
}
