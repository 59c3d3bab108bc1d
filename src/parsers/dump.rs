use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::dump::{self, DumpFile, DumpHeader};
use crate::error::Result;
use crate::utils::parser::FieldParser;

/// Plain `.dump` files.
pub struct DumpParser;

impl DumpParser {
    pub fn new() -> Self {
        DumpParser
    }
}

impl Default for DumpParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldParser for DumpParser {
    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["dump"]
    }

    fn name(&self) -> &'static str {
        "Dump Parser"
    }

    fn parse_from_file(&self, file_path: &Path) -> Result<DumpFile> {
        dump::load(file_path)
    }

    fn read_header(&self, file_path: &Path) -> Result<DumpHeader> {
        let mut reader = BufReader::new(File::open(file_path)?);
        DumpHeader::read_from(&mut reader)
    }
}
