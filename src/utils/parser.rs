use std::path::Path;

use crate::dump::{DumpFile, DumpHeader};
use crate::error::Result;

/// Dump file reader trait.
/// Each on-disk wrapping of the dump format (plain, gzip) implements it.
pub trait FieldParser: Send + Sync {
    /// File extensions handled (without the dot), e.g. "dump"
    fn supported_extensions(&self) -> Vec<&'static str>;

    fn supports(&self, extension: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// Loads header, payload and trailer.
    fn parse_from_file(&self, file_path: &Path) -> Result<DumpFile>;

    /// Reads and validates only the header block.
    /// Used when a request needs the shape before the payload is loaded.
    fn read_header(&self, file_path: &Path) -> Result<DumpHeader>;

    /// Parser name for logs and error responses
    fn name(&self) -> &'static str;
}
