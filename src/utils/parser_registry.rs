use std::path::Path;

use crate::utils::parser::FieldParser;

/// Registry of dump parsers, matched by file extension.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn FieldParser>>,
}

impl ParserRegistry {
    /// Creates a registry holding every available parser.
    pub fn new() -> Self {
        let parsers = crate::parsers::get_all_parsers();
        Self { parsers }
    }

    /// extension: without the dot, e.g. "dump"
    pub fn find_parser(&self, extension: &str) -> Option<&dyn FieldParser> {
        self.parsers
            .iter()
            .find(|parser| parser.supports(extension))
            .map(|p| p.as_ref())
    }

    /// Looks up a parser from the file's extension.
    pub fn find_parser_for_file(&self, file_path: &Path) -> Option<(&dyn FieldParser, String)> {
        let extension = file_path
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_string();

        self.find_parser(&extension)
            .map(|parser| (parser, extension))
    }

    /// Sorted, deduplicated, lowercase.
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions = Vec::new();
        for parser in &self.parsers {
            extensions.extend(
                parser
                    .supported_extensions()
                    .iter()
                    .map(|s| s.to_lowercase()),
            );
        }
        extensions.sort();
        extensions.dedup();
        extensions
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
