mod dump;
mod dump_gz;

pub use dump::DumpParser;
pub use dump_gz::GzDumpParser;

/// Every available parser
pub fn get_all_parsers() -> Vec<Box<dyn crate::utils::parser::FieldParser>> {
    vec![Box::new(DumpParser::new()), Box::new(GzDumpParser::new())]
}
