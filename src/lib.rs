//! # field-dump
//!
//! Reader and writer for `#dump002` field dump files: a fixed 112-byte header,
//! a `(comp, sx, sy, sz)` block of f32 samples and an 8-byte trailer.
//! An actix-web service on top serves headers and component data in chunks.
pub mod app_state;
pub mod config;
pub mod dump;
pub mod error;
pub mod field;
pub mod handlers;
pub mod parsers;
pub mod routes;
pub mod task;
pub mod utils;

pub use dump::{DumpFile, DumpHeader, Label, load, save};
pub use error::{DumpError, FormatError, Result};
pub use field::FieldArray;
