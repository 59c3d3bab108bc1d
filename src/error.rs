//! Error types for dump-file decoding and encoding.

use thiserror::Error;

/// The file (or the value handed to the encoder) does not describe a valid dump.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The leading 8-byte tag is not the supported format revision.
    #[error("bad magic number: {found:?}, expecting: {expected:?}")]
    BadMagic { found: String, expected: &'static str },

    /// The header declares a sample width other than 4 bytes.
    #[error("unsupported data precision: {found} bytes; expecting: {expected} bytes")]
    UnsupportedPrecision { found: u64, expected: u64 },

    /// At least one grid or component extent is zero.
    #[error("invalid dimensions: comp={comp}, sx={sx}, sy={sy}, sz={sz} (all must be >= 1)")]
    InvalidDimensions { comp: u64, sx: u64, sy: u64, sz: u64 },

    /// The payload size implied by the header does not fit in memory addressing.
    #[error("payload of {comp}x{sx}x{sy}x{sz} samples is too large to address")]
    PayloadTooLarge { comp: u64, sx: u64, sy: u64, sz: u64 },

    /// The header dimensions disagree with the array being saved.
    #[error("header shape {header:?} does not match array shape {array:?}")]
    ShapeMismatch { header: [u64; 4], array: [usize; 4] },

    /// A header block handed to the decoder is longer than the packed record.
    #[error("header block is {found} bytes; expecting exactly {expected}")]
    HeaderLength { found: usize, expected: usize },

    /// A flat sample vector cannot be reshaped to the requested dimensions.
    #[error("{found} samples cannot fill shape {shape:?}")]
    SampleCount { shape: [usize; 4], found: usize },

    /// A text label does not fit in its 8-byte slot.
    #[error("label {label:?} is {len} bytes; header labels hold at most 8")]
    LabelTooLong { label: String, len: usize },
}

/// The primary error type for all load/save operations in this crate.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Fewer bytes were available than the header promised.
    #[error("truncated {section}: expected {expected} bytes, found {found}")]
    Truncated {
        section: &'static str,
        expected: u64,
        found: u64,
    },

    /// The underlying file could not be opened, read or written.
    #[error("I/O error: {0}")]
    Unavailable(#[from] std::io::Error),

    /// No registered parser handles this file.
    #[error("unsupported file type: {file}")]
    UnsupportedFile { file: String },

    #[error("invalid file name: {file}")]
    InvalidPath { file: String },
}

impl DumpError {
    /// Whether the failure is about file content rather than file access.
    pub fn is_format(&self) -> bool {
        matches!(self, DumpError::Format(_) | DumpError::Truncated { .. })
    }
}

/// A convenience `Result` type alias using the crate's `DumpError` type.
pub type Result<T> = std::result::Result<T, DumpError>;
