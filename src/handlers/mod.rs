pub mod chunk;
pub mod field;
pub mod header;
pub mod health;
pub mod preprocess;

pub use chunk::get_field_chunk;
pub use field::get_field;
pub use header::get_header;
pub use health::hello;
pub use preprocess::preprocess_field;

use actix_web::HttpResponse;
use actix_web::http::StatusCode;

use crate::error::DumpError;

/// JSON error body for a failed dump operation.
pub fn error_response(err: &DumpError, file: &str) -> HttpResponse {
    let status = match err {
        DumpError::InvalidPath { .. } | DumpError::UnsupportedFile { .. } => {
            StatusCode::BAD_REQUEST
        }
        DumpError::Unavailable(io) if io.kind() == std::io::ErrorKind::NotFound => {
            StatusCode::NOT_FOUND
        }
        DumpError::Format(_) | DumpError::Truncated { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DumpError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    HttpResponse::build(status).json(serde_json::json!({
        "error": err.to_string(),
        "file": file,
    }))
}
