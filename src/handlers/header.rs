use actix_web::{HttpResponse, Responder, get, web};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::dump::DumpHeader;
use crate::error::{DumpError, Result};
use crate::handlers::error_response;

#[derive(Deserialize)]
pub struct HeaderQuery {
    pub file: String,
}

/// Header of a dump file; the payload is not read.
#[get("/dump/header")]
pub async fn get_header(
    data: web::Data<AppState>,
    query: web::Query<HeaderQuery>,
) -> impl Responder {
    match read_header(data.get_ref(), &query.file) {
        Ok((header, file_size, parser)) => HttpResponse::Ok().json(serde_json::json!({
            "file": query.file,
            "file_size": file_size,
            "parser": parser,
            "shape": header.shape(),
            "sample_count": header.sample_count().ok(),
            "header": header,
        })),
        Err(err) => error_response(&err, &query.file),
    }
}

fn read_header(app_state: &AppState, file: &str) -> Result<(DumpHeader, u64, &'static str)> {
    let file_path = app_state.resolve(file)?;
    let (parser, _) = app_state
        .parser_registry
        .find_parser_for_file(&file_path)
        .ok_or_else(|| DumpError::UnsupportedFile {
            file: file.to_string(),
        })?;
    let file_size = std::fs::metadata(&file_path)?.len();
    let header = parser.read_header(&file_path)?;
    Ok((header, file_size, parser.name()))
}
