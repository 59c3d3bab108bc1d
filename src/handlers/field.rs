use actix_web::{HttpResponse, Responder, get, web};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::handlers::preprocess::run_preprocess;

#[derive(Deserialize)]
pub struct FieldQuery {
    /// e.g. "m000001.dump"
    pub file: String,
    pub component: Option<usize>,
    /// samples per chunk, required
    pub chunk_size: Option<usize>,
}

/// Query-string form of `/dump/preprocess`.
/// e.g. /dump?file=m000001.dump&component=2&chunk_size=4096
#[get("/dump")]
pub async fn get_field(
    data: web::Data<AppState>,
    query: web::Query<FieldQuery>,
) -> impl Responder {
    let Some(chunk_size) = query.chunk_size else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "missing chunk_size",
            "message": "give the chunk size in samples, e.g. /dump?file=xxx&chunk_size=1000000",
        }));
    };

    match run_preprocess(
        data.get_ref(),
        &query.file,
        query.component.unwrap_or(0),
        chunk_size,
    ) {
        Ok(resp) => HttpResponse::Ok().json(resp),
        Err(err) => err,
    }
}
