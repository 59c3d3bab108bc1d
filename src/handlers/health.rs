use actix_web::{HttpResponse, Responder, get, web};

use crate::app_state::AppState;
use crate::dump::{HEADER_SIZE, MAGIC};

/// Service description.
#[get("/")]
pub async fn hello(data: web::Data<AppState>) -> impl Responder {
    let supported = data.parser_registry.supported_extensions();
    HttpResponse::Ok().json(serde_json::json!({
        "message": "field dump service",
        "format": MAGIC,
        "header_size": HEADER_SIZE,
        "endpoints": [
            "GET /dump/header?file=<filename>",
            "GET /dump?file=<filename>&component=<c>&chunk_size=<size>",
            "POST /dump/preprocess",
            "GET /dump/chunk?task_id=<id>&chunk_index=<i>",
        ],
        "supported_extensions": supported,
        "resource_dir": data.resource_dir,
    }))
}
