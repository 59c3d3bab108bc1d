use actix_web::{HttpResponse, Responder, get, http::header::ContentType, web};
use byteorder::{LittleEndian, WriteBytesExt};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::task::ChunkState;

#[derive(Deserialize)]
pub struct ChunkQuery {
    pub task_id: String,
    pub chunk_index: usize,
}

/// One chunk of a task as little-endian f32 bytes.
///
/// - 200: the chunk body, with `X-Chunk-*` headers giving its sample range
/// - 202: the background load has not finished
/// - 400: unknown task, index out of range, or chunk already served
/// - 500: the background load failed; `details` says why
///
/// A served chunk is removed from the task to release its memory, so each
/// chunk can be fetched once.
#[get("/dump/chunk")]
pub async fn get_field_chunk(
    data: web::Data<AppState>,
    query: web::Query<ChunkQuery>,
) -> impl Responder {
    let Some(task) = data.task_store.get(&query.task_id) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "unknown task_id",
            "task_id": query.task_id,
        }));
    };

    let Some(descriptor) = task.chunks.get(query.chunk_index) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "chunk_index out of range",
            "chunk_index": query.chunk_index,
        }));
    };

    match task.chunk_state(query.chunk_index) {
        ChunkState::Ready => {}
        ChunkState::Pending => {
            if let Some(reason) = task.failure() {
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "loading the dump failed",
                    "details": reason,
                    "file": task.file_path,
                    "task_id": query.task_id,
                }));
            }
            return HttpResponse::Accepted().json(serde_json::json!({
                "error": "chunk is still loading, retry later",
                "task_id": query.task_id,
                "chunk_index": query.chunk_index,
                "status": "processing",
            }));
        }
        ChunkState::Gone => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "chunk already served",
                "task_id": query.task_id,
                "chunk_index": query.chunk_index,
            }));
        }
    }

    let Some(chunk_values) = task.take_chunk(query.chunk_index) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "chunk already served",
            "task_id": query.task_id,
            "chunk_index": query.chunk_index,
        }));
    };

    let mut bytes = Vec::with_capacity(chunk_values.len() * std::mem::size_of::<f32>());
    for value in chunk_values {
        if let Err(e) = bytes.write_f32::<LittleEndian>(value) {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "failed to encode chunk",
                "details": e.to_string(),
            }));
        }
    }

    HttpResponse::Ok()
        .content_type(ContentType::octet_stream())
        .append_header(("X-Chunk-Index", descriptor.index.to_string()))
        .append_header(("X-Chunk-Start", descriptor.start.to_string()))
        .append_header(("X-Chunk-End", descriptor.end.to_string()))
        .append_header((
            "X-Chunk-Length",
            (descriptor.end - descriptor.start).to_string(),
        ))
        .append_header(("X-Chunk-Component", task.component.to_string()))
        .append_header(("X-Chunk-Task", query.task_id.clone()))
        .body(bytes)
}
