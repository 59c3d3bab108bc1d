use std::time::Instant;

use actix_web::{HttpResponse, Responder, post, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::app_state::AppState;
use crate::error::DumpError;
use crate::handlers::error_response;
use crate::task::{ChunkDescriptor, TaskData, plan_chunks};

#[derive(Deserialize)]
pub struct PreprocessRequest {
    pub file: String,
    #[serde(default)]
    pub component: usize,
    pub chunk_size: usize,
}

#[derive(Serialize, Clone)]
pub struct PreprocessResponse {
    pub task_id: String,
    pub file: String,
    pub file_size: u64,
    pub shape: [u64; 4],
    pub component: usize,
    /// samples in the selected component
    pub data_length: usize,
    pub chunk_size: usize,
    pub chunks: Vec<ChunkDescriptor>,
}

#[post("/dump/preprocess")]
pub async fn preprocess_field(
    data: web::Data<AppState>,
    payload: web::Json<PreprocessRequest>,
) -> impl Responder {
    match run_preprocess(data.get_ref(), &payload.file, payload.component, payload.chunk_size) {
        Ok(resp) => HttpResponse::Ok().json(resp),
        Err(err) => err,
    }
}

/// Creates a chunked-transfer task for one component of a dump file.
///
/// ## Steps
/// 1. Resolve `file` inside the resource directory (bare file names only).
/// 2. Pick a parser from the extension (`.dump`, `.gz`).
/// 3. Read only the header: the shape decides the chunk plan, so the
///    response goes out before the payload is touched.
/// 4. Check `component < comp` and cut its `sx*sy*sz` samples into
///    `chunk_size` pieces.
/// 5. Register the task, then load the whole file in the background on the
///    blocking pool.
/// 6. When the load finishes, the loaded shape is compared with the planned
///    one. A file rewritten in between fails the task instead of leaving its
///    chunks pending.
///
/// ## Arguments
/// - `file`: name inside the resource directory, e.g. "m000010.dump"
/// - `component`: index along the first axis (0 for scalar fields)
/// - `chunk_size`: samples per chunk, raised to at least 1
///
/// ## Returns
/// - `Ok(PreprocessResponse)`: task id, shape and chunk plan
/// - `Err(HttpResponse)`: 400 for bad names, unsupported files or
///   components, 404 for missing files, 422 for corrupt headers
pub fn run_preprocess(
    app_state: &AppState,
    file: &str,
    component: usize,
    chunk_size: usize,
) -> Result<PreprocessResponse, HttpResponse> {
    // step 1
    let chunk_size = chunk_size.max(1);
    let file_path = app_state
        .resolve(file)
        .map_err(|e| error_response(&e, file))?;

    // step 2
    let Some((parser, _)) = app_state.parser_registry.find_parser_for_file(&file_path) else {
        let supported = app_state.parser_registry.supported_extensions();
        return Err(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "unsupported file type",
            "file": file,
            "supported_extensions": supported,
        })));
    };

    let file_size = std::fs::metadata(&file_path)
        .map_err(|e| error_response(&DumpError::from(e), file))?
        .len();

    // step 3
    let header = parser
        .read_header(&file_path)
        .map_err(|e| error_response(&e, file))?;

    // step 4
    let comp = header.comp as usize;
    if component >= comp {
        return Err(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "component out of range",
            "file": file,
            "component": component,
            "components": comp,
        })));
    }

    let data_length = header
        .sample_count()
        .map_err(|e| error_response(&DumpError::from(e), file))?
        / comp;
    let chunks = plan_chunks(data_length, chunk_size);

    // step 5
    let task_data = TaskData::new(header.shape(), component, chunks.clone(), file_path.clone());
    let (task_id, task) = app_state.task_store.insert(task_data);

    let parser_registry = app_state.parser_registry.clone();
    let task_id_bg = task_id.clone();
    actix_web::rt::spawn(async move {
        let parse_start = Instant::now();
        let path = file_path.clone();
        let loaded = web::block(move || {
            let (parser, _) = parser_registry
                .find_parser_for_file(&path)
                .ok_or_else(|| DumpError::UnsupportedFile {
                    file: path.display().to_string(),
                })?;
            parser.parse_from_file(&path)
        })
        .await;

        let dump = match loaded {
            Ok(Ok(dump)) => dump,
            Ok(Err(e)) => {
                error!(task = %task_id_bg, file = %file_path.display(), "load failed: {e}");
                task.fail(e.to_string());
                return;
            }
            Err(e) => {
                error!(task = %task_id_bg, "load task aborted: {e}");
                task.fail(e.to_string());
                return;
            }
        };

        info!(
            task = %task_id_bg,
            trailer = format_args!("{:#018x}", dump.trailer),
            "file loaded in {}ms",
            parse_start.elapsed().as_millis()
        );

        // step 6
        let Some(values) = dump.field.component_values(task.component) else {
            task.fail(format!("component {} missing from payload", task.component));
            return;
        };
        if task.complete(dump.header.shape(), values) {
            info!(task = %task_id_bg, chunks = task.chunks.len(), "chunks ready");
        } else {
            error!(task = %task_id_bg, reason = ?task.failure(), "loaded file does not match plan");
        }
    });

    Ok(PreprocessResponse {
        task_id,
        file: file.to_string(),
        file_size,
        shape: header.shape(),
        component,
        data_length,
        chunk_size,
        chunks,
    })
}
