use actix_web::web;

use crate::handlers;

/// Registers every HTTP route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::hello)
        .service(handlers::get_header)
        .service(handlers::preprocess_field)
        .service(handlers::get_field_chunk)
        .service(handlers::get_field);
}
