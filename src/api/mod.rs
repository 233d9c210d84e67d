mod handlers;
mod models;

use crate::config::ALLOWED_ORIGINS;
use crate::services::{RefreshHandle, ResultCache};
use actix_cors::Cors;
use actix_web::{error, web, HttpResponse};
use models::SearchResponse;
use std::sync::Arc;
use tracing::warn;

/// Shared state handed to every request handler.
pub struct AppState {
    pub cache: Arc<ResultCache>,
    pub refresh: RefreshHandle,
}

impl AppState {
    pub fn new(cache: Arc<ResultCache>, refresh: RefreshHandle) -> Self {
        Self { cache, refresh }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::index)
        .service(handlers::status)
        .service(handlers::strategies)
        .service(handlers::refresh_cache)
        .service(handlers::search)
        .service(handlers::common_stocks);
}

pub fn cors() -> Cors {
    ALLOWED_ORIGINS
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
}

/// Malformed JSON bodies get the same failure envelope as other errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        warn!("Rejected request body: {}", err);
        let body = SearchResponse::failure(format!("Error: {}", err));
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}
