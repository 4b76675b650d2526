use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{MethodRouter, get, post};

use crate::config::ServerConfig;
use crate::handlers::{fallback, file, health};
use crate::state::AppState;

pub const HEALTH: &str = "/healthz";
pub const FILES: &str = "/v1/file";
pub const FILE: &str = "/v1/file/{id}";

/// The dispatch table: one entry per path, each with its own method fallback,
/// and a 404 fallback for everything else.
///
/// `HEAD` is routed explicitly because axum would otherwise serve it with the
/// `GET` handler.
pub fn routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .route(HEALTH, health_routes())
        .route(FILES, collection_routes(config.max_upload_size))
        .route(FILE, item_routes())
        .fallback(fallback::not_found)
}

fn health_routes() -> MethodRouter<AppState> {
    get(health::health_check)
        .head(fallback::method_not_allowed)
        .fallback(fallback::method_not_allowed)
        .layer(fallback::no_cache())
}

fn collection_routes(max_upload_size: usize) -> MethodRouter<AppState> {
    post(file::upload_file)
        .get(fallback::missing_file_id)
        .delete(fallback::missing_file_id)
        .head(fallback::method_not_allowed)
        .fallback(fallback::method_not_allowed)
        .layer(DefaultBodyLimit::max(max_upload_size))
}

fn item_routes() -> MethodRouter<AppState> {
    get(file::get_file)
        .delete(file::delete_file)
        .head(fallback::method_not_allowed)
        .fallback(fallback::method_not_allowed)
}
