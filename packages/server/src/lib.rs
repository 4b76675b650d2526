pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod persistence;
pub mod routes;
pub mod state;
pub mod utils;

use axum::middleware;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Filebox API",
        version = "1.0.0",
        description = "Health check and file upload/metadata service"
    ),
    paths(
        handlers::health::health_check,
        handlers::file::upload_file,
        handlers::file::get_file,
        handlers::file::delete_file,
    ),
    components(schemas(models::file::FileResponse, error::ErrorBody)),
    tags(
        (name = "Health", description = "Liveness check backed by the database"),
        (name = "Files", description = "File upload, metadata lookup and deletion"),
    ),
)]
pub struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let api_docs = state.config.server.api_docs;

    let mut router = routes::routes(&state.config.server)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            observability::track_latency,
        ))
        .with_state(state);

    if api_docs {
        router = router.merge(Scalar::with_url("/docs", ApiDoc::openapi()));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
}
