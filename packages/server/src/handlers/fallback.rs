use axum::http::{HeaderValue, StatusCode, header};
use axum::response::IntoResponse;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::error::AppError;

/// `Cache-Control: no-cache`, set on every health-check and not-found response.
pub fn no_cache() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))
}

/// Any path outside the route table.
pub async fn not_found() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))],
        StatusCode::NOT_FOUND,
    )
}

/// A known path hit with a method it does not serve.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Read-style methods on the collection path, which need an id.
pub async fn missing_file_id() -> AppError {
    AppError::Validation("A file id is required: use /v1/file/{id}".into())
}
