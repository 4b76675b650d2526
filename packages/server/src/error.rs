use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use serde::Serialize;
use thiserror::Error;

use crate::persistence::PersistenceError;

/// Structured error body returned with 400, 413 and 500 responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `PAYLOAD_TOO_LARGE`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Missing 'file' field")]
    pub message: String,
}

/// Application-level error type.
///
/// `NotFound`, `MethodNotAllowed` and `Unavailable` render with an empty body.
#[derive(Debug, Error)]
pub enum AppError {
    /// The request violated the endpoint's input contract.
    #[error("{0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("{0}")]
    PayloadTooLarge(String),
    /// A dependency needed to answer the request is unreachable.
    #[error("service unavailable: {0}")]
    Unavailable(String),
    /// A dependency call failed. The detail is never sent to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation(message) => ErrorBody {
                code: "VALIDATION_ERROR",
                message,
            },
            AppError::PayloadTooLarge(message) => ErrorBody {
                code: "PAYLOAD_TOO_LARGE",
                message,
            },
            AppError::Internal(_) => ErrorBody {
                code: "INTERNAL_ERROR",
                message: "An unexpected error occurred".into(),
            },
            AppError::NotFound | AppError::MethodNotAllowed | AppError::Unavailable(_) => {
                return status.into_response();
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<PersistenceError> for AppError {
    fn from(err: PersistenceError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Internal(err.to_string())
    }
}
