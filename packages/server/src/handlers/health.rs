use axum::body::{Body, to_bytes};
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use tracing::instrument;

use super::run_to_completion;
use crate::error::AppError;
use crate::observability::{DB_CALL, Event, timed};
use crate::persistence::HealthCheckEvent;
use crate::state::AppState;

const OPERATION: &str = "health_check";

/// Longest body read before the request is rejected as carrying one.
const MAX_HEALTH_BODY: usize = 4096;

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "Health",
    operation_id = "healthCheck",
    summary = "Liveness check",
    description = "Pings the database and appends a heartbeat row. The request must carry \
        no body and no query parameters. Responses always have an empty body and \
        `Cache-Control: no-cache`.",
    responses(
        (status = 200, description = "Database reachable, heartbeat recorded"),
        (status = 400, description = "Request carried a body or query parameters"),
        (status = 405, description = "Any method other than GET"),
        (status = 503, description = "Database unreachable or heartbeat write failed"),
    ),
)]
#[instrument(skip_all)]
pub async fn health_check(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: Body,
) -> StatusCode {
    if has_query_params(query.as_deref()) || has_body(body).await {
        state.telemetry.log_event(
            Event::warn(OPERATION, "Rejected health check carrying a body or query")
                .field("query", query.as_deref().unwrap_or("")),
        );
        return StatusCode::BAD_REQUEST;
    }

    let telemetry = state.telemetry.clone();
    let tasks = state.tasks.clone();
    match run_to_completion(&tasks, OPERATION, record_heartbeat(state)).await {
        Ok(event) => {
            telemetry.log_event(
                Event::info(OPERATION, "Heartbeat recorded").field("check_id", event.id),
            );
            StatusCode::OK
        }
        Err(e) => {
            telemetry.log_event(
                Event::error(OPERATION, "Health check failed").field("cause", &e),
            );
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn record_heartbeat(state: AppState) -> Result<HealthCheckEvent, AppError> {
    let sink = &*state.telemetry;
    timed(sink, DB_CALL, "ping", state.persistence.ping())
        .await
        .map_err(|e| AppError::Unavailable(e.to_string()))?;
    timed(
        sink,
        DB_CALL,
        "create_health_event",
        state.persistence.create_health_event(),
    )
    .await
    .map_err(|e| AppError::Unavailable(e.to_string()))
}

/// True if the request carries at least one body byte. An empty chunked
/// body counts as no body.
async fn has_body(body: Body) -> bool {
    match to_bytes(body, MAX_HEALTH_BODY).await {
        Ok(bytes) => !bytes.is_empty(),
        Err(_) => true,
    }
}

/// True if the query string holds at least one parameter. `/healthz?` has none.
fn has_query_params(query: Option<&str>) -> bool {
    query.is_some_and(|q| q.split('&').any(|pair| !pair.is_empty()))
}
