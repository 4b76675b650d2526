use std::fmt;
use std::future::Future;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ObservabilityConfig};
use crate::state::AppState;

/// Request latency, dimension `"<METHOD> <route>"`.
pub const API_LATENCY: &str = "api_latency_ms";
/// Persistence gateway call latency, dimension = gateway operation.
pub const DB_CALL: &str = "db_call_ms";
/// Object store call latency, dimension = gateway operation.
pub const STORAGE_CALL: &str = "storage_call_ms";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// A structured log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub level: EventLevel,
    /// Router operation that produced the event (`upload_file`, ...).
    pub operation: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl Event {
    pub fn new(level: EventLevel, operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            operation,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn info(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(EventLevel::Info, operation, message)
    }

    pub fn warn(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(EventLevel::Warn, operation, message)
    }

    pub fn error(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(EventLevel::Error, operation, message)
    }

    /// Attach a key/value pair.
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

struct Fields<'a>(&'a [(&'static str, String)]);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value:?}")?;
        }
        Ok(())
    }
}

/// Destination for structured events and timing samples.
///
/// Both methods must return promptly and never fail; callers do not wait on
/// delivery.
pub trait ObservabilitySink: Send + Sync {
    fn log_event(&self, event: Event);

    fn record_metric(&self, name: &'static str, dimension: &str, value: f64);
}

/// Sink that forwards events to `tracing` and samples to the `metrics` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetrySink;

impl ObservabilitySink for TelemetrySink {
    fn log_event(&self, event: Event) {
        let fields = Fields(&event.fields);
        let op = event.operation;
        match event.level {
            EventLevel::Info => tracing::info!(operation = op, fields = %fields, "{}", event.message),
            EventLevel::Warn => tracing::warn!(operation = op, fields = %fields, "{}", event.message),
            EventLevel::Error => tracing::error!(operation = op, fields = %fields, "{}", event.message),
        }
    }

    fn record_metric(&self, name: &'static str, dimension: &str, value: f64) {
        metrics::histogram!(name, "api" => dimension.to_string()).record(value);
    }
}

/// Await `fut`, recording its wall-clock duration in milliseconds.
pub async fn timed<F, T>(
    sink: &dyn ObservabilitySink,
    metric: &'static str,
    dimension: &str,
    fut: F,
) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let output = fut.await;
    sink.record_metric(metric, dimension, elapsed_ms(start));
    output
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Middleware recording the latency of every request.
pub async fn track_latency(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let dimension = format!("{} {}", req.method(), route);

    let start = Instant::now();
    let response = next.run(req).await;
    state
        .telemetry
        .record_metric(API_LATENCY, &dimension, elapsed_ms(start));
    response
}

/// Install the global `tracing` subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match config.log_format {
        LogFormat::Json => builder.json().flatten_event(true).init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Start the Prometheus exporter when `metrics_addr` is configured.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(config: &ObservabilityConfig) -> Result<(), BuildError> {
    if let Some(addr) = config.metrics_addr {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        info!(%addr, "Prometheus exporter listening");
    }
    Ok(())
}
