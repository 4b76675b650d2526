use std::sync::Arc;

use anyhow::Context;
use common::storage::{self, ObjectStore};
use tokio_util::task::TaskTracker;
use tracing::info;

use crate::config::AppConfig;
use crate::database::init_db;
use crate::observability::{ObservabilitySink, TelemetrySink};
use crate::persistence::{Persistence, SeaOrmPersistence};

/// Everything a request handler may touch. Built once at startup and shared
/// read-only between requests.
#[derive(Clone)]
pub struct AppState {
    pub persistence: Arc<dyn Persistence>,
    pub storage: Arc<dyn ObjectStore>,
    pub telemetry: Arc<dyn ObservabilitySink>,
    pub config: Arc<AppConfig>,
    /// Side-effect sequences still running on behalf of requests.
    pub tasks: TaskTracker,
}

impl AppState {
    pub fn new(
        persistence: Arc<dyn Persistence>,
        storage: Arc<dyn ObjectStore>,
        telemetry: Arc<dyn ObservabilitySink>,
        config: AppConfig,
    ) -> Self {
        Self {
            persistence,
            storage,
            telemetry,
            config: Arc::new(config),
            tasks: TaskTracker::new(),
        }
    }

    /// Connect both gateways. The database and its tables are created if absent.
    pub async fn initialize(config: AppConfig) -> anyhow::Result<Self> {
        let db = init_db(&config.database)
            .await
            .context("Failed to initialize database")?;
        let storage = storage::connect(&config.storage)
            .await
            .context("Failed to initialize object storage")?;
        info!(backend = ?config.storage.backend, bucket = %config.storage.bucket, "Object storage ready");

        Ok(Self::new(
            Arc::new(SeaOrmPersistence::new(db)),
            storage,
            Arc::new(TelemetrySink),
            config,
        ))
    }

    /// Wait for in-flight side-effect sequences, then release gateway
    /// resources. Call after the server stops accepting requests.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.tasks.close();
        if !self.tasks.is_empty() {
            info!(pending = self.tasks.len(), "Waiting for in-flight operations");
        }
        self.tasks.wait().await;

        self.persistence
            .close()
            .await
            .context("Failed to close database pool")?;
        info!("Resources released");
        Ok(())
    }
}
