use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};
use thiserror::Error;
use uuid::Uuid;

use crate::entity::{file_metadata, health_check};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("database unreachable: {0}")]
    Unavailable(String),
}

/// A heartbeat row written by a successful health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckEvent {
    pub id: i32,
    pub timestamp: DateTime<Utc>,
}

impl From<health_check::Model> for HealthCheckEvent {
    fn from(model: health_check::Model) -> Self {
        Self {
            id: model.check_id,
            timestamp: model.datetime,
        }
    }
}

/// Metadata for one uploaded blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: Uuid,
    pub filename: String,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

impl From<file_metadata::Model> for FileRecord {
    fn from(model: file_metadata::Model) -> Self {
        Self {
            id: model.id,
            filename: model.filename,
            storage_key: model.storage_key,
            created_at: model.created_at,
        }
    }
}

/// Relational store holding health-check events and file metadata.
///
/// Implementations are shared by all in-flight requests.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Lightweight connectivity check.
    async fn ping(&self) -> Result<(), PersistenceError>;

    async fn create_health_event(&self) -> Result<HealthCheckEvent, PersistenceError>;

    async fn create_file_record(
        &self,
        id: Uuid,
        filename: &str,
        storage_key: &str,
    ) -> Result<FileRecord, PersistenceError>;

    async fn get_file_record(&self, id: Uuid) -> Result<Option<FileRecord>, PersistenceError>;

    /// Returns `false` if no record with `id` existed.
    async fn delete_file_record(&self, id: Uuid) -> Result<bool, PersistenceError>;

    /// Release pooled connections.
    async fn close(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

/// [`Persistence`] over a sea-orm connection pool.
pub struct SeaOrmPersistence {
    db: DatabaseConnection,
}

impl SeaOrmPersistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Persistence for SeaOrmPersistence {
    async fn ping(&self) -> Result<(), PersistenceError> {
        self.db
            .ping()
            .await
            .map_err(|e| PersistenceError::Unavailable(e.to_string()))
    }

    async fn create_health_event(&self) -> Result<HealthCheckEvent, PersistenceError> {
        let event = health_check::ActiveModel {
            datetime: Set(Utc::now()),
            ..Default::default()
        };
        let model = event.insert(&self.db).await?;
        Ok(model.into())
    }

    async fn create_file_record(
        &self,
        id: Uuid,
        filename: &str,
        storage_key: &str,
    ) -> Result<FileRecord, PersistenceError> {
        let record = file_metadata::ActiveModel {
            id: Set(id),
            filename: Set(filename.to_string()),
            storage_key: Set(storage_key.to_string()),
            created_at: Set(Utc::now()),
        };
        let model = record.insert(&self.db).await?;
        Ok(model.into())
    }

    async fn get_file_record(&self, id: Uuid) -> Result<Option<FileRecord>, PersistenceError> {
        let model = file_metadata::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(FileRecord::from))
    }

    async fn delete_file_record(&self, id: Uuid) -> Result<bool, PersistenceError> {
        let result = file_metadata::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn close(&self) -> Result<(), PersistenceError> {
        // Closing any handle closes the shared pool.
        self.db.clone().close().await?;
        Ok(())
    }
}
