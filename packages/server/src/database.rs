use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Statement,
};
use tracing::info;

use crate::config::DatabaseConfig;

/// Connect to the configured database, creating it and any missing tables first.
pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    ensure_database_exists(config).await?;

    let mut opt = ConnectOptions::new(config.url().map_err(invalid_url)?);

    // Set connection pool options
    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    info!(database = %config.name, "Connected to database");

    db.get_schema_registry("filebox_server::entity::*")
        .sync(&db)
        .await?;
    info!("Database schema synced");

    Ok(db)
}

/// Create `config.name` through the maintenance database if it does not exist.
///
/// Returns `true` when the database was created.
pub async fn ensure_database_exists(config: &DatabaseConfig) -> Result<bool, DbErr> {
    let mut opt = ConnectOptions::new(config.maintenance_url().map_err(invalid_url)?);
    opt.max_connections(1)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(false);
    let admin = Database::connect(opt).await?;

    let existing = admin
        .query_one_raw(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT 1 FROM pg_database WHERE datname = $1",
            [config.name.clone().into()],
        ))
        .await?;

    let created = if existing.is_none() {
        info!(database = %config.name, "Database not found, creating");
        admin
            .execute_raw(Statement::from_string(
                DbBackend::Postgres,
                format!("CREATE DATABASE {}", quote_ident(&config.name)),
            ))
            .await?;
        true
    } else {
        false
    };

    admin.close().await?;
    Ok(created)
}

fn invalid_url(e: url::ParseError) -> DbErr {
    DbErr::Custom(format!("invalid database url: {e}"))
}

/// Quote a PostgreSQL identifier.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
