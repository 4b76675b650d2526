use std::net::SocketAddr;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use url::Url;

pub use common::config::{StorageBackend, StorageConfig};

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body for uploads, in bytes.
    pub max_upload_size: usize,
    /// Serve the OpenAPI reference UI at `/docs`.
    #[serde(default)]
    pub api_docs: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Database holding the service tables. Created on startup if absent.
    pub name: String,
    /// Database used to check for and create `name`.
    pub maintenance_db: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn url(&self) -> Result<String, url::ParseError> {
        self.url_for(&self.name)
    }

    pub fn maintenance_url(&self) -> Result<String, url::ParseError> {
        self.url_for(&self.maintenance_db)
    }

    /// Credentials and database name are percent-encoded.
    fn url_for(&self, database: &str) -> Result<String, url::ParseError> {
        let mut url = Url::parse(&format!("postgres://{}:{}", self.host, self.port))?;
        // Only fail on URLs without a host, which the parse above rules out.
        url.set_username(&self.username)
            .map_err(|_| url::ParseError::EmptyHost)?;
        url.set_password(Some(&self.password))
            .map_err(|_| url::ParseError::EmptyHost)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::EmptyHost)?
            .clear()
            .push(database);
        Ok(url.into())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub log_level: String,
    /// Address for the Prometheus scrape listener. Metrics are only
    /// exported when this is set.
    #[serde(default)]
    pub metrics_addr: Option<SocketAddr>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("FILEBOX_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.max_upload_size", 16 * 1024 * 1024)?
            .set_default("server.api_docs", false)?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.username", "postgres")?
            .set_default("database.password", "postgres")?
            .set_default("database.name", "cloud")?
            .set_default("database.maintenance_db", "postgres")?
            .set_default("database.max_connections", 10)?
            .set_default("database.connect_timeout_secs", 8)?
            .set_default("storage.backend", "s3")?
            .set_default("observability.log_format", "pretty")?
            .set_default("observability.log_level", "info")?
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., FILEBOX__STORAGE__BUCKET)
            .add_source(Environment::with_prefix("FILEBOX").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
