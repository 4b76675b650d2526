use std::path::PathBuf;

use serde::Deserialize;

/// Which object-storage backend holds uploaded blobs.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// S3-compatible bucket.
    S3,
    /// Directory on local disk. Intended for development and tests.
    Filesystem,
}

/// Object-storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Backend selector. Default: `s3`.
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Bucket name. Required for the S3 backend.
    #[serde(default)]
    pub bucket: String,
    /// Bucket region. Default: "us-east-1".
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, LocalStack, ...).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Static access key. When unset, credentials come from the environment
    /// or the shared profile.
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Use path-style addressing (`endpoint/bucket/key`). Default: false.
    #[serde(default)]
    pub path_style: bool,
    /// Root directory for the filesystem backend. Default: "./data/blobs".
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_backend() -> StorageBackend {
    StorageBackend::S3
}
fn default_region() -> String {
    "us-east-1".into()
}
fn default_root() -> PathBuf {
    PathBuf::from("./data/blobs")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            bucket: String::new(),
            region: default_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            path_style: false,
            root: default_root(),
        }
    }
}
