use std::fmt;

/// Errors that can occur during object storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The object key is empty or escapes the bucket namespace.
    InvalidKey(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The remote service answered with a non-success status.
    Rejected { status: u16, message: String },
    /// The remote service could not be reached or the client failed.
    Backend(String),
    /// The backend is misconfigured (missing bucket, bad credentials, ...).
    Config(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey(key) => write!(f, "invalid object key: {key:?}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::Rejected { status, message } => {
                write!(f, "object store rejected request ({status}): {message}")
            }
            Self::Backend(msg) => write!(f, "object store error: {msg}"),
            Self::Config(msg) => write!(f, "object store misconfigured: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
