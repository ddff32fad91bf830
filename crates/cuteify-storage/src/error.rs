use std::path::PathBuf;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Failure to remove a transient upload. Logged by the caller, never surfaced.
#[derive(Debug, Error)]
#[error("Failed to delete transient upload {path}: {source}")]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
