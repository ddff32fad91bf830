use std::time::Duration;

use cuteify_storage::StorageError;

use crate::validator::ValidationError;

/// Failure of a single transform task. The cause is carried in the message.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Failed to read input image: {0}")]
    Read(std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(image::ImageError),

    #[error("Failed to render variant: {0}")]
    Render(String),

    #[error("Failed to write variant: {0}")]
    Write(StorageError),

    #[error("Transform timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Transform task failed to complete: {0}")]
    Join(String),
}

/// Failure of the upload pipeline as a whole
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Request body exceeds the configured limit: {0}")]
    BodyLimit(String),

    #[error("Failed to read file data: {0}")]
    Stream(String),

    #[error(transparent)]
    Transform(#[from] TransformError),
}
