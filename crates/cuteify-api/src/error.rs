//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`. Pipeline and storage failures are
//! converted into an [`AppError`] here, and [`HttpAppError`] renders it with the
//! status, body and log level the error describes for itself.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cuteify_core::constants::BYTES_PER_MB;
use cuteify_core::{AppError, ErrorMetadata, LogLevel};
use cuteify_processing::{PipelineError, ValidationError};
use cuteify_storage::StorageError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    /// Underlying cause; omitted for sensitive errors and in production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rules: both IntoResponse and AppError are foreign to this crate)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    let details = error.detailed_message();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %details, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %details, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %details, error_type = error_type, "Error occurred");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Sensitive errors never carry details. Production responses are
        // stripped by `error_details_middleware`.
        let details = if app_error.is_sensitive() {
            None
        } else {
            Some(app_error.detailed_message())
        };

        let body = ErrorResponse {
            message: app_error.client_message(),
            details,
        };

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

// Convert domain errors to HttpAppError

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::InvalidName(msg) => AppError::InvalidInput(msg),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            other => AppError::Storage(other.to_string()),
        };
        HttpAppError(app)
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        let app = match err {
            ValidationError::FileTooLarge { max, .. } => AppError::PayloadTooLarge(format!(
                "File too large. Maximum size is {} MB",
                max as f64 / BYTES_PER_MB as f64
            )),
            ValidationError::EmptyFile => AppError::InvalidInput("File is empty".to_string()),
            other => AppError::InvalidInput(other.to_string()),
        };
        HttpAppError(app)
    }
}

impl From<PipelineError> for HttpAppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(e) => e.into(),
            PipelineError::Storage(e) => e.into(),
            PipelineError::BodyLimit(msg) => {
                HttpAppError(AppError::PayloadTooLarge(format!("Request body too large: {msg}")))
            }
            PipelineError::Stream(msg) => {
                HttpAppError(AppError::InvalidInput(format!("Failed to read upload: {}", msg)))
            }
            PipelineError::Transform(e) => HttpAppError(AppError::ImageProcessing(e.to_string())),
        }
    }
}
