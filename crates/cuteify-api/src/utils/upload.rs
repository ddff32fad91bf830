//! Multipart intake for the upload endpoint

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use cuteify_core::constants::UPLOAD_FIELD_NAME;
use cuteify_core::AppError;
use cuteify_processing::{PipelineError, UploadPipeline};
use cuteify_storage::TransientUpload;
use futures::StreamExt;

use crate::error::HttpAppError;

/// Body-limit violations surface as 413; anything else is a malformed request.
fn map_multipart_error(err: MultipartError) -> PipelineError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PipelineError::BodyLimit(err.body_text())
    } else {
        PipelineError::Stream(err.body_text())
    }
}

/// Stream the `image` field of `multipart` into transient storage.
///
/// Exactly one file field named `image` is accepted. Text fields are skipped;
/// a second file field (under any name) fails the request and the already
/// stored upload is removed when it goes out of scope.
pub async fn receive_image(
    pipeline: &UploadPipeline,
    mut multipart: Multipart,
) -> Result<TransientUpload, HttpAppError> {
    let mut upload: Option<TransientUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        let is_file = field.file_name().is_some();

        if field_name != UPLOAD_FIELD_NAME {
            if is_file {
                return Err(AppError::InvalidInput(format!(
                    "Unexpected file field '{}'; send exactly one file in field '{}'",
                    field_name, UPLOAD_FIELD_NAME
                ))
                .into());
            }
            continue;
        }

        if upload.is_some() {
            return Err(AppError::InvalidInput(format!(
                "Multiple files are not allowed; send exactly one file in field '{}'",
                UPLOAD_FIELD_NAME
            ))
            .into());
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        tracing::debug!(
            filename = %filename,
            content_type = %content_type,
            "Receiving image field"
        );

        let chunks = field.map(|chunk| chunk.map_err(map_multipart_error));
        upload = Some(pipeline.ingest(&filename, &content_type, chunks).await?);
    }

    upload.ok_or_else(|| {
        AppError::InvalidInput(format!(
            "No image provided; send one file in field '{}'",
            UPLOAD_FIELD_NAME
        ))
        .into()
    })
}
