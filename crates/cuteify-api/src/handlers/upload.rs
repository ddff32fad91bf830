use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::receive_image;
use crate::utils::url::{resolve_urls, RequestOrigin};

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Absolute URLs of the generated variants, in rotation order (0, 90, 180, 270)
    pub images: Vec<String>,
}

/// Upload image handler
///
/// Accepts one JPEG or PNG in the multipart field `image`, generates the four
/// 300x300 rotated JPEG variants, and returns their absolute URLs. The uploaded
/// file itself is removed before the response is sent.
///
/// # Errors
/// - `AppError::InvalidInput` - Missing field, disallowed type, malformed body
/// - `AppError::PayloadTooLarge` - File exceeds the configured size limit
/// - `AppError::ImageProcessing` - Any variant failed; no URLs are returned
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "images",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "All variants generated", body = UploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Error processing image", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(host = %origin.host, operation = "upload_image")
)]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    origin: RequestOrigin,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let start = std::time::Instant::now();

    let upload = receive_image(&state.pipeline, multipart).await?;
    let stem = upload.stem().to_string();
    let original_filename = upload.original_filename().to_string();
    let content_type = upload.content_type().to_string();

    let paths = state.pipeline.process(upload).await?;
    let images = resolve_urls(&origin, &paths);

    tracing::info!(
        stem = %stem,
        original_filename = %original_filename,
        content_type = %content_type,
        variants = images.len(),
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Image processed"
    );

    Ok(Json(UploadResponse { images }))
}
