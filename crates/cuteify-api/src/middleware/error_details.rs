//! Error detail redaction
//!
//! [`HttpAppError`](crate::error::HttpAppError) attaches the [`ErrorResponse`]
//! it rendered to the response extensions. In production this middleware
//! re-renders any such body without `details`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ErrorResponse;

pub async fn error_details_middleware(
    State(is_production): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !is_production {
        return response;
    }

    let redacted = match response.extensions().get::<ErrorResponse>() {
        Some(body) if body.details.is_some() => ErrorResponse {
            message: body.message.clone(),
            details: None,
        },
        _ => return response,
    };

    let mut stripped = (response.status(), Json(redacted.clone())).into_response();
    stripped.extensions_mut().insert(redacted);
    stripped
}
