//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cuteify API",
        version = "0.1.0",
        description = "Upload a JPEG or PNG and receive four 300x300 rotated JPEG variants."
    ),
    paths(
        handlers::upload::upload_image,
        handlers::health::health_check,
    ),
    components(schemas(
        handlers::upload::UploadResponse,
        handlers::health::HealthResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "images", description = "Image upload and variant generation"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
