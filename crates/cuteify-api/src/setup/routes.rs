//! Route configuration and setup

use crate::api_doc;
use crate::handlers;
use crate::middleware::error_details_middleware;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use cuteify_core::constants::{PROCESSED_ROUTE, UPLOADS_ROUTE, UPLOAD_ROUTE};
use cuteify_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    // The pipeline enforces the file limit itself while streaming; this bounds
    // the whole request body so the file check is what normally trips first.
    let body_limit = config.max_file_size_bytes + MULTIPART_OVERHEAD_BYTES;

    let http_concurrency_limit = config.http_concurrency_limit.max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        body_limit_bytes = body_limit,
        "HTTP limits configured"
    );

    let api_routes = Router::new()
        .route(
            UPLOAD_ROUTE,
            post(handlers::upload::upload_image).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(api_doc::get_openapi_spec()) }),
        )
        .with_state(state);

    let app = api_routes
        .nest_service(PROCESSED_ROUTE, ServeDir::new(&config.processed_dir))
        .nest_service(UPLOADS_ROUTE, ServeDir::new(&config.upload_dir))
        .layer(axum::middleware::from_fn_with_state(
            config.is_production(),
            error_details_middleware,
        ))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
