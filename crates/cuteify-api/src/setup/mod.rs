//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use cuteify_core::Config;
use cuteify_processing::UploadPipeline;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_tracing(config.log_format).context("Failed to initialize tracing")?;

    tracing::info!(
        environment = %config.environment,
        "Configuration loaded and validated successfully"
    );

    let state = build_state(config).await?;
    let router = routes::setup_routes(&state.config, state.clone())?;

    Ok((state, router))
}

/// Create storage directories and the upload pipeline
pub async fn build_state(config: Config) -> Result<Arc<AppState>> {
    let pipeline = UploadPipeline::from_config(&config)
        .await
        .context("Failed to initialize upload pipeline")?;

    Ok(Arc::new(AppState::new(config, pipeline)))
}
