//! Cuteify API Library
//!
//! This crate provides the HTTP surface of the upload pipeline: the upload and
//! health handlers, static serving of variants, and application setup.

// Module declarations
mod api_doc;
mod handlers;
mod middleware;
pub mod setup;
mod telemetry;
pub mod utils;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use handlers::upload::UploadResponse;
pub use state::AppState;
