//! Test helpers: build AppState and router for integration tests.
//!
//! Every test app gets its own temporary upload and processed directories.

#![allow(dead_code)]

pub mod fixtures;

use axum_test::TestServer;
use cuteify_api::setup::{build_state, routes};
use cuteify_api::AppState;
use cuteify_core::Config;
use cuteify_processing::{MediaValidator, UploadPipeline, VariantRenderer};
use cuteify_storage::LocalStorage;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Test application: server and owned directories.
pub struct TestApp {
    pub server: TestServer,
    pub config: Config,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_dir
    }

    pub fn processed_dir(&self) -> &Path {
        &self.config.processed_dir
    }
}

pub fn create_test_config(temp_dir: &TempDir, max_file_size_bytes: usize) -> Config {
    Config {
        upload_dir: temp_dir.path().join("uploads"),
        processed_dir: temp_dir.path().join("processed"),
        max_file_size_bytes,
        ..Config::default()
    }
}

/// Setup test app with the default 5 MiB limit.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_limit(5 * 1024 * 1024).await
}

pub async fn setup_test_app_with_limit(max_file_size_bytes: usize) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = create_test_config(&temp_dir, max_file_size_bytes);
    build_test_app(config, temp_dir).await
}

/// Setup test app running under `environment` (e.g. "production").
pub async fn setup_test_app_in_environment(environment: &str) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = Config {
        environment: environment.to_string(),
        ..create_test_config(&temp_dir, 5 * 1024 * 1024)
    };
    build_test_app(config, temp_dir).await
}

async fn build_test_app(config: Config, temp_dir: TempDir) -> TestApp {
    let state = build_state(config.clone())
        .await
        .expect("Failed to build state");
    into_test_app(config, state, temp_dir)
}

/// Setup test app whose variants are produced by `renderer`.
pub async fn setup_test_app_with_renderer(renderer: Arc<dyn VariantRenderer>) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = create_test_config(&temp_dir, 5 * 1024 * 1024);

    let storage = LocalStorage::new(&config.upload_dir, &config.processed_dir)
        .await
        .expect("Failed to create local storage");
    let pipeline = UploadPipeline::new(
        MediaValidator::images(config.max_file_size_bytes),
        storage,
        renderer,
    );
    let state = Arc::new(AppState::new(config.clone(), pipeline));
    into_test_app(config, state, temp_dir)
}

fn into_test_app(config: Config, state: Arc<AppState>, temp_dir: TempDir) -> TestApp {
    let router = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        config,
        _temp_dir: temp_dir,
    }
}

/// Number of entries in `dir`.
pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.count())
        .unwrap_or(0)
}
