//! Configuration module
//!
//! Configuration is read once at startup from the environment (with `.env`
//! support) and passed explicitly into the pipeline and the HTTP layer.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::BYTES_PER_MB;

// Defaults
const SERVER_PORT: u16 = 5000;
const MAX_FILE_SIZE_MB: usize = 5;
const JPEG_QUALITY: u8 = 80;
const TRANSFORM_TIMEOUT_SECS: u64 = 30;
const HTTP_CONCURRENCY_LIMIT: usize = 1024;
const UPLOAD_DIR: &str = "uploads";
const PROCESSED_DIR: &str = "processed";

/// Output format of the tracing subscriber
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub upload_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub max_file_size_bytes: usize,
    pub jpeg_quality: u8,
    /// Per-task timeout in seconds; 0 disables it
    pub transform_timeout_secs: u64,
    pub trust_forwarded_proto: bool,
    /// Requests in flight across the whole router
    pub http_concurrency_limit: usize,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            upload_dir: PathBuf::from(UPLOAD_DIR),
            processed_dir: PathBuf::from(PROCESSED_DIR),
            max_file_size_bytes: MAX_FILE_SIZE_MB * BYTES_PER_MB,
            jpeg_quality: JPEG_QUALITY,
            transform_timeout_secs: TRANSFORM_TIMEOUT_SECS,
            trust_forwarded_proto: false,
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let server_port = match env::var("PORT") {
            Ok(port) => port
                .trim()
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("PORT must be a valid port number: {}", e))?,
            Err(_) => SERVER_PORT,
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let jpeg_quality = env::var("JPEG_QUALITY")
            .unwrap_or_else(|_| JPEG_QUALITY.to_string())
            .parse::<u8>()
            .unwrap_or(JPEG_QUALITY);

        let transform_timeout_secs = env::var("TRANSFORM_TIMEOUT_SECS")
            .unwrap_or_else(|_| TRANSFORM_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .unwrap_or(TRANSFORM_TIMEOUT_SECS);

        let trust_forwarded_proto = env::var("TRUST_FORWARDED_PROTO")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let http_concurrency_limit = env::var("HTTP_CONCURRENCY_LIMIT")
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(HTTP_CONCURRENCY_LIMIT)
            .max(1);

        let config = Config {
            server_port,
            environment,
            cors_origins,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(UPLOAD_DIR)),
            processed_dir: env::var("PROCESSED_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(PROCESSED_DIR)),
            max_file_size_bytes: max_file_size_mb * BYTES_PER_MB,
            jpeg_quality,
            transform_timeout_secs,
            trust_forwarded_proto,
            http_concurrency_limit,
            log_format: LogFormat::parse(&env::var("LOG_FORMAT").unwrap_or_default()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(anyhow::anyhow!("JPEG_QUALITY must be between 1 and 100"));
        }

        if self.upload_dir == self.processed_dir {
            return Err(anyhow::anyhow!(
                "UPLOAD_DIR and PROCESSED_DIR must be different directories"
            ));
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            tracing::warn!("CORS_ORIGINS is '*' in production");
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Per-task timeout, `None` when disabled
    pub fn transform_timeout(&self) -> Option<Duration> {
        (self.transform_timeout_secs > 0).then(|| Duration::from_secs(self.transform_timeout_secs))
    }
}
