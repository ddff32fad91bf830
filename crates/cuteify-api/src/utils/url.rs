//! Absolute URL construction from the inbound request.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::state::AppState;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Scheme and host the client used to reach this server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// Resolve the origin from request parts.
    ///
    /// Host comes from the `Host` header, then the request URI authority. The
    /// scheme is `http` unless `trust_forwarded_proto` is set and the proxy sent
    /// `X-Forwarded-Proto: http|https`.
    pub fn from_parts(parts: &Parts, trust_forwarded_proto: bool) -> Self {
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        let forwarded = trust_forwarded_proto
            .then(|| parts.headers.get(FORWARDED_PROTO))
            .flatten()
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_lowercase())
            .filter(|v| v == "http" || v == "https");

        let scheme = forwarded
            .or_else(|| parts.uri.scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string());

        Self { scheme, host }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}://{}{}", self.scheme, self.host, path)
    }
}

impl FromRequestParts<Arc<AppState>> for RequestOrigin {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts, state.config.trust_forwarded_proto))
    }
}

/// Prefix each public path with the request origin, preserving order.
pub fn resolve_urls(origin: &RequestOrigin, paths: &[String]) -> Vec<String> {
    paths.iter().map(|p| origin.url_for(p)).collect()
}
