//! Guard configuration

use std::env;

/// Middleware configuration, loaded from the protected application's
/// environment.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Base URL of the classification service
    pub classifier_url: String,

    /// Timeout for one classification call, in milliseconds. A timeout is
    /// treated like any other classifier error: the request passes through.
    pub classify_timeout_ms: u64,

    /// Largest request body the middleware will buffer for inspection
    pub max_body_bytes: usize,

    /// Aggregator base URL for event reporting (reporting disabled if unset)
    pub aggregator_url: Option<String>,

    /// Bearer token for the aggregator's ingest endpoint
    pub aggregator_token: Option<String>,
}

impl GuardConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            classifier_url: env::var("MIRAGE_CLASSIFIER_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8500".to_string()),

            classify_timeout_ms: env::var("MIRAGE_CLASSIFY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),

            max_body_bytes: env::var("MIRAGE_MAX_BODY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256 * 1024),

            aggregator_url: env::var("MIRAGE_AGGREGATOR_URL").ok(),

            aggregator_token: env::var("MIRAGE_AGGREGATOR_TOKEN").ok(),
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            classifier_url: "http://127.0.0.1:8500".to_string(),
            classify_timeout_ms: 500,
            max_body_bytes: 256 * 1024,
            aggregator_url: None,
            aggregator_token: None,
        }
    }
}
