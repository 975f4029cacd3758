//! Configuration module

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Shared bearer token expected from protected instances
    pub ingest_token: String,

    /// Base URL of the deep-analysis service
    pub analysis_url: String,

    /// Timeout for one analysis call, in milliseconds
    pub analysis_timeout_ms: u64,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),

            ingest_token: env::var("INGEST_TOKEN")
                .unwrap_or_else(|_| "dev-ingest-token-change-in-production".to_string()),

            analysis_url: env::var("AI_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:5001".to_string()),

            analysis_timeout_ms: env::var("ANALYSIS_TIMEOUT_MS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(10_000),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
