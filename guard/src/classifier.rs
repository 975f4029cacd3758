//! Classification service client
//!
//! HTTP client for the external classification service. One client is built
//! per guard and cloned into every request's task; the underlying connection
//! pool is shared, and each call is stateless.

use std::time::Duration;

use mirage_protocol::{ClassifyRequest, Decision};

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// Connection failure or timeout - the two are deliberately
    /// indistinguishable, both fail open.
    #[error("network error: {0}")]
    Network(String),
    #[error("classifier responded {0}")]
    Server(u16),
    #[error("parse error: {0}")]
    Parse(String),
}

/// Client for the classification service's `/classify` endpoint.
#[derive(Debug, Clone)]
pub struct ClassifierClient {
    url: String,
    http: reqwest::Client,
}

impl ClassifierClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            url: format!("{}/classify", base_url.trim_end_matches('/')),
            http,
        }
    }

    /// Ask the classifier for a verdict on one request.
    pub async fn classify(&self, request: &ClassifyRequest) -> Result<Decision, ClassifyError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| ClassifyError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClassifyError::Server(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| ClassifyError::Parse(e.to_string()))
    }
}
