//! Asynchronous deep-analysis dispatch.
//!
//! Non-benign events are handed to the analysis service on a detached task,
//! strictly after the raw event is broadcast and independent of the response
//! already sent to the reporting instance. A failed call is logged and
//! dropped; nothing propagates back.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use mirage_protocol::{AnalyzeRequest, AnalyzeResponse, Event};

use crate::models::AiInsight;
use crate::publish::{Publisher, KIND_AI_INSIGHT};

/// Client for the analysis service's `/analyze` endpoint.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    url: String,
    http: reqwest::Client,
}

impl AnalysisClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            url: format!("{}/analyze", base_url.trim_end_matches('/')),
            http,
        }
    }

    pub async fn analyze(&self, request: &AnalyzeRequest) -> anyhow::Result<AnalyzeResponse> {
        let response = self.http.post(&self.url).json(request).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("analysis service responded {}", response.status());
        }

        Ok(response.json().await?)
    }
}

/// Fire-and-forget: analyze one event and broadcast the insight when it
/// arrives.
pub fn spawn_analysis(client: AnalysisClient, publisher: Arc<dyn Publisher>, event: Event) {
    tokio::spawn(async move {
        let request = AnalyzeRequest {
            src_ip: event.src_ip.clone(),
            label: event.label.clone(),
            body: format!(
                "{} {}",
                event.path,
                event.payload_excerpt.as_deref().unwrap_or("")
            ),
        };

        match client.analyze(&request).await {
            Ok(response) => {
                tracing::info!(src_ip = %event.src_ip, "analysis insight generated");
                let insight = AiInsight {
                    src_ip: event.src_ip,
                    analysis: response.analysis,
                    timestamp: Utc::now(),
                };
                match serde_json::to_value(&insight) {
                    Ok(data) => publisher.publish(KIND_AI_INSIGHT, data),
                    Err(e) => tracing::warn!(error = %e, "insight serialization failed"),
                }
            }
            Err(e) => {
                tracing::warn!(src_ip = %event.src_ip, error = %e, "analysis failed");
            }
        }
    });
}
