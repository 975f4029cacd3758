//! Event reporting to the aggregator
//!
//! Non-benign verdicts are forwarded to the aggregation service so the
//! dashboard sees this instance's traffic. Reports are fire-and-forget:
//! a failed report is logged and dropped, it never touches the request
//! that triggered it.

use std::time::Duration;

use mirage_protocol::Event;

const REPORT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the aggregator's `/v1/events` ingest endpoint.
#[derive(Debug, Clone)]
pub struct EventReporter {
    url: String,
    token: String,
    http: reqwest::Client,
}

impl EventReporter {
    pub fn new(aggregator_url: &str, token: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REPORT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            url: format!("{}/v1/events", aggregator_url.trim_end_matches('/')),
            token: token.to_string(),
            http,
        }
    }

    /// Dispatch one event on a detached task and return immediately.
    pub fn dispatch(&self, event: Event) {
        let reporter = self.clone();
        tokio::spawn(async move {
            if let Err(e) = reporter.send(&event).await {
                tracing::warn!(src_ip = %event.src_ip, error = %e, "event report failed");
            }
        });
    }

    async fn send(&self, event: &Event) -> anyhow::Result<()> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(event)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("aggregator responded {}", response.status());
        }
        Ok(())
    }
}
