//! Wire types shared between the guard middleware and the aggregator.
//!
//! Field names are fixed by the external interfaces: the classification and
//! analysis services speak snake_case JSON, and event reports carry the same
//! shape the aggregator ingests.

use serde::{Deserialize, Deserializer, Serialize};

/// One inbound request, flattened for inspection by the classification
/// service. Built per request and discarded once a [`Decision`] is back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub src_ip: String,
    pub path: String,
    pub method: String,
    /// Combined inspection text: request body plus query string, so both
    /// GET query-string and POST body payloads are visible to the classifier.
    pub body: String,
}

/// Enforcement action recommended by the classification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    #[default]
    Pass,
    Deceive,
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Classifiers send either the enum name or its numeric tag; anything
        // unrecognized enforces as PASS.
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) if s.eq_ignore_ascii_case("deceive") => Action::Deceive,
            serde_json::Value::Number(n) if n.as_i64() == Some(1) => Action::Deceive,
            _ => Action::Pass,
        })
    }
}

/// Verdict returned by the classification service for one request.
///
/// Every field is optional on the wire: a minimal `{}` decodes to a benign
/// pass-through with no delay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub delay_ms: u64,
    /// Deceptive response body rendered when no honeypot target is set.
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub honeypot_host: String,
    #[serde(default)]
    pub honeypot_port: u16,
}

impl Decision {
    pub fn is_benign(&self) -> bool {
        self.label.is_empty() || self.label == "benign"
    }

    /// Redirect target when the decision routes the caller to a honeypot.
    /// A zero port means deception is served in place instead.
    pub fn honeypot_target(&self) -> Option<String> {
        if self.honeypot_port > 0 {
            Some(format!("http://{}:{}", self.honeypot_host, self.honeypot_port))
        } else {
            None
        }
    }
}

/// Notable traffic observation forwarded from a protected instance.
///
/// The aggregator stamps the arrival time itself; senders do not supply one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub src_ip: String,
    pub label: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_excerpt: Option<String>,
}

/// Request to the deep-analysis service for one non-benign event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub src_ip: String,
    pub label: String,
    /// Path and payload excerpt concatenated into one context blob.
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
}
