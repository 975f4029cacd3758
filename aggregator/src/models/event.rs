//! Event and insight shapes as broadcast to subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mirage_protocol::Event;

/// An ingested event plus its arrival time. The timestamp is assigned
/// here, never taken from the sender.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastEvent {
    #[serde(flatten)]
    pub event: Event,
    pub timestamp: DateTime<Utc>,
}

impl BroadcastEvent {
    pub fn now(event: Event) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }
}

/// Result of the asynchronous deep analysis of one event.
#[derive(Debug, Clone, Serialize)]
pub struct AiInsight {
    pub src_ip: String,
    pub analysis: String,
    pub timestamp: DateTime<Utc>,
}
