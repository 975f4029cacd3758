//! Data shapes owned by the aggregator

pub mod event;
pub mod vuln;

pub use event::{AiInsight, BroadcastEvent};
pub use vuln::{TrivyReport, VulnerabilitySummary};

use serde::Serialize;

/// Uniform ingest acknowledgment.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub status: &'static str,
}

impl Ack {
    pub fn received() -> Self {
        Self { status: "received" }
    }
}
