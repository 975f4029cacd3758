//! Broadcast fan-out to live dashboard subscribers.
//!
//! One process-wide channel carries every frame; handlers publish through
//! the [`Publisher`] capability and the WebSocket route subscribes. Sends
//! never block: a slow subscriber lags and skips, it cannot back-pressure
//! the ingest path.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

pub const DEFAULT_CAPACITY: usize = 256;

// Frame kinds, matching what dashboard clients subscribe to.
pub const KIND_NEW_EVENT: &str = "new_event";
pub const KIND_AI_INSIGHT: &str = "ai_insight";
pub const KIND_TRIVY_UPDATE: &str = "trivy_update";

/// One frame pushed to every connected subscriber.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub kind: &'static str,
    pub data: Value,
}

/// Capability handlers publish through. Injected rather than global so the
/// ingest and report paths can be exercised against a test channel.
pub trait Publisher: Send + Sync {
    /// Push one frame to all live subscribers without blocking.
    fn publish(&self, kind: &'static str, data: Value);

    /// Open a subscription carrying every frame published from now on.
    fn subscribe(&self) -> broadcast::Receiver<Frame>;
}

/// Process-wide publisher over a tokio broadcast channel.
pub struct BroadcastPublisher {
    tx: broadcast::Sender<Frame>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

impl Publisher for BroadcastPublisher {
    fn publish(&self, kind: &'static str, data: Value) {
        // Send only fails when no subscriber is connected; that is not an
        // error for the ingest path.
        let _ = self.tx.send(Frame { kind, data });
    }

    fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.tx.subscribe()
    }
}
