//! Event ingestion handler
//!
//! One endpoint per event. The raw event is broadcast before anything else
//! happens and the caller is acknowledged immediately; deep analysis runs
//! on its own task afterwards, so subscribers always see the raw event in
//! near real time and never wait on the analysis service.

use axum::{extract::State, Json};

use mirage_protocol::Event;

use crate::analysis;
use crate::models::{Ack, BroadcastEvent};
use crate::publish::KIND_NEW_EVENT;
use crate::{AppResult, AppState};

/// Ingest one event from a protected instance
pub async fn ingest(
    State(state): State<AppState>,
    Json(event): Json<Event>,
) -> AppResult<Json<Ack>> {
    tracing::info!(src_ip = %event.src_ip, label = %event.label, "event received");

    // 1. Broadcast the raw event immediately, unconditionally.
    let broadcast = BroadcastEvent::now(event.clone());
    state
        .publisher
        .publish(KIND_NEW_EVENT, serde_json::to_value(&broadcast)?);

    // 2. Non-benign events get deep analysis, off this request's path.
    if event.label != "benign" {
        analysis::spawn_analysis(state.analysis.clone(), state.publisher.clone(), event);
    }

    Ok(Json(Ack::received()))
}
