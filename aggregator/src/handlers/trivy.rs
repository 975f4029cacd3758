//! Vulnerability scan report handler
//!
//! Reduces one scan report to the top findings by severity and pushes the
//! summary to subscribers. The summary is transient, recomputed per report;
//! nothing accumulates between scans.

use axum::{extract::State, Json};

use crate::models::vuln::SUMMARY_LIMIT;
use crate::models::{Ack, TrivyReport, VulnerabilitySummary};
use crate::publish::KIND_TRIVY_UPDATE;
use crate::{AppResult, AppState};

/// Ingest one scan report
pub async fn ingest(
    State(state): State<AppState>,
    Json(report): Json<TrivyReport>,
) -> AppResult<Json<Ack>> {
    let top = report.top_findings(SUMMARY_LIMIT);
    tracing::info!(
        total = report.finding_count(),
        retained = top.len(),
        "scan report processed"
    );

    let summary = VulnerabilitySummary::now(top);
    state
        .publisher
        .publish(KIND_TRIVY_UPDATE, serde_json::to_value(&summary)?);

    Ok(Json(Ack::received()))
}
