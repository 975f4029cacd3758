//! Trivy scan report shapes and severity ranking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How many findings the dashboard widget shows.
pub const SUMMARY_LIMIT: usize = 5;

/// Fixed subject label attached to every summary broadcast.
pub const SCAN_SUBJECT: &str = "protected-app:latest";

/// Incoming scan report. Every level may be missing and defaults empty;
/// a bare `{}` is a valid zero-finding scan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrivyReport {
    #[serde(rename = "Results", default)]
    pub results: Vec<TrivyResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrivyResult {
    #[serde(rename = "Vulnerabilities", default)]
    pub vulnerabilities: Vec<TrivyVulnerability>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrivyVulnerability {
    #[serde(rename = "VulnerabilityID", default)]
    pub vulnerability_id: String,
    #[serde(rename = "PkgName", default)]
    pub pkg_name: String,
    #[serde(rename = "Severity", default)]
    pub severity: String,
    #[serde(rename = "Title", default)]
    pub title: String,
}

/// One retained finding, projected for the dashboard.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VulnSummaryEntry {
    pub id: String,
    pub pkg: String,
    pub severity: String,
    pub title: String,
}

/// Broadcast payload for one processed scan.
#[derive(Debug, Clone, Serialize)]
pub struct VulnerabilitySummary {
    pub image: &'static str,
    pub scan_time: DateTime<Utc>,
    pub vulnerabilities: Vec<VulnSummaryEntry>,
}

impl VulnerabilitySummary {
    pub fn now(vulnerabilities: Vec<VulnSummaryEntry>) -> Self {
        Self {
            image: SCAN_SUBJECT,
            scan_time: Utc::now(),
            vulnerabilities,
        }
    }
}

/// Severity rank. Unrecognized tags sort below LOW rather than crashing:
/// a scanner emitting a new tag must still produce a summary.
fn severity_rank(severity: &str) -> i8 {
    match severity {
        "CRITICAL" => 3,
        "HIGH" => 2,
        "MEDIUM" => 1,
        "LOW" => 0,
        _ => -1,
    }
}

impl TrivyReport {
    pub fn finding_count(&self) -> usize {
        self.results.iter().map(|r| r.vulnerabilities.len()).sum()
    }

    /// Top findings across all targets: descending severity, stable on
    /// ties, truncated to `limit`.
    pub fn top_findings(&self, limit: usize) -> Vec<VulnSummaryEntry> {
        let mut findings: Vec<&TrivyVulnerability> = self
            .results
            .iter()
            .flat_map(|r| &r.vulnerabilities)
            .collect();

        findings.sort_by_key(|v| std::cmp::Reverse(severity_rank(&v.severity)));

        findings
            .into_iter()
            .take(limit)
            .map(|v| VulnSummaryEntry {
                id: v.vulnerability_id.clone(),
                pkg: v.pkg_name.clone(),
                severity: v.severity.clone(),
                title: v.title.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(id: &str, severity: &str) -> TrivyVulnerability {
        TrivyVulnerability {
            vulnerability_id: id.to_string(),
            pkg_name: "openssl".to_string(),
            severity: severity.to_string(),
            title: format!("{} in openssl", id),
        }
    }

    fn report(severities: &[(&str, &str)]) -> TrivyReport {
        TrivyReport {
            results: vec![TrivyResult {
                vulnerabilities: severities
                    .iter()
                    .map(|(id, sev)| finding(id, sev))
                    .collect(),
            }],
        }
    }

    #[test]
    fn top_findings_ranks_by_severity_and_keeps_encounter_order() {
        let report = report(&[
            ("CVE-1", "LOW"),
            ("CVE-2", "CRITICAL"),
            ("CVE-3", "HIGH"),
            ("CVE-4", "HIGH"),
            ("CVE-5", "MEDIUM"),
            ("CVE-6", "CRITICAL"),
            ("CVE-7", "LOW"),
        ]);

        let top = report.top_findings(SUMMARY_LIMIT);
        let order: Vec<(&str, &str)> = top
            .iter()
            .map(|v| (v.id.as_str(), v.severity.as_str()))
            .collect();

        assert_eq!(
            order,
            vec![
                ("CVE-2", "CRITICAL"),
                ("CVE-6", "CRITICAL"),
                ("CVE-3", "HIGH"),
                ("CVE-4", "HIGH"),
                ("CVE-5", "MEDIUM"),
            ]
        );
    }

    #[test]
    fn findings_are_flattened_across_targets() {
        let report = TrivyReport {
            results: vec![
                TrivyResult {
                    vulnerabilities: vec![finding("CVE-A", "LOW")],
                },
                TrivyResult {
                    vulnerabilities: vec![finding("CVE-B", "CRITICAL")],
                },
            ],
        };

        let top = report.top_findings(SUMMARY_LIMIT);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, "CVE-B");
        assert_eq!(report.finding_count(), 2);
    }

    #[test]
    fn unrecognized_severity_ranks_below_low() {
        let report = report(&[("CVE-X", "UNKNOWN"), ("CVE-Y", "LOW")]);

        let top = report.top_findings(SUMMARY_LIMIT);
        assert_eq!(top[0].id, "CVE-Y");
        assert_eq!(top[1].id, "CVE-X");
    }

    #[test]
    fn missing_results_decodes_to_zero_findings() {
        let report: TrivyReport = serde_json::from_str("{}").unwrap();
        assert_eq!(report.finding_count(), 0);
        assert!(report.top_findings(SUMMARY_LIMIT).is_empty());
    }

    #[test]
    fn fewer_findings_than_limit_are_all_retained() {
        let report = report(&[("CVE-1", "MEDIUM"), ("CVE-2", "HIGH")]);
        let top = report.top_findings(SUMMARY_LIMIT);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, "CVE-2");
    }
}
