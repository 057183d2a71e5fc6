//! Summary builder
//!
//! Builds the persisted-summary projection plus the check count.

use detection_kit::store::ScanSummary;
use detection_kit::DetectionReport;
use serde::Serialize;

/// Minimal verdict output
#[derive(Debug, Serialize)]
pub struct SummaryOutput {
    #[serde(flatten)]
    pub summary: ScanSummary,
    pub total_checks: usize,
}

/// Build summary output from a report
pub fn build_summary(report: &DetectionReport) -> SummaryOutput {
    SummaryOutput {
        summary: ScanSummary::from_report(report),
        total_checks: report.total_checks(),
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::compromised_report;

    #[test]
    fn test_summary_fields() {
        let value = serde_json::to_value(build_summary(&compromised_report())).unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["is_jailbroken", "last_scan", "threats_detected", "total_checks"]
        );
        assert_eq!(value["total_checks"], 8);
    }
}
