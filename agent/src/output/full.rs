//! Full result builder
//!
//! The full output is the report export document, evidence included.

use detection_kit::DetectionReport;

use super::OutputError;

/// Build the full report JSON
pub fn build_full_result(report: &DetectionReport) -> Result<String, OutputError> {
    Ok(report.to_json()?)
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
    fn test_full_result_imports_back() {
        let report = compromised_report();
        let json = build_full_result(&report).unwrap();
        let imported = DetectionReport::from_json(&json).unwrap();
        assert_eq!(imported, report);
    }
}
