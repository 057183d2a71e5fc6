//! Console output formatting
//!
//! Provides formatted console output for scan reports and stored summaries.

use chrono::{DateTime, Utc};
use detection_kit::catalog::Severity;
use detection_kit::store::ScanSummary;
use detection_kit::{DetectionReport, DetectionResult};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Maximum evidence characters per console line
const EVIDENCE_WIDTH: usize = 70;

/// Print a scan report to console in a human-readable format
pub fn print_report(report: &DetectionReport) {
    println!();
    println!("╔═══════════════════════════════════════════════════════════════════════════════╗");
    println!("║                           DEVICE INTEGRITY SCAN                               ║");
    println!("╚═══════════════════════════════════════════════════════════════════════════════╝");
    println!();
    println!("  Device:      {}", report.device_model());
    println!("  Platform:    {}", report.platform_version());
    println!("  Timestamp:   {}", report.timestamp().to_rfc3339());
    println!();

    for (index, result) in report.results().iter().enumerate() {
        print_check_result(index + 1, report.total_checks(), result);
    }

    print_summary_table(report);
}

/// Print a single technique result
fn print_check_result(num: usize, total: usize, result: &DetectionResult) {
    let (icon, text, color) = if result.detected() {
        ("✗", "DETECTED", RED)
    } else {
        ("✓", "SECURE", GREEN)
    };

    println!("┌───────────────────────────────────────────────────────────────────────────────┐");
    println!("│ Check {}/{}: {}", num, total, result.technique());
    println!("├───────────────────────────────────────────────────────────────────────────────┤");
    println!("│ Status:      {}{} {}{}", color, icon, text, RESET);
    println!("│ Severity:    {}", result.severity());
    println!(
        "│ Controls:    {} | {}",
        result.mstg_reference(),
        result.mitre_reference()
    );
    println!("│ Evidence:    {}", truncate(result.evidence(), EVIDENCE_WIDTH));
    println!("└───────────────────────────────────────────────────────────────────────────────┘");
    println!();
}

/// Print summary table
fn print_summary_table(report: &DetectionReport) {
    let (verdict, color) = verdict_label(report.is_jailbroken());

    println!("╔═══════════════════════════════════════════════════════════════════════════════╗");
    println!("║                                 SUMMARY                                       ║");
    println!("╠═══════════════════════════════════════════════════════════════════════════════╣");
    println!("║                                                                               ║");
    println!("║   Verdict:        {}{:<11}{}                                                 ║", color, verdict, RESET);
    println!(
        "║   Total Checks:   {:3}                                                         ║",
        report.total_checks()
    );
    println!(
        "║   Threats:        {:3}                                                         ║",
        report.threats_detected()
    );
    println!("║                                                                               ║");
    println!("╠═══════════════════════════════════════════════════════════════════════════════╣");
    println!("║                                                                               ║");
    println!("║   By Severity:           Secure  Detected  Total                              ║");
    println!("║   ─────────────────────────────────────────                                   ║");

    for severity in [Severity::Critical, Severity::High, Severity::Medium] {
        let (secure, detected) = severity_counts(report, severity);
        if secure + detected > 0 {
            println!(
                "║   {:<22} {:3}     {:3}       {:3}                                  ║",
                severity_title(severity),
                secure,
                detected,
                secure + detected
            );
        }
    }

    println!("║                                                                               ║");
    println!("╚═══════════════════════════════════════════════════════════════════════════════╝");
    println!();
}

/// Print a stored summary for the `status` command
pub fn print_status(summary: &ScanSummary, stale: bool, now: DateTime<Utc>) {
    let (verdict, color) = verdict_label(summary.is_jailbroken);
    let age = now.signed_duration_since(summary.last_scan);

    println!();
    println!("  Verdict:     {}{}{}", color, verdict, RESET);
    println!("  Threats:     {}", summary.threats_detected);
    println!(
        "  Last scan:   {} ({} min ago)",
        summary.last_scan.to_rfc3339(),
        age.num_minutes()
    );
    if stale {
        println!("  {}Summary is stale - run a new scan{}", YELLOW, RESET);
    }
    println!();
}

fn verdict_label(is_jailbroken: bool) -> (&'static str, &'static str) {
    if is_jailbroken {
        ("COMPROMISED", RED)
    } else {
        ("SECURE", GREEN)
    }
}

/// Count (secure, detected) results of one severity
fn severity_counts(report: &DetectionReport, severity: Severity) -> (usize, usize) {
    report
        .results()
        .iter()
        .filter(|r| r.severity() == severity)
        .fold((0, 0), |(secure, detected), r| {
            if r.detected() {
                (secure, detected + 1)
            } else {
                (secure + 1, detected)
            }
        })
}

fn severity_title(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "Critical",
        Severity::High => "High",
        Severity::Medium => "Medium",
    }
}

/// Shorten text to `width` characters on a char boundary
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
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
    fn test_severity_counts() {
        let report = compromised_report();
        // FileSystem and EnvironmentVariables are both HIGH
        assert_eq!(severity_counts(&report, Severity::High), (1, 2));
        assert_eq!(severity_counts(&report, Severity::Critical), (3, 0));
        assert_eq!(severity_counts(&report, Severity::Medium), (2, 0));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 70), "short");
        let long = "ü".repeat(100);
        let cut = truncate(&long, 70);
        assert_eq!(cut.chars().count(), 70);
        assert!(cut.ends_with("..."));
    }
}
