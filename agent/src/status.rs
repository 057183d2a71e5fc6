//! Status command
//!
//! Reads the summary recorded by the last scan without scanning again.

use chrono::{DateTime, Duration, Utc};
use detection_kit::store::{StoreError, SummaryStore};

use crate::config::{EXIT_COMPROMISED, EXIT_ERROR, EXIT_SECURE};
use crate::output;

/// Outcome of a status check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Secure,
    Compromised,
    /// The last summary is older than the allowed age
    Stale,
    /// No scan has been recorded
    Missing,
}

impl StatusOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            StatusOutcome::Secure => EXIT_SECURE,
            StatusOutcome::Compromised => EXIT_COMPROMISED,
            StatusOutcome::Stale | StatusOutcome::Missing => EXIT_ERROR,
        }
    }
}

/// Evaluate the stored summary at `now`
pub fn check_status(
    store: &dyn SummaryStore,
    max_age: Duration,
    now: DateTime<Utc>,
    quiet: bool,
) -> Result<StatusOutcome, StoreError> {
    let summary = match store.load()? {
        Some(summary) => summary,
        None => {
            if !quiet {
                println!("No scan recorded yet. Run `integrity_agent scan` first.");
            }
            return Ok(StatusOutcome::Missing);
        }
    };

    let stale = summary.is_stale(max_age, now);
    if !quiet {
        output::print_status(&summary, stale, now);
    }

    let outcome = if stale {
        log::warn!(
            "Last scan at {} is older than {} minutes",
            summary.last_scan.to_rfc3339(),
            max_age.num_minutes()
        );
        StatusOutcome::Stale
    } else if summary.is_jailbroken {
        StatusOutcome::Compromised
    } else {
        StatusOutcome::Secure
    };
    Ok(outcome)
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
    use detection_kit::store::{MemoryStore, ScanSummary};

    fn store_with(is_jailbroken: bool, threats_detected: usize, last_scan: DateTime<Utc>) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .save(&ScanSummary {
                is_jailbroken,
                threats_detected,
                last_scan,
            })
            .unwrap();
        store
    }

    #[test]
    fn test_missing_summary() {
        let outcome =
            check_status(&MemoryStore::new(), Duration::minutes(60), Utc::now(), true).unwrap();
        assert_eq!(outcome, StatusOutcome::Missing);
        assert_eq!(outcome.exit_code(), EXIT_ERROR);
    }

    #[test]
    fn test_fresh_summaries() {
        let now = Utc::now();
        let secure = store_with(false, 0, now - Duration::minutes(5));
        assert_eq!(
            check_status(&secure, Duration::minutes(60), now, true).unwrap(),
            StatusOutcome::Secure
        );

        let compromised = store_with(true, 3, now - Duration::minutes(5));
        let outcome = check_status(&compromised, Duration::minutes(60), now, true).unwrap();
        assert_eq!(outcome, StatusOutcome::Compromised);
        assert_eq!(outcome.exit_code(), EXIT_COMPROMISED);
    }

    #[test]
    fn test_stale_summary() {
        let now = Utc::now();
        let store = store_with(false, 0, now - Duration::minutes(90));
        assert_eq!(
            check_status(&store, Duration::minutes(60), now, true).unwrap(),
            StatusOutcome::Stale
        );
    }
}
