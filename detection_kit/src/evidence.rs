//! Evidence string helpers
//!
//! Evidence is human-readable and bounded: offending lists are capped and the
//! final string is clipped to [`MAX_EVIDENCE_CHARS`].

/// Maximum number of list items shown in evidence
pub const MAX_EVIDENCE_ITEMS: usize = 5;

/// Maximum evidence length in characters
pub const MAX_EVIDENCE_CHARS: usize = 512;

/// Join at most `max_items` entries, noting how many were left out
///
/// `["a", "b", "c"]` with `max_items = 2` becomes `a, b (+1 more)`.
pub fn summarize_list<S: AsRef<str>>(items: &[S], max_items: usize) -> String {
    let shown: Vec<&str> = items.iter().take(max_items).map(AsRef::as_ref).collect();
    let mut summary = shown.join(", ");

    let hidden = items.len().saturating_sub(max_items);
    if hidden > 0 {
        summary.push_str(&format!(" (+{} more)", hidden));
    }
    summary
}

/// Clip evidence to [`MAX_EVIDENCE_CHARS`] on a char boundary
pub fn clip(evidence: String) -> String {
    if evidence.chars().count() <= MAX_EVIDENCE_CHARS {
        return evidence;
    }
    let mut clipped: String = evidence.chars().take(MAX_EVIDENCE_CHARS - 3).collect();
    clipped.push_str("...");
    clipped
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

    #[test]
    fn test_summarize_list_within_limit() {
        let items = ["cydia", "sileo"];
        assert_eq!(summarize_list(&items, 5), "cydia, sileo");
    }

    #[test]
    fn test_summarize_list_over_limit() {
        let items = ["a", "b", "c", "d"];
        assert_eq!(summarize_list(&items, 3), "a, b, c (+1 more)");
    }

    #[test]
    fn test_summarize_empty_list() {
        let items: [&str; 0] = [];
        assert_eq!(summarize_list(&items, 3), "");
    }

    #[test]
    fn test_clip_long_evidence() {
        let long = "é".repeat(MAX_EVIDENCE_CHARS + 10);
        let clipped = clip(long);
        assert_eq!(clipped.chars().count(), MAX_EVIDENCE_CHARS);
        assert!(clipped.ends_with("..."));
    }

    #[test]
    fn test_clip_short_evidence_unchanged() {
        assert_eq!(clip("No suspicious files found".to_string()), "No suspicious files found");
    }
}
