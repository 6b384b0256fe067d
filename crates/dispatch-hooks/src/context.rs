//! Context threshold monitoring.
//!
//! Estimates how much of the host's context window the conversation has
//! consumed and warns once per session when it crosses the threshold.
//! The estimate is deliberately crude — one thousand tokens per observed
//! transcript turn — because the transcript format is the host's
//! business and an order-of-magnitude signal is all the warning needs.

use std::path::Path;

use tracing::debug;

/// Assumed tokens consumed per transcript turn.
pub const TOKENS_PER_TURN: u64 = 1_000;

/// Assumed size of the host's context window, in tokens.
pub const CONTEXT_WINDOW_TOKENS: u64 = 200_000;

/// Fraction of the window at which the warning fires.
pub const WARN_FRACTION: f64 = 0.70;

/// Estimated tokens consumed, from the transcript at `path`.
///
/// Each non-empty line of the transcript counts as one turn. An
/// unreadable transcript estimates to zero: no data, no warning.
#[must_use]
pub(crate) fn estimate_tokens(path: &Path) -> u64 {
    let Ok(content) = std::fs::read_to_string(path) else {
        debug!(path = %path.display(), "transcript unreadable, skipping context estimate");
        return 0;
    };
    let turns = content.lines().filter(|l| !l.trim().is_empty()).count() as u64;
    turns.saturating_mul(TOKENS_PER_TURN)
}

/// Whether `estimated` tokens cross the warning threshold.
#[must_use]
pub(crate) fn over_threshold(estimated: u64) -> bool {
    #[allow(clippy::cast_precision_loss)]
    let fraction = estimated as f64 / CONTEXT_WINDOW_TOKENS as f64;
    fraction >= WARN_FRACTION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_counts_turns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.jsonl");
        std::fs::write(&path, "{\"a\":1}\n{\"b\":2}\n\n{\"c\":3}\n").unwrap();
        assert_eq!(estimate_tokens(&path), 3 * TOKENS_PER_TURN);
    }

    #[test]
    fn test_missing_transcript_is_zero() {
        assert_eq!(estimate_tokens(Path::new("/nonexistent/transcript")), 0);
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(!over_threshold(0));
        assert!(!over_threshold(139_000));
        assert!(over_threshold(140_000));
        assert!(over_threshold(CONTEXT_WINDOW_TOKENS));
    }
}
