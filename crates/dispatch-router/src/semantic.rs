//! The pluggable semantic matcher.
//!
//! An external classifier process: it receives the request text on stdin
//! and must print one JSON object to stdout within the timeout:
//!
//! ```json
//! {"agent": "haiku-general", "confidence": 0.82, "reason": "small edit"}
//! ```
//!
//! `agent` may be `null` to signal "no match". Any other outcome —
//! spawn failure, timeout, non-zero exit, malformed JSON — is reported to
//! the router, which falls back to the keyword matcher and records the
//! cause in the decision reason. This is the single place where
//! non-determinism enters the routing pipeline, and it is contained here.

use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::warn;

/// Environment variable enabling the semantic matcher.
///
/// Its value is the classifier command line (shell-style quoting via
/// `shlex`). Bare truthy values (`1`, `true`, `yes`) enable the stage
/// without naming a command, which degrades to the keyword matcher with
/// a one-shot install hint.
pub const SEMANTIC_MATCHER_ENV: &str = "ROUTER_USE_LLM";

/// Poll interval while waiting for the classifier to exit.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// The classifier's verdict.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SemanticResponse {
    /// Matched agent id, or `null` for no match.
    pub agent: Option<String>,
    /// Confidence in `[0, 1]`; out-of-range values are clamped.
    pub confidence: f64,
    /// Classifier's own explanation (logged, not surfaced).
    #[serde(default)]
    pub reason: String,
}

/// Why a semantic match attempt produced nothing.
#[derive(Debug)]
pub(crate) enum SemanticFailure {
    /// The classifier could not be spawned.
    Spawn(std::io::Error),
    /// The classifier outlived its timeout and was killed.
    Timeout(Duration),
    /// The classifier exited non-zero.
    NonZeroExit(Option<i32>),
    /// stdout was not the contracted JSON object.
    Malformed(String),
}

impl std::fmt::Display for SemanticFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(e) => write!(f, "semantic matcher failed to start: {e}"),
            Self::Timeout(t) => write!(f, "semantic matcher timed out after {}s", t.as_secs()),
            Self::NonZeroExit(Some(code)) => {
                write!(f, "semantic matcher exited with status {code}")
            },
            Self::NonZeroExit(None) => write!(f, "semantic matcher was killed"),
            Self::Malformed(e) => write!(f, "semantic matcher returned malformed JSON: {e}"),
        }
    }
}

/// An external classifier command with a bounded timeout.
#[derive(Debug, Clone)]
pub struct SemanticMatcher {
    argv: Vec<String>,
    timeout: Duration,
}

impl SemanticMatcher {
    /// Default confidence threshold for direct routing.
    pub const DEFAULT_THRESHOLD: f64 = 0.7;

    /// Default classifier timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Build from [`SEMANTIC_MATCHER_ENV`].
    ///
    /// `None` when the variable is unset, empty, or carries a bare truthy
    /// value with no command to run (the latter logs an install hint).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let raw = std::env::var(SEMANTIC_MATCHER_ENV).ok()?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if matches!(trimmed, "1" | "true" | "yes" | "on") {
            warn!(
                "{SEMANTIC_MATCHER_ENV} is set but names no classifier command; \
                 set it to the command line of a matcher (e.g. a small script \
                 printing {{\"agent\", \"confidence\", \"reason\"}}) to enable \
                 semantic matching"
            );
            return None;
        }
        let argv = shlex::split(trimmed)?;
        if argv.is_empty() {
            return None;
        }
        Some(Self {
            argv,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    /// Build from an explicit command line (useful for testing).
    #[must_use]
    pub fn from_argv(argv: Vec<String>, timeout: Duration) -> Self {
        Self { argv, timeout }
    }

    /// Run the classifier on `request`.
    pub(crate) fn match_request(&self, request: &str) -> Result<SemanticResponse, SemanticFailure> {
        let mut child = Command::new(&self.argv[0])
            .args(&self.argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(SemanticFailure::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            // A classifier that exits without reading stdin breaks the
            // pipe; that is its prerogative, not an error here.
            let _ = stdin.write_all(request.as_bytes());
        }

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(SemanticFailure::Timeout(self.timeout));
                    }
                    std::thread::sleep(POLL_INTERVAL);
                },
                Err(e) => {
                    let _ = child.kill();
                    return Err(SemanticFailure::Spawn(e));
                },
            }
        };

        let mut stdout = String::new();
        if let Some(mut out) = child.stdout.take() {
            let _ = out.read_to_string(&mut stdout);
        }
        if !status.success() {
            return Err(SemanticFailure::NonZeroExit(status.code()));
        }

        let mut response: SemanticResponse = serde_json::from_str(stdout.trim())
            .map_err(|e| SemanticFailure::Malformed(e.to_string()))?;
        response.confidence = response.confidence.clamp(0.0, 1.0);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> SemanticMatcher {
        SemanticMatcher::from_argv(
            vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            Duration::from_secs(2),
        )
    }

    #[test]
    fn test_successful_match() {
        let matcher = sh(r#"cat >/dev/null; echo '{"agent":"haiku-general","confidence":0.9,"reason":"small edit"}'"#);
        let response = matcher.match_request("fix typo").unwrap();
        assert_eq!(response.agent.as_deref(), Some("haiku-general"));
        assert!((response.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_null_agent_is_no_match() {
        let matcher = sh(r#"cat >/dev/null; echo '{"agent":null,"confidence":0.0,"reason":"nothing fits"}'"#);
        let response = matcher.match_request("???").unwrap();
        assert!(response.agent.is_none());
    }

    #[test]
    fn test_confidence_clamped() {
        let matcher = sh(r#"cat >/dev/null; echo '{"agent":"a","confidence":3.5}'"#);
        let response = matcher.match_request("x").unwrap();
        assert!((response.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_zero_exit_fails() {
        let matcher = sh("cat >/dev/null; exit 3");
        let err = matcher.match_request("x").unwrap_err();
        assert!(matches!(err, SemanticFailure::NonZeroExit(Some(3))));
    }

    #[test]
    fn test_malformed_json_fails() {
        let matcher = sh("cat >/dev/null; echo not-json");
        let err = matcher.match_request("x").unwrap_err();
        assert!(matches!(err, SemanticFailure::Malformed(_)));
    }

    #[test]
    fn test_timeout_kills_classifier() {
        let matcher = SemanticMatcher::from_argv(
            vec!["sh".to_string(), "-c".to_string(), "sleep 30".to_string()],
            Duration::from_millis(200),
        );
        let start = Instant::now();
        let err = matcher.match_request("x").unwrap_err();
        assert!(matches!(err, SemanticFailure::Timeout(_)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_missing_binary_fails_to_spawn() {
        let matcher = SemanticMatcher::from_argv(
            vec!["/nonexistent/classifier".to_string()],
            Duration::from_secs(1),
        );
        assert!(matches!(
            matcher.match_request("x").unwrap_err(),
            SemanticFailure::Spawn(_)
        ));
    }
}
