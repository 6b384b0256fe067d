//! Hook stdin payloads.
//!
//! The host supplies one JSON object per invocation. Fields vary by
//! hook; everything is optional here so a hook can take what it needs
//! and ignore the rest, and a malformed payload degrades to an empty
//! one instead of failing the host.

use std::io::Read;

use serde::Deserialize;
use tracing::warn;

/// The host-supplied hook payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HookInput {
    /// Working directory of the host session.
    pub cwd: Option<String>,
    /// The submitted prompt (`prompt-submit`).
    pub prompt: Option<String>,
    /// Agent type being started/stopped (`agent-start`, `agent-stop`).
    pub agent_type: Option<String>,
    /// Host-assigned agent instance id.
    pub agent_id: Option<String>,
    /// Wall-clock duration of the agent run (`agent-stop`).
    pub duration_sec: Option<f64>,
    /// Free-text status of the agent run (`agent-stop`).
    pub status: Option<String>,
    /// Path to the host's transcript file (`prompt-submit`).
    pub transcript_path: Option<String>,
    /// Host session identifier.
    pub session_id: Option<String>,
    /// Tool about to be invoked (`pre-tool-use`).
    pub tool_name: Option<String>,
}

impl HookInput {
    /// Parse a payload from a JSON string.
    ///
    /// Malformed JSON logs a warning and reads as an empty payload.
    #[must_use]
    pub fn from_json(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(input) => input,
            Err(e) => {
                warn!(error = %e, "malformed hook payload, proceeding with empty input");
                Self::default()
            },
        }
    }

    /// Read and parse a payload from a reader (the hook's stdin).
    #[must_use]
    pub fn from_reader(reader: &mut impl Read) -> Self {
        let mut raw = String::new();
        if let Err(e) = reader.read_to_string(&mut raw) {
            warn!(error = %e, "unreadable hook stdin, proceeding with empty input");
            return Self::default();
        }
        if raw.trim().is_empty() {
            return Self::default();
        }
        Self::from_json(&raw)
    }
}

/// Strip pipes, newlines, and control characters from host-supplied free
/// text before it lands in logs or events.
#[must_use]
pub(crate) fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '|' && !c.is_control())
        .collect()
}
