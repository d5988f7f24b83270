//! The command interpreter's error kinds (§7). `ProtocolError` and
//! `ResourceUnavailable` are fatal (the caller logs and exits after a
//! best-effort tree serialization); the rest are attached to the per-command
//! JSON reply and the batch continues.

#[derive(Debug, thiserror::Error)]
pub enum WmError {
    #[error("backend request failed: {0}")]
    ProtocolError(String),
    #[error("tree invariant violated: {0}")]
    InvariantViolation(String),
    #[error("could not parse command or config: {0}")]
    ParseError(String),
    #[error("no container matched the given criteria")]
    CriteriaMismatch,
    #[error("resource allocation failed: {0}")]
    ResourceUnavailable(String),
    #[error("{0}")]
    PolicyRefusal(String),
}

impl WmError {
    /// `ProtocolError` and `ResourceUnavailable` abort the process (§7);
    /// everything else is reported and the batch continues.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WmError::ProtocolError(_) | WmError::ResourceUnavailable(_))
    }
}

impl From<core_state::TreeError> for WmError {
    fn from(e: core_state::TreeError) -> Self {
        match &e {
            core_state::TreeError::InvariantViolation(msg) => WmError::InvariantViolation(msg.clone()),
            core_state::TreeError::ResizeBelowMinimum => WmError::PolicyRefusal(e.to_string()),
            _ => WmError::ParseError(e.to_string()),
        }
    }
}
