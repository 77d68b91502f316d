//! Error type reported by host code invoked from scripts

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

use thiserror::Error;

/// Result type for host invocations
pub type HostResult<T> = Result<T, HostError>;

/// Failure raised by a registered host member.
///
/// The backtrace is always captured where the error is created, regardless
/// of `RUST_BACKTRACE`, so the bridge can carry the host stack into the
/// script-visible error.
#[derive(Error)]
#[error("{message}")]
pub struct HostError {
    message: String,
    // Boxed so thiserror does not treat it as the provided backtrace.
    backtrace: Box<Backtrace>,
}

impl HostError {
    /// Create a new host error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            backtrace: Box::new(Backtrace::force_capture()),
        }
    }

    /// Error for a value that does not have the expected kind
    pub fn type_mismatch(expected: &str, got: &str) -> Self {
        Self::new(format!("Type mismatch: expected {}, got {}", expected, got))
    }

    /// Error for a missing or out-of-range argument
    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(format!("Argument error: {}", message.into()))
    }

    /// The error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Host backtrace rendered as text, if one was captured
    pub fn trace(&self) -> Option<String> {
        match self.backtrace.status() {
            BacktraceStatus::Captured => Some(self.backtrace.to_string()),
            _ => None,
        }
    }
}

impl fmt::Debug for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostError")
            .field("message", &self.message)
            .field("backtrace", &self.backtrace.status())
            .finish()
    }
}

impl From<String> for HostError {
    fn from(s: String) -> Self {
        HostError::new(s)
    }
}

impl From<&str> for HostError {
    fn from(s: &str) -> Self {
        HostError::new(s)
    }
}

impl From<mlua::Error> for HostError {
    fn from(e: mlua::Error) -> Self {
        HostError::new(e.to_string())
    }
}
