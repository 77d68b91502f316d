//! Bridge error types
//!
//! Errors raised inside a metamethod are handed to Lua as external errors, so
//! a script can catch them with `pcall`. When they surface back on the host
//! side they arrive wrapped in `mlua` callback errors; `BridgeError::root`
//! recovers the original.

use std::any::Any;

use tether_sdk::HostError;
use thiserror::Error;

use crate::coroutine::CoroutineStatus;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur while crossing the host/Lua boundary
#[derive(Debug, Error)]
pub enum BridgeError {
    /// More values to transfer than the configured limit allows
    #[error("Insufficient stack space: {needed} values requested, limit is {limit}")]
    InsufficientStackSpace {
        /// Values that needed transferring
        needed: usize,
        /// Configured maximum
        limit: usize,
    },

    /// Name does not resolve to an exposed member
    #[error("Unknown member '{member}' on {type_name}")]
    UnknownMember {
        /// Type the lookup ran against
        type_name: String,
        /// Requested member name
        member: String,
    },

    /// No overload accepts the supplied arguments
    #[error("No overload of {type_name}.{member} matches ({args})")]
    NoMatchingOverload {
        /// Type declaring the member group
        type_name: String,
        /// Member group name
        member: String,
        /// Kinds of the supplied arguments
        args: String,
    },

    /// Type arguments missing, surplus or not type descriptors
    #[error("Invalid type argument for {type_name}: {reason}")]
    InvalidTypeArgument {
        /// Generic type or method being closed
        type_name: String,
        /// What was wrong
        reason: String,
    },

    /// Neither operand's type overloads the operator
    #[error("Operator {operator} is not supported between {left} and {right}")]
    OperatorNotSupported {
        /// Operator symbol
        operator: String,
        /// Kind of the left operand
        left: String,
        /// Kind of the right operand
        right: String,
    },

    /// Value cannot be coerced to the declared kind
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Declared kind
        expected: String,
        /// Kind of the supplied value
        got: String,
    },

    /// Host value has no Lua representation
    #[error("Unsupported value kind: {0}")]
    UnsupportedValueKind(String),

    /// Assignment to a constant field, setter-less property or non-data member
    #[error("Member '{member}' on {type_name} is read-only")]
    ReadOnlyMember {
        /// Declaring type
        type_name: String,
        /// Member name
        member: String,
    },

    /// Host member failed or panicked
    #[error("Error invoking {context}: {message}{}", trace_suffix(.trace))]
    HostInvocation {
        /// Member being invoked, e.g. `Counter.add`
        context: String,
        /// Host error message or panic payload
        message: String,
        /// Host backtrace, when captured
        trace: Option<String>,
    },

    /// Resume of a finished or failed coroutine
    #[error("Cannot resume dead coroutine")]
    DeadCoroutine,

    /// Resume of a coroutine that is already running or has resumed another
    #[error("Cannot resume {status} coroutine")]
    CoroutineNotSuspended {
        /// Status at the time of the resume
        status: CoroutineStatus,
    },

    /// Error raised by Lua code, or surfaced through it
    #[error("Script error: {0}")]
    Script(#[from] mlua::Error),

    /// Reading a script or options file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Options file is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

fn trace_suffix(trace: &Option<String>) -> String {
    match trace {
        Some(trace) => format!("\nhost backtrace:\n{}", trace),
        None => String::new(),
    }
}

/// Broad classes of bridge failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Stack/transfer discipline violated
    Protocol,
    /// Member, overload or type argument resolution failed
    Resolution,
    /// Value conversion failed
    Coercion,
    /// Host code failed
    HostInvocation,
    /// Coroutine lifecycle violated
    Lifecycle,
    /// Lua-side failure
    Script,
    /// File access failed
    Io,
    /// Invalid configuration
    Config,
}

impl BridgeError {
    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            BridgeError::InsufficientStackSpace { .. } => ErrorCategory::Protocol,
            BridgeError::UnknownMember { .. }
            | BridgeError::NoMatchingOverload { .. }
            | BridgeError::InvalidTypeArgument { .. }
            | BridgeError::OperatorNotSupported { .. } => ErrorCategory::Resolution,
            BridgeError::TypeMismatch { .. }
            | BridgeError::UnsupportedValueKind(_)
            | BridgeError::ReadOnlyMember { .. } => ErrorCategory::Coercion,
            BridgeError::HostInvocation { .. } => ErrorCategory::HostInvocation,
            BridgeError::DeadCoroutine | BridgeError::CoroutineNotSuspended { .. } => {
                ErrorCategory::Lifecycle
            }
            BridgeError::Script(_) => ErrorCategory::Script,
            BridgeError::Io(_) => ErrorCategory::Io,
            BridgeError::Config(_) => ErrorCategory::Config,
        }
    }

    /// Innermost bridge error.
    ///
    /// A bridge error raised inside a metamethod reaches the host as
    /// `Script(CallbackError { cause: ExternalError(..) })`, possibly nested
    /// several levels deep. This walks the wrappers and returns the original
    /// error, or `self` when there is none.
    pub fn root(&self) -> &BridgeError {
        match self {
            BridgeError::Script(err) => match find_bridge_error(err) {
                Some(inner) => inner.root(),
                None => self,
            },
            _ => self,
        }
    }

    /// Wrap a host member failure
    pub fn host(context: impl Into<String>, err: &HostError) -> Self {
        BridgeError::HostInvocation {
            context: context.into(),
            message: err.message().to_string(),
            trace: err.trace(),
        }
    }

    /// Wrap a host member panic, with the trace captured when it was raised
    pub fn panic(
        context: impl Into<String>,
        payload: Box<dyn Any + Send>,
        trace: Option<String>,
    ) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            format!("panicked: {}", s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("panicked: {}", s)
        } else {
            "panicked".to_string()
        };
        BridgeError::HostInvocation {
            context: context.into(),
            message,
            trace,
        }
    }

    pub(crate) fn mismatch(expected: impl ToString, got: impl Into<String>) -> Self {
        BridgeError::TypeMismatch {
            expected: expected.to_string(),
            got: got.into(),
        }
    }
}

fn find_bridge_error(err: &mlua::Error) -> Option<&BridgeError> {
    match err {
        mlua::Error::CallbackError { cause, .. } => find_bridge_error(cause),
        mlua::Error::WithContext { cause, .. } => find_bridge_error(cause),
        mlua::Error::ExternalError(inner) => inner.downcast_ref::<BridgeError>(),
        _ => None,
    }
}

impl From<BridgeError> for mlua::Error {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Script(inner) => inner,
            other => mlua::Error::external(other),
        }
    }
}
