// Callback-specific error types
// Every variant collapses to an invalid value on the non-throwing call path

use thiserror::Error;
use crate::{DynacallError, ErrorCode, ErrorDomain};

/// Callback error codes
pub mod codes {
    use crate::ErrorCode;

    // Callback error codes start with 2000
    pub const ARITY_MISMATCH: ErrorCode = ErrorCode(2001);
    pub const UNRESOLVED_PLACEHOLDER: ErrorCode = ErrorCode(2002);
    pub const MISSING_VARIADIC_EXTRA: ErrorCode = ErrorCode(2003);
    pub const CONVERSION: ErrorCode = ErrorCode(2004);
    pub const INVALID_TARGET: ErrorCode = ErrorCode(2005);
    pub const INSTANCE_DROPPED: ErrorCode = ErrorCode(2006);
    pub const GUARD_REJECTED: ErrorCode = ErrorCode(2007);
    pub const INSTANCE_BUSY: ErrorCode = ErrorCode(2008);
}

/// Errors produced while resolving arguments for, or invoking, a callback
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// Effective argument count differs from the target's parameter count
    #[error("Arity mismatch: expected {expected} arguments, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    /// A placeholder references a call-time argument that was not supplied
    #[error("Placeholder _{index} is unresolved: only {supplied} arguments supplied")]
    UnresolvedPlaceholder { index: usize, supplied: usize },

    /// A variadic target with a fixed extra parameter received no arguments
    #[error("Variadic target needs at least one argument for its fixed parameter")]
    MissingVariadicExtra,

    /// An argument could not be coerced to the parameter type
    #[error("Cannot convert argument {position} from {from} to {to}")]
    Conversion { position: usize, from: &'static str, to: &'static str },

    /// The callback holds no target
    #[error("Callback has no target")]
    InvalidTarget,

    /// The instance a method callback refers to no longer exists
    #[error("Instance of {0} was dropped before invocation")]
    InstanceDropped(&'static str),

    /// A mutating method was re-entered on an instance this thread already
    /// has locked
    #[error("Instance of {0} is already locked by a running call on this thread")]
    InstanceBusy(&'static str),

    /// The guard attached to a method evaluated to false
    #[error("Guard of method {method} rejected the arguments")]
    GuardRejected { method: String },
}

impl DynacallError for CallbackError {
    fn code(&self) -> ErrorCode {
        use codes::*;
        match self {
            CallbackError::ArityMismatch { .. } => ARITY_MISMATCH,
            CallbackError::UnresolvedPlaceholder { .. } => UNRESOLVED_PLACEHOLDER,
            CallbackError::MissingVariadicExtra => MISSING_VARIADIC_EXTRA,
            CallbackError::Conversion { .. } => CONVERSION,
            CallbackError::InvalidTarget => INVALID_TARGET,
            CallbackError::InstanceDropped(_) => INSTANCE_DROPPED,
            CallbackError::InstanceBusy(_) => INSTANCE_BUSY,
            CallbackError::GuardRejected { .. } => GUARD_REJECTED,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Callback
    }
}

/// Convenient Result type for callback operations
pub type CallbackResult<T> = Result<T, CallbackError>;

impl CallbackError {
    /// Create a new arity mismatch error
    pub fn arity(expected: usize, found: usize) -> Self {
        CallbackError::ArityMismatch { expected, found }
    }

    /// Whether the error stems from the shape of the argument list rather
    /// than from a type or the target itself
    pub fn is_binding_error(&self) -> bool {
        matches!(
            self,
            CallbackError::ArityMismatch { .. }
                | CallbackError::UnresolvedPlaceholder { .. }
                | CallbackError::MissingVariadicExtra
        )
    }
}
