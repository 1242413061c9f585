// Value-specific error types
// Raised by the dynamic value registries when a fallible lookup misses

use thiserror::Error;
use crate::{DynacallError, ErrorCode, ErrorDomain};

/// Value error codes
pub mod codes {
    use crate::ErrorCode;

    // Value error codes start with 1000
    pub const NOT_CONVERTIBLE: ErrorCode = ErrorCode(1001);
    pub const INCOMPARABLE: ErrorCode = ErrorCode(1002);
    pub const INVALID_VALUE: ErrorCode = ErrorCode(1003);
    pub const TYPE_MISMATCH: ErrorCode = ErrorCode(1004);
}

/// Errors produced by conversion, comparison and extraction of dynamic values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// No conversion is registered for the pair
    #[error("No conversion registered from {from} to {to}")]
    NotConvertible { from: &'static str, to: &'static str },

    /// No comparison is registered for the pair
    #[error("Values of type {left} and {right} cannot be compared")]
    Incomparable { left: &'static str, right: &'static str },

    /// The value holds nothing
    #[error("Value is invalid")]
    InvalidValue,

    /// The value holds a different type than requested
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },
}

impl DynacallError for ValueError {
    fn code(&self) -> ErrorCode {
        use codes::*;
        match self {
            ValueError::NotConvertible { .. } => NOT_CONVERTIBLE,
            ValueError::Incomparable { .. } => INCOMPARABLE,
            ValueError::InvalidValue => INVALID_VALUE,
            ValueError::TypeMismatch { .. } => TYPE_MISMATCH,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Value
    }
}

/// Convenient Result type for value operations
pub type ValueResult<T> = Result<T, ValueError>;

impl ValueError {
    /// Create a new conversion error
    pub fn not_convertible(from: &'static str, to: &'static str) -> Self {
        ValueError::NotConvertible { from, to }
    }
}
