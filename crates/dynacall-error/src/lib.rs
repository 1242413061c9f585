// dynacall error handling
// Central location for error types, codes, and the serialisable error message

use std::fmt;

// Re-export thiserror so dependents derive against the same version
pub use thiserror;

mod callback;
mod config;
mod macros;
mod value;

pub use callback::{CallbackError, CallbackResult};
pub use config::{ConfigError, ConfigResult};
pub use value::{ValueError, ValueResult};

pub use callback::codes as callback_codes;
pub use config::codes as config_codes;
pub use value::codes as value_codes;

/// Error domains representing the components of the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorDomain {
    Value,
    Callback,
    Config,
}

impl fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorDomain::Value => write!(f, "value"),
            ErrorDomain::Callback => write!(f, "callback"),
            ErrorDomain::Config => write!(f, "config"),
        }
    }
}

/// Numeric error code, unique across domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ErrorCode(pub u32);

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// Standard error message format for serialization
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorMessage {
    pub code: ErrorCode,
    pub domain: ErrorDomain,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorMessage {
    /// Attach structured details to the message
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Base trait for every error raised by the runtime.
pub trait DynacallError: std::error::Error + fmt::Debug + Send + Sync + 'static {
    /// Numeric code of this error.
    fn code(&self) -> ErrorCode;

    /// Component the error originates from.
    fn domain(&self) -> ErrorDomain;

    /// Builds the serialisable form of this error.
    fn to_message(&self) -> ErrorMessage {
        ErrorMessage {
            code: self.code(),
            domain: self.domain(),
            message: self.to_string(),
            details: None,
        }
    }
}

impl<E: DynacallError> From<E> for ErrorMessage {
    fn from(err: E) -> Self {
        err.to_message()
    }
}
