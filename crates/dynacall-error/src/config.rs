// Configuration error types

use thiserror::Error;
use crate::{DynacallError, ErrorCode, ErrorDomain};

/// Configuration error codes
pub mod codes {
    use crate::ErrorCode;

    // Config error codes start with 3000
    pub const IO_ERROR: ErrorCode = ErrorCode(3001);
    pub const PARSE_ERROR: ErrorCode = ErrorCode(3002);
    pub const TRACING_ERROR: ErrorCode = ErrorCode(3003);
}

/// Errors raised while loading configuration or installing the subscriber
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Tracing error: {0}")]
    Tracing(String),
}

impl DynacallError for ConfigError {
    fn code(&self) -> ErrorCode {
        use codes::*;
        match self {
            ConfigError::Io(_) => IO_ERROR,
            ConfigError::Parse(_) => PARSE_ERROR,
            ConfigError::Tracing(_) => TRACING_ERROR,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Config
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

/// Convenient Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;
