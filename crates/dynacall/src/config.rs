//! Runtime configuration
//!
//! Selects which built-in registry groups are installed and how the tracing
//! subscriber is set up. Every field has a default, so an empty TOML document
//! is a valid configuration.

use std::path::Path;

use dynacall_error::{ConfigError, ConfigResult};
use dynacall_value::Builtins;
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Built-in conversion groups to install
    pub builtins: BuiltinsConfig,

    /// Tracing subscriber settings
    pub tracing: TracingConfig,
}

/// Built-in conversion groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuiltinsConfig {
    /// Integer, float, bool and char coercions
    pub numeric: bool,

    /// Coercions to and from strings
    pub text: bool,

    /// Coercions to and from JSON values
    pub json: bool,
}

impl Default for BuiltinsConfig {
    fn default() -> Self {
        Self {
            numeric: true,
            text: true,
            json: true,
        }
    }
}

impl From<BuiltinsConfig> for Builtins {
    fn from(config: BuiltinsConfig) -> Self {
        Builtins {
            numeric: config.numeric,
            text: config.text,
            json: config.json,
        }
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Install a subscriber during `init`
    pub enabled: bool,

    /// Filter directive, e.g. `"info"` or `"dynacall_callback=debug,warn"`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------
