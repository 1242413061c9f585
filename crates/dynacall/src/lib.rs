//! Dynacall
//!
//! Dynamic values and type-erased callbacks. Values carry any `Clone + Send +
//! Sync` payload and are converted, compared and iterated through a
//! process-wide registry; callbacks wrap functions, methods and closures and
//! are invoked with lists of values, coercing each argument to the parameter
//! type the target declares.
//!
//! ```
//! use dynacall::prelude::*;
//!
//! fn scale(value: f64, factor: f64) -> f64 {
//!     value * factor
//! }
//!
//! let double = Callback::from_fn(scale).bind(bind_args![_1, 2.0]);
//! assert_eq!(double.call(&values!["1.5"]).to::<f64>(), Some(3.0));
//! ```

pub mod config;
pub mod tracing;

pub use dynacall_callback as callback;
pub use dynacall_error as error;
pub use dynacall_value as value;

pub use config::{BuiltinsConfig, Config, TracingConfig};
pub use self::tracing::init_tracing;

pub use dynacall_callback::{bind_args, Callback};
pub use dynacall_value::{values, Registry, Value, ValueList, ValueMap};

use dynacall_error::{ConfigError, ConfigResult};
use dynacall_value::{registry, Builtins};

/// Commonly used items
pub mod prelude {
    pub use dynacall_callback::placeholders::*;
    pub use dynacall_callback::{
        bind_args, BoundArg, Callback, Guard, InvokeAction, MethodHandle, Placeholder, Signature,
    };
    pub use dynacall_error::{CallbackError, DynacallError, ValueError};
    pub use dynacall_value::{values, Registry, TypeTag, Value, ValueList, ValueMap};
}

/// Applies `config` to the process.
///
/// Replaces the process-wide registry with one holding the selected built-in
/// groups, discarding earlier registrations, then installs the tracing
/// subscriber if enabled. Enabling tracing fails when a subscriber is already
/// installed; the registry is replaced regardless.
pub fn init(config: &Config) -> ConfigResult<()> {
    let mut fresh = Registry::new();
    Builtins::from(config.builtins).install(&mut fresh);
    registry::install(fresh);
    ::tracing::debug!(builtins = ?config.builtins, "installed global registry");

    if config.tracing.enabled {
        init_tracing(Some(&config.tracing.level), config.tracing.json)
            .map_err(|e| ConfigError::Tracing(e.to_string()))?;
    }
    Ok(())
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_covers_common_use() {
        crate::tracing::init_test_logging();

        let local = {
            let mut registry = Registry::new();
            dynacall_value::Builtins::all().install(&mut registry);
            registry
        };
        let greet = Callback::from_fn(|name: String, times: usize| name.repeat(times));
        let twice = greet.bind(bind_args![_1, 2_usize]);
        let out = twice.call_in(&local, &values!["ab"]);
        assert_eq!(out.downcast_ref::<String>().map(String::as_str), Some("abab"));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_feature_enables_bridge() {
        let registry = Registry::with_builtins();
        let json = dynacall_value::json::to_json_in(&registry, &Value::from(3_i64));
        assert_eq!(json.map(|j| j.to_string()).as_deref(), Some("3"));
    }
}
