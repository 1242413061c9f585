// Tracing subscriber setup

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

//-----------------------------------------------------------------------------
// Tracing Initialization
//-----------------------------------------------------------------------------

/// Installs the global tracing subscriber.
///
/// # Arguments
///
/// * `log_level`: filter directive, defaults to `"info"`. `RUST_LOG` wins when
///   it is set. Module directives such as `"dynacall_value=trace,info"` work.
/// * `json_output`: emit JSON lines instead of the pretty format.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(log_level: Option<&str>, json_output: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))?;

    let subscriber = Registry::default().with(env_filter);

    if json_output {
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true);
        tracing::subscriber::set_global_default(subscriber.with(json_layer))?;
    } else {
        let fmt_layer = fmt::layer().pretty().with_target(true).with_level(true);
        tracing::subscriber::set_global_default(subscriber.with(fmt_layer))?;
    }

    Ok(())
}

/// Debug-level logging for tests, installed once per test binary.
#[cfg(test)]
pub(crate) fn init_test_logging() {
    use std::sync::Once;

    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("debug"));
        let layer = fmt::layer().with_target(true).with_test_writer();
        let _ = tracing::subscriber::set_global_default(Registry::default().with(filter).with(layer));
    });
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------
