//! The process-wide registry.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use super::Registry;

/// Process-wide registry, populated with the built-in groups on first use.
static GLOBAL: Lazy<RwLock<Arc<Registry>>> =
    Lazy::new(|| RwLock::new(Arc::new(Registry::with_builtins())));

/// Snapshot of the process-wide registry.
///
/// The snapshot is immutable; registrations made after it was taken are not
/// visible through it.
pub fn global() -> Arc<Registry> {
    GLOBAL.read().clone()
}

/// Mutates the process-wide registry.
///
/// Outstanding snapshots keep the previous tables; the mutation lands in a
/// copy when any exist.
pub fn with_global_mut<R>(f: impl FnOnce(&mut Registry) -> R) -> R {
    let mut guard = GLOBAL.write();
    f(Arc::make_mut(&mut guard))
}

/// Forces initialisation of the process-wide registry.
pub fn init() {
    Lazy::force(&GLOBAL);
}

/// Replaces the process-wide registry with a fresh one holding only the
/// built-in groups. Discards every user registration.
pub fn reset() {
    debug!("resetting global registry");
    install(Registry::with_builtins());
}

/// Empties the process-wide registry, built-ins included.
pub fn shutdown() {
    debug!("shutting down global registry");
    install(Registry::new());
}

/// Replaces the process-wide registry with `registry`.
pub fn install(registry: Registry) {
    *GLOBAL.write() = Arc::new(registry);
}
