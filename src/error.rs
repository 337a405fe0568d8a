/// Error kinds and the process-wide fatal hook.
///
/// Every failure mode here is fatal by default: a default hook logs and the
/// process panics. Callers who want to recover instead of crashing use the
/// `try_*` entry points, which return `Result<_, MapError>` directly; the
/// infallible entry points (`insert`, `get_idx`, ...) still funnel failures
/// through the hook for callers who never touch `try_*`.
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("allocation failed")]
    AllocationFailure,

    #[error("key size mismatch: map expects {expected}-byte keys, got {got}")]
    KeySizeMismatch { expected: i32, got: usize },

    #[error("capacity exceeded: requested {requested}, max {max}")]
    CapacityExceeded { requested: usize, max: usize },

    #[error("map already initialized")]
    DoubleInit,

    #[error("platform unsupported: {0}")]
    PlatformUnsupported(&'static str),

    #[error("map is configured with user_managed_keys; use try_insert_borrowed instead of insert/try_insert")]
    RequiresUnsafeInsert,
}

type ErrorHook = dyn Fn(&MapError) + Send + Sync;

static ERROR_HOOK: OnceLock<Box<ErrorHook>> = OnceLock::new();

/// Install a process-wide error hook. Only the first call wins — later
/// calls are silently ignored, since there's a single global slot.
pub fn set_error_handler<F>(hook: F)
where
    F: Fn(&MapError) + Send + Sync + 'static,
{
    let _ = ERROR_HOOK.set(Box::new(hook));
}

/// Report a fatal error through the installed hook (or the default
/// logger) and never return.
pub(crate) fn fire(err: MapError) -> ! {
    match ERROR_HOOK.get() {
        Some(hook) => hook(&err),
        None => log::error!("stablemap: fatal error: {err}"),
    }
    panic!("stablemap: unrecoverable error: {err}");
}
