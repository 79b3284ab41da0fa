//! Tracing setup for the `xfn-render` binary.

use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

static FILTER_HANDLE: OnceLock<FilterHandle> = OnceLock::new();

pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Install the global subscriber with `level` as the starting filter.
///
/// Log lines are written to stderr. Stdout is reserved for the rendered
/// `CompositeResponse`, so a caller piping the output into another step
/// never sees log text mixed into the JSON. `RUST_LOG`, when set, takes
/// precedence over `level`. The filter stays reloadable through
/// [`apply_logging_level`]. Calling this more than once is harmless.
pub fn init_tracing_with_level(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let (filter_layer, handle) = reload::Layer::new(filter);
    if FILTER_HANDLE.set(handle).is_err() {
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Swap in the level from configuration once it has been loaded. Has no
/// effect when `RUST_LOG` is set or tracing was never initialized.
pub fn apply_logging_level(level: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    if let Some(handle) = FILTER_HANDLE.get()
        && let Err(err) = handle.reload(EnvFilter::new(level))
    {
        eprintln!("Warning: failed to apply log level {level}: {err}");
    }
}
