//! Diagnostic logging setup.
//!
//! Command output goes to stdout; diagnostics go to stderr through
//! `tracing`. The filter is read from `BINLOCK_LOG` using the usual
//! `EnvFilter` directive syntax (for example `binlock=debug`).

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "BINLOCK_LOG";

/// Filter used when `BINLOCK_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

/// Install the stderr subscriber unless one is already set.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
