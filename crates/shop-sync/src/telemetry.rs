//! Structured logging setup for hosts embedding the session engine.

use tracing_subscriber::EnvFilter;

/// Default directives when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,shop_sync=debug,shop_core=debug";

/// Installs a global fmt subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=shop_sync=trace` - Trace the session engine only
/// - Default: [`DEFAULT_FILTER`]
///
/// Returns `false` when a global subscriber was already installed (tests,
/// or a host with its own logging).
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
