//! Tracing setup

use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber
///
/// `RUST_LOG` wins over `default_filter` when set. Calling this twice is
/// harmless; the second install is ignored.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
