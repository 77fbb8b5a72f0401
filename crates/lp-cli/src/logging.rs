//! Logging init for the `linkpure` binary.

use tracing_subscriber::EnvFilter;

/// Structured logging to stderr, filtered by `RUST_LOG` (default `info`).
/// Records from the library crates arrive through the `log` bridge.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}
