//! Diagnostic tracing, separate from the interactive conversation.
//!
//! Logs go to stderr; prompts and step output go to stdout.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. `verbose` forces `gitwise=debug`.
///
/// # Example
/// ```bash
/// RUST_LOG=gitwise=trace gitwise commit my changes
/// ```
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,gitwise=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
