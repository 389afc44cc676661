//! Process-wide tracing subscriber.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Picks the log filter: a parseable `RUST_LOG` directive wins over the
/// configured `logging.level`.
fn log_filter(rust_log: Option<&str>, level: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}

/// Installs the global fmt subscriber filtered at `level`.
///
/// Called once, after the configuration has been loaded. Later calls leave
/// the installed subscriber in place.
pub fn init_tracing(level: &str) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let _ = tracing_subscriber::registry()
        .with(log_filter(rust_log.as_deref(), level))
        .with(fmt::layer())
        .try_init();
}
