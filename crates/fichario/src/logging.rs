//! Tracing subscriber setup for binaries and tests.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber with an env-filter (RUST_LOG)
/// falling back to the given default, and bridges `log` records into
/// tracing. Safe to call more than once; later calls are no-ops.
pub fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        let _ = tracing_log::LogTracer::init();
    }
}
