use tracing_subscriber::EnvFilter;

/// Initialize logging for the process.
///
/// Diagnostics go to stderr so the directive stream on stdout stays clean.
/// `DRIFT_LOG` controls the filter (same syntax as `RUST_LOG`); the default
/// is `info` for this crate and `warn` for everything else.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env("DRIFT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn,drift_wm=info,drift=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
