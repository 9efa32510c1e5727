use tracing_subscriber::EnvFilter;

pub(crate) const LOG_ENV: &str = "OSA_LOG";

/// Installs a stderr subscriber filtered by `OSA_LOG` (default `warn`).
/// Stdout carries the command protocol, so nothing is logged there.
pub(crate) fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
