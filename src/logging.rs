use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

const LOG_FILTER_ENV: &str = "WORKLOG_LOG";

/// Diagnostics go to stderr; stdout carries only command output.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
