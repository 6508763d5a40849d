//! Tracing setup for the host binary.
//!
//! Logs go to stderr: stdout carries the IPC responses.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter (e.g. `secretsafe=debug`).
pub const LOG_ENV: &str = "SECRETSAFE_LOG";

/// Install the global subscriber.
///
/// `SECRETSAFE_LOG` wins over `default_filter`.  Calling this twice is
/// harmless; the second call is ignored.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
