//! Logging setup for the command-line entry point.
//!
//! Installs a global tracing subscriber that writes to stderr so stdout stays
//! free for the styled stage output. `RUST_LOG` overrides the verbosity flag.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to set the global tracing subscriber.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(String),
}

/// Default filter directive for a `-v` count
fn default_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    format!("warn,lifeboat={}", level)
}

/// Initialize tracing once. Subsequent calls are no-ops.
pub fn init(verbosity: u8) -> Result<(), LoggingError> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| LoggingError::SetGlobal(e.to_string()))?;

    let _ = INITIALIZED.set(());
    tracing::debug!("Logging initialized");
    Ok(())
}
