//! Tracing subscriber setup for host programs.
//!
//! The library itself only emits `tracing` events; nothing is printed unless
//! the host installs a subscriber, either its own or the one built here.

use crate::config::{ConfigError, ConfigResult, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `config.level`. Fails with
/// [`ConfigError::LoggingInit`] if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> ConfigResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => configured_filter(&config.level)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    installed.map_err(|e| ConfigError::LoggingInit(e.to_string()))
}

fn configured_filter(level: &str) -> ConfigResult<EnvFilter> {
    EnvFilter::try_new(level).map_err(|e| ConfigError::validation("logging.level", e.to_string()))
}
