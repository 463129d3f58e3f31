//! Logging setup.
//!
//! The binary calls [`init`] once at startup. Library code only uses the
//! `tracing` macros.

use crate::config::LogFormat;
use tracing_subscriber::{filter::EnvFilter, prelude::*};

/// Build the filter: `RUST_LOG` wins when set, otherwise `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber writing to stderr in the given format.
///
/// Returns an error if a subscriber is already installed.
pub fn init(
    format: LogFormat,
    default_level: &str,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let registry = tracing_subscriber::registry().with(env_filter(default_level));
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match format {
        LogFormat::Json => registry.with(layer.json()).try_init(),
        LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
        LogFormat::Compact => registry.with(layer.compact()).try_init(),
    }
}
