use std::path::PathBuf;
use thiserror::Error;

/// Why the bridge configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `--config` or `BUCHI_BRIDGE_CONFIG` named a file that does not exist.
    #[error("Config file {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot read config file {}: {source}", .path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value parsed but is out of range, e.g. a zero baud rate.
    #[error("{key}: {message}")]
    ValidationError { key: String, message: String },

    /// A `BUCHI_BRIDGE_*` override could not be parsed.
    #[error("{var}: expected {message}")]
    EnvParseError { var: String, message: String },
}

impl ConfigError {
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env_parse(var: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
