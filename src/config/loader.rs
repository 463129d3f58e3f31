//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "BUCHI_BRIDGE";

/// Config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "BUCHI_BRIDGE_CONFIG";

/// Per-user config directory name
const APP_DIR_NAME: &str = "buchi-bridge";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `BUCHI_BRIDGE_CONFIG` environment variable (explicit path)
    /// 2. `./config.toml` (current directory)
    /// 3. `~/.config/buchi-bridge/config.toml` (XDG on Linux/macOS)
    /// 4. `%APPDATA%\buchi-bridge\config.toml` (Windows)
    /// 5. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. XDG config directory (Linux/macOS) or APPDATA (Windows)
    if let Some(app_config) = get_default_config_path() {
        if app_config.exists() {
            return Some(app_config);
        }
    }

    None
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

/// Get the default config file path for this application.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Read `BUCHI_BRIDGE_<key>` and parse it, if set.
fn env_value<T: FromStr>(key: &str, what: &str) -> ConfigResult<Option<T>> {
    let var = format!("{}_{}", ENV_PREFIX, key);
    match std::env::var(&var) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env_parse(var, what)),
        Err(_) => Ok(None),
    }
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(format!("{}_{}", ENV_PREFIX, key))
        .ok()
        .map(|val| val.eq_ignore_ascii_case("true") || val == "1")
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `BUCHI_BRIDGE_<SECTION>_<KEY>`
/// For example:
/// - `BUCHI_BRIDGE_SERVER_PORT=8080`
/// - `BUCHI_BRIDGE_SERIAL_BAUD_RATE=9600`
/// - `BUCHI_BRIDGE_SERIAL_PORT=COM3`
/// - `BUCHI_BRIDGE_SERIAL_EXCLUDE_PORTS=COM1,COM2`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Server overrides
    if let Some(val) = env_value::<String>("SERVER_HOST", "a host name")? {
        config.server.host = val;
    }
    if let Some(val) = env_value("SERVER_PORT", "a port number")? {
        config.server.port = val;
    }
    if let Some(val) = env_value::<String>("SERVER_LOG_LEVEL", "a log level")? {
        config.server.log_level = val;
    }

    // Serial overrides
    if let Some(val) = env_flag("SERIAL_ENABLED") {
        config.serial.enabled = val;
    }
    if let Some(val) = env_value("SERIAL_BAUD_RATE", "a baud rate")? {
        config.serial.baud_rate = val;
    }
    if let Some(val) = env_value("SERIAL_TIMEOUT_MS", "milliseconds")? {
        config.serial.timeout_ms = val;
    }
    if let Some(val) = env_value("SERIAL_SETTLE_MS", "milliseconds")? {
        config.serial.settle_ms = val;
    }
    if let Some(val) = env_value::<String>("SERIAL_PORT", "a port name")? {
        config.serial.port = (!val.is_empty()).then_some(val);
    }
    if let Some(val) = env_value::<String>("SERIAL_EXCLUDE_PORTS", "a comma-separated port list")? {
        config.serial.exclude_ports = val
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(val) = env_flag("SERIAL_DRAIN_STALE_INPUT") {
        config.serial.drain_stale_input = val;
    }

    // Logging overrides
    if let Some(val) = env_value("LOGGING_FORMAT", "json, pretty or compact")? {
        config.logging.format = val;
    }

    Ok(())
}
