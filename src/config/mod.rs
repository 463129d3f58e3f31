//! Configuration module for buchi-bridge.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `BUCHI_BRIDGE_CONFIG` environment variable (explicit path)
//! 2. `./config.toml` (current directory)
//! 3. `~/.config/buchi-bridge/config.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\buchi-bridge\config.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Any configuration value can be overridden via environment variables.
//! The pattern is: `BUCHI_BRIDGE_<SECTION>_<KEY>`
//!
//! # Example
//!
//! ```rust,no_run
//! use buchi_bridge::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//!
//! println!("Server port: {}", config.server.port);
//! println!("Baud rate: {}", config.serial.baud_rate);
//! # Ok::<(), buchi_bridge::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig, ServerConfig};
