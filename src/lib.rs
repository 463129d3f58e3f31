//! BUCHI bridge library
//!
//! Bridges HTTP clients to a single BUCHI device on a serial port: the device
//! is found by handshake at startup, then each request becomes one
//! line-based command/response exchange.
//!
//! # Modules
//!
//! - `port`: serial port traits, the `serialport`-backed implementation and mocks
//! - `protocol`: command lines and response matching
//! - `link`: `DeviceLink`, discovery and exchange
//! - `service`: serialized async access to the link
//! - `rest_api`: HTTP routes (when `rest-api` feature is enabled)
//! - `error`: HTTP-facing error type
//! - `config`: configuration management with TOML support
//! - `logging`: tracing subscriber setup

pub mod config;
pub mod error;
pub mod link;
pub mod logging;
pub mod port;
pub mod protocol;
pub mod service;

#[cfg(feature = "rest-api")]
pub mod rest_api;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult};
pub use link::{DeviceLink, LinkError, LinkResult, LinkSettings, LinkStatus};
pub use port::{
    CandidatePort, MockPortProvider, MockSerialPort, PortConfiguration, PortError, PortProvider,
    SerialPortAdapter, SyncSerialPort, SystemPorts,
};
pub use protocol::Command;
pub use service::LinkService;

pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
