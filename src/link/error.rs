//! Link-level errors.

use crate::port::PortError;
use thiserror::Error;

/// Errors returned by [`DeviceLink`](super::DeviceLink) operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// An exchange was attempted with no active connection.
    #[error("Serial port is not open")]
    NotConnected,

    /// Discovery finished without any candidate answering the handshake.
    #[error("Could not find any BUCHI device")]
    DeviceNotFound,

    /// The OS refused to list serial ports.
    #[error("Failed to enumerate serial ports: {0}")]
    Enumeration(#[source] PortError),

    /// A write or read on the active connection failed.
    #[error("Error during serial communication: {0}")]
    Io(#[source] PortError),

    /// A command argument cannot be sent as a single protocol line.
    #[error("Invalid command argument: {0}")]
    InvalidArgument(String),

    /// The blocking task running the link operation did not complete.
    #[error("Link worker failed: {0}")]
    Worker(String),
}

impl LinkError {
    /// Stable name of the variant, used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConnected => "NotConnected",
            Self::DeviceNotFound => "DeviceNotFound",
            Self::Enumeration(_) => "EnumerationError",
            Self::Io(_) => "IoError",
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::Worker(_) => "WorkerError",
        }
    }
}

/// Convenient Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;
