//! Port-specific error types.
//!
//! Kept separate from link-level errors: a `PortError` describes what the OS or
//! driver reported, while the link decides whether that aborts an exchange or
//! just skips a discovery candidate.

use thiserror::Error;

/// Failure reported while listing, opening or talking to a serial port.
#[derive(Debug, Error)]
pub enum PortError {
    /// No port with this name exists (unplugged, or never there).
    #[error("No serial port named {0}")]
    NotFound(String),

    /// Read, write or flush failed, including read timeouts.
    #[error("Serial I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The driver refused the line settings.
    #[error("Unsupported port settings: {0}")]
    Config(String),

    #[error("serialport: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error is a read timeout rather than a real failure.
    ///
    /// The `serialport` crate reports an expired read timeout as an
    /// `io::ErrorKind::TimedOut` error; line reads treat it as end of data.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::TimedOut)
    }
}
