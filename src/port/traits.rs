//! Core traits for serial port abstraction.
//!
//! `SerialPortAdapter` covers I/O on one open port; `PortProvider` covers
//! enumerating candidate ports and opening them. Discovery only talks to these
//! two traits, so tests can hand it a scripted set of mock ports.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Line settings for opening a port. Framing is always 8N1 without flow control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Read/write timeout for a single driver call.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            timeout: Duration::from_secs(1),
        }
    }
}

/// Trait for serial port I/O operations.
///
/// Dropping the adapter closes the underlying port.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read. An expired read timeout is
    /// reported as an `io::ErrorKind::TimedOut` error, see
    /// [`PortError::is_timeout`].
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Set the read/write timeout for this port.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Discard any unread data in the receive buffer and any unsent data in the
    /// transmit buffer.
    fn clear_buffers(&mut self) -> Result<(), PortError>;

    /// Write the whole buffer, retrying on short writes.
    fn write_all_bytes(&mut self, mut data: &[u8]) -> Result<(), PortError> {
        while !data.is_empty() {
            match self.write_bytes(data)? {
                0 => {
                    return Err(PortError::Io(std::io::Error::new(
                        std::io::ErrorKind::WriteZero,
                        "failed to write whole command",
                    )))
                }
                n => data = &data[n..],
            }
        }
        Ok(())
    }
}

/// Metadata about a candidate port, as reported by enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePort {
    /// System name/path used to open the port.
    pub port_name: String,
    /// Transport reported by the OS: "usb", "pci", "bluetooth" or "unknown".
    pub transport: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
}

impl CandidatePort {
    /// A candidate known only by name.
    pub fn named(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            transport: "unknown".to_string(),
            manufacturer: None,
            product: None,
        }
    }
}

/// Source of candidate ports for discovery.
pub trait PortProvider: Send + Sync + std::fmt::Debug {
    /// List the ports currently visible, in enumeration order.
    fn candidates(&self) -> Result<Vec<CandidatePort>, PortError>;

    /// Open the named port with the given line settings.
    fn open(
        &self,
        port_name: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}
