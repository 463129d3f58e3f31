use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::port::SerialPortAdapter;

/// Type alias for the port handle held while connected.
pub type PortHandle = Box<dyn SerialPortAdapter>;

/// Lifecycle of the single serial connection.
#[derive(Debug, Default)]
pub enum LinkState {
    /// Never connected, or every discovery so far failed.
    #[default]
    Uninitialized,
    Connected {
        /// The open port that answered the handshake.
        port: PortHandle,
        baud_rate: u32,
        connected_since: Instant,
        /// Commands exchanged over this connection.
        exchanges: u64,
    },
    /// Released by `close()`; discovery may connect again.
    Closed,
}

impl LinkState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Serializable snapshot of this state.
    pub fn status(&self) -> LinkStatus {
        match self {
            Self::Uninitialized => LinkStatus::Uninitialized,
            Self::Connected {
                port,
                baud_rate,
                connected_since,
                exchanges,
            } => LinkStatus::Connected {
                port_name: port.name().to_string(),
                baud_rate: *baud_rate,
                connected_ms: connected_since.elapsed().as_millis() as u64,
                exchanges: *exchanges,
            },
            Self::Closed => LinkStatus::Closed,
        }
    }
}

/// Link status as reported over HTTP and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkStatus {
    Uninitialized,
    Connected {
        port_name: String,
        baud_rate: u32,
        connected_ms: u64,
        exchanges: u64,
    },
    Closed,
}
