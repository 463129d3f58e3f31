//! Port abstraction layer for serial communication.
//!
//! Provides the traits discovery and exchange are written against, the real
//! `serialport`-backed implementation, and mocks for tests.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{MockPortProvider, MockSerialPort};
pub use sync_port::{SyncSerialPort, SystemPorts};
pub use traits::*;
