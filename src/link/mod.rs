//! The device link: discovery and command/response exchange.
//!
//! `DeviceLink` owns at most one open serial port. `discover()` scans the
//! candidates a [`PortProvider`] reports, in the order it reports them, and
//! keeps the first port that answers `BUCHI:WHO` with `BUCHI:OK?`. Every other
//! port it opens is dropped (closed) before the next one is tried.
//!
//! All operations block, for at most the settle delay plus the read timeout
//! per port. The link has no internal locking; see
//! [`LinkService`](crate::service::LinkService) for the shared, serialized
//! wrapper used by the HTTP layer.

mod error;
mod state;

pub use error::{LinkError, LinkResult};
pub use state::{LinkState, LinkStatus, PortHandle};

use crate::config::SerialConfig;
use crate::port::{PortConfiguration, PortError, PortProvider, SerialPortAdapter, SystemPorts};
use crate::protocol::{self, Command};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Tunables for discovery and exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    pub baud_rate: u32,
    /// Upper bound for reading one response line.
    pub read_timeout: Duration,
    /// Wait between opening a candidate and sending the handshake, while the
    /// device finishes its power-on initialization.
    pub settle: Duration,
    /// Port names discovery never opens (compared case-insensitively).
    pub exclude_ports: Vec<String>,
    /// Clear the input buffer before writing each command.
    pub drain_stale_input: bool,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            read_timeout: Duration::from_secs(1),
            settle: Duration::from_secs(2),
            exclude_ports: Vec::new(),
            drain_stale_input: false,
        }
    }
}

impl LinkSettings {
    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration {
            baud_rate: self.baud_rate,
            timeout: self.read_timeout,
        }
    }

    pub fn is_excluded(&self, port_name: &str) -> bool {
        self.exclude_ports
            .iter()
            .any(|p| p.eq_ignore_ascii_case(port_name))
    }
}

impl From<&SerialConfig> for LinkSettings {
    fn from(config: &SerialConfig) -> Self {
        Self {
            baud_rate: config.baud_rate,
            read_timeout: config.timeout(),
            settle: config.settle(),
            exclude_ports: config.exclude_ports.clone(),
            drain_stale_input: config.drain_stale_input,
        }
    }
}

/// The single serial connection to the BUCHI device.
#[derive(Debug)]
pub struct DeviceLink {
    provider: Box<dyn PortProvider>,
    settings: LinkSettings,
    state: LinkState,
}

impl DeviceLink {
    /// Create an unconnected link over the given port provider.
    pub fn new(provider: impl PortProvider + 'static, settings: LinkSettings) -> Self {
        Self {
            provider: Box::new(provider),
            settings,
            state: LinkState::Uninitialized,
        }
    }

    /// Create an unconnected link over the system's serial ports.
    pub fn system(settings: LinkSettings) -> Self {
        Self::new(SystemPorts, settings)
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Name of the connected port, if any.
    pub fn port_name(&self) -> Option<&str> {
        match &self.state {
            LinkState::Connected { port, .. } => Some(port.name()),
            _ => None,
        }
    }

    pub fn status(&self) -> LinkStatus {
        self.state.status()
    }

    /// Scan every candidate port and connect to the first one that answers
    /// the handshake.
    ///
    /// Returns the name of the connected port. Open, write and read failures
    /// on a candidate are logged and the scan moves on; a port that answers
    /// with anything else is closed and skipped.
    ///
    /// # Errors
    ///
    /// - `LinkError::Enumeration` if the port list cannot be obtained
    /// - `LinkError::DeviceNotFound` if no candidate answered
    pub fn discover(&mut self) -> LinkResult<String> {
        self.release();

        let candidates = self.provider.candidates().map_err(LinkError::Enumeration)?;
        info!(count = candidates.len(), "Scanning serial ports for BUCHI device");

        for candidate in candidates {
            let name = candidate.port_name;
            if self.settings.is_excluded(&name) {
                debug!(port = %name, "Skipping excluded port");
                continue;
            }
            if let Some(port) = self.try_candidate(&name) {
                self.attach(port);
                return Ok(name);
            }
        }

        warn!("Could not find any BUCHI device.");
        Err(LinkError::DeviceNotFound)
    }

    /// Run the handshake against one named port and connect to it if it
    /// answers.
    ///
    /// # Errors
    ///
    /// - `LinkError::DeviceNotFound` if the port cannot be opened or does not
    ///   answer the handshake
    pub fn connect(&mut self, port_name: &str) -> LinkResult<String> {
        self.release();

        match self.try_candidate(port_name) {
            Some(port) => {
                self.attach(port);
                Ok(port_name.to_string())
            }
            None => Err(LinkError::DeviceNotFound),
        }
    }

    /// Send one command body and return the trimmed response line.
    ///
    /// The terminator is appended here. A read that times out without data
    /// yields an empty string, not an error. On failure the link stays
    /// connected; the caller decides whether to rediscover.
    ///
    /// # Errors
    ///
    /// - `LinkError::NotConnected` if no device is connected
    /// - `LinkError::InvalidArgument` if the body contains control characters
    /// - `LinkError::Io` if the write or read fails
    pub fn exchange(&mut self, body: &str) -> LinkResult<String> {
        let LinkState::Connected {
            port, exchanges, ..
        } = &mut self.state
        else {
            return Err(LinkError::NotConnected);
        };

        protocol::check_line_safe(body).map_err(LinkError::InvalidArgument)?;

        if self.settings.drain_stale_input {
            port.clear_buffers().map_err(LinkError::Io)?;
        }

        debug!(port = port.name(), command = body, "Sending command");
        port.write_all_bytes(&protocol::encode(body))
            .map_err(LinkError::Io)?;
        let response =
            read_line(port.as_mut(), self.settings.read_timeout).map_err(LinkError::Io)?;
        *exchanges += 1;

        debug!(port = port.name(), response = %response, "Received raw response");
        Ok(response)
    }

    /// Send a protocol command. See [`exchange`](Self::exchange).
    pub fn send(&mut self, command: &Command) -> LinkResult<String> {
        self.exchange(&command.body())
    }

    /// Ask the device whether `token` is valid.
    ///
    /// Any answer not containing `BUCHI:OK`, including an empty one, is `false`.
    pub fn validate_token(&mut self, token: &str) -> LinkResult<bool> {
        let response = self.send(&Command::ValidateToken(token.to_string()))?;
        Ok(protocol::is_ok(&response))
    }

    /// Push a URL to the device and return its answer verbatim.
    pub fn write_url(&mut self, url: &str) -> LinkResult<String> {
        self.send(&Command::WriteUrl(url.to_string()))
    }

    /// Close the connection if one is open. Always leaves the link `Closed`.
    pub fn close(&mut self) {
        if let LinkState::Connected { port, .. } =
            std::mem::replace(&mut self.state, LinkState::Closed)
        {
            info!(port = port.name(), "Serial port closed.");
        }
    }

    /// Drop a held connection before a new scan so two ports are never open.
    fn release(&mut self) {
        if self.state.is_connected() {
            self.close();
        }
    }

    fn attach(&mut self, port: PortHandle) {
        info!(
            port = port.name(),
            baud_rate = self.settings.baud_rate,
            "Successfully connected to BUCHI device"
        );
        self.state = LinkState::Connected {
            port,
            baud_rate: self.settings.baud_rate,
            connected_since: Instant::now(),
            exchanges: 0,
        };
    }

    fn try_candidate(&self, port_name: &str) -> Option<PortHandle> {
        match self.handshake(port_name) {
            Ok(found) => found,
            Err(e) => {
                warn!(port = port_name, error = %e, "Could not open or write to port");
                None
            }
        }
    }

    /// Open, settle, send `BUCHI:WHO` and read one line. The port is returned
    /// only if the answer carries the handshake acknowledgement; otherwise it
    /// is dropped here, which closes it.
    fn handshake(&self, port_name: &str) -> Result<Option<PortHandle>, PortError> {
        let mut port = self
            .provider
            .open(port_name, &self.settings.port_configuration())?;
        debug!(port = port_name, "Opened candidate port");

        if !self.settings.settle.is_zero() {
            std::thread::sleep(self.settings.settle);
        }

        port.write_all_bytes(&protocol::encode(&Command::Who.body()))?;
        let response = read_line(port.as_mut(), self.settings.read_timeout)?;

        if protocol::is_handshake_ack(&response) {
            Ok(Some(port))
        } else {
            debug!(port = port_name, response = %response, "Handshake mismatch, not a BUCHI device");
            Ok(None)
        }
    }
}

/// Read one line, byte by byte, until `\n`, a port read timeout, or `timeout`
/// elapses. Whatever arrived is decoded lossily and trimmed.
///
/// `timeout` bounds the whole line: each byte read waits only for what is left
/// of it. The port's timeout is set back to `timeout` afterwards.
pub fn read_line(port: &mut dyn SerialPortAdapter, timeout: Duration) -> Result<String, PortError> {
    let deadline = Instant::now() + timeout;
    let line = read_until_deadline(port, deadline);
    port.set_timeout(timeout)?;
    Ok(String::from_utf8_lossy(&line?).trim().to_string())
}

fn read_until_deadline(
    port: &mut dyn SerialPortAdapter,
    deadline: Instant,
) -> Result<Vec<u8>, PortError> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        port.set_timeout(remaining)?;

        match port.read_bytes(&mut byte) {
            // Nothing arrived in time.
            Ok(0) => break,
            Ok(_) => {
                line.push(byte[0]);
                if byte[0] == b'\n' {
                    break;
                }
            }
            Err(e) if e.is_timeout() => break,
            Err(e) => return Err(e),
        }
    }

    Ok(line)
}
