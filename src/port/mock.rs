//! Mock serial port implementation for testing.
//!
//! `MockSerialPort` simulates a device without hardware: reads come from a
//! queue, writes are logged, and scripted replies can be attached to specific
//! requests so a reply only appears after the matching command is written.
//! `MockPortProvider` hands a fixed list of mock ports to discovery.

use super::error::PortError;
use super::traits::{CandidatePort, PortConfiguration, PortProvider, SerialPortAdapter};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Inner state of the mock port, shared between clones.
#[derive(Debug, Default)]
struct MockPortState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of all bytes written to the port.
    write_log: Vec<Vec<u8>>,
    /// Scripted replies: when a write equals the request, the reply is queued.
    replies: Vec<(Vec<u8>, Vec<u8>)>,
    /// Configured timeout duration.
    timeout: Duration,
    /// Sleep for the configured timeout before reporting an empty read.
    block_on_empty: bool,
    /// Fail every read and write with a broken-pipe error.
    broken: bool,
    /// Refuse to open through a provider.
    fail_open: bool,
    /// Number of times a provider opened this port.
    open_count: usize,
    /// Whether a provider-issued handle is currently alive.
    open: bool,
    /// Whether buffers have been cleared.
    buffers_cleared: bool,
}

/// Mock serial port implementation for testing.
///
/// # Example
/// ```
/// use buchi_bridge::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.reply_to(b"BUCHI:WHO\r\n", b"BUCHI:OK?\r\n");
///
/// port.write_bytes(b"BUCHI:WHO\r\n").unwrap();
///
/// let mut buffer = [0u8; 16];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"BUCHI:OK?\r\n");
/// assert_eq!(port.get_write_log(), vec![b"BUCHI:WHO\r\n".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    /// The port name/identifier.
    name: String,
    /// The internal state, shared by every clone of this port.
    state: Arc<Mutex<MockPortState>>,
    /// Set on clones handed out by `MockPortProvider::open`; dropping such a
    /// clone marks the port closed.
    handle: bool,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_secs(1),
                ..Default::default()
            })),
            handle: false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockPortState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.lock().read_queue.extend(data);
    }

    /// Queue `reply` for reading each time exactly `request` is written.
    pub fn reply_to(&mut self, request: &[u8], reply: &[u8]) {
        self.lock().replies.push((request.to_vec(), reply.to_vec()));
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.lock().write_log.clone()
    }

    /// Clear the write log.
    pub fn clear_write_log(&mut self) {
        self.lock().write_log.clear();
    }

    /// Make empty reads wait out the configured timeout, like a silent device.
    pub fn set_block_on_empty(&mut self, block: bool) {
        self.lock().block_on_empty = block;
    }

    /// Make every subsequent read and write fail.
    pub fn set_broken(&mut self, broken: bool) {
        self.lock().broken = broken;
    }

    /// Make the provider refuse to open this port.
    pub fn set_fail_open(&mut self, fail: bool) {
        self.lock().fail_open = fail;
    }

    /// Number of times a provider opened this port.
    pub fn open_count(&self) -> usize {
        self.lock().open_count
    }

    /// Whether a provider-issued handle to this port is still alive.
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// Get whether buffers have been cleared.
    pub fn was_cleared(&self) -> bool {
        self.lock().buffers_cleared
    }

    /// Currently configured timeout.
    pub fn timeout(&self) -> Duration {
        self.lock().timeout
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.lock().read_queue.len()
    }

    fn broken_pipe() -> PortError {
        PortError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "mock port is broken",
        ))
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.lock();
        if state.broken {
            return Err(Self::broken_pipe());
        }

        state.write_log.push(data.to_vec());

        let replies: Vec<u8> = state
            .replies
            .iter()
            .filter(|(request, _)| request.as_slice() == data)
            .flat_map(|(_, reply)| reply.iter().copied())
            .collect();
        state.read_queue.extend(replies);

        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let (bytes_read, wait) = {
            let mut state = self.lock();
            if state.broken {
                return Err(Self::broken_pipe());
            }

            let mut bytes_read = 0;
            for byte in buffer.iter_mut() {
                match state.read_queue.pop_front() {
                    Some(queued) => {
                        *byte = queued;
                        bytes_read += 1;
                    }
                    None => break,
                }
            }
            let wait = state.block_on_empty.then_some(state.timeout);
            (bytes_read, wait)
        };

        if bytes_read > 0 {
            return Ok(bytes_read);
        }

        // Same shape as a real port whose read timeout expired.
        if let Some(timeout) = wait {
            std::thread::sleep(timeout);
        }
        Err(PortError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "Operation timed out",
        )))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.lock().timeout = timeout;
        Ok(())
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        let mut state = self.lock();
        state.read_queue.clear();
        state.buffers_cleared = true;
        Ok(())
    }
}

impl Drop for MockSerialPort {
    fn drop(&mut self) {
        if self.handle {
            self.lock().open = false;
        }
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

/// Port provider over a fixed, ordered list of mock ports.
///
/// Keep clones of the ports to script them and to inspect what discovery did.
#[derive(Debug, Clone, Default)]
pub struct MockPortProvider {
    ports: Vec<MockSerialPort>,
}

impl MockPortProvider {
    pub fn new(ports: Vec<MockSerialPort>) -> Self {
        Self { ports }
    }

    /// Append a port to the end of the enumeration order.
    pub fn with_port(mut self, port: MockSerialPort) -> Self {
        self.ports.push(port);
        self
    }
}

impl PortProvider for MockPortProvider {
    fn candidates(&self) -> Result<Vec<CandidatePort>, PortError> {
        Ok(self
            .ports
            .iter()
            .map(|p| CandidatePort::named(p.name.clone()))
            .collect())
    }

    fn open(
        &self,
        port_name: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let port = self
            .ports
            .iter()
            .find(|p| p.name == port_name)
            .ok_or_else(|| PortError::not_found(port_name))?;

        {
            let mut state = port.lock();
            if state.fail_open {
                return Err(PortError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "Access is denied",
                )));
            }
            if state.open {
                return Err(PortError::Io(std::io::Error::new(
                    std::io::ErrorKind::AddrInUse,
                    "port is busy",
                )));
            }
            state.open = true;
            state.open_count += 1;
            state.timeout = config.timeout;
        }

        let mut handle = port.clone();
        handle.handle = true;
        Ok(Box::new(handle))
    }
}
