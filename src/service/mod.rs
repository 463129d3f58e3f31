//! Service layer over the device link.
//!
//! `DeviceLink` is synchronous and takes `&mut self`. `LinkService` is the one
//! place the HTTP handlers (and the CLI) reach it through: a shared mutex so
//! the handshake and every command take turns on the single physical port,
//! and `spawn_blocking` so a read waiting on the device never stalls the
//! async runtime.
//!
//! ```text
//! GET /write-url ──────┐
//! GET /validate-token ─┼──> LinkService ──> Arc<Mutex<DeviceLink>> ──> serial port
//! POST /discover ──────┘
//! ```

use crate::link::{DeviceLink, LinkError, LinkResult, LinkStatus};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared, serialized access to the device link.
#[derive(Debug, Clone)]
pub struct LinkService {
    link: Arc<Mutex<DeviceLink>>,
    /// Port to connect to instead of scanning.
    pinned_port: Option<String>,
}

impl LinkService {
    pub fn new(link: DeviceLink) -> Self {
        Self {
            link: Arc::new(Mutex::new(link)),
            pinned_port: None,
        }
    }

    /// Connect to `port` on every (re)connect instead of scanning all ports.
    pub fn with_pinned_port(mut self, port: Option<String>) -> Self {
        self.pinned_port = port;
        self
    }

    pub fn pinned_port(&self) -> Option<&str> {
        self.pinned_port.as_deref()
    }

    /// Connect to the device: the pinned port if configured, otherwise a full
    /// discovery scan. Returns the connected port name.
    pub async fn connect(&self) -> LinkResult<String> {
        match self.pinned_port.clone() {
            Some(port) => self.run(move |link| link.connect(&port)).await,
            None => self.run(DeviceLink::discover).await,
        }
    }

    /// Push a URL to the device, returning its answer.
    pub async fn write_url(&self, url: String) -> LinkResult<String> {
        self.run(move |link| link.write_url(&url)).await
    }

    /// Ask the device whether `token` is valid.
    pub async fn validate_token(&self, token: String) -> LinkResult<bool> {
        self.run(move |link| link.validate_token(&token)).await
    }

    pub async fn status(&self) -> LinkResult<LinkStatus> {
        self.run(|link| Ok(link.status())).await
    }

    /// Release the serial port. Safe to call more than once.
    pub async fn close(&self) -> LinkResult<()> {
        self.run(|link| {
            link.close();
            Ok(())
        })
        .await
    }

    /// Run `op` with exclusive access to the link on the blocking pool.
    async fn run<T, F>(&self, op: F) -> LinkResult<T>
    where
        F: FnOnce(&mut DeviceLink) -> LinkResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let link = Arc::clone(&self.link);
        tokio::task::spawn_blocking(move || op(&mut *link.lock()))
            .await
            .map_err(|e| LinkError::Worker(e.to_string()))?
    }
}
