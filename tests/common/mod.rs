//! Shared test utilities for the BUCHI bridge tests.
//!
//! - Mock ports scripted to behave like a BUCHI device or a stranger
//! - Links and services with fast timeouts
//! - An HTTP test server on an ephemeral port

#![allow(dead_code)]

use buchi_bridge::{DeviceLink, LinkService, LinkSettings, MockPortProvider, MockSerialPort};
use serde_json::Value;
use std::time::Duration;

/// What discovery writes to every candidate.
pub const WHO: &[u8] = b"BUCHI:WHO\r\n";

/// Read timeout used by most tests.
pub const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Settings with no settle delay and a short read timeout.
pub fn fast_settings() -> LinkSettings {
    LinkSettings {
        read_timeout: READ_TIMEOUT,
        settle: Duration::ZERO,
        ..LinkSettings::default()
    }
}

/// A mock port that answers the handshake like a BUCHI device.
pub fn buchi_device(port_name: &str) -> MockSerialPort {
    answering_port(port_name, b"BUCHI:OK?\r\n")
}

/// A mock port that answers the handshake with `reply`.
pub fn answering_port(port_name: &str, reply: &[u8]) -> MockSerialPort {
    let mut port = MockSerialPort::new(port_name);
    port.reply_to(WHO, reply);
    port
}

/// A mock port that never answers and waits out the read timeout.
pub fn silent_port(port_name: &str) -> MockSerialPort {
    let mut port = MockSerialPort::new(port_name);
    port.set_block_on_empty(true);
    port
}

/// A link over `ports`, in enumeration order. Keep clones to inspect them.
pub fn link_over(ports: &[MockSerialPort], settings: LinkSettings) -> DeviceLink {
    DeviceLink::new(MockPortProvider::new(ports.to_vec()), settings)
}

/// A link already connected to `port`, which must answer the handshake.
pub fn connected_link(port: &MockSerialPort) -> DeviceLink {
    let mut link = link_over(std::slice::from_ref(port), fast_settings());
    link.discover().expect("mock device should answer the handshake");
    link
}

pub fn service_over(ports: &[MockSerialPort]) -> LinkService {
    LinkService::new(link_over(ports, fast_settings()))
}

/// Assert that every field of `expected` is present in `actual` with the same value.
pub fn assert_json_contains(actual: &Value, expected: &Value) {
    match (actual, expected) {
        (Value::Object(actual_map), Value::Object(expected_map)) => {
            for (key, expected_value) in expected_map {
                let actual_value = actual_map
                    .get(key)
                    .unwrap_or_else(|| panic!("Expected key '{}' not found in {}", key, actual));
                assert_json_contains(actual_value, expected_value);
            }
        }
        _ => assert_eq!(actual, expected, "JSON values differ"),
    }
}

#[cfg(feature = "rest-api")]
pub use server::TestServer;

#[cfg(feature = "rest-api")]
mod server {
    use buchi_bridge::rest_api::{self, RestContext};
    use buchi_bridge::LinkService;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;

    /// The REST API served on `127.0.0.1:0` for the lifetime of the value.
    pub struct TestServer {
        pub base_url: String,
        pub service: LinkService,
        pub client: reqwest::Client,
        shutdown: Option<oneshot::Sender<()>>,
        handle: Option<JoinHandle<std::io::Result<()>>>,
    }

    impl TestServer {
        pub async fn start(service: LinkService) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral port");
            let addr = listener.local_addr().expect("local addr");
            let (tx, rx) = oneshot::channel::<()>();

            let ctx = RestContext {
                service: service.clone(),
            };
            let handle = tokio::spawn(rest_api::serve(listener, ctx, async {
                let _ = rx.await;
            }));

            Self {
                base_url: format!("http://{}", addr),
                service,
                client: reqwest::Client::new(),
                shutdown: Some(tx),
                handle: Some(handle),
            }
        }

        pub fn url(&self, path: &str) -> String {
            format!("{}{}", self.base_url, path)
        }

        /// Stop accepting connections and wait for the server task.
        pub async fn stop(mut self) {
            if let Some(tx) = self.shutdown.take() {
                let _ = tx.send(());
            }
            if let Some(handle) = self.handle.take() {
                handle
                    .await
                    .expect("server task panicked")
                    .expect("server returned an error");
            }
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            if let Some(tx) = self.shutdown.take() {
                let _ = tx.send(());
            }
        }
    }
}
