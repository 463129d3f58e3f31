//! Handshake and exchange against a real BUCHI device.
//!
//! Environment:
//! - `BUCHI_BRIDGE_TEST_PORT`: serial port the device is attached to
//! - `BUCHI_BRIDGE_TEST_BAUD`: baud rate (default 115200)

use buchi_bridge::{DeviceLink, LinkSettings, LinkStatus, PortProvider, SystemPorts};
use serial_test::serial;
use std::env;
use std::time::Duration;

fn test_port() -> Option<String> {
    let port = env::var("BUCHI_BRIDGE_TEST_PORT").ok();
    if port.is_none() {
        println!("Skipping: BUCHI_BRIDGE_TEST_PORT not set");
    }
    port
}

fn hardware_settings() -> LinkSettings {
    LinkSettings {
        baud_rate: env::var("BUCHI_BRIDGE_TEST_BAUD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(115_200),
        read_timeout: Duration::from_secs(1),
        settle: Duration::from_secs(2),
        ..LinkSettings::default()
    }
}

#[test]
fn test_port_is_enumerated() {
    let Some(port) = test_port() else { return };

    let candidates = SystemPorts.candidates().unwrap();
    assert!(
        candidates.iter().any(|c| c.port_name == port),
        "{} not among {:?}",
        port,
        candidates
    );
}

#[test]
#[serial]
fn test_handshake_on_named_port() {
    let Some(port) = test_port() else { return };

    let mut link = DeviceLink::system(hardware_settings());
    assert_eq!(link.connect(&port).unwrap(), port);
    assert!(matches!(link.status(), LinkStatus::Connected { .. }));

    // An unknown token must not validate.
    assert!(!link.validate_token("buchi-bridge-hardware-test").unwrap());

    link.close();
    assert_eq!(link.status(), LinkStatus::Closed);
}

#[test]
#[serial]
fn test_discovery_finds_device() {
    let Some(port) = test_port() else { return };

    let mut link = DeviceLink::system(hardware_settings());
    assert_eq!(link.discover().unwrap(), port);
    link.close();
}
