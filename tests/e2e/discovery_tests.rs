//! E2E tests for device discovery.
//!
//! These tests verify that discovery:
//! - Sends the handshake after the settle delay
//! - Connects to the first port that identifies itself
//! - Closes every port that does not, and survives ports that fail

use crate::common::*;
use buchi_bridge::{LinkError, LinkSettings, LinkStatus, MockSerialPort};
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};

#[test]
fn test_handshake_waits_for_settle_then_sends_who() {
    let port = buchi_device("COM3");
    let settings = LinkSettings {
        settle: Duration::from_millis(40),
        ..fast_settings()
    };
    let mut link = link_over(&[port.clone()], settings);

    let started = Instant::now();
    assert_eq!(link.discover().unwrap(), "COM3");
    assert!(started.elapsed() >= Duration::from_millis(40));

    assert_eq!(port.get_write_log(), vec![WHO.to_vec()]);
    assert!(matches!(link.status(), LinkStatus::Connected { .. }));
}

#[test]
fn test_candidate_opened_with_configured_timeout() {
    let port = buchi_device("COM3");
    let settings = LinkSettings {
        read_timeout: Duration::from_millis(75),
        ..fast_settings()
    };
    let mut link = link_over(&[port.clone()], settings);

    link.discover().unwrap();
    assert_eq!(port.timeout(), Duration::from_millis(75));
}

#[test]
fn test_first_answering_port_wins() {
    let stranger = answering_port("COM1", b"BUCHI:NO\r\n");
    let mute = MockSerialPort::new("COM2");
    let device = buchi_device("COM3");
    let second_device = buchi_device("COM4");
    let ports = [
        stranger.clone(),
        mute.clone(),
        device.clone(),
        second_device.clone(),
    ];
    let mut link = link_over(&ports, fast_settings());

    assert_eq!(link.discover().unwrap(), "COM3");

    // Non-matching candidates were opened once and closed again.
    for port in [&stranger, &mute] {
        assert_eq!(port.open_count(), 1);
        assert!(!port.is_open());
        assert_eq!(port.get_write_log(), vec![WHO.to_vec()]);
    }
    assert!(device.is_open());
    assert_eq!(second_device.open_count(), 0);

    let open: Vec<_> = ports.iter().filter(|p| p.is_open()).collect();
    assert_eq!(open.len(), 1);
}

#[test]
fn test_no_device_found_leaves_nothing_open() {
    let stranger = answering_port("COM1", b"BUCHI:NO\r\n");
    let mut link = link_over(&[stranger.clone()], fast_settings());

    assert!(matches!(link.discover(), Err(LinkError::DeviceNotFound)));
    assert!(!stranger.is_open());
    assert!(!link.is_connected());
    assert!(matches!(
        link.write_url("http://example.com"),
        Err(LinkError::NotConnected)
    ));
}

#[test]
fn test_no_ports_at_all() {
    let mut link = link_over(&[], fast_settings());
    assert!(matches!(link.discover(), Err(LinkError::DeviceNotFound)));
    assert_eq!(link.status(), LinkStatus::Uninitialized);
}

#[test]
fn test_ack_must_include_question_mark() {
    // A plain affirmative is not an identification.
    let almost = answering_port("COM1", b"BUCHI:OK\r\n");
    let chatty = answering_port("COM2", b"fw 2.1 BUCHI:OK? ready\r\n");
    let mut link = link_over(&[almost.clone(), chatty.clone()], fast_settings());

    assert_eq!(link.discover().unwrap(), "COM2");
    assert!(!almost.is_open());
}

#[test]
fn test_open_failure_does_not_stop_scan() {
    let mut locked = buchi_device("COM1");
    locked.set_fail_open(true);
    let device = buchi_device("COM2");
    let mut link = link_over(&[locked.clone(), device.clone()], fast_settings());

    assert_eq!(link.discover().unwrap(), "COM2");
    assert_eq!(locked.open_count(), 0);
    assert!(device.is_open());
}

#[test]
fn test_io_failure_during_handshake_does_not_stop_scan() {
    let mut broken = buchi_device("COM1");
    broken.set_broken(true);
    let device = buchi_device("COM2");
    let mut link = link_over(&[broken.clone(), device], fast_settings());

    assert_eq!(link.discover().unwrap(), "COM2");
    assert_eq!(broken.open_count(), 1);
    assert!(!broken.is_open());
}

#[test]
fn test_excluded_ports_are_never_opened() {
    let excluded = buchi_device("COM1");
    let device = buchi_device("COM2");
    let settings = LinkSettings {
        exclude_ports: vec!["com1".into()],
        ..fast_settings()
    };
    let mut link = link_over(&[excluded.clone(), device], settings);

    assert_eq!(link.discover().unwrap(), "COM2");
    assert_eq!(excluded.open_count(), 0);
    assert!(excluded.get_write_log().is_empty());
}

#[test]
fn test_silent_candidate_costs_one_read_timeout() {
    let silent = silent_port("COM1");
    let device = buchi_device("COM2");
    let mut link = link_over(&[silent.clone(), device], fast_settings());

    let started = Instant::now();
    assert_eq!(link.discover().unwrap(), "COM2");
    assert!(started.elapsed() >= READ_TIMEOUT);
    assert!(!silent.is_open());
}

#[test]
fn test_connect_runs_handshake_on_named_port() {
    let stranger = answering_port("COM1", b"BUCHI:NO\r\n");
    let device = buchi_device("COM2");
    let mut link = link_over(&[stranger.clone(), device.clone()], fast_settings());

    assert!(matches!(
        link.connect("COM1"),
        Err(LinkError::DeviceNotFound)
    ));
    assert!(!stranger.is_open());

    assert_eq!(link.connect("COM2").unwrap(), "COM2");
    assert_eq!(link.port_name(), Some("COM2"));
}

#[test]
fn test_discover_after_close_reconnects() {
    let device = buchi_device("COM3");
    let mut link = connected_link(&device);

    link.close();
    assert!(!device.is_open());

    assert_eq!(link.discover().unwrap(), "COM3");
    assert!(device.is_open());
    assert_eq!(device.open_count(), 2);
}
