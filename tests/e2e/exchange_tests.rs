//! E2E tests for command exchange on a connected link.

use crate::common::*;
use buchi_bridge::{Command, LinkError, LinkStatus};
use pretty_assertions::assert_eq;
use std::time::Instant;

#[test]
fn test_requests_fail_before_discover() {
    let mut link = link_over(&[buchi_device("COM3")], fast_settings());

    assert!(matches!(link.exchange("BUCHI:WHO"), Err(LinkError::NotConnected)));
    assert!(matches!(link.validate_token("t"), Err(LinkError::NotConnected)));
    assert!(matches!(link.write_url("u"), Err(LinkError::NotConnected)));
}

#[test]
fn test_requests_fail_after_close() {
    let device = buchi_device("COM3");
    let mut link = connected_link(&device);

    link.close();
    assert!(!device.is_open());
    assert!(matches!(link.write_url("u"), Err(LinkError::NotConnected)));
}

#[test]
fn test_close_twice() {
    let mut link = connected_link(&buchi_device("COM3"));
    link.close();
    link.close();
    assert_eq!(link.status(), LinkStatus::Closed);
}

#[test]
fn test_write_url_returns_trimmed_answer() {
    let mut device = buchi_device("COM3");
    device.reply_to(
        b"BUCHI:WRITE.URL?http://host/a?b=1&c=2\r\n",
        b"  BUCHI:URL STORED  \r\n",
    );
    let mut link = connected_link(&device);

    assert_eq!(
        link.write_url("http://host/a?b=1&c=2").unwrap(),
        "BUCHI:URL STORED"
    );
    assert_eq!(
        device.get_write_log().last().unwrap(),
        b"BUCHI:WRITE.URL?http://host/a?b=1&c=2\r\n"
    );
}

#[test]
fn test_write_url_command_against_ok_device() {
    let mut device = buchi_device("COM3");
    device.reply_to(b"BUCHI:WRITE.URL?x\r\n", b"BUCHI:OK\r\n");
    let mut link = connected_link(&device);

    let command = Command::WriteUrl("x".into());
    assert_eq!(link.send(&command).unwrap(), "BUCHI:OK");
}

#[test]
fn test_validate_token_answers() {
    let mut device = buchi_device("COM3");
    device.reply_to(b"BUCHI:VALIDATE.TOKEN?good\r\n", b"BUCHI:OK\r\n");
    device.reply_to(b"BUCHI:VALIDATE.TOKEN?wrapped\r\n", b"<BUCHI:OK>\r\n");
    device.reply_to(b"BUCHI:VALIDATE.TOKEN?bad\r\n", b"BUCHI:NO\r\n");
    let mut link = connected_link(&device);

    assert!(link.validate_token("good").unwrap());
    assert!(link.validate_token("wrapped").unwrap());
    assert!(!link.validate_token("bad").unwrap());
    // No answer at all.
    assert!(!link.validate_token("unknown").unwrap());
}

#[test]
fn test_silent_device_yields_empty_line_after_timeout() {
    let mut device = buchi_device("COM3");
    let mut link = connected_link(&device);
    device.set_block_on_empty(true);

    let started = Instant::now();
    assert_eq!(link.exchange("BUCHI:VALIDATE.TOKEN?t").unwrap(), "");
    assert!(started.elapsed() >= READ_TIMEOUT);
    assert!(link.is_connected());
}

#[test]
fn test_io_error_keeps_link_connected() {
    let mut device = buchi_device("COM3");
    device.reply_to(b"BUCHI:WRITE.URL?u\r\n", b"BUCHI:OK\r\n");
    let mut link = connected_link(&device);

    device.set_broken(true);
    assert!(matches!(link.write_url("u"), Err(LinkError::Io(_))));
    assert!(link.is_connected());

    device.set_broken(false);
    assert_eq!(link.write_url("u").unwrap(), "BUCHI:OK");
}

#[test]
fn test_control_characters_rejected_without_writing() {
    let device = buchi_device("COM3");
    let mut link = connected_link(&device);
    let writes = device.get_write_log().len();

    for bad in ["a\r\nBUCHI:WHO", "a\nb", "tab\there", "nul\0"] {
        assert!(
            matches!(link.write_url(bad), Err(LinkError::InvalidArgument(_))),
            "{:?} should be rejected",
            bad
        );
    }
    assert_eq!(device.get_write_log().len(), writes);
}

#[test]
fn test_one_line_per_exchange() {
    let mut device = buchi_device("COM3");
    device.reply_to(b"BUCHI:PING\r\n", b"BUCHI:A\r\nBUCHI:B\r\n");
    let mut link = connected_link(&device);

    assert_eq!(link.send(&Command::Raw("BUCHI:PING".into())).unwrap(), "BUCHI:A");
    // The second line stays buffered for the next reader.
    assert_eq!(device.available_bytes(), b"BUCHI:B\r\n".len());
}
