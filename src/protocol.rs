//! BUCHI line protocol.
//!
//! Every command is one ASCII line `BUCHI:<OPERATION>[?<ARG>]` terminated by
//! CR+LF, and every answer is one line back. Arguments are sent verbatim, so
//! anything that would end the line early is refused up front.

use std::fmt;

/// Line terminator appended to every command.
pub const TERMINATOR: &str = "\r\n";

/// Substring that identifies the device in its answer to [`Command::Who`].
pub const HANDSHAKE_ACK: &str = "BUCHI:OK?";

/// Substring that marks an affirmative answer.
pub const OK_MARKER: &str = "BUCHI:OK";

/// A command understood by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Identification handshake.
    Who,
    /// Ask the device whether a token is valid.
    ValidateToken(String),
    /// Push a URL to the device.
    WriteUrl(String),
    /// A pre-formatted command body, sent as-is.
    Raw(String),
}

impl Command {
    /// The command body without terminator.
    pub fn body(&self) -> String {
        match self {
            Self::Who => "BUCHI:WHO".to_string(),
            Self::ValidateToken(token) => format!("BUCHI:VALIDATE.TOKEN?{token}"),
            Self::WriteUrl(url) => format!("BUCHI:WRITE.URL?{url}"),
            Self::Raw(body) => body.clone(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body())
    }
}

/// Frame a command body for the wire.
pub fn encode(body: &str) -> Vec<u8> {
    let mut line = Vec::with_capacity(body.len() + TERMINATOR.len());
    line.extend_from_slice(body.as_bytes());
    line.extend_from_slice(TERMINATOR.as_bytes());
    line
}

/// Check that `value` can travel inside a single protocol line.
///
/// Returns a description of the first offending character.
pub fn check_line_safe(value: &str) -> Result<(), String> {
    match value.char_indices().find(|(_, c)| c.is_control()) {
        Some((index, c)) => Err(format!(
            "control character {:?} at byte {index} would break command framing",
            c
        )),
        None => Ok(()),
    }
}

/// Whether a handshake answer identifies the device.
pub fn is_handshake_ack(response: &str) -> bool {
    response.contains(HANDSHAKE_ACK)
}

/// Whether an answer is affirmative.
pub fn is_ok(response: &str) -> bool {
    response.contains(OK_MARKER)
}
