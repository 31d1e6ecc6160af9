//! Manager wire format parsing
//!
//! After the one-line banner every message is a block of `Key: Value` lines
//! closed by an empty line. `Response: Follows` blocks from older Asterisk
//! releases carry raw command output lines ending in `--END COMMAND--`.

use bytes::BytesMut;
use indexmap::IndexMap;
use tracing::{error, trace};

use crate::{
    constants::*,
    error::{DialplanError, DialplanResult},
};

const END_COMMAND: &str = "--END COMMAND--";

/// Message category, taken from its first header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageType {
    /// `Response: <status>`
    Response(String),
    /// `Event: <name>`
    Event(String),
    /// Neither header present
    Unknown,
}

/// Parsed manager message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmiMessage {
    pub message_type: MessageType,
    /// Headers in wire order. Repeated `Output` headers go to [`output`](Self::output).
    pub headers: IndexMap<String, String>,
    /// Command output lines
    pub output: Vec<String>,
}

impl AmiMessage {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .map(String::as_str)
    }

    pub fn action_id(&self) -> Option<&str> {
        self.header(HEADER_ACTION_ID)
    }

    pub fn is_event(&self) -> bool {
        matches!(self.message_type, MessageType::Event(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    WaitingForBanner,
    WaitingForMessage,
}

/// Incremental parser fed from the socket
///
/// Bytes accumulate until a CRLF (banner) or CRLF CRLF (message) terminator
/// arrives; each complete frame is split off the front of the buffer.
pub struct AmiParser {
    buffer: BytesMut,
    state: ParseState,
}

impl AmiParser {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(BUF_CHUNK),
            state: ParseState::WaitingForBanner,
        }
    }

    /// Append socket data. Fails once an unterminated frame outgrows the limit.
    pub fn add_data(&mut self, data: &[u8]) -> DialplanResult<()> {
        self.buffer
            .extend_from_slice(data);
        let pending = self
            .buffer
            .len();
        if pending > MAX_BUFFER_SIZE {
            error!(
                "Receive buffer holds {} bytes without a complete message (limit {})",
                pending, MAX_BUFFER_SIZE
            );
            return Err(DialplanError::BufferOverflow {
                size: pending,
                limit: MAX_BUFFER_SIZE,
            });
        }
        Ok(())
    }

    /// Split off one frame ending in `terminator`, without the terminator.
    fn take_frame(&mut self, terminator: &str, what: &str) -> DialplanResult<Option<String>> {
        let terminator = terminator.as_bytes();
        let Some(pos) = self
            .buffer
            .windows(terminator.len())
            .position(|w| w == terminator)
        else {
            return Ok(None);
        };
        let mut frame = self
            .buffer
            .split_to(pos + terminator.len());
        frame.truncate(pos);
        trace!("[PARSE] {} frame of {} bytes", what, pos);

        String::from_utf8(frame.to_vec())
            .map(Some)
            .map_err(|_| DialplanError::protocol_error(format!("Invalid UTF-8 in {}", what)))
    }

    /// The `Asterisk Call Manager/x.y.z` line, once it has arrived
    pub fn parse_banner(&mut self) -> DialplanResult<Option<String>> {
        if self.state != ParseState::WaitingForBanner {
            return Err(DialplanError::protocol_error("banner already consumed"));
        }
        let Some(banner) = self.take_frame(LINE_TERMINATOR, "banner")? else {
            return Ok(None);
        };
        if !banner.starts_with(AMI_BANNER_PREFIX) {
            return Err(DialplanError::protocol_error(format!(
                "unexpected banner {:?}",
                banner
            )));
        }
        self.state = ParseState::WaitingForMessage;
        Ok(Some(banner))
    }

    /// Next complete message, or `None` if more data is needed
    pub fn parse_message(&mut self) -> DialplanResult<Option<AmiMessage>> {
        if self.state != ParseState::WaitingForMessage {
            return Err(DialplanError::protocol_error("banner not received yet"));
        }
        while let Some(text) = self.take_frame(MESSAGE_TERMINATOR, "message")? {
            // stray blank lines between messages
            if text
                .trim()
                .is_empty()
            {
                continue;
            }
            return parse_block(&text).map(Some);
        }
        Ok(None)
    }
}

impl Default for AmiParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_block(text: &str) -> DialplanResult<AmiMessage> {
    let mut headers = IndexMap::new();
    let mut output = Vec::new();
    let mut follows = false;

    for line in text.split(LINE_TERMINATOR) {
        if line.is_empty() {
            continue;
        }
        if follows && !looks_like_header(line) {
            if line != END_COMMAND {
                output.push(
                    line.strip_suffix(END_COMMAND)
                        .unwrap_or(line)
                        .trim_end()
                        .to_string(),
                );
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            return Err(DialplanError::InvalidHeader {
                header: line.to_string(),
            });
        };
        let key = key.trim();
        let value = value.trim();
        if key == HEADER_OUTPUT {
            output.push(value.to_string());
            continue;
        }
        if key == HEADER_RESPONSE && value.eq_ignore_ascii_case("Follows") {
            follows = true;
        }
        headers.insert(key.to_string(), value.to_string());
    }

    let message_type = if let Some(status) = headers.get(HEADER_RESPONSE) {
        MessageType::Response(status.clone())
    } else if let Some(name) = headers.get(HEADER_EVENT) {
        MessageType::Event(name.clone())
    } else {
        MessageType::Unknown
    };

    Ok(AmiMessage {
        message_type,
        headers,
        output,
    })
}

/// `Key: Value` where the key is a single token
fn looks_like_header(line: &str) -> bool {
    match line.split_once(": ") {
        Some((key, _)) => {
            !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        None => false,
    }
}
