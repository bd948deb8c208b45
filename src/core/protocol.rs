//! Control channel protocol
//!
//! The socket carries two kinds of frames: JSON control messages and raw
//! terminal output. Inbound classification is a try-parse: a text frame that
//! deserializes into the recognized status schema is control, anything else
//! (including malformed JSON and binary data) is output. Parse failures are
//! never fatal.

use serde::{Deserialize, Serialize};

/// Reserved websocket close code for a clean shutdown; every other code is
/// treated as abnormal.
pub const NORMAL_CLOSE_CODE: u16 = 1000;

/// A frame received from or sent over the transport.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// Outbound control message.
///
/// Keystrokes and paste text are sent raw, never wrapped in JSON; resize is
/// the only structured message the client emits.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Resize { cols: u16, rows: u16 },
}

/// A recognized inbound status, with kind-specific fields defaulted.
#[derive(Clone, Debug, PartialEq)]
pub enum Status {
    Connected,
    Rejected { reason: String },
    IdleWarning { remaining_secs: u64 },
    IdleTimeout,
    Exited { code: i64 },
    /// A well-formed status frame with an unrecognized kind. Ignored, so
    /// newer servers can add kinds without breaking older clients.
    Unknown,
}

/// Result of classifying one inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    Control(Status),
    Output(String),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum InboundMessage {
    #[serde(rename = "status")]
    Status(StatusPayload),
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default, rename = "remainingSec")]
    remaining_sec: Option<u64>,
    #[serde(default)]
    code: Option<i64>,
}

impl StatusPayload {
    fn into_status(self) -> Status {
        match self.msg.as_deref() {
            Some("connected") => Status::Connected,
            Some("rejected") => Status::Rejected {
                reason: self.reason.unwrap_or_else(|| "max sessions".to_string()),
            },
            Some("idle_warning") => Status::IdleWarning {
                remaining_secs: self.remaining_sec.unwrap_or(60),
            },
            Some("idle_timeout") => Status::IdleTimeout,
            Some("exited") => Status::Exited {
                code: self.code.unwrap_or(0),
            },
            _ => Status::Unknown,
        }
    }
}

/// Classify an inbound frame as control or output.
///
/// Binary frames are always output, decoded as UTF-8 (lossy). Text frames are
/// control only when they parse into the status schema with the `"status"`
/// discriminant; otherwise the text is output verbatim.
pub fn classify(frame: Frame) -> Inbound {
    match frame {
        Frame::Binary(data) => Inbound::Output(String::from_utf8_lossy(&data).into_owned()),
        Frame::Text(text) => match try_parse_status(&text) {
            Some(status) => Inbound::Control(status),
            None => Inbound::Output(text),
        },
    }
}

fn try_parse_status(text: &str) -> Option<Status> {
    let InboundMessage::Status(payload) = serde_json::from_str(text).ok()?;
    Some(payload.into_status())
}
