//! Transport boundary
//!
//! The session treats its channel as an abstract bidirectional byte/text
//! pipe with open/frame/close/error notifications. The concrete websocket
//! implementation lives in [`ws`]; tests substitute scripted transports.

pub mod ws;

use thiserror::Error;

use crate::core::protocol::Frame;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to connect: {0}")]
    Connect(#[source] tungstenite::Error),

    #[error("Failed to configure socket: {0}")]
    Configure(#[source] std::io::Error),

    #[error("Failed to send frame: {0}")]
    Send(#[source] tungstenite::Error),

    #[error("Transport is not open")]
    NotOpen,
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Notification surfaced by a transport when polled.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    /// The channel finished opening and is ready to carry frames.
    Opened,
    /// An inbound text or binary frame.
    Frame(Frame),
    /// The channel closed. `code` 1000 is a normal closure, anything else is
    /// abnormal.
    Closed { code: u16, reason: String },
    /// A transport-level failure; the channel is unusable afterwards.
    Error(String),
}

/// A live bidirectional channel. At most one exists per session; replacing
/// it releases the previous one first.
pub trait Transport {
    fn send_text(&mut self, text: &str) -> Result<()>;
    fn send_bytes(&mut self, data: &[u8]) -> Result<()>;

    /// Drain the next pending notification without blocking.
    fn poll(&mut self) -> Option<TransportEvent>;

    fn is_open(&self) -> bool;

    /// Initiate shutdown. Safe to call on an already-closed channel.
    fn close(&mut self);
}

/// Factory for transports, injected into the session so lifecycle logic can
/// be exercised without any real socket.
pub trait Connector {
    fn connect(&mut self) -> Result<Box<dyn Transport>>;
}
