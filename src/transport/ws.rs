//! WebSocket transport
//!
//! A `tungstenite` client in binary-capable text mode. The underlying TCP
//! stream is switched to non-blocking after the handshake so the single event
//! loop can drain frames with `poll` between input events; nothing here
//! blocks or spawns.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::net::TcpStream;

use tracing::debug;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::{Connector, Result, Transport, TransportError, TransportEvent};
use crate::core::protocol::{Frame, NORMAL_CLOSE_CODE};

/// Close code reported when the peer drops without a close handshake.
const ABNORMAL_CLOSE_CODE: u16 = 1006;

/// Factory dialing a fixed endpoint URL.
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

impl Connector for WsConnector {
    fn connect(&mut self) -> Result<Box<dyn Transport>> {
        Ok(Box::new(WsTransport::dial(&self.url)?))
    }
}

/// A live websocket channel.
pub struct WsTransport {
    socket: Option<WebSocket<MaybeTlsStream<TcpStream>>>,
    queued: VecDeque<TransportEvent>,
}

impl WsTransport {
    /// Complete the handshake against `url` and switch to non-blocking I/O.
    pub fn dial(url: &str) -> Result<Self> {
        let (mut socket, response) =
            tungstenite::connect(url).map_err(TransportError::Connect)?;
        debug!(url, status = %response.status(), "websocket handshake complete");

        if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
            stream
                .set_nonblocking(true)
                .map_err(TransportError::Configure)?;
        }

        // The blocking handshake already succeeded, so the open notification
        // is delivered on the first poll.
        let mut queued = VecDeque::new();
        queued.push_back(TransportEvent::Opened);

        Ok(Self {
            socket: Some(socket),
            queued,
        })
    }
}

impl Transport for WsTransport {
    fn send_text(&mut self, text: &str) -> Result<()> {
        let socket = self.socket.as_mut().ok_or(TransportError::NotOpen)?;
        match socket.send(Message::Text(text.to_string())) {
            Ok(()) => Ok(()),
            // Queued inside tungstenite; flushed on a later poll.
            Err(tungstenite::Error::Io(e)) if e.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(TransportError::Send(e)),
        }
    }

    fn send_bytes(&mut self, data: &[u8]) -> Result<()> {
        let socket = self.socket.as_mut().ok_or(TransportError::NotOpen)?;
        match socket.send(Message::Binary(data.to_vec())) {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::Io(e)) if e.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(TransportError::Send(e)),
        }
    }

    fn poll(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.queued.pop_front() {
            return Some(event);
        }

        let socket = self.socket.as_mut()?;

        // Push out anything still buffered from a WouldBlock send.
        match socket.flush() {
            Ok(()) => {}
            Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {}
            Err(_) => {}
        }

        match socket.read() {
            Ok(Message::Text(text)) => Some(TransportEvent::Frame(Frame::Text(text))),
            Ok(Message::Binary(data)) => Some(TransportEvent::Frame(Frame::Binary(data))),
            Ok(Message::Close(frame)) => {
                let (code, reason) = frame
                    .map(|f| (u16::from(f.code), f.reason.into_owned()))
                    .unwrap_or((NORMAL_CLOSE_CODE, String::new()));
                self.socket = None;
                Some(TransportEvent::Closed { code, reason })
            }
            // Ping/pong and raw frames are handled inside tungstenite.
            Ok(_) => None,
            Err(tungstenite::Error::Io(e)) if e.kind() == ErrorKind::WouldBlock => None,
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                // EOF without a close handshake.
                self.socket = None;
                Some(TransportEvent::Closed {
                    code: ABNORMAL_CLOSE_CODE,
                    reason: String::new(),
                })
            }
            Err(e) => {
                self.socket = None;
                Some(TransportEvent::Error(e.to_string()))
            }
        }
    }

    fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None);
            let _ = socket.flush();
        }
    }
}
