//! Session lifecycle management
//!
//! One `Session` is the single logical connection to a remote PTY. It owns
//! the transport handle, drives the connection state machine from transport
//! events and inbound status messages, and feeds filtered output into the
//! scrollback buffer.
//!
//! Everything runs on one cooperative loop: the host polls the transport,
//! forwards input, and calls [`Session::tick`] so the deferred timers
//! (disconnect notice, close grace, resize debounce) fire without threads.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::filter::filter;
use super::protocol::{classify, ClientMessage, Frame, Inbound, Status, NORMAL_CLOSE_CODE};
use super::scrollback::Scrollback;
use crate::transport::{Connector, Transport, TransportError, TransportEvent};

/// Delay before surfacing the "connection lost" notice after an abnormal
/// close. Cancelled by a reconnect in the meantime.
const DISCONNECT_NOTICE_DELAY: Duration = Duration::from_millis(1000);
/// Grace period between sending the shell exit line and force-closing the
/// transport, giving the remote shell a chance to exit cleanly.
const CLOSE_GRACE_DELAY: Duration = Duration::from_millis(500);
/// Quiet period applied to geometry-change resize notifications.
const RESIZE_DEBOUNCE: Duration = Duration::from_millis(250);

/// Connection state. The idle warning is auxiliary display state, not a
/// state of its own; it only matters while Connected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnState {
    Disconnected,
    Connecting,
    Connected,
}

/// Drawable area in pixels, as reported by the hosting surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    pub width: f64,
    pub height: f64,
}

/// The session: transport owner, state machine, and output sink.
pub struct Session {
    state: ConnState,
    transport: Option<Box<dyn Transport>>,
    connector: Box<dyn Connector>,
    scrollback: Scrollback,
    font_size: f64,
    geometry: Option<Geometry>,
    idle_warning: bool,
    idle_remaining_secs: u64,
    /// Bumped on every reconnect; a deferred notice fires only if it still
    /// belongs to the generation that scheduled it.
    generation: u64,
    disconnect_notice_at: Option<(u64, Instant)>,
    close_grace_at: Option<Instant>,
    resize_at: Option<Instant>,
    dirty: bool,
}

impl Session {
    pub fn new(connector: Box<dyn Connector>, font_size: f64, scrollback_lines: usize) -> Self {
        Self {
            state: ConnState::Disconnected,
            transport: None,
            connector,
            scrollback: Scrollback::with_capacity(scrollback_lines),
            font_size,
            geometry: None,
            idle_warning: false,
            idle_remaining_secs: 0,
            generation: 0,
            disconnect_notice_at: None,
            close_grace_at: None,
            resize_at: None,
            dirty: true,
        }
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    pub fn idle_warning(&self) -> bool {
        self.idle_warning
    }

    pub fn idle_remaining_secs(&self) -> u64 {
        self.idle_remaining_secs
    }

    /// True once per change that requires a redraw.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Open a new transport. Valid only from Disconnected; the transition to
    /// Connected completes when the transport reports `Opened`.
    pub fn connect(&mut self, _now: Instant) -> Result<(), TransportError> {
        if self.state != ConnState::Disconnected {
            return Ok(());
        }
        info!("connecting");
        self.state = ConnState::Connecting;
        self.dirty = true;
        match self.connector.connect() {
            Ok(transport) => {
                self.transport = Some(transport);
                Ok(())
            }
            Err(e) => {
                self.state = ConnState::Disconnected;
                Err(e)
            }
        }
    }

    /// Tear down any existing transport (harmless if none), clear rendered
    /// output, and connect again. User-initiated; nothing reconnects
    /// automatically.
    pub fn reconnect(&mut self, now: Instant) -> Result<(), TransportError> {
        info!("reconnecting");
        self.generation += 1;
        self.disconnect_notice_at = None;
        self.close_grace_at = None;
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.scrollback.clear();
        self.state = ConnState::Disconnected;
        self.idle_warning = false;
        self.dirty = true;
        self.connect(now)
    }

    /// Ask the remote shell to exit, then force-close the transport after a
    /// grace delay if it is still open by then.
    pub fn close(&mut self, now: Instant) {
        if self.state != ConnState::Connected {
            return;
        }
        if let Some(transport) = self.transport.as_mut() {
            if transport.is_open() {
                info!("requesting shell exit");
                if let Err(e) = transport.send_text("exit\r") {
                    warn!(error = %e, "failed to send exit");
                }
                self.close_grace_at = Some(now + CLOSE_GRACE_DELAY);
            }
        }
    }

    /// Drain and apply all pending transport notifications.
    pub fn poll_transport(&mut self, now: Instant) {
        loop {
            let event = match self.transport.as_mut().and_then(|t| t.poll()) {
                Some(event) => event,
                None => break,
            };
            self.handle_event(event, now);
        }
    }

    /// Apply one transport notification to the state machine.
    pub fn handle_event(&mut self, event: TransportEvent, now: Instant) {
        match event {
            TransportEvent::Opened => {
                info!("transport open");
                self.state = ConnState::Connected;
                self.idle_warning = false;
                self.dirty = true;
                self.send_resize();
            }
            TransportEvent::Frame(frame) => self.handle_frame(frame),
            TransportEvent::Closed { code, reason } => {
                info!(code, %reason, "transport closed");
                let was_disconnected = self.state == ConnState::Disconnected;
                self.state = ConnState::Disconnected;
                self.transport = None;
                self.dirty = true;
                if code != NORMAL_CLOSE_CODE && !was_disconnected {
                    self.disconnect_notice_at =
                        Some((self.generation, now + DISCONNECT_NOTICE_DELAY));
                }
            }
            TransportEvent::Error(err) => {
                warn!(%err, "transport error");
                self.state = ConnState::Disconnected;
                self.transport = None;
                self.dirty = true;
            }
        }
    }

    /// Fire any timers that have come due. Called every loop iteration.
    pub fn tick(&mut self, now: Instant) {
        if let Some((generation, at)) = self.disconnect_notice_at {
            if now >= at {
                self.disconnect_notice_at = None;
                // A reconnect in the meantime bumps the generation and makes
                // this notice stale.
                if generation == self.generation && self.state == ConnState::Disconnected {
                    self.append_output(
                        "\r\n[Connection lost. Press Ctrl+Shift+R to start a new session.]\r\n",
                    );
                }
            }
        }

        if let Some(at) = self.close_grace_at {
            if now >= at {
                self.close_grace_at = None;
                // The handle may already be gone if the server closed first.
                if let Some(mut transport) = self.transport.take() {
                    if transport.is_open() {
                        transport.close();
                    }
                }
                self.state = ConnState::Disconnected;
                self.dirty = true;
            }
        }

        if let Some(at) = self.resize_at {
            if now >= at {
                self.resize_at = None;
                self.send_resize();
            }
        }
    }

    /// Record a new drawable area. The resize notification is debounced so
    /// continuous host resizing does not flood the control channel.
    pub fn update_geometry(&mut self, geometry: Geometry, now: Instant) {
        self.geometry = Some(geometry);
        self.resize_at = Some(now + RESIZE_DEBOUNCE);
        self.dirty = true;
    }

    /// Change the font scale used for cell estimation and notify the remote
    /// end immediately.
    pub fn set_font_size(&mut self, font_size: f64) {
        self.font_size = font_size;
        self.dirty = true;
        self.send_resize();
    }

    /// Terminal size in whole cells, estimated from the drawable area and
    /// the font scale, with an 80x24 fallback when nothing is measurable.
    pub fn winsize(&self) -> (u16, u16) {
        let Some(geometry) = self.geometry else {
            return (80, 24);
        };
        let char_width = self.font_size * 0.6;
        let char_height = self.font_size * 1.2;
        let cols = (geometry.width / char_width).floor();
        let rows = (geometry.height / char_height).floor();
        let cols = if cols.is_finite() && cols >= 1.0 {
            cols as u16
        } else {
            80
        };
        let rows = if rows.is_finite() && rows >= 1.0 {
            rows as u16
        } else {
            24
        };
        (cols, rows)
    }

    /// Send encoded input bytes. No-op unless the transport is open.
    pub fn send_bytes(&mut self, data: &[u8]) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        if !transport.is_open() {
            return;
        }
        if let Err(e) = transport.send_bytes(data) {
            warn!(error = %e, "failed to send input");
        }
    }

    /// Send input text verbatim. No-op unless the transport is open.
    pub fn send_text(&mut self, text: &str) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        if !transport.is_open() {
            return;
        }
        if let Err(e) = transport.send_text(text) {
            warn!(error = %e, "failed to send input");
        }
    }

    /// Send pasted text as a single frame.
    pub fn send_paste(&mut self, text: &str) {
        if !text.is_empty() {
            self.send_text(text);
        }
    }

    /// Empty the rendered output.
    pub fn clear_output(&mut self) {
        self.scrollback.clear();
        self.dirty = true;
    }

    fn handle_frame(&mut self, frame: Frame) {
        match classify(frame) {
            Inbound::Control(status) => self.apply_status(status),
            Inbound::Output(text) => self.append_output(&text),
        }
    }

    fn apply_status(&mut self, status: Status) {
        match status {
            Status::Connected => {
                self.state = ConnState::Connected;
                self.dirty = true;
            }
            Status::Rejected { reason } => {
                info!(%reason, "session rejected");
                self.state = ConnState::Disconnected;
                self.append_output(&format!("[Connection rejected: {}]\r\n", reason));
            }
            Status::IdleWarning { remaining_secs } => {
                self.idle_warning = true;
                self.idle_remaining_secs = remaining_secs;
                self.dirty = true;
            }
            Status::IdleTimeout => {
                // The server closes the transport shortly after; don't force
                // it from this side.
                self.idle_warning = false;
                self.append_output("\r\n[Session terminated: idle timeout]\r\n");
            }
            Status::Exited { code } => {
                info!(code, "remote shell exited");
                self.state = ConnState::Disconnected;
                self.append_output(&format!("\r\n[Session ended (exit code: {})]\r\n", code));
            }
            Status::Unknown => {}
        }
    }

    fn append_output(&mut self, text: &str) {
        self.scrollback.append(&filter(text));
        self.dirty = true;
    }

    fn send_resize(&mut self) {
        let (cols, rows) = self.winsize();
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        if !transport.is_open() {
            return;
        }
        match serde_json::to_string(&ClientMessage::Resize { cols, rows }) {
            Ok(json) => {
                debug!(cols, rows, "sending resize");
                if let Err(e) = transport.send_text(&json) {
                    warn!(error = %e, "failed to send resize");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode resize"),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }
}
