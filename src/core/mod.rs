//! Core session components.
//!
//! This module contains the transport-independent session logic:
//!
//! - **filter**: ANSI/VT escape sequence stripping for plain-text display
//! - **scrollback**: Bounded output buffer
//! - **protocol**: Control channel message schema and frame classification
//! - **session**: Lifecycle state machine tying the above to a transport
//!
//! # Data flow
//!
//! ```text
//! Transport ──frames──▶ Session
//!                       ├── protocol::classify (control vs output)
//!                       ├── filter (strip escapes from output)
//!                       └── Scrollback (bounded text for the renderer)
//! ```

pub mod filter;
pub mod protocol;
pub mod scrollback;
pub mod session;
