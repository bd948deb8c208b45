//! User interface: input encoding and rendering.
//!
//! - **encoder**: Keyboard events to remote PTY payloads
//! - **renderer**: Plain-text scrollback view with a status line

pub mod encoder;
pub mod renderer;

pub use encoder::{Encoded, InputEncoder, Modifiers};
pub use renderer::Renderer;
