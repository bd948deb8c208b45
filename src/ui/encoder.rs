//! Keyboard input encoding
//!
//! Maps key events to the byte/text payloads the remote PTY expects. The
//! encoder is a pure function of key plus modifiers; it never touches the
//! transport. Chords it does not encode are either handed back to the host
//! for local handling ([`Encoded::PassThrough`]) or swallowed outright
//! ([`Encoded::Consumed`]).

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(m: KeyModifiers) -> Self {
        let mut mods = Modifiers::empty();
        if m.contains(KeyModifiers::SHIFT) {
            mods |= Modifiers::SHIFT;
        }
        if m.contains(KeyModifiers::CONTROL) {
            mods |= Modifiers::CTRL;
        }
        if m.contains(KeyModifiers::ALT) {
            mods |= Modifiers::ALT;
        }
        if m.intersects(KeyModifiers::SUPER | KeyModifiers::HYPER | KeyModifiers::META) {
            mods |= Modifiers::META;
        }
        mods
    }
}

/// What to do with one key event.
#[derive(Clone, Debug, PartialEq)]
pub enum Encoded {
    /// Raw bytes for the remote PTY.
    Bytes(Vec<u8>),
    /// Text for the remote PTY.
    Text(String),
    /// Not encoded; the host decides (local shortcuts live here).
    PassThrough,
    /// Swallowed entirely, neither sent nor handled locally.
    Consumed,
}

/// Stateless key-event encoder.
pub struct InputEncoder;

impl InputEncoder {
    /// Encode a key event for the remote session.
    pub fn encode(event: &KeyEvent) -> Encoded {
        let mods = Modifiers::from(event.modifiers);
        Self::encode_key(event.code, mods)
    }

    pub fn encode_key(code: KeyCode, mods: Modifiers) -> Encoded {
        if mods.contains(Modifiers::CTRL) {
            // Bare Ctrl+letter becomes the control byte; adding Shift or the
            // OS key turns the chord into a host shortcut instead.
            if !mods.intersects(Modifiers::SHIFT | Modifiers::META) {
                if let KeyCode::Char(ch) = code {
                    if ch.is_ascii_alphabetic() {
                        return Encoded::Bytes(vec![(ch.to_ascii_uppercase() as u8) - 0x40]);
                    }
                }
            }
            return Encoded::PassThrough;
        }

        if mods.intersects(Modifiers::ALT | Modifiers::META) {
            return Encoded::PassThrough;
        }

        match code {
            KeyCode::Char(ch) => Encoded::Text(ch.to_string()),
            KeyCode::Enter => Encoded::Text("\r".to_string()),
            KeyCode::Backspace => Encoded::Text("\x7f".to_string()),
            KeyCode::Tab => Encoded::Text("\t".to_string()),
            KeyCode::Esc => Encoded::Text("\x1b".to_string()),
            KeyCode::Up => Encoded::Text("\x1b[A".to_string()),
            KeyCode::Down => Encoded::Text("\x1b[B".to_string()),
            KeyCode::Right => Encoded::Text("\x1b[C".to_string()),
            KeyCode::Left => Encoded::Text("\x1b[D".to_string()),
            KeyCode::Home => Encoded::Text("\x1b[H".to_string()),
            KeyCode::End => Encoded::Text("\x1b[F".to_string()),
            KeyCode::Delete => Encoded::Text("\x1b[3~".to_string()),
            KeyCode::PageUp => Encoded::Text("\x1b[5~".to_string()),
            KeyCode::PageDown => Encoded::Text("\x1b[6~".to_string()),
            // Function keys have no binding in the remote sessions this
            // client targets; swallow them rather than leak raw sequences.
            KeyCode::F(_) => Encoded::Consumed,
            _ => Encoded::Consumed,
        }
    }

    /// Pasted text goes over the wire verbatim, line breaks included, as one
    /// payload.
    pub fn encode_paste(text: &str) -> &str {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, mods: Modifiers) -> Encoded {
        InputEncoder::encode_key(code, mods)
    }

    #[test]
    fn test_plain_chars_sent_as_text() {
        assert_eq!(key(KeyCode::Char('a'), Modifiers::empty()), Encoded::Text("a".into()));
        assert_eq!(key(KeyCode::Char(' '), Modifiers::empty()), Encoded::Text(" ".into()));
        assert_eq!(key(KeyCode::Char('A'), Modifiers::SHIFT), Encoded::Text("A".into()));
        assert_eq!(key(KeyCode::Char('ö'), Modifiers::empty()), Encoded::Text("ö".into()));
    }

    #[test]
    fn test_ctrl_letters_become_control_bytes() {
        for (i, ch) in ('a'..='z').enumerate() {
            assert_eq!(
                key(KeyCode::Char(ch), Modifiers::CTRL),
                Encoded::Bytes(vec![(i + 1) as u8]),
                "Ctrl+{}",
                ch
            );
        }
        // Uppercase report of the same chord maps identically.
        assert_eq!(key(KeyCode::Char('C'), Modifiers::CTRL), Encoded::Bytes(vec![0x03]));
    }

    #[test]
    fn test_ctrl_shift_passes_through_for_host() {
        for ch in ['c', 'v', 'r', 'q', 'l', 'x'] {
            assert_eq!(
                key(KeyCode::Char(ch), Modifiers::CTRL | Modifiers::SHIFT),
                Encoded::PassThrough
            );
        }
    }

    #[test]
    fn test_ctrl_nonletter_passes_through() {
        assert_eq!(key(KeyCode::Char('1'), Modifiers::CTRL), Encoded::PassThrough);
        assert_eq!(key(KeyCode::Left, Modifiers::CTRL), Encoded::PassThrough);
    }

    #[test]
    fn test_alt_and_meta_pass_through() {
        assert_eq!(key(KeyCode::Char('f'), Modifiers::ALT), Encoded::PassThrough);
        assert_eq!(key(KeyCode::Char('c'), Modifiers::META), Encoded::PassThrough);
        assert_eq!(
            key(KeyCode::Char('c'), Modifiers::CTRL | Modifiers::META),
            Encoded::PassThrough
        );
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(key(KeyCode::Enter, Modifiers::empty()), Encoded::Text("\r".into()));
        assert_eq!(key(KeyCode::Backspace, Modifiers::empty()), Encoded::Text("\x7f".into()));
        assert_eq!(key(KeyCode::Tab, Modifiers::empty()), Encoded::Text("\t".into()));
        assert_eq!(key(KeyCode::Esc, Modifiers::empty()), Encoded::Text("\x1b".into()));
    }

    #[test]
    fn test_navigation_keys() {
        assert_eq!(key(KeyCode::Up, Modifiers::empty()), Encoded::Text("\x1b[A".into()));
        assert_eq!(key(KeyCode::Down, Modifiers::empty()), Encoded::Text("\x1b[B".into()));
        assert_eq!(key(KeyCode::Right, Modifiers::empty()), Encoded::Text("\x1b[C".into()));
        assert_eq!(key(KeyCode::Left, Modifiers::empty()), Encoded::Text("\x1b[D".into()));
        assert_eq!(key(KeyCode::Home, Modifiers::empty()), Encoded::Text("\x1b[H".into()));
        assert_eq!(key(KeyCode::End, Modifiers::empty()), Encoded::Text("\x1b[F".into()));
        assert_eq!(key(KeyCode::PageUp, Modifiers::empty()), Encoded::Text("\x1b[5~".into()));
        assert_eq!(key(KeyCode::PageDown, Modifiers::empty()), Encoded::Text("\x1b[6~".into()));
        assert_eq!(key(KeyCode::Delete, Modifiers::empty()), Encoded::Text("\x1b[3~".into()));
    }

    #[test]
    fn test_function_keys_consumed() {
        for n in 1..=12 {
            assert_eq!(key(KeyCode::F(n), Modifiers::empty()), Encoded::Consumed);
        }
    }

    #[test]
    fn test_keys_outside_table_consumed() {
        // The encoding table is closed; anything unlisted produces nothing.
        assert_eq!(key(KeyCode::Insert, Modifiers::empty()), Encoded::Consumed);
        assert_eq!(key(KeyCode::CapsLock, Modifiers::empty()), Encoded::Consumed);
        assert_eq!(key(KeyCode::ScrollLock, Modifiers::empty()), Encoded::Consumed);
    }

    #[test]
    fn test_modifier_conversion_from_crossterm() {
        let mods = Modifiers::from(KeyModifiers::CONTROL | KeyModifiers::SHIFT);
        assert_eq!(mods, Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(Modifiers::from(KeyModifiers::SUPER), Modifiers::META);
        assert_eq!(Modifiers::from(KeyModifiers::HYPER), Modifiers::META);
    }

    #[test]
    fn test_paste_is_verbatim() {
        let text = "line one\nline two\r\n\ttabbed";
        assert_eq!(InputEncoder::encode_paste(text), text);
    }
}
