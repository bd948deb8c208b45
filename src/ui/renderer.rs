//! Terminal renderer using crossterm
//!
//! Draws the session scrollback as plain text, pinned to the newest line,
//! with a one-row status bar at the bottom. No cell grid and no attribute
//! handling; escape sequences are already stripped before text reaches the
//! scrollback.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    style::{Attribute, ResetColor, SetAttribute},
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use unicode_width::UnicodeWidthChar;

use crate::core::scrollback::Scrollback;
use crate::core::session::ConnState;

/// Terminal renderer
pub struct Renderer {
    initialized: bool,
    url: String,
}

impl Renderer {
    pub fn new(url: String) -> Self {
        Self {
            initialized: false,
            url,
        }
    }

    /// Initialize the terminal for rendering
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableBracketedPaste,
            DisableLineWrap,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;
        stdout.flush()?;
        self.initialized = true;
        Ok(())
    }

    /// Cleanup the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();
        let _ = execute!(stdout, ResetColor, SetAttribute(Attribute::Reset));
        let _ = execute!(stdout, Show, EnableLineWrap);
        let _ = execute!(stdout, DisableBracketedPaste);
        let _ = execute!(stdout, LeaveAlternateScreen);
        let _ = stdout.flush();

        terminal::disable_raw_mode()?;
        println!();
        Ok(())
    }

    /// Render the scrollback tail and the status line.
    pub fn render(
        &mut self,
        scrollback: &Scrollback,
        state: ConnState,
        idle_warning: Option<u64>,
    ) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        if rows == 0 {
            return Ok(());
        }

        let stdout = io::stdout();
        let mut stdout = io::BufWriter::with_capacity(65536, stdout.lock());

        execute!(stdout, Hide)?;

        // Everything above the status line shows the newest scrollback lines.
        let content_rows = (rows - 1) as usize;
        let lines: Vec<&str> = scrollback.lines().collect();
        let start = lines.len().saturating_sub(content_rows);

        for row in 0..content_rows {
            execute!(stdout, MoveTo(0, row as u16))?;
            write!(stdout, "\x1b[K")?;
            if let Some(line) = lines.get(start + row) {
                write!(stdout, "{}", clip_line(line, cols as usize))?;
            }
        }

        execute!(stdout, MoveTo(0, rows - 1))?;
        write!(stdout, "\x1b[K")?;
        execute!(stdout, SetAttribute(Attribute::Reverse))?;
        write!(
            stdout,
            "{}",
            clip_line(&status_text(&self.url, state, idle_warning), cols as usize)
        )?;
        execute!(stdout, SetAttribute(Attribute::Reset))?;

        stdout.flush()?;
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Truncate a line to at most `max_width` display columns, dropping the
/// trailing CR left by CRLF line endings.
fn clip_line(line: &str, max_width: usize) -> String {
    let line = line.trim_end_matches('\r');
    let mut out = String::new();
    let mut width = 0;
    for ch in line.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width {
            break;
        }
        width += w;
        out.push(ch);
    }
    out
}

/// Status line content for the current connection state.
fn status_text(url: &str, state: ConnState, idle_warning: Option<u64>) -> String {
    match state {
        ConnState::Connected => match idle_warning {
            Some(secs) => format!(
                " connected {} | idle, closing in {}s (press any key) ",
                url, secs
            ),
            None => format!(
                " connected {} | Ctrl+Shift+R new  Ctrl+Shift+X close  Ctrl+Shift+Q quit ",
                url
            ),
        },
        ConnState::Connecting => format!(" connecting {} ... ", url),
        ConnState::Disconnected => format!(
            " disconnected {} | Ctrl+Shift+R new session  Ctrl+Shift+Q quit ",
            url
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_line_ascii() {
        assert_eq!(clip_line("hello world", 5), "hello");
        assert_eq!(clip_line("short", 80), "short");
        assert_eq!(clip_line("", 80), "");
    }

    #[test]
    fn test_clip_line_drops_trailing_cr() {
        assert_eq!(clip_line("prompt$ \r", 80), "prompt$ ");
    }

    #[test]
    fn test_clip_line_wide_chars() {
        // Each ideograph is two columns; a cut never splits one.
        assert_eq!(clip_line("日本語", 4), "日本");
        assert_eq!(clip_line("日本語", 5), "日本");
        assert_eq!(clip_line("a日本", 3), "a日");
    }

    #[test]
    fn test_status_text_states() {
        let url = "ws://host:8090/terminal";
        assert!(status_text(url, ConnState::Connecting, None).contains("connecting"));
        assert!(status_text(url, ConnState::Disconnected, None).contains("disconnected"));
        assert!(status_text(url, ConnState::Connected, None).contains("connected"));
        assert!(status_text(url, ConnState::Connected, None).contains(url));
        assert!(status_text(url, ConnState::Connected, Some(15)).contains("15s"));
    }
}
