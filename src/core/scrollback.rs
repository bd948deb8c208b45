//! Bounded scrollback buffer
//!
//! Accumulates rendered output text with a sliding line-count cap. Appends
//! are full-content operations: the text is split on line breaks and the
//! trailing window is kept. The cap is small and fixed, so the rebuild cost
//! on overflow is acceptable.

/// Maximum retained lines when no explicit capacity is given.
pub const MAX_SCROLLBACK: usize = 5000;

/// Output buffer holding the live text of the session.
///
/// The render position is derived, not stored: a sink drawing this buffer is
/// always scrolled to the newest line after an append.
pub struct Scrollback {
    text: String,
    max_lines: usize,
}

impl Default for Scrollback {
    fn default() -> Self {
        Self::new()
    }
}

impl Scrollback {
    pub fn new() -> Self {
        Self::with_capacity(MAX_SCROLLBACK)
    }

    pub fn with_capacity(max_lines: usize) -> Self {
        Self {
            text: String::new(),
            max_lines: max_lines.max(1),
        }
    }

    /// Append already-filtered text, trimming from the oldest end once the
    /// line count exceeds the capacity.
    pub fn append(&mut self, text: &str) {
        self.text.push_str(text);

        if self.text.split('\n').count() > self.max_lines {
            let lines: Vec<&str> = self.text.split('\n').collect();
            let keep = lines.len() - self.max_lines;
            self.text = lines[keep..].join("\n");
        }
    }

    /// Drop all buffered output.
    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    #[allow(dead_code)]
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_accumulates() {
        let mut buf = Scrollback::new();
        buf.append("hello ");
        buf.append("world\n");
        buf.append("next");
        assert_eq!(buf.text(), "hello world\nnext");
        assert_eq!(buf.line_count(), 2);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut buf = Scrollback::with_capacity(3);
        for i in 0..10 {
            buf.append(&format!("line {}\n", i));
            assert!(buf.line_count() <= 3);
        }
    }

    #[test]
    fn test_trailing_lines_kept_in_order() {
        let mut buf = Scrollback::with_capacity(3);
        for i in 0..6 {
            buf.append(&format!("line {}\n", i));
        }
        // The trailing newline counts as the start of an empty last line.
        let lines: Vec<&str> = buf.lines().collect();
        assert_eq!(lines, vec!["line 4", "line 5", ""]);
    }

    #[test]
    fn test_multi_line_chunk_trimmed_once() {
        let mut buf = Scrollback::with_capacity(4);
        buf.append("a\nb\nc\nd\ne\nf\ng");
        let lines: Vec<&str> = buf.lines().collect();
        assert_eq!(lines, vec!["d", "e", "f", "g"]);
    }

    #[test]
    fn test_clear() {
        let mut buf = Scrollback::new();
        buf.append("output\n");
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.text(), "");
    }
}
