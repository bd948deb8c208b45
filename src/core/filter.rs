//! Escape sequence filter
//!
//! Strips ANSI/VT control sequences from a text chunk so it can be handed to
//! a plain-text sink. The renderer here is not a terminal emulator; cursor
//! movement, colors and mode switches are simply removed.
//!
//! Filtering is per chunk: a sequence split across two received chunks is not
//! reassembled. The stray ESC byte falls into the C0 strip, so only the
//! printable tail of a split sequence leaks into output.

/// Remove terminal control sequences from `raw`.
///
/// Strips, wherever they occur in the chunk:
/// - CSI sequences: ESC `[`, optional `?`, digits/semicolons, one final letter
/// - OSC sequences: ESC `]` up to BEL or ST (ESC `\`)
/// - Charset designation: ESC `(` or `)` plus one digit/letter
/// - Remaining C0 controls except TAB, LF and CR
///
/// Pure and idempotent: the output contains no ESC and no stripped C0 bytes,
/// so filtering clean text is the identity.
pub fn filter(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if b == 0x1B {
            match bytes.get(i + 1) {
                Some(b'[') => {
                    if let Some(end) = csi_end(bytes, i + 2) {
                        i = end;
                        continue;
                    }
                }
                Some(b']') => {
                    if let Some(end) = osc_end(bytes, i + 2) {
                        i = end;
                        continue;
                    }
                }
                Some(b'(') | Some(b')') => {
                    if bytes.get(i + 2).is_some_and(|c| c.is_ascii_alphanumeric()) {
                        i += 3;
                        continue;
                    }
                }
                _ => {}
            }
            // Incomplete sequence: the ESC itself is a C0 byte and is
            // dropped; whatever follows is handled on its own.
            i += 1;
            continue;
        }

        if b <= 0x08 || (0x0E..0x20).contains(&b) {
            i += 1;
            continue;
        }

        out.push(b);
        i += 1;
    }

    // Only single ASCII bytes were removed, so the result is valid UTF-8.
    String::from_utf8_lossy(&out).into_owned()
}

/// Index past a CSI sequence starting after ESC `[`, if one terminates here.
fn csi_end(bytes: &[u8], mut j: usize) -> Option<usize> {
    if bytes.get(j) == Some(&b'?') {
        j += 1;
    }
    while bytes.get(j).is_some_and(|b| b.is_ascii_digit() || *b == b';') {
        j += 1;
    }
    match bytes.get(j) {
        Some(b) if b.is_ascii_alphabetic() => Some(j + 1),
        _ => None,
    }
}

/// Index past an OSC string starting after ESC `]`, if a terminator exists.
fn osc_end(bytes: &[u8], mut j: usize) -> Option<usize> {
    while j < bytes.len() {
        match bytes[j] {
            0x07 => return Some(j + 1),
            0x1B if bytes.get(j + 1) == Some(&b'\\') => return Some(j + 2),
            _ => j += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(filter("hello world"), "hello world");
        assert_eq!(filter(""), "");
        assert_eq!(filter("multi\nline\r\ntext"), "multi\nline\r\ntext");
    }

    #[test]
    fn test_csi_removed() {
        assert_eq!(filter("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(filter("\x1b[1;32mbold green\x1b[m"), "bold green");
        assert_eq!(filter("a\x1b[2Jb\x1b[Hc"), "abc");
    }

    #[test]
    fn test_csi_private_mode_removed() {
        assert_eq!(filter("\x1b[?25lhidden\x1b[?25h"), "hidden");
        assert_eq!(filter("\x1b[?1049htext\x1b[?1049l"), "text");
    }

    #[test]
    fn test_osc_removed() {
        assert_eq!(filter("\x1b]0;window title\x07prompt$ "), "prompt$ ");
        assert_eq!(filter("\x1b]2;title\x1b\\after"), "after");
    }

    #[test]
    fn test_charset_designation_removed() {
        assert_eq!(filter("\x1b(Bline\x1b)0"), "line");
    }

    #[test]
    fn test_c0_stripped_except_whitespace() {
        assert_eq!(filter("a\x00b\x01c\x08d"), "abcd");
        assert_eq!(filter("bell\x07ring"), "bellring");
        assert_eq!(filter("keep\ttab\nnewline\rcr"), "keep\ttab\nnewline\rcr");
        assert_eq!(filter("\x0e\x0f\x1f"), "");
    }

    #[test]
    fn test_interleaved_sequences() {
        let raw = "\x1b[32muser\x1b[0m@\x1b]0;t\x07host:\x1b[1m~\x1b[0m$ ls\r\n";
        assert_eq!(filter(raw), "user@host:~$ ls\r\n");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "plain",
            "\x1b[31mred\x1b[0m\n",
            "\x1b]0;t\x07x\x1b(B\t\r\n",
            "partial \x1b[12;3",
        ];
        for raw in inputs {
            let once = filter(raw);
            assert_eq!(filter(&once), once);
        }
    }

    #[test]
    fn test_split_sequence_leaks_tail() {
        // A sequence cut at a chunk boundary is not reassembled: the ESC is
        // dropped with the C0 strip and the printable remainder shows.
        assert_eq!(filter("\x1b[12;3"), "[12;3");
        assert_eq!(filter("4m"), "4m");
        // Whole sequence in one chunk disappears.
        assert_eq!(filter("\x1b[12;34m"), "");
    }

    #[test]
    fn test_unterminated_osc_leaks_tail() {
        assert_eq!(filter("\x1b]0;no terminator"), "]0;no terminator");
    }

    #[test]
    fn test_multibyte_preserved() {
        assert_eq!(filter("\x1b[35m日本語\x1b[0m ← ok"), "日本語 ← ok");
    }
}
