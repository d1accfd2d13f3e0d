/// Result of skipping whitespace towards an expected character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The expected character sits at this offset.
    Found(usize),
    /// Another non-whitespace character sits at this offset; the candidate is
    /// rejected and anchor search should resume from here.
    Diverged(usize),
    /// The text ended before anything but whitespace was seen.
    Exhausted,
}

pub(super) fn is_inline_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n')
}

pub fn advance_to_or_diverge(source: &[u8], mut index: usize, stop: u8) -> Step {
    while index < source.len() && source[index] != stop && is_inline_whitespace(source[index]) {
        index += 1;
    }

    match source.get(index) {
        None => Step::Exhausted,
        Some(&byte) if byte == stop => Step::Found(index),
        Some(_) => Step::Diverged(index),
    }
}

/// Skips a quoted run starting at the opening quote at `index`.
///
/// Returns the offset just past the closing quote of the same character, or
/// `None` when the text ends first. A backslash always escapes the byte after
/// it. `${...}` inside a backtick run is not interpreted.
pub fn consume_quoted(source: &[u8], index: usize) -> Option<usize> {
    let quote = *source.get(index)?;
    let mut index = index + 1;

    while index < source.len() {
        let byte = source[index];
        if byte == b'\\' {
            index += 2;
            continue;
        }
        if byte == quote {
            return Some(index + 1);
        }
        index += 1;
    }

    None
}

/// Skips a `//` comment whose second slash is at `index`. Stops on the
/// newline (not past it) or at the end of the text.
pub fn consume_line_comment(source: &[u8], index: usize) -> usize {
    let mut index = index;
    while index < source.len() && source[index] != b'\n' {
        index += 1;
    }
    index
}

pub(super) fn is_quote(byte: u8) -> bool {
    matches!(byte, b'\'' | b'"' | b'`')
}

#[cfg(test)]
mod tests {
    use super::{Step, advance_to_or_diverge, consume_line_comment, consume_quoted};

    #[test]
    fn advance_finds_stop_after_whitespace() {
        assert_eq!(advance_to_or_diverge(b"  \t\n{", 0, b'{'), Step::Found(4));
        assert_eq!(advance_to_or_diverge(b"{", 0, b'{'), Step::Found(0));
    }

    #[test]
    fn advance_reports_divergence_position() {
        assert_eq!(advance_to_or_diverge(b"  x{", 0, b'{'), Step::Diverged(2));
    }

    #[test]
    fn advance_reports_exhaustion_on_trailing_whitespace() {
        assert_eq!(advance_to_or_diverge(b"   ", 0, b'{'), Step::Exhausted);
        assert_eq!(advance_to_or_diverge(b"", 0, b'{'), Step::Exhausted);
        assert_eq!(advance_to_or_diverge(b"ab", 7, b'{'), Step::Exhausted);
    }

    #[test]
    fn advance_does_not_treat_carriage_return_as_whitespace() {
        assert_eq!(advance_to_or_diverge(b" \r\n=", 0, b'='), Step::Diverged(1));
    }

    #[test]
    fn consume_quoted_stops_after_matching_quote() {
        let source = br#"'a"b' tail"#;
        assert_eq!(consume_quoted(source, 0), Some(5));
    }

    #[test]
    fn consume_quoted_skips_escaped_quote() {
        let source = br#""a\"b" tail"#;
        assert_eq!(consume_quoted(source, 0), Some(6));
    }

    #[test]
    fn consume_quoted_treats_double_backslash_as_complete_escape() {
        let source = br#""a\\" tail"#;
        assert_eq!(consume_quoted(source, 0), Some(5));
    }

    #[test]
    fn consume_quoted_keeps_template_interpolation_opaque() {
        let source = b"`${ '}' }` tail";
        assert_eq!(consume_quoted(source, 0), Some(10));
    }

    #[test]
    fn consume_quoted_returns_none_when_unterminated() {
        assert_eq!(consume_quoted(b"'abc", 0), None);
        assert_eq!(consume_quoted(b"'abc\\", 0), None);
    }

    #[test]
    fn consume_line_comment_stops_on_newline() {
        let source = b"// }\nnext";
        assert_eq!(consume_line_comment(source, 1), 4);
        assert_eq!(consume_line_comment(b"// end", 1), 6);
    }
}
