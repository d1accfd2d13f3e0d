use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open byte range into a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start < end, "span must not be empty: {start}..{end}");
        Self { start, end }
    }

    /// Borrows the covered text, or `None` if the span does not fit `source`.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::Span;

    #[test]
    fn slice_returns_covered_text() {
        let span = Span::new(4, 9);
        assert_eq!(span.slice("var itemTypes;"), Some("itemT"));
    }

    #[test]
    fn slice_rejects_out_of_range_spans() {
        let span = Span::new(2, 40);
        assert_eq!(span.slice("short"), None);
    }

    #[test]
    fn display_uses_range_notation() {
        assert_eq!(Span::new(3, 7).to_string(), "3..7");
    }
}
