//! Lexical extraction of named declarations out of a script.
//!
//! Every mode follows the same loop: search for a textual anchor from a
//! cursor, check with [`advance_to_or_diverge`] that the declaration really
//! starts there, then scan forward to the end of the construct. A rejected
//! anchor moves the cursor forward and the search starts over; the source is
//! never sliced or copied.
//!
//! This is a restricted lexer. Block comments, regex literals and template
//! interpolation are not understood.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::span::Span;

mod scanner;

pub use scanner::{Step, advance_to_or_diverge, consume_line_comment, consume_quoted};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    Function,
    Array,
    Variable,
}

impl FragmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Array => "array",
            Self::Variable => "variable",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub name: String,
    pub span: Span,
}

impl Fragment {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.slice(source).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("unable to find {kind} \"{name}\"")]
    AnchorNotFound { kind: FragmentKind, name: String },

    #[error("{kind} \"{name}\" is never terminated (last candidate at byte {offset})")]
    Unterminated {
        kind: FragmentKind,
        name: String,
        offset: usize,
    },
}

impl ExtractError {
    pub fn kind(&self) -> FragmentKind {
        match self {
            Self::AnchorNotFound { kind, .. } | Self::Unterminated { kind, .. } => *kind,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::AnchorNotFound { name, .. } | Self::Unterminated { name, .. } => name,
        }
    }
}

pub fn extract(source: &str, kind: FragmentKind, name: &str) -> Result<Fragment, ExtractError> {
    let span = match kind {
        FragmentKind::Function => extract_function(source, name)?,
        FragmentKind::Array => extract_array_variable(source, name)?,
        FragmentKind::Variable => extract_variable(source, name)?,
    };

    Ok(Fragment {
        kind,
        name: name.to_string(),
        span,
    })
}

/// What one candidate produced.
enum Attempt {
    Closed(Span),
    /// Anchor rejected; search again from this offset.
    Resume(usize),
    /// No valid construct can follow this or any later anchor.
    GiveUp,
}

/// Drives the shared anchor search and recovery loop.
fn scan_candidates(
    source: &str,
    kind: FragmentKind,
    name: &str,
    anchor: &str,
    mut attempt: impl FnMut(&[u8], usize) -> Attempt,
) -> Result<Span, ExtractError> {
    let mut cursor = 0usize;
    let mut last_candidate = None;

    while let Some(found) = source.get(cursor..).and_then(|rest| rest.find(anchor)) {
        let start = cursor + found;
        last_candidate = Some(start);

        match attempt(source.as_bytes(), start) {
            Attempt::Closed(span) => return Ok(span),
            Attempt::Resume(next) => {
                trace!(%kind, name, start, next, "anchor rejected, resuming search");
                cursor = next.max(start + 1);
            }
            Attempt::GiveUp => break,
        }
    }

    Err(match last_candidate {
        None => ExtractError::AnchorNotFound {
            kind,
            name: name.to_string(),
        },
        Some(offset) => ExtractError::Unterminated {
            kind,
            name: name.to_string(),
            offset,
        },
    })
}

/// Finds `function NAME(...) { ... }` and returns the span from the `function`
/// keyword through the closing brace.
pub fn extract_function(source: &str, name: &str) -> Result<Span, ExtractError> {
    let anchor = format!("function {name}(");
    let anchor_len = anchor.len();

    scan_candidates(source, FragmentKind::Function, name, &anchor, |bytes, start| {
        let Some(close_paren) = bytes[start + anchor_len..]
            .iter()
            .position(|byte| *byte == b')')
            .map(|offset| start + anchor_len + offset)
        else {
            return Attempt::GiveUp;
        };

        let open_brace = match advance_to_or_diverge(bytes, close_paren + 1, b'{') {
            Step::Found(index) => index,
            Step::Diverged(index) => return Attempt::Resume(index),
            Step::Exhausted => return Attempt::GiveUp,
        };

        match brace_block_end(bytes, open_brace) {
            Some(end) => Attempt::Closed(Span::new(start, end)),
            None => Attempt::Resume(start + 1),
        }
    })
}

/// Finds `var NAME = [ ... ];` and returns the span through the `;`.
pub fn extract_array_variable(source: &str, name: &str) -> Result<Span, ExtractError> {
    let anchor = format!("var {name}");
    let anchor_len = anchor.len();

    scan_candidates(source, FragmentKind::Array, name, &anchor, |bytes, start| {
        let equals = match advance_to_or_diverge(bytes, start + anchor_len, b'=') {
            Step::Found(index) => index,
            Step::Diverged(index) => return Attempt::Resume(index),
            Step::Exhausted => return Attempt::GiveUp,
        };
        let open_bracket = match advance_to_or_diverge(bytes, equals + 1, b'[') {
            Step::Found(index) => index,
            Step::Diverged(index) => return Attempt::Resume(index),
            Step::Exhausted => return Attempt::GiveUp,
        };

        match array_statement_end(bytes, open_bracket) {
            Some(end) => Attempt::Closed(Span::new(start, end)),
            None => Attempt::Resume(start + 1),
        }
    })
}

/// Finds `var NAME = ...` and returns the span through the first `;` or `,`
/// that is not inside a string.
pub fn extract_variable(source: &str, name: &str) -> Result<Span, ExtractError> {
    let anchor = format!("var {name}");
    let anchor_len = anchor.len();

    scan_candidates(source, FragmentKind::Variable, name, &anchor, |bytes, start| {
        let equals = match advance_to_or_diverge(bytes, start + anchor_len, b'=') {
            Step::Found(index) => index,
            Step::Diverged(index) => return Attempt::Resume(index),
            Step::Exhausted => return Attempt::GiveUp,
        };

        match statement_end(bytes, equals + 1) {
            Some(end) => Attempt::Closed(Span::new(start, end)),
            None => Attempt::Resume(start + 1),
        }
    })
}

/// Returns the offset just past the `}` that balances the `{` at
/// `open_brace`.
fn brace_block_end(source: &[u8], open_brace: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut index = open_brace;

    while index < source.len() {
        let byte = source[index];

        if byte == b'/' && source.get(index + 1) == Some(&b'/') {
            index = scanner::consume_line_comment(source, index + 1);
            continue;
        }

        if scanner::is_quote(byte) {
            index = scanner::consume_quoted(source, index)?;
            continue;
        }

        if byte == b'{' {
            depth += 1;
        } else if byte == b'}' {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(index + 1);
            }
        }

        index += 1;
    }

    None
}

fn array_statement_end(source: &[u8], open_bracket: usize) -> Option<usize> {
    let mut index = open_bracket;

    while index < source.len() {
        let byte = source[index];

        if matches!(byte, b'\'' | b'"') {
            index = scanner::consume_quoted(source, index)?;
            continue;
        }

        if byte == b']' && source.get(index + 1) == Some(&b';') {
            return Some(index + 2);
        }

        index += 1;
    }

    None
}

fn statement_end(source: &[u8], from: usize) -> Option<usize> {
    let mut index = from;

    while index < source.len() {
        let byte = source[index];

        if matches!(byte, b'\'' | b'"') {
            index = scanner::consume_quoted(source, index)?;
            continue;
        }

        if matches!(byte, b';' | b',') {
            return Some(index + 1);
        }

        index += 1;
    }

    None
}
