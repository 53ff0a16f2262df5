//! Splits script source into literal text and tag tokens.
//!
//! Three delimiters are recognised: `{{ … }}` (output), `{% … %}` (statement)
//! and `{# … #}` (comment, dropped). A `-` just inside an opening or closing
//! delimiter trims whitespace on that side. Spaces and tabs between the start
//! of a line and a statement or comment tag are removed.

use crate::error::{Result, SiestaError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Text(String),
    /// Inside of `{{ … }}`, trim markers removed.
    Output(String),
    /// Inside of `{% … %}`, trim markers removed.
    Statement(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Line on which the token starts, 1-based.
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delim {
    Output,
    Statement,
    Comment,
}

impl Delim {
    fn from_open(byte: u8) -> Option<Delim> {
        match byte {
            b'{' => Some(Delim::Output),
            b'%' => Some(Delim::Statement),
            b'#' => Some(Delim::Comment),
            _ => None,
        }
    }

    fn close(self) -> &'static str {
        match self {
            Delim::Output => "}}",
            Delim::Statement => "%}",
            Delim::Comment => "#}",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Delim::Output => "{{",
            Delim::Statement => "{%",
            Delim::Comment => "{#",
        }
    }
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1;

    while let Some((start, delim)) = next_open(source, pos) {
        let mut text = &source[pos..start];
        let trim_left = bytes.get(start + 2) == Some(&b'-');

        if delim != Delim::Output
            && let Some(indent) = line_indent(source, pos, start)
        {
            text = &text[..text.len() - indent];
        }
        if trim_left {
            text = text.trim_end();
        }
        push_text(&mut tokens, text, line);
        line += count_lines(&source[pos..start]);

        let inner_start = start + 2 + usize::from(trim_left);
        let close = find_close(source, inner_start, delim).ok_or_else(|| SiestaError::Syntax {
            line,
            message: format!("'{}' is never closed", delim.describe()),
        })?;

        let mut inner = &source[inner_start..close];
        let trim_right = inner.ends_with('-');
        if trim_right {
            inner = &inner[..inner.len() - 1];
        }

        match delim {
            Delim::Output => tokens.push(Token {
                kind: TokenKind::Output(inner.trim().to_string()),
                line,
            }),
            Delim::Statement => tokens.push(Token {
                kind: TokenKind::Statement(inner.trim().to_string()),
                line,
            }),
            Delim::Comment => {}
        }

        let tag_end = close + 2;
        line += count_lines(&source[start..tag_end]);
        pos = tag_end;

        if trim_right {
            let rest = &source[pos..];
            let skipped = rest.len() - rest.trim_start().len();
            line += count_lines(&rest[..skipped]);
            pos += skipped;
        }
    }

    push_text(&mut tokens, &source[pos..], line);
    Ok(tokens)
}

fn push_text(tokens: &mut Vec<Token>, text: &str, line: usize) {
    if !text.is_empty() {
        tokens.push(Token {
            kind: TokenKind::Text(text.to_string()),
            line,
        });
    }
}

fn count_lines(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}

fn next_open(source: &str, from: usize) -> Option<(usize, Delim)> {
    let bytes = source.as_bytes();
    let mut search = from;
    while let Some(offset) = source[search..].find('{') {
        let at = search + offset;
        if let Some(delim) = bytes.get(at + 1).copied().and_then(Delim::from_open) {
            return Some((at, delim));
        }
        search = at + 1;
    }
    None
}

/// Length of the run of spaces/tabs preceding `tag_start` on its line, if
/// that run starts the line and lies entirely within the pending text.
fn line_indent(source: &str, text_start: usize, tag_start: usize) -> Option<usize> {
    let line_start = source[..tag_start].rfind('\n').map_or(0, |i| i + 1);
    if line_start < text_start {
        return None;
    }
    let indent = &source[line_start..tag_start];
    indent
        .bytes()
        .all(|b| b == b' ' || b == b'\t')
        .then_some(indent.len())
}

/// Offset of the closing delimiter, skipping over quoted strings so that
/// `"%}"` inside a filter argument does not end the tag.
fn find_close(source: &str, from: usize, delim: Delim) -> Option<usize> {
    let close = delim.close().as_bytes();
    let bytes = source.as_bytes();

    if delim == Delim::Comment {
        return source[from..].find(delim.close()).map(|i| from + i);
    }

    let mut quote: Option<u8> = None;
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'"' || b == b'\'' {
                    quote = Some(b);
                } else if bytes[i..].starts_with(close) {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}
