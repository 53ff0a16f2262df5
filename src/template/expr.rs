//! Parsing of tag contents: expressions and filter chains.
//!
//! ```text
//! chain    := call ( "|" call )*
//! call     := IDENT ( "(" [ arg ( "," arg )* [","] ] ")" )?
//! arg      := literal | IDENT "=" literal
//! literal  := STRING | NUMBER | True | False | true | false | None | none
//! expr     := STRING | IDENT ( "." ( IDENT | INT ) | "[" ( STRING | INT ) "]" )*
//! ```

use super::ast::{Expr, PathStep};
use crate::error::{Result, SiestaError};
use crate::filters::{ArgValue, Chain, FilterCall, RawArgs};

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Punct(char),
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Ident(name) => format!("'{}'", name),
            Tok::Str(s) => format!("string {:?}", s),
            Tok::Int(i) => format!("number {}", i),
            Tok::Float(x) => format!("number {}", x),
            Tok::Punct(c) => format!("'{}'", c),
        }
    }
}

const PUNCT: &[char] = &['|', '(', ')', ',', '=', '.', '[', ']'];

fn lex(source: &str, line: usize) -> Result<Vec<Tok>> {
    let syntax = |message: String| SiestaError::Syntax { line, message };
    let chars: Vec<char> = source.chars().collect();
    let mut toks = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            toks.push(Tok::Ident(chars[start..i].iter().collect()));
        } else if c.is_ascii_digit()
            || (c == '-' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()))
        {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            // After a dot, digits are a path index: `items.0.1` is two steps.
            let after_dot = toks.last() == Some(&Tok::Punct('.'));
            let fractional = !after_dot
                && chars.get(i) == Some(&'.')
                && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit());
            if fractional {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let text: String = chars[start..i].iter().collect();
            let tok = if fractional {
                text.parse().map(Tok::Float).ok()
            } else {
                text.parse().map(Tok::Int).ok()
            };
            toks.push(tok.ok_or_else(|| syntax(format!("invalid number '{}'", text)))?);
        } else if c == '"' || c == '\'' {
            let (value, next) = lex_string(&chars, i)
                .ok_or_else(|| syntax("unterminated string literal".to_string()))?;
            toks.push(Tok::Str(value));
            i = next;
        } else if PUNCT.contains(&c) {
            toks.push(Tok::Punct(c));
            i += 1;
        } else {
            return Err(syntax(format!("unexpected character '{}'", c)));
        }
    }
    Ok(toks)
}

/// Lex a quoted string starting at `start`; returns the value and the index
/// past the closing quote.
fn lex_string(chars: &[char], start: usize) -> Option<(String, usize)> {
    let quote = chars[start];
    let mut value = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let escaped = *chars.get(i + 1)?;
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    '\\' | '"' | '\'' => value.push(escaped),
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
                i += 2;
            }
            c if c == quote => return Some((value, i + 1)),
            c => {
                value.push(c);
                i += 1;
            }
        }
    }
    None
}

/// Cursor over the tokens of one tag.
pub(crate) struct TagParser {
    toks: Vec<Tok>,
    pos: usize,
    line: usize,
}

impl TagParser {
    pub(crate) fn new(source: &str, line: usize) -> Result<Self> {
        Ok(Self {
            toks: lex(source, line)?,
            pos: 0,
            line,
        })
    }

    fn syntax(&self, message: impl Into<String>) -> SiestaError {
        SiestaError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn found(&self) -> String {
        self.peek()
            .map_or_else(|| "end of tag".to_string(), Tok::describe)
    }

    pub(crate) fn is_done(&self) -> bool {
        self.pos >= self.toks.len()
    }

    /// Consume `c` if it is next.
    pub(crate) fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(&Tok::Punct(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.syntax(format!("expected '{}', found {}", c, self.found())))
        }
    }

    pub(crate) fn ident(&mut self, what: &str) -> Result<String> {
        match self.peek() {
            Some(Tok::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.syntax(format!("expected {}, found {}", what, self.found()))),
        }
    }

    /// Fail if anything is left in the tag.
    pub(crate) fn finish(&self) -> Result<()> {
        if self.is_done() {
            Ok(())
        } else {
            Err(self.syntax(format!("unexpected {}", self.found())))
        }
    }

    pub(crate) fn expr(&mut self) -> Result<Expr> {
        let root = match self.bump() {
            Some(Tok::Str(text)) => return Ok(Expr::Literal(text)),
            Some(Tok::Ident(name)) => name,
            other => {
                return Err(self.syntax(format!(
                    "expected a variable or string, found {}",
                    other.map_or_else(|| "end of tag".to_string(), |t| t.describe())
                )));
            }
        };

        let mut steps = Vec::new();
        loop {
            if self.eat('.') {
                match self.bump() {
                    Some(Tok::Ident(key)) => steps.push(PathStep::Key(key)),
                    Some(Tok::Int(index)) if index >= 0 => steps.push(PathStep::Index(index as usize)),
                    _ => return Err(self.syntax(format!("invalid path after '{}.'", root))),
                }
            } else if self.eat('[') {
                match self.bump() {
                    Some(Tok::Str(key)) => steps.push(PathStep::Key(key)),
                    Some(Tok::Int(index)) if index >= 0 => steps.push(PathStep::Index(index as usize)),
                    _ => return Err(self.syntax("subscript must be a string or a non-negative integer")),
                }
                self.expect(']')?;
            } else {
                break;
            }
        }
        Ok(Expr::Path { root, steps })
    }

    /// `|call|call…` if the next token is a pipe, else an empty chain.
    pub(crate) fn piped_chain(&mut self) -> Result<Chain> {
        if self.eat('|') {
            self.chain()
        } else {
            Ok(Chain::default())
        }
    }

    pub(crate) fn chain(&mut self) -> Result<Chain> {
        let mut calls = vec![self.call()?];
        while self.eat('|') {
            calls.push(self.call()?);
        }
        Ok(Chain { calls })
    }

    fn call(&mut self) -> Result<FilterCall> {
        let name = self.ident("a filter name")?;
        let mut raw = RawArgs::default();

        if self.eat('(') {
            while !self.eat(')') {
                let keyword = match (self.toks.get(self.pos), self.toks.get(self.pos + 1)) {
                    (Some(Tok::Ident(key)), Some(Tok::Punct('='))) => {
                        let key = key.clone();
                        self.pos += 2;
                        Some(key)
                    }
                    _ => None,
                };
                let value = self.literal()?;
                match keyword {
                    Some(key) => raw.keyword.push((key, value)),
                    None if !raw.keyword.is_empty() => {
                        return Err(self.syntax(format!(
                            "positional argument follows keyword argument in '{}(...)'",
                            name
                        )));
                    }
                    None => raw.positional.push(value),
                }
                if !self.eat(',') {
                    self.expect(')')?;
                    break;
                }
            }
        }

        FilterCall::resolve(&name, raw, self.line)
    }

    fn literal(&mut self) -> Result<ArgValue> {
        let value = match self.peek() {
            Some(Tok::Str(s)) => ArgValue::Str(s.clone()),
            Some(Tok::Int(i)) => ArgValue::Int(*i),
            Some(Tok::Float(x)) => ArgValue::Float(*x),
            Some(Tok::Ident(word)) => match word.as_str() {
                "True" | "true" => ArgValue::Bool(true),
                "False" | "false" => ArgValue::Bool(false),
                "None" | "none" => ArgValue::None,
                other => {
                    return Err(self.syntax(format!(
                        "filter arguments must be literals, found '{}'",
                        other
                    )));
                }
            },
            _ => return Err(self.syntax(format!("expected an argument, found {}", self.found()))),
        };
        self.pos += 1;
        Ok(value)
    }
}
