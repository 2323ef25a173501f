//! Lexical tokens as delivered by an external scanner.
//!
//! The grammar never inspects raw source text; it sees a stream of
//! `(kind, space, text)` triples, each tagged with the position it was
//! scanned at.

use std::fmt;

use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Free text the scanner could not classify further.
    Text,
    Alphanum,
    Number,
    /// Escaped text that must never be read as structure.
    Literal,
    Symbol,
    /// Structural punctuation: `{ } [ ] | @ -> <- / // < >` and friends.
    Token,
    /// Opens an indented block; the text is the bullet (`+ * - > !`).
    Start,
    /// Closes the innermost block. The stream ends with one extra stop.
    Stop,
    /// A blank line.
    Break,
    /// A horizontal rule line.
    Dash,
    /// A scanner error, reported as a diagnostic by the grammar.
    Error,
}

impl TokenKind {
    /// Kinds that accumulate into a text node.
    pub fn is_content(self) -> bool {
        matches!(
            self,
            TokenKind::Text
                | TokenKind::Alphanum
                | TokenKind::Number
                | TokenKind::Literal
                | TokenKind::Symbol
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Whitespace between the previous token and this one, normalised by
    /// the scanner (usually `""` or `" "`).
    pub space: String,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, space: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            space: space.into(),
            text: text.into(),
        }
    }

    pub fn stop() -> Self {
        Self::new(TokenKind::Stop, "", "")
    }

    /// True for structural punctuation with the given text.
    pub fn is(&self, text: &str) -> bool {
        self.kind == TokenKind::Token && self.text == text
    }

    /// True for an operator-ish token with the given text, regardless of
    /// whether the scanner classified it as a symbol or a token.
    pub fn is_op(&self, text: &str) -> bool {
        matches!(self.kind, TokenKind::Token | TokenKind::Symbol) && self.text == text
    }

    /// True when this token directly abuts the previous one.
    pub fn adjoins(&self) -> bool {
        self.space.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Stop => write!(f, "end of block"),
            TokenKind::Break => write!(f, "blank line"),
            TokenKind::Start => write!(f, "'{}' block", self.text),
            _ => write!(f, "{} \"{}\"", self.kind, self.text),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    pub value: T,
    pub line: usize,
    pub col: usize,
}

impl<T> Located<T> {
    pub fn new(value: T, position: Position) -> Self {
        Self {
            value,
            line: position.line,
            col: position.col,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.col)
    }
}
