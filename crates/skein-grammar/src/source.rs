//! Pull-style token sources.

use skein_types::{Located, Position, Token};

/// Supplies tokens one at a time. A well-formed source ends with a final
/// `stop` token and yields nothing after it.
pub trait TokenSource {
    fn next_token(&mut self) -> Option<Located<Token>>;

    /// Position of the most recently delivered token.
    fn position(&self) -> Position;
}

/// A source over an already-scanned token list.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: std::vec::IntoIter<Located<Token>>,
    position: Position,
}

impl TokenStream {
    pub fn new(tokens: Vec<Located<Token>>) -> Self {
        Self {
            tokens: tokens.into_iter(),
            position: Position::default(),
        }
    }
}

impl From<Vec<Located<Token>>> for TokenStream {
    fn from(tokens: Vec<Located<Token>>) -> Self {
        Self::new(tokens)
    }
}

impl TokenSource for TokenStream {
    fn next_token(&mut self) -> Option<Located<Token>> {
        let token = self.tokens.next()?;
        self.position = token.position();
        Some(token)
    }

    fn position(&self) -> Position {
        self.position
    }
}
