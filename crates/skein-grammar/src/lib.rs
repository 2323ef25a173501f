//! Compiles a token stream into a linked story graph.
//!
//! The grammar is a single-pass recursive descent over a pull-style
//! [`TokenSource`]. Forward links are carried as loose ends and tied into
//! the [`Story`] as soon as their target is known.

mod control;
pub mod dump;
mod expression;
mod option;
mod parser;
pub mod source;

use skein_types::{Located, StoreError, Story, Token};

pub use expression::invert_expression;
pub use source::{TokenSource, TokenStream};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("line {line}, col {col}: {token} after the final stop")]
    TokenAfterStop {
        line: usize,
        col: usize,
        token: String,
    },
    #[error("line {line}, col {col}: token stream ended without a final stop")]
    MissingStop { line: usize, col: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{count} unresolved link(s), first {field} of {name}")]
    Dangling {
        name: String,
        field: String,
        count: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Label of the story's entry node.
    pub start: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            start: "start".to_string(),
        }
    }
}

/// Compile every token `source` yields into a story.
///
/// Script mistakes are collected as diagnostics on the returned story. An
/// `Err` means the token stream itself was malformed or the grammar broke
/// one of its own invariants.
pub fn compile<S: TokenSource>(source: S, options: &CompileOptions) -> Result<Story, CompileError> {
    parser::Parser::new(source, options).parse()
}

/// Compile a scanned token list with default options.
pub fn compile_tokens(tokens: Vec<Located<Token>>) -> Result<Story, CompileError> {
    compile(TokenStream::new(tokens), &CompileOptions::default())
}
