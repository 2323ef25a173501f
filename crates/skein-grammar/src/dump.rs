//! Line-oriented text rendition of a token stream.
//!
//! One token per line: `line:col kind "space" "text"`. Strings escape `"`,
//! `\`, newline and tab with a backslash. Blank lines and lines starting
//! with `#` are ignored.
//!
//! ```text
//! # + [Look around] You see fog.
//! 1:1 start "" "+"
//! 1:3 token " " "["
//! 1:4 alphanum "" "Look"
//! ```

use std::str::FromStr;

use skein_types::{Located, Position, Token, TokenKind};
use winnow::ascii::{dec_uint, space1};
use winnow::combinator::{alt, delimited, preceded, repeat, separated_pair};
use winnow::error::{StrContext, StrContextValue};
use winnow::ModalResult;
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("line {line}, col {col}: {msg}")]
    Syntax { line: usize, col: usize, msg: String },
}

/// Parse a whole token dump.
pub fn parse_dump(input: &str) -> Result<Vec<Located<Token>>, DumpError> {
    let mut tokens = Vec::new();
    for (index, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let token = located.parse(line).map_err(|e| {
            let msg = e.inner().to_string();
            DumpError::Syntax {
                line: index + 1,
                col: raw.len() - raw.trim_start().len() + e.offset() + 1,
                msg: if msg.is_empty() {
                    "malformed token".to_string()
                } else {
                    msg
                },
            }
        })?;
        tokens.push(token);
    }
    Ok(tokens)
}

/// Render tokens in the dump format.
pub fn render_dump(tokens: &[Located<Token>]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(&format!(
            "{}:{} {} \"{}\" \"{}\"\n",
            token.line,
            token.col,
            token.value.kind,
            escape(&token.value.space),
            escape(&token.value.text)
        ));
    }
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn located(input: &mut &str) -> ModalResult<Located<Token>> {
    (
        position,
        preceded(space1, kind),
        preceded(space1, quoted),
        preceded(space1, quoted),
    )
        .map(|(position, kind, space, text)| {
            Located::new(Token::new(kind, space, text), position)
        })
        .parse_next(input)
}

fn position(input: &mut &str) -> ModalResult<Position> {
    separated_pair(dec_uint, ':', dec_uint)
        .map(|(line, col): (usize, usize)| Position::new(line, col))
        .context(StrContext::Label("position"))
        .parse_next(input)
}

fn kind(input: &mut &str) -> ModalResult<TokenKind> {
    take_while(1.., |c: char| c.is_ascii_lowercase())
        .try_map(TokenKind::from_str)
        .context(StrContext::Label("token kind"))
        .parse_next(input)
}

enum Fragment<'a> {
    Literal(&'a str),
    Escaped(char),
}

fn quoted(input: &mut &str) -> ModalResult<String> {
    delimited(
        '"',
        repeat(0.., fragment).fold(String::new, |mut acc, fragment| {
            match fragment {
                Fragment::Literal(s) => acc.push_str(s),
                Fragment::Escaped(c) => acc.push(c),
            }
            acc
        }),
        '"',
    )
    .context(StrContext::Expected(StrContextValue::Description(
        "quoted string",
    )))
    .parse_next(input)
}

fn fragment<'a>(input: &mut &'a str) -> ModalResult<Fragment<'a>> {
    alt((
        take_till(1.., ['"', '\\']).map(Fragment::Literal),
        preceded(
            '\\',
            alt((
                'n'.value('\n'),
                't'.value('\t'),
                '"'.value('"'),
                '\\'.value('\\'),
            )),
        )
        .map(Fragment::Escaped),
    ))
    .parse_next(input)
}
