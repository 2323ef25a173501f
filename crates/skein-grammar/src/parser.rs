//! Token plumbing shared by every grammar rule, and the thread sequencer.
//!
//! Each rule takes the scope to create nodes at and the loose ends handed to
//! it, and returns the scope and loose ends its continuation should use.
//! Tokens that close an enclosing construct are left unconsumed, so the rule
//! that opened the construct decides what they mean.

use skein_types::{
    Ends, Located, LooseEnd, NodeBody, Position, Scope, Story, Target, Token, TokenKind,
};

use crate::option::Leader;
use crate::source::TokenSource;
use crate::{CompileError, CompileOptions};

/// Token texts that end a thread and belong to an enclosing rule.
const TERMINATORS: &[&str] = &["|", "]", "[", "}"];

/// Token texts that introduce a construct inside a thread.
const INTRODUCERS: &[&str] = &["{", "@", "->", "<-", "<", "/", "//"];

/// Punctuation rewritten to typographic characters inside text.
const TYPOGRAPHY: &[(&str, &str)] = &[
    ("{\"", "\u{201c}"),
    ("\"}", "\u{201d}"),
    ("{'", "\u{2018}"),
    ("'}", "\u{2019}"),
    ("--", "\u{2013}"),
    ("---", "\u{2014}"),
];

/// Where the enclosing rule resumes: the next free scope and the open ends.
pub(crate) type Step = Result<(Scope, Ends), CompileError>;

pub(crate) struct Parser<S> {
    source: S,
    current: Option<Located<Token>>,
    pub(crate) story: Story,
}

impl<S: TokenSource> Parser<S> {
    pub(crate) fn new(mut source: S, options: &CompileOptions) -> Self {
        let current = source.next_token();
        Self {
            source,
            current,
            story: Story::new(options.start.clone()),
        }
    }

    pub(crate) fn position(&self) -> Position {
        self.current
            .as_ref()
            .map(Located::position)
            .unwrap_or_else(|| self.source.position())
    }

    fn missing_stop(&self) -> CompileError {
        let position = self.source.position();
        CompileError::MissingStop {
            line: position.line,
            col: position.col,
        }
    }

    pub(crate) fn peek(&self) -> Result<&Token, CompileError> {
        match &self.current {
            Some(token) => Ok(&token.value),
            None => Err(self.missing_stop()),
        }
    }

    pub(crate) fn advance(&mut self) -> Result<Located<Token>, CompileError> {
        let token = self.current.take().ok_or_else(|| self.missing_stop())?;
        log::trace!("{}: {}", token.position(), token.value);
        self.current = self.source.next_token();
        Ok(token)
    }

    pub(crate) fn at(&self, text: &str) -> Result<bool, CompileError> {
        Ok(self.peek()?.is(text))
    }

    pub(crate) fn eat(&mut self, text: &str) -> Result<bool, CompileError> {
        if self.at(text)? {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes `text`, or reports it missing and carries on as if it were there.
    pub(crate) fn expect(&mut self, text: &str) -> Result<(), CompileError> {
        if !self.eat(text)? {
            let message = format!("expected '{text}', found {}", self.peek()?);
            self.error(message);
        }
        Ok(())
    }

    pub(crate) fn error(&mut self, message: impl Into<String>) {
        let position = self.position();
        self.story.error(position, message);
    }

    /// Creates a node that falls through, consuming `rets`.
    pub(crate) fn append(
        &mut self,
        scope: Scope,
        ends: Ends,
        body: NodeBody,
        position: Position,
    ) -> Step {
        let id = self.story.create(&scope, body, position)?;
        self.story.tie_to(ends.rets, &scope)?;
        Ok((scope.next(), Ends::new(vec![LooseEnd::next(id)], ends.escs)))
    }

    pub(crate) fn parse(mut self) -> Result<Story, CompileError> {
        let start = Scope::label(self.story.start());
        let position = self.position();
        let entry = self.story.create_placeholder(&start, position)?;
        let mut scope = start;
        let mut ends = Ends::rets(vec![LooseEnd::next(entry)]);
        loop {
            (scope, ends) = self.thread(scope, ends)?;
            let token = self.peek()?;
            if token.kind == TokenKind::Stop {
                break;
            }
            let message = format!("unexpected {token}");
            self.error(message);
            self.advance()?;
        }
        self.advance()?;
        if let Some(extra) = &self.current {
            return Err(CompileError::TokenAfterStop {
                line: extra.line,
                col: extra.col,
                token: extra.value.to_string(),
            });
        }

        self.story.tie(ends.rets, &Target::Ret)?;
        self.story.tie(ends.escs, &Target::Esc)?;
        self.story.check();
        let dangling = self.story.dangling();
        if let Some((name, field)) = dangling.first() {
            return Err(CompileError::Dangling {
                name: name.clone(),
                field: format!("{field:?}"),
                count: dangling.len(),
            });
        }
        log::debug!(
            "compiled {} nodes, {} diagnostics",
            self.story.len(),
            self.story.diagnostics().len()
        );
        Ok(self.story)
    }

    /// Sequences nodes until a token that belongs to an enclosing rule.
    pub(crate) fn thread(&mut self, mut scope: Scope, mut ends: Ends) -> Step {
        loop {
            let token = self.peek()?.clone();
            (scope, ends) = match token.kind {
                TokenKind::Stop => return Ok((scope, ends)),
                TokenKind::Token if TERMINATORS.contains(&token.text.as_str()) => {
                    return Ok((scope, ends));
                }
                TokenKind::Start => self.block(scope, ends)?,
                TokenKind::Break => {
                    self.advance()?;
                    (scope, ends)
                }
                TokenKind::Dash => self.simple(scope, ends, NodeBody::Rule { next: None })?,
                TokenKind::Error => {
                    self.error(format!("scanner error: {}", token.text));
                    self.advance()?;
                    (scope, ends)
                }
                TokenKind::Token => match token.text.as_str() {
                    "{" => self.brace(scope, ends)?,
                    "@" => self.label(scope, ends)?,
                    "->" => self.goto(scope, ends)?,
                    "<-" => {
                        self.advance()?;
                        self.story.tie(ends.rets, &Target::Ret)?;
                        (scope.next(), Ends::new(Vec::new(), ends.escs))
                    }
                    "<" => self.cue(scope, ends)?,
                    "/" => self.simple(scope, ends, NodeBody::Break { next: None })?,
                    "//" => self.simple(scope, ends, NodeBody::Paragraph { next: None })?,
                    _ => self.text(scope, ends)?,
                },
                _ => self.text(scope, ends)?,
            };
        }
    }

    /// A node made of a single token.
    fn simple(&mut self, scope: Scope, ends: Ends, body: NodeBody) -> Step {
        let position = self.advance()?.position();
        self.append(scope, ends, body, position)
    }

    fn text(&mut self, scope: Scope, ends: Ends) -> Step {
        let first = self.advance()?;
        let position = first.position();
        let lift = first.value.space.clone();
        let mut text = typography(&first.value).to_string();
        while is_text(self.peek()?) {
            let token = self.advance()?.value;
            text.push_str(&token.space);
            text.push_str(typography(&token));
        }
        let drop = self.peek()?.space.clone();
        let body = NodeBody::Text {
            text,
            lift,
            drop,
            next: None,
        };
        self.append(scope, ends, body, position)
    }

    /// An indented block opened by a `start` token.
    fn block(&mut self, scope: Scope, ends: Ends) -> Step {
        let start = self.advance()?;
        let position = start.position();
        let (scope, ends) = match start.value.text.as_str() {
            "+" => self.option(scope, ends, Leader::Repeat, position)?,
            "*" => self.option(scope, ends, Leader::Once, position)?,
            "-" => self.thread(scope, ends)?,
            ">" => self.ask(scope, ends, position)?,
            "!" => self.program(scope, ends)?,
            other => {
                self.error(format!("unknown block '{other}'"));
                self.thread(scope, ends)?
            }
        };
        self.expect_stop()?;
        Ok((scope, ends))
    }

    /// Consumes a block's `stop`. Anything else is reported and skipped up
    /// to the matching `stop`.
    fn expect_stop(&mut self) -> Result<(), CompileError> {
        let token = self.peek()?;
        if token.kind == TokenKind::Stop {
            self.advance()?;
            return Ok(());
        }
        let message = format!("expected end of block, found {token}");
        self.error(message);
        let mut depth = 0usize;
        loop {
            match self.advance()?.value.kind {
                TokenKind::Start => depth += 1,
                TokenKind::Stop if depth == 0 => return Ok(()),
                TokenKind::Stop => depth -= 1,
                _ => {}
            }
        }
    }

    /// A prompt: the options registered so far are offered here, and the
    /// pending escapes continue after the choice.
    fn ask(&mut self, scope: Scope, ends: Ends, position: Position) -> Step {
        log::debug!("ask at {scope}");
        self.story.create(&scope, NodeBody::Ask, position)?;
        self.story.tie_to(ends.rets, &scope)?;
        self.thread(scope.next(), Ends::rets(ends.escs))
    }
}

fn is_text(token: &Token) -> bool {
    token.kind.is_content()
        || (token.kind == TokenKind::Token
            && !TERMINATORS.contains(&token.text.as_str())
            && !INTRODUCERS.contains(&token.text.as_str()))
}

fn typography(token: &Token) -> &str {
    if token.kind != TokenKind::Token {
        return &token.text;
    }
    TYPOGRAPHY
        .iter()
        .find(|(from, _)| *from == token.text)
        .map_or(token.text.as_str(), |(_, to)| *to)
}
