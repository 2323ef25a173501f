//! Option blocks: the guards and consequences in front of an option, its
//! keywords, and the bracketed split between the question (what the choice
//! shows) and the answer (what choosing it says).
//!
//! ```text
//! + [Look around] You see nothing but fog.
//! * {-gold} <buy> [Buy the lamp.] You hand over a coin.
//! ```
//!
//! Text before the first `[` belongs to the answer only, a lone bracketed
//! thread to the question only, and after a nested `[Q]` the text inside the
//! outer brackets belongs to both. Text after the last `]` ends the answer
//! and carries on after the prompt. A body that starts with `]` reads the
//! same way with the roles of question and answer swapped. A body with no
//! brackets serves as both.

use std::collections::BTreeSet;

use skein_types::{
    BinaryOp, Ends, Expr, LooseEnd, NodeBody, NodeId, Position, Scope, Target,
};

use crate::CompileError;
use crate::control::{MUTATORS, SETTERS, move_node};
use crate::expression::invert_expression;
use crate::parser::{Parser, Step};
use crate::source::TokenSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Leader {
    /// `+`: offered every time.
    Repeat,
    /// `*`: offered until chosen once.
    Once,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Question,
    Answer,
    Both,
}

/// Delimiters and roles for one reading direction.
#[derive(Debug, Clone, Copy)]
struct Form {
    open: &'static str,
    close: &'static str,
    outer: Role,
    inner: Role,
}

const FORWARD: Form = Form {
    open: "[",
    close: "]",
    outer: Role::Answer,
    inner: Role::Question,
};

const REVERSED: Form = Form {
    open: "]",
    close: "[",
    outer: Role::Question,
    inner: Role::Answer,
};

/// A thread of the option body, before its role is settled.
struct Segment {
    start: Scope,
    entry: NodeId,
    end: Scope,
    ends: Ends,
}

#[derive(Default)]
struct Annotations {
    guards: Vec<Expr>,
    consequences: Vec<(Expr, Expr)>,
    keywords: BTreeSet<String>,
}

/// What the option body has produced so far.
struct Body {
    cursor: Scope,
    question: Vec<String>,
    answer: Vec<String>,
    escs: Vec<LooseEnd>,
    /// The last segment was answer-only and created something to continue from.
    advancing: bool,
}

impl Body {
    fn new(cursor: Scope) -> Self {
        Self {
            cursor,
            question: Vec::new(),
            answer: Vec::new(),
            escs: Vec::new(),
            advancing: false,
        }
    }
}

impl<S: TokenSource> Parser<S> {
    pub(crate) fn option(
        &mut self,
        scope: Scope,
        ends: Ends,
        leader: Leader,
        position: Position,
    ) -> Step {
        let mut annotations = self.annotations()?;
        if leader == Leader::Once {
            let counter = Expr::get(scope.name());
            annotations.guards.insert(
                0,
                Expr::binary(BinaryOp::Eq, counter.clone(), Expr::Val(0.0)),
            );
            let bumped = Expr::binary(BinaryOp::Add, counter.clone(), Expr::Val(1.0));
            annotations.consequences.insert(0, (counter, bumped));
        }
        let Annotations {
            guards,
            consequences,
            keywords,
        } = annotations;
        log::debug!("option at {scope}, {} guard(s)", guards.len());

        // Each failing guard skips straight past the option.
        let mut cursor = scope;
        let mut rets = ends.rets;
        let mut skips = Vec::new();
        for guard in guards {
            let body = NodeBody::Jump {
                condition: invert_expression(guard),
                branch: None,
                next: None,
            };
            let id = self.story.create(&cursor, body, position)?;
            self.story.tie_to(rets, &cursor)?;
            skips.push(LooseEnd::branch(id));
            rets = vec![LooseEnd::next(id)];
            cursor = cursor.next();
        }

        let node = NodeBody::Option {
            question: Vec::new(),
            answer: Vec::new(),
            keywords,
            next: None,
        };
        let id = self.story.create(&cursor, node, position)?;
        self.story.tie_to(rets, &cursor)?;

        let mut body = Body::new(cursor.first_child());
        self.consequences(&mut body, consequences, position)?;
        self.option_body(&mut body)?;
        if !body.advancing {
            let goto = self.story.create(&body.cursor, NodeBody::goto(), position)?;
            body.answer.push(body.cursor.name());
            body.escs.push(LooseEnd::next(goto));
        }

        if let Some(NodeBody::Option {
            question, answer, ..
        }) = self.story.node_mut(id).map(|node| &mut node.body)
        {
            *question = body.question;
            *answer = body.answer;
        }
        skips.push(LooseEnd::next(id));
        let mut escs = ends.escs;
        escs.extend(body.escs);
        Ok((cursor.next(), Ends::new(skips, escs)))
    }

    /// Guards, consequences and keywords in front of the option body.
    fn annotations(&mut self) -> Result<Annotations, CompileError> {
        let mut annotations = Annotations::default();
        loop {
            if self.at("<")? {
                self.advance()?;
                let keyword = self.words(">")?;
                if keyword.is_empty() {
                    self.error("empty keyword");
                } else {
                    annotations.keywords.insert(keyword);
                }
                continue;
            }
            if !self.at("{")? {
                return Ok(annotations);
            }
            self.advance()?;

            let token = self.peek()?.clone();
            if let Some(&(_, op)) = MUTATORS.iter().find(|(sigil, _)| token.is_op(sigil)) {
                self.advance()?;
                let Some((target, amount)) = self.mutation()? else {
                    self.skip_brace()?;
                    continue;
                };
                if op == BinaryOp::Sub {
                    let guard = Expr::binary(BinaryOp::Ge, target.clone(), Expr::Val(amount));
                    annotations.guards.push(guard);
                }
                let source = Expr::binary(op, target.clone(), Expr::Val(amount));
                annotations.consequences.push((target, source));
            } else if let Some(&(_, value)) = SETTERS.iter().find(|(sigil, _)| token.is_op(sigil)) {
                self.advance()?;
                let Some(target) = self.assignable()? else {
                    self.skip_brace()?;
                    continue;
                };
                annotations.consequences.push((target, Expr::Val(value)));
            } else {
                let guard = self.expression()?;
                annotations.guards.push(guard);
                // `{expr?}` reads the same as `{expr}`.
                if self.peek()?.is_op("?") {
                    self.advance()?;
                }
            }
            self.expect("}")?;
        }
    }

    /// Chains the consequence moves into the first answer entry.
    fn consequences(
        &mut self,
        body: &mut Body,
        consequences: Vec<(Expr, Expr)>,
        position: Position,
    ) -> Result<(), CompileError> {
        if consequences.is_empty() {
            return Ok(());
        }
        body.answer.push(body.cursor.name());
        let mut rets = Vec::new();
        for (target, source) in consequences {
            let id = self
                .story
                .create(&body.cursor, move_node(target, source), position)?;
            self.story.tie_to(rets, &body.cursor)?;
            rets = vec![LooseEnd::next(id)];
            body.cursor = body.cursor.next();
        }
        self.story.tie(rets, &Target::Ret)?;
        Ok(())
    }

    fn option_body(&mut self, body: &mut Body) -> Result<(), CompileError> {
        let lead = self.segment(&body.cursor)?;
        let form = if self.at("[")? {
            FORWARD
        } else if self.at("]")? {
            REVERSED
        } else {
            return self.settle(body, lead, Role::Both, true);
        };
        self.settle(body, lead, form.outer, false)?;
        self.advance()?;

        let mut depth = 1;
        let mut first = true;
        loop {
            let segment = self.segment(&body.cursor)?;
            let role = if depth == 2 {
                form.inner
            } else if first && self.at(form.open)? {
                form.outer
            } else if first {
                form.inner
            } else {
                Role::Both
            };
            self.settle(body, segment, role, false)?;
            first = false;

            let token = self.peek()?;
            if token.is(form.close) {
                self.advance()?;
                depth -= 1;
                if depth == 0 {
                    break;
                }
            } else if token.is(form.open) {
                self.advance()?;
                if depth == 2 {
                    self.error(format!("'{}' nested too deeply", form.open));
                }
                depth = 2;
            } else {
                let message = format!("expected '{}', found {token}", form.close);
                self.error(message);
                break;
            }
        }

        let mut last = self.segment(&body.cursor)?;
        loop {
            let token = self.peek()?;
            if !(token.is("[") || token.is("]")) {
                break;
            }
            let message = format!("unexpected {token} after the closing bracket");
            self.error(message);
            self.advance()?;
            (last.end, last.ends) = self.thread(last.end, last.ends)?;
        }
        self.settle(body, last, form.outer, true)
    }

    /// Parses one body thread starting at `start`, from a placeholder entry.
    fn segment(&mut self, start: &Scope) -> Result<Segment, CompileError> {
        let position = self.position();
        let entry = self.story.create_placeholder(start, position)?;
        let (end, ends) = self.thread(start.clone(), Ends::rets(vec![LooseEnd::next(entry)]))?;
        Ok(Segment {
            start: start.clone(),
            entry,
            end,
            ends,
        })
    }

    /// Files a segment under the question and/or answer, unless it produced
    /// nothing, and routes its loose ends.
    fn settle(
        &mut self,
        body: &mut Body,
        segment: Segment,
        role: Role,
        last: bool,
    ) -> Result<(), CompileError> {
        let Segment {
            start,
            entry,
            end,
            ends,
        } = segment;
        let empty = end == start && self.story.is_placeholder(entry);
        if empty {
            self.story.discard_placeholder(entry);
        } else {
            if role != Role::Answer {
                body.question.push(start.name());
            }
            if role != Role::Question {
                body.answer.push(start.name());
            }
        }

        body.escs.extend(ends.escs);
        body.advancing = last && role == Role::Answer && !empty;
        if body.advancing {
            body.escs.extend(ends.rets);
        } else {
            self.story.tie(ends.rets, &Target::Ret)?;
        }
        body.cursor = end;
        Ok(())
    }
}
