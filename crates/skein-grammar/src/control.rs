//! Labels, jumps, calls, cues, assignments and switches.

use skein_types::{
    BinaryOp, Ends, Expr, LooseEnd, NodeBody, NodeId, Position, Scope, SwitchMode, Target,
    TokenKind, UnaryOp,
};

use crate::CompileError;
use crate::expression::invert_expression;
use crate::parser::{Parser, Step};
use crate::source::TokenSource;

/// Mutators that open a brace block, and the operator they apply.
pub(crate) const MUTATORS: &[(&str, BinaryOp)] = &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)];

/// Constant assignments: `{! x}` sets, `{? x}` clears.
pub(crate) const SETTERS: &[(&str, f64)] = &[("!", 1.0), ("?", 0.0)];

/// Sigils for switches that keep their own index or draw it at random.
const SWITCH_MODES: &[(&str, SwitchMode)] = &[
    ("|", SwitchMode::Walk),
    ("&", SwitchMode::Loop),
    ("~", SwitchMode::Rand),
];

/// Assignment operators in `!` programs; compound forms fold in the target.
const ASSIGNMENTS: &[(&str, Option<BinaryOp>)] = &[
    ("=", None),
    ("+=", Some(BinaryOp::Add)),
    ("-=", Some(BinaryOp::Sub)),
    ("*=", Some(BinaryOp::Mul)),
    ("/=", Some(BinaryOp::Div)),
    ("%=", Some(BinaryOp::Mod)),
];

/// A conditional-index switch always has room for an else case.
const MIN_CASES: usize = 2;

/// How a switch chooses its case.
struct Selection {
    mode: SwitchMode,
    variable: Option<String>,
    value: Expr,
    weighted: bool,
    min_cases: usize,
}

impl<S: TokenSource> Parser<S> {
    /// `{ ... }` in a thread.
    pub(crate) fn brace(&mut self, scope: Scope, ends: Ends) -> Step {
        let position = self.advance()?.position();
        let token = self.peek()?.clone();

        if let Some(&(_, op)) = MUTATORS.iter().find(|(sigil, _)| token.is_op(sigil)) {
            self.advance()?;
            let Some((target, amount)) = self.mutation()? else {
                self.skip_brace()?;
                return Ok((scope, ends));
            };
            let source = Expr::binary(op, target.clone(), Expr::Val(amount));
            self.expect("}")?;
            return self.append(scope, ends, move_node(target, source), position);
        }

        if let Some(&(_, value)) = SETTERS.iter().find(|(sigil, _)| token.is_op(sigil)) {
            self.advance()?;
            let Some(target) = self.assignable()? else {
                self.skip_brace()?;
                return Ok((scope, ends));
            };
            self.expect("}")?;
            return self.append(scope, ends, move_node(target, Expr::Val(value)), position);
        }

        if token.is_op("$") {
            self.advance()?;
            let expr = self.expression()?;
            self.expect("}")?;
            return self.append(scope, ends, NodeBody::Echo { expr, next: None }, position);
        }

        if let Some(&(_, mode)) = SWITCH_MODES.iter().find(|(sigil, _)| token.is_op(sigil)) {
            self.advance()?;
            let name = scope.name();
            let selection = match mode {
                SwitchMode::Rand => Selection {
                    mode,
                    variable: None,
                    value: Expr::Val(0.0),
                    weighted: false,
                    min_cases: 0,
                },
                _ => Selection {
                    mode,
                    value: Expr::get(name.clone()),
                    variable: Some(name),
                    weighted: false,
                    min_cases: 0,
                },
            };
            return self.switch(scope, ends, selection, position);
        }

        let expr = self.selector()?;
        let token = self.peek()?.clone();
        if token.is("}") {
            self.advance()?;
            return self.append(scope, ends, NodeBody::Echo { expr, next: None }, position);
        }
        if token.is_op("?") {
            self.advance()?;
            return self.jump(scope, ends, expr, position);
        }
        if token.is("|") {
            self.advance()?;
            let selection = Selection {
                mode: SwitchMode::Walk,
                variable: None,
                value: expr,
                weighted: false,
                min_cases: MIN_CASES,
            };
            return self.switch(scope, ends, selection, position);
        }
        if token.is_op("~") {
            self.advance()?;
            let selection = Selection {
                mode: SwitchMode::Pick,
                variable: None,
                value: expr,
                weighted: true,
                min_cases: 0,
            };
            return self.switch(scope, ends, selection, position);
        }

        self.error(format!("expected '}}', found {token}"));
        self.append(scope, ends, NodeBody::Echo { expr, next: None }, position)
    }

    /// `[n] variable` after a `+` or `-` sigil: the variable and the amount.
    pub(crate) fn mutation(&mut self) -> Result<Option<(Expr, f64)>, CompileError> {
        let amount = if self.peek()?.kind == TokenKind::Number {
            let text = self.advance()?.value.text;
            text.parse::<f64>().unwrap_or_else(|_| {
                self.error(format!("invalid number '{text}'"));
                1.0
            })
        } else {
            1.0
        };
        Ok(self.assignable()?.map(|target| (target, amount)))
    }

    /// Drops the rest of a malformed brace block.
    pub(crate) fn skip_brace(&mut self) -> Result<(), CompileError> {
        loop {
            let token = self.peek()?;
            if token.is("}") {
                self.advance()?;
                break;
            }
            if matches!(token.kind, TokenKind::Stop | TokenKind::Start) {
                break;
            }
            self.advance()?;
        }
        Ok(())
    }

    /// `{condition? then | else}`: the jump branches to the else case when
    /// the condition fails.
    fn jump(&mut self, scope: Scope, ends: Ends, condition: Expr, position: Position) -> Step {
        let body = NodeBody::Jump {
            condition: invert_expression(condition),
            branch: None,
            next: None,
        };
        let id = self.story.create(&scope, body, position)?;
        self.story.tie_to(ends.rets, &scope)?;

        let mut escs = ends.escs;
        let (cursor, then) = self.thread(scope.first_child(), Ends::rets(vec![LooseEnd::next(id)]))?;
        let mut rets = then.rets;
        escs.extend(then.escs);
        if self.eat("|")? {
            let (_, otherwise) = self.thread(cursor, Ends::rets(vec![LooseEnd::branch(id)]))?;
            rets.extend(otherwise.rets);
            escs.extend(otherwise.escs);
        } else {
            rets.push(LooseEnd::branch(id));
        }
        self.expect("}")?;
        Ok((scope.next(), Ends::new(rets, escs)))
    }

    /// The cases of a switch, up to the closing `}`.
    fn switch(&mut self, scope: Scope, ends: Ends, selection: Selection, position: Position) -> Step {
        log::debug!("{} switch at {scope}", selection.mode);
        let Selection {
            mode,
            variable,
            value,
            weighted,
            min_cases,
        } = selection;
        let body = NodeBody::Switch {
            mode,
            variable,
            value,
            branches: Vec::new(),
            weights: Vec::new(),
            next: None,
        };
        let id = self.story.create(&scope, body, position)?;
        self.story.tie_to(ends.rets, &scope)?;

        let mut rets = Vec::new();
        let mut escs = ends.escs;
        let mut cursor = scope.first_child();
        let mut count = 0;
        loop {
            let weight = if weighted && self.at("(")? {
                self.advance()?;
                let weight = self.expression()?;
                self.expect(")")?;
                Some(weight)
            } else {
                None
            };
            self.push_case(id, weight);
            let case;
            (cursor, case) = self.thread(cursor, Ends::rets(vec![LooseEnd::case(id, count)]))?;
            rets.extend(case.rets);
            escs.extend(case.escs);
            count += 1;
            if !self.eat("|")? {
                break;
            }
        }
        self.expect("}")?;

        while count < min_cases {
            self.push_case(id, None);
            rets.push(LooseEnd::case(id, count));
            count += 1;
        }
        match mode {
            SwitchMode::Pick => rets.push(LooseEnd::next(id)),
            SwitchMode::Rand => self.draw_uniformly(id, count),
            _ => {}
        }
        Ok((scope.next(), Ends::new(rets, escs)))
    }

    fn draw_uniformly(&mut self, id: NodeId, count: usize) {
        if let Some(NodeBody::Switch { value, .. }) = self.story.node_mut(id).map(|node| &mut node.body)
        {
            *value = Expr::unary(UnaryOp::Random, Expr::Val(count as f64));
        }
    }

    fn push_case(&mut self, id: NodeId, weight: Option<Expr>) {
        if let Some(NodeBody::Switch {
            branches, weights, ..
        }) = self.story.node_mut(id).map(|node| &mut node.body)
        {
            branches.push(None);
            weights.push(weight);
        }
    }

    /// A dotted name made of adjoining words and numbers.
    fn name(&mut self) -> Result<Option<String>, CompileError> {
        if self.peek()?.kind != TokenKind::Alphanum {
            return Ok(None);
        }
        let mut name = self.advance()?.value.text;
        loop {
            let token = self.peek()?;
            let joins = token.adjoins()
                && (matches!(token.kind, TokenKind::Alphanum | TokenKind::Number)
                    || token.is_op("."));
            if !joins {
                return Ok(Some(name));
            }
            name.push_str(&self.advance()?.value.text);
        }
    }

    /// Claims a label name, renaming duplicates and names that could collide
    /// with generated ones.
    fn claim_label(&mut self, name: String) -> String {
        let generated = name
            .split('.')
            .skip(1)
            .any(|part| part.chars().all(|c| c.is_ascii_digit()));
        if generated {
            self.error(format!("label '{name}' has a numeric part"));
        } else if self.story.is_defined(&name) {
            self.error(format!("label '{name}' is already defined"));
        } else {
            return name;
        }
        self.story.fresh_label(&name)
    }

    /// `@name`, `@name(params)` or `@...`.
    pub(crate) fn label(&mut self, scope: Scope, ends: Ends) -> Step {
        let position = self.advance()?.position();
        if self.at("...")? {
            self.advance()?;
            return self.loop_label(scope, ends, position);
        }
        let Some(name) = self.name()? else {
            let message = format!("expected label name, found {}", self.peek()?);
            self.error(message);
            return Ok((scope, ends));
        };
        if self.at("(")? && self.peek()?.adjoins() {
            return self.subroutine(scope, ends, name, position);
        }

        let name = self.claim_label(name);
        log::debug!("label {name}");
        let label = Scope::label(name);
        let entry = self.story.create_placeholder(&label, position)?;
        self.story.tie_to(ends.rets, &label)?;
        Ok((label, Ends::new(vec![LooseEnd::next(entry)], ends.escs)))
    }

    /// The rest of the block loops back to its own entry.
    fn loop_label(&mut self, scope: Scope, ends: Ends, position: Position) -> Step {
        log::debug!("loop at {scope}");
        let entry = self.story.create_placeholder(&scope, position)?;
        self.story.tie_to(ends.rets, &scope)?;
        let (cursor, body) = self.thread(scope.clone(), Ends::rets(vec![LooseEnd::next(entry)]))?;
        self.story.tie_to(body.rets, &scope)?;
        let mut escs = ends.escs;
        escs.extend(body.escs);
        Ok((cursor, Ends::new(Vec::new(), escs)))
    }

    /// A callable entry point. Its body is the rest of the block; the
    /// enclosing thread carries on past it untouched.
    fn subroutine(&mut self, scope: Scope, ends: Ends, name: String, position: Position) -> Step {
        self.advance()?;
        let mut params = Vec::new();
        if !self.eat(")")? {
            loop {
                match self.name()? {
                    Some(param) => params.push(param),
                    None => {
                        let message = format!("expected parameter name, found {}", self.peek()?);
                        self.error(message);
                        break;
                    }
                }
                if !self.eat(",")? {
                    break;
                }
            }
            self.expect(")")?;
        }

        let name = self.claim_label(name);
        log::debug!("subroutine {name}({})", params.join(", "));
        let entry = Scope::label(name);
        let id = self
            .story
            .create(&entry, NodeBody::Def { params, next: None }, position)?;
        let (_, body) = self.thread(entry.next(), Ends::rets(vec![LooseEnd::next(id)]))?;
        self.story.tie(body.rets, &Target::Ret)?;
        self.story.tie(body.escs, &Target::Esc)?;
        Ok((scope, ends))
    }

    /// `-> name` or `-> name(args)`.
    pub(crate) fn goto(&mut self, scope: Scope, ends: Ends) -> Step {
        let position = self.advance()?.position();
        let Some(name) = self.name()? else {
            let message = format!("expected label name, found {}", self.peek()?);
            self.error(message);
            return Ok((scope, ends));
        };
        if self.at("(")? && self.peek()?.adjoins() {
            let args = self.arguments()?;
            let body = NodeBody::Call {
                label: name,
                args,
                next: None,
                branch: None,
            };
            let id = self.story.create(&scope, body, position)?;
            self.story.tie_to(ends.rets, &scope)?;
            let mut escs = ends.escs;
            escs.push(LooseEnd::branch(id));
            return Ok((scope.next(), Ends::new(vec![LooseEnd::next(id)], escs)));
        }
        // The scope may hold a placeholder that is now a goto itself.
        self.story.tie(ends.rets, &Target::Node(name))?;
        Ok((scope.next(), Ends::new(Vec::new(), ends.escs)))
    }

    /// `<name>`: a side-channel signal.
    pub(crate) fn cue(&mut self, scope: Scope, ends: Ends) -> Step {
        let position = self.advance()?.position();
        let cue = self.words(">")?;
        if cue.is_empty() {
            self.error("empty cue");
            return Ok((scope, ends));
        }
        self.append(scope, ends, NodeBody::Cue { cue, next: None }, position)
    }

    /// Joins token texts up to `close`, which is consumed if present.
    pub(crate) fn words(&mut self, close: &str) -> Result<String, CompileError> {
        let mut words = String::new();
        loop {
            let token = self.peek()?;
            if token.is(close) {
                self.advance()?;
                return Ok(words);
            }
            if matches!(
                token.kind,
                TokenKind::Stop | TokenKind::Start | TokenKind::Break
            ) {
                let message = format!("expected '{close}', found {token}");
                self.error(message);
                return Ok(words);
            }
            let token = self.advance()?.value;
            if !words.is_empty() {
                words.push_str(&token.space);
            }
            words.push_str(&token.text);
        }
    }

    /// A `!` block: assignments, optionally separated by commas.
    pub(crate) fn program(&mut self, mut scope: Scope, mut ends: Ends) -> Step {
        loop {
            let token = self.peek()?;
            // A nested block is left for the enclosing `expect_stop` to skip.
            if matches!(token.kind, TokenKind::Stop | TokenKind::Start) {
                return Ok((scope, ends));
            }
            if token.is(",") || token.kind == TokenKind::Break {
                self.advance()?;
                continue;
            }
            let position = self.position();
            let Some(target) = self.assignable()? else {
                self.advance()?;
                continue;
            };
            let token = self.peek()?;
            let Some(&(_, op)) = ASSIGNMENTS.iter().find(|(spelling, _)| token.is_op(spelling))
            else {
                let message = format!("expected assignment, found {token}");
                self.error(message);
                continue;
            };
            self.advance()?;
            let value = self.expression()?;
            let source = match op {
                Some(op) => Expr::binary(op, target.clone(), value),
                None => value,
            };
            (scope, ends) = self.append(scope, ends, move_node(target, source), position)?;
        }
    }
}

pub(crate) fn move_node(target: Expr, source: Expr) -> NodeBody {
    NodeBody::Move {
        target,
        source,
        next: None,
    }
}
