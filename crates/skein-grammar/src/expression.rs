//! Precedence-climbing value expressions.

use skein_types::{BinaryOp, Expr, Token, TokenKind, UnaryOp};

use crate::CompileError;
use crate::parser::Parser;
use crate::source::TokenSource;

/// Binary operators grouped by precedence, lowest first.
pub(crate) type Tiers = &'static [&'static [BinaryOp]];

pub(crate) const TIERS: Tiers = &[
    &[BinaryOp::Or],
    &[BinaryOp::And],
    &[
        BinaryOp::Lt,
        BinaryOp::Le,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Ge,
        BinaryOp::Gt,
    ],
    &[BinaryOp::Add, BinaryOp::Sub],
    &[
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Mod,
        BinaryOp::Rem,
        BinaryOp::Random,
    ],
    &[BinaryOp::Pow],
];

/// Switch selectors: `~` is left to introduce a weighted pick.
pub(crate) const SELECTOR_TIERS: Tiers = &[
    &[BinaryOp::Or],
    &[BinaryOp::And],
    &[
        BinaryOp::Lt,
        BinaryOp::Le,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Ge,
        BinaryOp::Gt,
    ],
    &[BinaryOp::Add, BinaryOp::Sub],
    &[BinaryOp::Mul, BinaryOp::Div, BinaryOp::Mod, BinaryOp::Rem],
    &[BinaryOp::Pow],
];

const UNARY: &[UnaryOp] = &[UnaryOp::Not, UnaryOp::Neg, UnaryOp::Random, UnaryOp::Count];

/// Comparisons and their logical complements.
const COMPLEMENTS: &[(BinaryOp, BinaryOp)] = &[
    (BinaryOp::Eq, BinaryOp::Ne),
    (BinaryOp::Gt, BinaryOp::Le),
    (BinaryOp::Lt, BinaryOp::Ge),
];

/// The logical negation of `expr`, flipping a comparison where one applies.
pub fn invert_expression(expr: Expr) -> Expr {
    match expr {
        Expr::Binary { op, left, right } => match complement(op) {
            Some(op) => Expr::Binary { op, left, right },
            None => Expr::unary(UnaryOp::Not, Expr::Binary { op, left, right }),
        },
        other => Expr::unary(UnaryOp::Not, other),
    }
}

fn complement(op: BinaryOp) -> Option<BinaryOp> {
    COMPLEMENTS.iter().find_map(|&(a, b)| {
        if a == op {
            Some(b)
        } else if b == op {
            Some(a)
        } else {
            None
        }
    })
}

/// Operators may be scanned as punctuation or, for `and`/`or`/`not`/`rem`,
/// as words.
fn spells(token: &Token, spelling: &str) -> bool {
    token.text == spelling
        && matches!(
            token.kind,
            TokenKind::Token | TokenKind::Symbol | TokenKind::Alphanum
        )
}

impl<S: TokenSource> Parser<S> {
    pub(crate) fn expression(&mut self) -> Result<Expr, CompileError> {
        self.climb(TIERS, 0)
    }

    pub(crate) fn selector(&mut self) -> Result<Expr, CompileError> {
        self.climb(SELECTOR_TIERS, 0)
    }

    fn climb(&mut self, tiers: Tiers, level: usize) -> Result<Expr, CompileError> {
        let Some(ops) = tiers.get(level) else {
            return self.unary();
        };
        let mut left = self.climb(tiers, level + 1)?;
        while let Some(op) = self.binary_op(ops)? {
            self.advance()?;
            let right = self.climb(tiers, level + 1)?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn binary_op(&self, ops: &[BinaryOp]) -> Result<Option<BinaryOp>, CompileError> {
        let token = self.peek()?;
        Ok(ops.iter().copied().find(|op| spells(token, op.as_ref())))
    }

    fn unary(&mut self) -> Result<Expr, CompileError> {
        let token = self.peek()?;
        if let Some(op) = UNARY.iter().copied().find(|op| spells(token, op.as_ref())) {
            self.advance()?;
            let operand = self.unary()?;
            return Ok(Expr::unary(op, operand));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, CompileError> {
        let token = self.peek()?;
        if token.kind == TokenKind::Number {
            let text = self.advance()?.value.text;
            return match text.parse::<f64>() {
                Ok(n) => Ok(Expr::Val(n)),
                Err(_) => {
                    self.error(format!("invalid number '{text}'"));
                    Ok(Expr::Val(0.0))
                }
            };
        }
        if token.is("(") {
            self.advance()?;
            let expr = self.expression()?;
            self.expect(")")?;
            return Ok(expr);
        }
        if self.at_reference()? {
            return self.reference();
        }
        let message = format!("expected expression, found {}", self.peek()?);
        self.error(message);
        Ok(Expr::Val(0.0))
    }

    pub(crate) fn at_reference(&self) -> Result<bool, CompileError> {
        let token = self.peek()?;
        Ok(token.kind == TokenKind::Alphanum || token.is("{"))
    }

    /// A variable, either static (`room.seen`) or spliced together from
    /// adjoining pieces (`room.{i}.seen`). A static name that abuts `(` is
    /// a call.
    pub(crate) fn reference(&mut self) -> Result<Expr, CompileError> {
        let mut parts = vec![String::new()];
        let mut exprs = Vec::new();
        let mut first = true;
        loop {
            let token = self.peek()?;
            if !first && !token.adjoins() {
                break;
            }
            if matches!(token.kind, TokenKind::Alphanum | TokenKind::Number) || token.is_op(".") {
                let text = self.advance()?.value.text;
                if let Some(part) = parts.last_mut() {
                    part.push_str(&text);
                }
            } else if token.is("{") {
                self.advance()?;
                exprs.push(self.expression()?);
                self.expect("}")?;
                parts.push(String::new());
            } else {
                break;
            }
            first = false;
        }

        if !exprs.is_empty() {
            return Ok(Expr::Var { parts, exprs });
        }
        let name = parts.concat();
        if self.at("(")? && self.peek()?.adjoins() {
            let args = self.arguments()?;
            return Ok(Expr::Call { callee: name, args });
        }
        Ok(Expr::Get(name))
    }

    /// A parenthesised, comma-separated argument list.
    pub(crate) fn arguments(&mut self) -> Result<Vec<Expr>, CompileError> {
        self.expect("(")?;
        let mut args = Vec::new();
        if self.eat(")")? {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if !self.eat(",")? {
                break;
            }
        }
        self.expect(")")?;
        Ok(args)
    }

    /// The target of an assignment. Reports and yields nothing when the
    /// next tokens do not name a variable.
    pub(crate) fn assignable(&mut self) -> Result<Option<Expr>, CompileError> {
        if !self.at_reference()? {
            let message = format!("expected variable, found {}", self.peek()?);
            self.error(message);
            return Ok(None);
        }
        let target = self.reference()?;
        if !target.is_variable() {
            self.error(format!("cannot assign to {target}"));
            return Ok(None);
        }
        Ok(Some(target))
    }
}
