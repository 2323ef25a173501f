//! Pure value expressions: guards, assignment sources, switch selectors and
//! call arguments. Expressions never refer to node addresses.

use std::fmt;

use serde::{Serialize, Serializer};
use strum::{AsRefStr, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, EnumIter)]
pub enum UnaryOp {
    #[strum(serialize = "not")]
    Not,
    #[strum(serialize = "-")]
    Neg,
    /// Random integer below the operand.
    #[strum(serialize = "~")]
    Random,
    /// Count of the operand (string length or list size at runtime).
    #[strum(serialize = "#")]
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, EnumIter)]
pub enum BinaryOp {
    #[strum(serialize = "or")]
    Or,
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "<>")]
    Ne,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "rem")]
    Rem,
    /// Dice-style random: `a ~ b`.
    #[strum(serialize = "~")]
    Random,
    #[strum(serialize = "**")]
    Pow,
}

impl Serialize for UnaryOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

impl Serialize for BinaryOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expr {
    Val(f64),
    Get(String),
    /// A variable whose name is spliced together at runtime: `parts` has
    /// one more element than `exprs`, and they interleave.
    Var {
        parts: Vec<String>,
        exprs: Vec<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn get(name: impl Into<String>) -> Self {
        Expr::Get(name.into())
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// True for references that can be the target of an assignment.
    pub fn is_variable(&self) -> bool {
        matches!(self, Expr::Get(_) | Expr::Var { .. })
    }
}

/// Prefix rendering, e.g. `+(a, *(b, c))`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Val(n) => write!(f, "{n}"),
            Expr::Get(name) => write!(f, "{name}"),
            Expr::Var { parts, exprs } => {
                for (i, part) in parts.iter().enumerate() {
                    write!(f, "{part}")?;
                    if let Some(expr) = exprs.get(i) {
                        write!(f, "{{{expr}}}")?;
                    }
                }
                Ok(())
            }
            Expr::Call { callee, args } => {
                write!(f, "{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::Unary { op, operand } => write!(f, "{}({operand})", op.as_ref()),
            Expr::Binary { op, left, right } => {
                write!(f, "{}({left}, {right})", op.as_ref())
            }
        }
    }
}
