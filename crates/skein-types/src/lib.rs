pub mod expr;
pub mod node;
pub mod scope;
pub mod story;
pub mod token;

pub use expr::{BinaryOp, Expr, UnaryOp};
pub use node::{Link, LinkField, Node, NodeBody, NodeKind, SwitchMode, Target};
pub use scope::Scope;
pub use story::{Diagnostic, Ends, LooseEnd, NodeId, StoreError, Story};
pub use token::{Located, Position, Token, TokenKind};
