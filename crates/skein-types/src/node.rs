//! Nodes of the compiled instruction graph.
//!
//! Links between nodes are names, not references: a link is filled in once
//! the grammar knows what follows, and until then it is `None`.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};
use strum::{AsRefStr, Display, EnumIter};

use crate::expr::Expr;
use crate::token::Position;

/// Where a resolved link leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Node(String),
    /// Return to the caller (or end the story at top level).
    Ret,
    /// Escape-return: resume after the caller's next prompt.
    Esc,
}

impl Target {
    pub const RET: &'static str = "RET";
    pub const ESC: &'static str = "ESC";

    pub fn node(name: impl Into<String>) -> Self {
        Target::Node(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Target::Node(name) => name,
            Target::Ret => Self::RET,
            Target::Esc => Self::ESC,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A forward link: unresolved until tied.
pub type Link = Option<Target>;

/// Which link of a node a loose end stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkField {
    Next,
    Branch,
    Case(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SwitchMode {
    /// Advance an index, sticking on the last case.
    Walk,
    /// Advance an index, wrapping around.
    Loop,
    /// Uniform random case.
    Rand,
    /// Weighted random case; may select nothing and fall through.
    Pick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Text,
    Break,
    Paragraph,
    Rule,
    Ask,
    Jump,
    Switch,
    Move,
    Echo,
    Cue,
    Goto,
    Call,
    Def,
    Option,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeBody {
    Text {
        text: String,
        /// Space before the text.
        lift: String,
        /// Space after the text.
        drop: String,
        next: Link,
    },
    Break {
        next: Link,
    },
    Paragraph {
        next: Link,
    },
    Rule {
        next: Link,
    },
    /// Presents the options registered so far; the chosen answer continues.
    Ask,
    /// Takes `branch` when `condition` holds, `next` otherwise.
    Jump {
        condition: Expr,
        branch: Link,
        next: Link,
    },
    Switch {
        mode: SwitchMode,
        /// Variable holding the switch's own index, for walk and loop.
        variable: Option<String>,
        value: Expr,
        branches: Vec<Link>,
        weights: Vec<Option<Expr>>,
        /// Fall-through when a pick selects no case. Unused otherwise.
        #[serde(skip_serializing_if = "Option::is_none")]
        next: Link,
    },
    Move {
        target: Expr,
        source: Expr,
        next: Link,
    },
    Echo {
        expr: Expr,
        next: Link,
    },
    Cue {
        cue: String,
        next: Link,
    },
    Goto {
        next: Link,
    },
    /// `next` is the normal return, `branch` the escape return.
    Call {
        label: String,
        args: Vec<Expr>,
        next: Link,
        branch: Link,
    },
    Def {
        params: Vec<String>,
        next: Link,
    },
    Option {
        question: Vec<String>,
        answer: Vec<String>,
        keywords: BTreeSet<String>,
        next: Link,
    },
}

impl NodeBody {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeBody::Text { .. } => NodeKind::Text,
            NodeBody::Break { .. } => NodeKind::Break,
            NodeBody::Paragraph { .. } => NodeKind::Paragraph,
            NodeBody::Rule { .. } => NodeKind::Rule,
            NodeBody::Ask => NodeKind::Ask,
            NodeBody::Jump { .. } => NodeKind::Jump,
            NodeBody::Switch { .. } => NodeKind::Switch,
            NodeBody::Move { .. } => NodeKind::Move,
            NodeBody::Echo { .. } => NodeKind::Echo,
            NodeBody::Cue { .. } => NodeKind::Cue,
            NodeBody::Goto { .. } => NodeKind::Goto,
            NodeBody::Call { .. } => NodeKind::Call,
            NodeBody::Def { .. } => NodeKind::Def,
            NodeBody::Option { .. } => NodeKind::Option,
        }
    }

    pub fn goto() -> Self {
        NodeBody::Goto { next: None }
    }

    /// The storage slot behind a loose end, if this kind of node has one.
    pub fn link_mut(&mut self, field: LinkField) -> Option<&mut Link> {
        match (self, field) {
            (
                NodeBody::Text { next, .. }
                | NodeBody::Break { next }
                | NodeBody::Paragraph { next }
                | NodeBody::Rule { next }
                | NodeBody::Jump { next, .. }
                | NodeBody::Move { next, .. }
                | NodeBody::Echo { next, .. }
                | NodeBody::Cue { next, .. }
                | NodeBody::Goto { next }
                | NodeBody::Call { next, .. }
                | NodeBody::Def { next, .. }
                | NodeBody::Option { next, .. },
                LinkField::Next,
            ) => Some(next),
            (
                NodeBody::Switch {
                    mode: SwitchMode::Pick,
                    next,
                    ..
                },
                LinkField::Next,
            ) => Some(next),
            (NodeBody::Jump { branch, .. } | NodeBody::Call { branch, .. }, LinkField::Branch) => {
                Some(branch)
            }
            (NodeBody::Switch { branches, .. }, LinkField::Case(index)) => branches.get_mut(index),
            _ => None,
        }
    }

    /// Every link this node must have resolved, with the field it lives in.
    pub fn links(&self) -> Vec<(LinkField, &Link)> {
        match self {
            NodeBody::Text { next, .. }
            | NodeBody::Break { next }
            | NodeBody::Paragraph { next }
            | NodeBody::Rule { next }
            | NodeBody::Move { next, .. }
            | NodeBody::Echo { next, .. }
            | NodeBody::Cue { next, .. }
            | NodeBody::Goto { next }
            | NodeBody::Def { next, .. }
            | NodeBody::Option { next, .. } => vec![(LinkField::Next, next)],
            NodeBody::Ask => Vec::new(),
            NodeBody::Jump { branch, next, .. } | NodeBody::Call { branch, next, .. } => {
                vec![(LinkField::Next, next), (LinkField::Branch, branch)]
            }
            NodeBody::Switch {
                mode,
                branches,
                next,
                ..
            } => {
                let mut links: Vec<_> = branches
                    .iter()
                    .enumerate()
                    .map(|(i, branch)| (LinkField::Case(i), branch))
                    .collect();
                if *mode == SwitchMode::Pick {
                    links.push((LinkField::Next, next));
                }
                links
            }
        }
    }

    /// Node names referenced outside the link fields.
    pub fn references(&self) -> Vec<&str> {
        match self {
            NodeBody::Option {
                question, answer, ..
            } => question.iter().chain(answer).map(String::as_str).collect(),
            NodeBody::Call { label, .. } => vec![label.as_str()],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    #[serde(flatten)]
    pub body: NodeBody,
    #[serde(skip)]
    pub position: Position,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    /// The `next` link, for kinds that fall through.
    pub fn next(&self) -> Option<&Target> {
        self.links()
            .into_iter()
            .find(|(field, _)| *field == LinkField::Next)
            .and_then(|(_, link)| link.as_ref())
    }

    pub fn links(&self) -> Vec<(LinkField, &Link)> {
        self.body.links()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_next_only_counts_for_pick() {
        let mut walk = NodeBody::Switch {
            mode: SwitchMode::Walk,
            variable: None,
            value: Expr::Val(0.0),
            branches: vec![None, None],
            weights: vec![None, None],
            next: None,
        };
        assert!(walk.link_mut(LinkField::Next).is_none());
        assert!(walk.link_mut(LinkField::Case(1)).is_some());
        assert!(walk.link_mut(LinkField::Case(2)).is_none());
        assert_eq!(walk.links().len(), 2);

        if let NodeBody::Switch { mode, .. } = &mut walk {
            *mode = SwitchMode::Pick;
        }
        assert!(walk.link_mut(LinkField::Next).is_some());
        assert_eq!(walk.links().len(), 3);
    }

    #[test]
    fn ask_has_no_links() {
        let mut ask = NodeBody::Ask;
        assert!(ask.link_mut(LinkField::Next).is_none());
        assert!(ask.links().is_empty());
        assert_eq!(ask.kind().to_string(), "ask");
    }

    #[test]
    fn references_cover_option_threads_and_callees() {
        let option = NodeBody::Option {
            question: vec!["a.1".into()],
            answer: vec!["a.2".into(), "a.3".into()],
            keywords: BTreeSet::new(),
            next: None,
        };
        assert_eq!(option.references(), vec!["a.1", "a.2", "a.3"]);
    }
}
