//! The node store: an arena of nodes addressed by name, plus the loose-end
//! bookkeeping the grammar uses to fill in forward links.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::{Serialize, Serializer};

use crate::node::{LinkField, Node, NodeBody, Target};
use crate::scope::Scope;
use crate::token::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A link that has not been resolved yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LooseEnd {
    pub node: NodeId,
    pub field: LinkField,
}

impl LooseEnd {
    pub fn next(node: NodeId) -> Self {
        Self {
            node,
            field: LinkField::Next,
        }
    }

    pub fn branch(node: NodeId) -> Self {
        Self {
            node,
            field: LinkField::Branch,
        }
    }

    pub fn case(node: NodeId, index: usize) -> Self {
        Self {
            node,
            field: LinkField::Case(index),
        }
    }
}

/// The two open sets of loose ends threaded through the grammar.
///
/// `rets` continue with whatever comes next in sequence. `escs` continue
/// after the next prompt, and become `rets` once one is crossed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ends {
    pub rets: Vec<LooseEnd>,
    pub escs: Vec<LooseEnd>,
}

impl Ends {
    pub fn new(rets: Vec<LooseEnd>, escs: Vec<LooseEnd>) -> Self {
        Self { rets, escs }
    }

    pub fn rets(rets: Vec<LooseEnd>) -> Self {
        Self {
            rets,
            escs: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rets.is_empty() && self.escs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub position: Position,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("node {name} already exists")]
    DuplicateNode { name: String },
    #[error("link {field:?} of {name} tied twice")]
    Retied { name: String, field: LinkField },
    #[error("node {name} has no {field:?} link")]
    NoSuchLink { name: String, field: LinkField },
}

#[derive(Debug, Clone, Default)]
pub struct Story {
    start: String,
    /// `None` marks a placeholder that real content replaced.
    slots: Vec<Option<Node>>,
    index: HashMap<String, NodeId>,
    placeholders: HashSet<NodeId>,
    diagnostics: Vec<Diagnostic>,
}

impl Story {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            ..Self::default()
        }
    }

    /// Name of the entry node.
    pub fn start(&self) -> &str {
        &self.start
    }

    /// Allocates a node at the scope's name. A placeholder already living
    /// there is retired, along with any of its links still pending.
    pub fn create(
        &mut self,
        scope: &Scope,
        body: NodeBody,
        position: Position,
    ) -> Result<NodeId, StoreError> {
        let name = scope.name();
        if let Some(&existing) = self.index.get(&name) {
            if !self.placeholders.remove(&existing) {
                return Err(StoreError::DuplicateNode { name });
            }
            log::trace!("replacing placeholder {name}");
            self.slots[existing.0] = None;
        }
        log::trace!("create {} {name}", body.kind());
        let id = NodeId(self.slots.len());
        self.slots.push(Some(Node {
            name: name.clone(),
            body,
            position,
        }));
        self.index.insert(name, id);
        Ok(id)
    }

    /// Creates a `goto` that the next node created at the same name replaces.
    pub fn create_placeholder(
        &mut self,
        scope: &Scope,
        position: Position,
    ) -> Result<NodeId, StoreError> {
        let id = self.create(scope, NodeBody::goto(), position)?;
        self.placeholders.insert(id);
        Ok(id)
    }

    /// Drops a placeholder nothing replaced or tied. Returns false when the
    /// node had already become permanent.
    pub fn discard_placeholder(&mut self, id: NodeId) -> bool {
        if !self.placeholders.remove(&id) {
            return false;
        }
        if let Some(node) = self.slots[id.0].take() {
            if self.index.get(&node.name) == Some(&id) {
                self.index.remove(&node.name);
            }
        }
        true
    }

    pub fn is_placeholder(&self, id: NodeId) -> bool {
        self.placeholders.contains(&id)
    }

    /// Resolves every loose end to `target`. Loose ends of retired
    /// placeholders are dropped.
    pub fn tie(&mut self, ends: Vec<LooseEnd>, target: &Target) -> Result<(), StoreError> {
        for end in ends {
            let Some(node) = self.slots[end.node.0].as_mut() else {
                continue;
            };
            let Some(link) = node.body.link_mut(end.field) else {
                return Err(StoreError::NoSuchLink {
                    name: node.name.clone(),
                    field: end.field,
                });
            };
            if link.is_some() {
                return Err(StoreError::Retied {
                    name: node.name.clone(),
                    field: end.field,
                });
            }
            log::trace!("tie {}:{:?} -> {target}", node.name, end.field);
            *link = Some(target.clone());
            self.placeholders.remove(&end.node);
        }
        Ok(())
    }

    /// Resolves every loose end to the node at `scope`.
    pub fn tie_to(&mut self, ends: Vec<LooseEnd>, scope: &Scope) -> Result<(), StoreError> {
        self.tie(ends, &Target::Node(scope.name()))
    }

    /// Records a non-fatal diagnostic.
    pub fn error(&mut self, position: Position, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            position,
            message: message.into(),
        };
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.index.get(name).and_then(|&id| self.node(id))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// True when a real (non-placeholder) node owns the name.
    pub fn is_defined(&self, name: &str) -> bool {
        self.index
            .get(name)
            .is_some_and(|id| !self.placeholders.contains(id))
    }

    /// A label name derived from `base` that no node uses yet.
    pub fn fresh_label(&self, base: &str) -> String {
        (2..)
            .map(|n| format!("{base}'{n}"))
            .find(|name| !self.contains(name))
            .unwrap_or_else(|| base.to_string())
    }

    /// Live nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.nodes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Links that were never tied.
    pub fn dangling(&self) -> Vec<(String, LinkField)> {
        self.nodes()
            .flat_map(|node| {
                node.links()
                    .into_iter()
                    .filter(|(_, link)| link.is_none())
                    .map(|(field, _)| (node.name.clone(), field))
            })
            .collect()
    }

    /// Reports every link or reference naming a node that does not exist.
    pub fn check(&mut self) {
        let mut missing = Vec::new();
        for node in self.nodes() {
            let linked = node.links().into_iter().filter_map(|(_, link)| match link {
                Some(Target::Node(name)) => Some(name.as_str()),
                _ => None,
            });
            for name in linked.chain(node.body.references()) {
                if !self.contains(name) {
                    missing.push((node.position, name.to_string()));
                }
            }
        }
        for (position, name) in missing {
            self.error(position, format!("no label named '{name}'"));
        }
    }

    /// Nodes keyed by name, in name order.
    pub fn to_map(&self) -> BTreeMap<&str, &Node> {
        self.nodes().map(|node| (node.name.as_str(), node)).collect()
    }
}

impl Serialize for Story {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.to_map())
    }
}
