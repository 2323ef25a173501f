//! Structural paths that give every node a unique, deterministic name.
//!
//! A path is a label followed by a non-empty list of indices. The root of a
//! label, `[label, 0]`, is named after the label alone; every other path
//! renders as `label.i.j...`. Siblings advance the last index and children
//! append one, so two distinct paths never share a name.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    label: String,
    indices: Vec<u32>,
}

impl Scope {
    /// The entry of a named label.
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            indices: vec![0],
        }
    }

    pub fn label_name(&self) -> &str {
        &self.label
    }

    /// The following sibling.
    pub fn next(&self) -> Self {
        let mut indices = self.indices.clone();
        if let Some(last) = indices.last_mut() {
            *last += 1;
        }
        Self {
            label: self.label.clone(),
            indices,
        }
    }

    pub fn first_child(&self) -> Self {
        self.child(1)
    }

    pub fn zeroth_child(&self) -> Self {
        self.child(0)
    }

    fn child(&self, index: u32) -> Self {
        let mut indices = self.indices.clone();
        indices.push(index);
        Self {
            label: self.label.clone(),
            indices,
        }
    }

    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)?;
        if self.indices != [0] {
            for index in &self.indices {
                write!(f, ".{index}")?;
            }
        }
        Ok(())
    }
}
