#![forbid(unsafe_code)]

//! Boundary toward the host document tree.
//!
//! The core never creates or styles markup itself. Everything structural goes
//! through [`HostTree`], which a host (a browser bridge, a retained-mode
//! toolkit, or the in-memory document in `cadre-harness`) implements.
//!
//! # Invariants expected from implementations
//!
//! 1. A node has at most one parent; inserting a node that already has a
//!    parent moves it.
//! 2. `is_attached` is true exactly when the ancestor chain reaches the live
//!    document root.
//! 3. `children_of` returns children in document order.
//! 4. Freshly created elements are detached.

use std::fmt;

/// Opaque handle to a host node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a raw host handle.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw host handle.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A node given either by identity or by identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A node handle.
    Node(NodeId),
    /// A host identifier, resolved through [`HostTree::find_by_identifier`].
    Identifier(String),
}

impl From<NodeId> for Target {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for Target {
    fn from(identifier: &str) -> Self {
        Self::Identifier(identifier.to_owned())
    }
}

impl From<String> for Target {
    fn from(identifier: String) -> Self {
        Self::Identifier(identifier)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(node) => write!(f, "{node}"),
            Self::Identifier(id) => write!(f, "#{id}"),
        }
    }
}

/// Structural operations the core needs from a host document.
pub trait HostTree {
    /// Look up a node by identifier anywhere the host can see.
    fn find_by_identifier(&self, identifier: &str) -> Option<NodeId>;

    /// Create a detached element.
    fn create_element(&mut self, identifier: Option<&str>, class_name: Option<&str>) -> NodeId;

    /// Identifier of a node, if it has one.
    fn identifier_of(&self, node: NodeId) -> Option<String>;

    /// Full classification tag (class attribute) of a node.
    fn class_name(&self, node: NodeId) -> Option<String>;

    /// Add one class to a node's classification tag.
    fn add_class(&mut self, node: NodeId, class: &str);

    /// Children in document order.
    fn children_of(&self, node: NodeId) -> Vec<NodeId>;

    /// Parent, if the node is inserted somewhere.
    fn parent_of(&self, node: NodeId) -> Option<NodeId>;

    /// Insert `node` under `parent` before `reference`, or last when
    /// `reference` is `None`.
    fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>);

    /// Append `node` as the last child of `parent`.
    fn append_child(&mut self, parent: NodeId, node: NodeId) {
        self.insert_before(parent, node, None);
    }

    /// Detach `node` from `parent`.
    fn remove_child(&mut self, parent: NodeId, node: NodeId);

    /// Whether the node is part of the live document.
    fn is_attached(&self, node: NodeId) -> bool;

    /// Show or hide the node.
    fn set_presentation_visible(&mut self, node: NodeId, visible: bool);

    /// Replace all content of `node` with markup text.
    fn set_markup(&mut self, node: NodeId, markup: &str);

    /// Remove all children and markup of `node`.
    fn clear_children(&mut self, node: NodeId);

    /// Drop host-level listeners bound to `node` (and its subtree when
    /// `recursive`).
    fn purge_listeners(&mut self, node: NodeId, recursive: bool);

    /// Resolve `identifier`, creating a detached element carrying it when the
    /// host has none.
    fn resolve_or_create(&mut self, identifier: &str) -> NodeId {
        match self.find_by_identifier(identifier) {
            Some(node) => node,
            None => self.create_element(Some(identifier), None),
        }
    }

    /// Resolve a [`Target`] without creating anything.
    fn resolve(&self, target: &Target) -> Option<NodeId> {
        match target {
            Target::Node(node) => Some(*node),
            Target::Identifier(id) => self.find_by_identifier(id),
        }
    }

    /// Whether `ancestor` is a proper ancestor of `node`.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.parent_of(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent_of(current);
        }
        false
    }

    /// First child in document order.
    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children_of(node).first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_conversions() {
        assert_eq!(Target::from("panel"), Target::Identifier("panel".into()));
        assert_eq!(
            Target::from(NodeId::from_raw(4)),
            Target::Node(NodeId::from_raw(4))
        );
        assert_eq!(Target::from("x").to_string(), "#x");
        assert_eq!(Target::from(NodeId::from_raw(2)).to_string(), "node#2");
    }
}
