//! Plan tree: node map plus parent->children index.
//!
//! # Responsibility
//! - Hold both structures as one unit so they are always read together.
//! - Offer read helpers shared by every projection.
//!
//! # Invariants
//! - Exactly one root (`ROOT_ID`) with no parent.
//! - Every id in the children index exists in the node map.
//! - Every non-root node's `parent` lists it exactly once.
//! - Following `parent` links from any node reaches the root.

use crate::model::node::{Node, NodeId, ROOT_ID};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Node map keyed by id.
pub type NodeMap = BTreeMap<NodeId, Node>;
/// Ordered child ids keyed by parent id.
pub type ChildrenIndex = BTreeMap<NodeId, Vec<NodeId>>;
/// Ids whose children are hidden from layout and rows.
pub type CollapsedSet = BTreeSet<NodeId>;

/// Structural invariant violation found by [`PlanTree::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeInvariantError {
    MissingRoot,
    RootHasParent,
    /// A children-index entry (key or value) has no node.
    DanglingIndexEntry(NodeId),
    /// A non-root node is not listed exactly once under its parent.
    ParentMismatch { node: NodeId, listed: usize },
    /// Parent links from this node never reach the root.
    Unreachable(NodeId),
}

impl Display for TreeInvariantError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRoot => write!(f, "tree has no root node"),
            Self::RootHasParent => write!(f, "root node must not have a parent"),
            Self::DanglingIndexEntry(id) => {
                write!(f, "children index references missing node: {id}")
            }
            Self::ParentMismatch { node, listed } => write!(
                f,
                "node {node} is listed {listed} times under its parent, expected once"
            ),
            Self::Unreachable(id) => write!(f, "node {id} does not reach the root"),
        }
    }
}

impl Error for TreeInvariantError {}

/// Canonical hierarchical plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTree {
    pub nodes: NodeMap,
    pub children: ChildrenIndex,
}

impl PlanTree {
    /// Creates a tree holding only the given root.
    pub fn seeded(mut root: Node) -> Self {
        root.id = ROOT_ID.to_string();
        root.parent = None;
        let mut nodes = NodeMap::new();
        nodes.insert(ROOT_ID.to_string(), root);
        let mut children = ChildrenIndex::new();
        children.insert(ROOT_ID.to_string(), Vec::new());
        Self { nodes, children }
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.get(ROOT_ID)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Raw child sequence from the index, possibly containing drifted ids.
    pub fn children_of(&self, id: &str) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Child ids that still exist in the node map, in sequence order.
    pub fn present_children(&self, id: &str) -> Vec<&str> {
        self.children_of(id)
            .iter()
            .filter(|child| self.nodes.contains_key(child.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Present children, or none when `id` is collapsed.
    pub fn visible_children(&self, id: &str, collapsed: &CollapsedSet) -> Vec<&str> {
        if collapsed.contains(id) {
            return Vec::new();
        }
        self.present_children(id)
    }

    /// Collects `id` and all of its descendants, breadth-first.
    ///
    /// Each id is reported once even if the index contains a cycle.
    pub fn subtree_ids(&self, id: &str) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(id.to_string());
        seen.insert(id.to_string());
        while let Some(current) = queue.pop_front() {
            for child in self.children_of(&current) {
                if seen.insert(child.clone()) {
                    queue.push_back(child.clone());
                }
            }
            order.push(current);
        }
        order
    }

    /// Verifies the map/index invariants.
    pub fn check_invariants(&self) -> Result<(), TreeInvariantError> {
        let root = self.root().ok_or(TreeInvariantError::MissingRoot)?;
        if root.parent.is_some() {
            return Err(TreeInvariantError::RootHasParent);
        }

        for (parent, kids) in &self.children {
            if !self.nodes.contains_key(parent) {
                return Err(TreeInvariantError::DanglingIndexEntry(parent.clone()));
            }
            if let Some(kid) = kids.iter().find(|kid| !self.nodes.contains_key(kid.as_str())) {
                return Err(TreeInvariantError::DanglingIndexEntry(kid.clone()));
            }
        }

        for node in self.nodes.values() {
            let Some(parent) = node.parent.as_deref() else {
                if node.id != ROOT_ID {
                    return Err(TreeInvariantError::Unreachable(node.id.clone()));
                }
                continue;
            };
            let listed_under_parent = self
                .children_of(parent)
                .iter()
                .filter(|kid| **kid == node.id)
                .count();
            let listed_total = self
                .children
                .values()
                .flatten()
                .filter(|kid| **kid == node.id)
                .count();
            if listed_under_parent != 1 || listed_total != 1 {
                return Err(TreeInvariantError::ParentMismatch {
                    node: node.id.clone(),
                    listed: listed_total,
                });
            }
        }

        for id in self.nodes.keys() {
            if !self.reaches_root(id) {
                return Err(TreeInvariantError::Unreachable(id.clone()));
            }
        }
        Ok(())
    }

    fn reaches_root(&self, id: &str) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ROOT_ID {
                return true;
            }
            if !visited.insert(current) {
                return false;
            }
            cursor = self
                .nodes
                .get(current)
                .and_then(|node| node.parent.as_deref());
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::{CollapsedSet, PlanTree, TreeInvariantError};
    use crate::model::node::{Node, ROOT_ID};

    fn two_level_tree() -> PlanTree {
        let mut tree = PlanTree::seeded(Node::root("Programme"));
        for (id, parent) in [("a", ROOT_ID), ("b", ROOT_ID), ("a1", "a")] {
            tree.nodes
                .insert(id.to_string(), Node::new(id, id, Some(parent.to_string())));
            tree.children
                .entry(parent.to_string())
                .or_default()
                .push(id.to_string());
            tree.children.entry(id.to_string()).or_default();
        }
        tree
    }

    #[test]
    fn seeded_tree_satisfies_invariants() {
        let tree = PlanTree::seeded(Node::root("Programme"));
        assert!(tree.check_invariants().is_ok());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn visible_children_respect_collapse_and_drift() {
        let mut tree = two_level_tree();
        tree.children
            .get_mut(ROOT_ID)
            .unwrap()
            .push("ghost".to_string());

        assert_eq!(tree.present_children(ROOT_ID), vec!["a", "b"]);
        let mut collapsed = CollapsedSet::new();
        collapsed.insert("a".to_string());
        assert!(tree.visible_children("a", &collapsed).is_empty());
        assert_eq!(tree.visible_children(ROOT_ID, &collapsed), vec!["a", "b"]);
    }

    #[test]
    fn subtree_ids_are_breadth_first_and_cycle_safe() {
        let mut tree = two_level_tree();
        tree.children.get_mut("a1").unwrap().push("a".to_string());

        assert_eq!(tree.subtree_ids("a"), vec!["a".to_string(), "a1".to_string()]);
    }

    #[test]
    fn invariant_check_reports_dangling_index_entry() {
        let mut tree = two_level_tree();
        tree.nodes.remove("a1");

        assert_eq!(
            tree.check_invariants(),
            Err(TreeInvariantError::DanglingIndexEntry("a1".to_string()))
        );
    }
}
