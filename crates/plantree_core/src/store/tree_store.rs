//! Canonical owner of the plan tree and its view state.
//!
//! # Responsibility
//! - Own the node map, children index, collapsed set and cost legend.
//! - Provide structural edits that update map and index as one unit.
//!
//! # Invariants
//! - No public operation leaves the map and index contradictory.
//! - The root is seeded once and can never be deleted.
//! - Child order changes only by explicit insertion position.
//! - `revision` increases by one on every applied mutation.

use crate::model::node::{Node, NodeId, NodePatch, ROOT_ID};
use crate::model::snapshot::{CostLegend, Snapshot, SnapshotError};
use crate::model::tree::{CollapsedSet, PlanTree};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DEFAULT_CHILD_LABEL: &str = "New Initiative";
const DEFAULT_SIBLING_LABEL: &str = "New Sibling";

/// Result type used by tree store operations.
pub type TreeStoreResult<T> = Result<T, TreeStoreError>;

/// Errors from structural tree operations.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeStoreError {
    /// Add-child target does not exist.
    InvalidParent(NodeId),
    /// Target node is missing or is the root where the root is forbidden.
    InvalidNode(NodeId),
    CannotDeleteRoot,
    /// Caller-supplied id is already taken.
    DuplicateId(NodeId),
    /// Snapshot load rejected; nothing was applied.
    MalformedSnapshot(SnapshotError),
}

impl Display for TreeStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParent(id) => write!(f, "parent node not found: {id}"),
            Self::InvalidNode(id) => write!(f, "invalid target node: {id}"),
            Self::CannotDeleteRoot => write!(f, "the root node cannot be deleted"),
            Self::DuplicateId(id) => write!(f, "node id already exists: {id}"),
            Self::MalformedSnapshot(err) => write!(f, "malformed snapshot: {err}"),
        }
    }
}

impl Error for TreeStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedSnapshot(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SnapshotError> for TreeStoreError {
    fn from(value: SnapshotError) -> Self {
        Self::MalformedSnapshot(value)
    }
}

/// Single owner of the plan tree.
///
/// Projections borrow [`TreeStore::tree`] and [`TreeStore::collapsed`]
/// immutably; only this type mutates them.
#[derive(Debug, Clone)]
pub struct TreeStore {
    tree: PlanTree,
    collapsed: CollapsedSet,
    legend: CostLegend,
    revision: u64,
}

impl TreeStore {
    /// Creates a store seeded with `root` and the default legend.
    pub fn new(root: Node) -> Self {
        Self::with_legend(root, CostLegend::default())
    }

    pub fn with_legend(root: Node, legend: CostLegend) -> Self {
        Self {
            tree: PlanTree::seeded(root),
            collapsed: CollapsedSet::new(),
            legend,
            revision: 0,
        }
    }

    /// Builds a store from an already-checked snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            tree: PlanTree {
                nodes: snapshot.data_map,
                children: snapshot.children_map,
            },
            collapsed: snapshot.collapsed,
            legend: snapshot.cost_legend,
            revision: 0,
        }
    }

    /// Parses a JSON snapshot into a new store.
    pub fn import_json(payload: &str) -> TreeStoreResult<Self> {
        let snapshot = Snapshot::from_json_str(payload).map_err(|err| {
            warn!("event=snapshot_import module=store status=error error={err}");
            TreeStoreError::from(err)
        })?;
        let store = Self::from_snapshot(snapshot);
        info!(
            "event=snapshot_import module=store status=ok nodes={} collapsed={}",
            store.tree.len(),
            store.collapsed.len()
        );
        Ok(store)
    }

    /// Replaces the whole state with `snapshot`.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) {
        let revision = self.revision;
        *self = Self::from_snapshot(snapshot);
        self.revision = revision + 1;
    }

    /// Copies the current state into the wire snapshot shape.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            data_map: self.tree.nodes.clone(),
            children_map: self.tree.children.clone(),
            collapsed: self.collapsed.clone(),
            cost_legend: self.legend.clone(),
        }
    }

    pub fn export_json(&self) -> TreeStoreResult<String> {
        let payload = self.snapshot().to_json_string()?;
        info!(
            "event=snapshot_export module=store status=ok nodes={} bytes={}",
            self.tree.len(),
            payload.len()
        );
        Ok(payload)
    }

    pub fn tree(&self) -> &PlanTree {
        &self.tree
    }

    pub fn collapsed(&self) -> &CollapsedSet {
        &self.collapsed
    }

    pub fn legend(&self) -> &CostLegend {
        &self.legend
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.tree.node(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tree.contains(id)
    }

    pub fn set_legend(&mut self, legend: CostLegend) {
        self.legend = legend;
        self.bump();
    }

    /// Appends a new child under `parent_id` and returns its fresh id.
    ///
    /// The child inherits category and colours from the parent; `fields`
    /// are applied on top.
    pub fn add_child(&mut self, parent_id: &str, fields: NodePatch) -> TreeStoreResult<NodeId> {
        let id = self.fresh_id();
        self.insert_child(parent_id, id, fields)
    }

    /// Same as [`TreeStore::add_child`] with a caller-chosen id.
    ///
    /// Used when the id already exists in an external view.
    pub fn add_child_with_id(
        &mut self,
        parent_id: &str,
        id: impl Into<NodeId>,
        fields: NodePatch,
    ) -> TreeStoreResult<NodeId> {
        let id = id.into();
        if self.tree.contains(&id) || self.tree.children.contains_key(&id) {
            return Err(TreeStoreError::DuplicateId(id));
        }
        self.insert_child(parent_id, id, fields)
    }

    fn insert_child(
        &mut self,
        parent_id: &str,
        id: NodeId,
        fields: NodePatch,
    ) -> TreeStoreResult<NodeId> {
        let parent = self
            .tree
            .node(parent_id)
            .ok_or_else(|| TreeStoreError::InvalidParent(parent_id.to_string()))?;
        let node = build_node(&id, parent, DEFAULT_CHILD_LABEL, &fields);

        self.tree.nodes.insert(id.clone(), node);
        self.tree
            .children
            .entry(parent_id.to_string())
            .or_default()
            .push(id.clone());
        self.tree.children.insert(id.clone(), Vec::new());
        self.bump();

        info!(
            "event=tree_add_child module=store status=ok id={} parent={} revision={}",
            id, parent_id, self.revision
        );
        Ok(id)
    }

    /// Inserts a new node right after `node_id` under the same parent.
    ///
    /// The new node copies category and colours from `node_id` itself.
    ///
    /// # Errors
    /// - `InvalidNode` when `node_id` is the root, absent, or its parent is
    ///   missing from the node map.
    pub fn add_sibling(&mut self, node_id: &str, fields: NodePatch) -> TreeStoreResult<NodeId> {
        let sibling = self
            .tree
            .node(node_id)
            .ok_or_else(|| TreeStoreError::InvalidNode(node_id.to_string()))?;
        let parent_id = sibling
            .parent
            .clone()
            .filter(|parent_id| self.tree.contains(parent_id))
            .ok_or_else(|| TreeStoreError::InvalidNode(node_id.to_string()))?;

        let id = self.fresh_id();
        let mut node = Node::new(id.clone(), DEFAULT_SIBLING_LABEL, Some(parent_id.clone()));
        node.inherit_presentation(sibling);
        node.apply_patch(&fields);

        self.tree.nodes.insert(id.clone(), node);
        let siblings = self.tree.children.entry(parent_id.clone()).or_default();
        match siblings.iter().position(|sibling| sibling == node_id) {
            Some(index) => siblings.insert(index + 1, id.clone()),
            None => siblings.push(id.clone()),
        }
        self.tree.children.insert(id.clone(), Vec::new());
        self.bump();

        info!(
            "event=tree_add_sibling module=store status=ok id={} after={} parent={} revision={}",
            id, node_id, parent_id, self.revision
        );
        Ok(id)
    }

    /// Removes `node_id` and every descendant; returns the removed ids.
    ///
    /// Descendants are collected breadth-first over the children index.
    pub fn delete_subtree(&mut self, node_id: &str) -> TreeStoreResult<Vec<NodeId>> {
        if node_id == ROOT_ID {
            return Err(TreeStoreError::CannotDeleteRoot);
        }
        if !self.tree.contains(node_id) {
            return Err(TreeStoreError::InvalidNode(node_id.to_string()));
        }

        let removed = self.tree.subtree_ids(node_id);
        for id in &removed {
            self.tree.nodes.remove(id);
            self.tree.children.remove(id);
            self.collapsed.remove(id);
        }
        for kids in self.tree.children.values_mut() {
            kids.retain(|kid| !removed.contains(kid));
        }
        self.bump();

        info!(
            "event=tree_delete_subtree module=store status=ok id={} removed={} revision={}",
            node_id,
            removed.len(),
            self.revision
        );
        Ok(removed)
    }

    /// Merges `patch` into the node; returns whether it was applied.
    ///
    /// A missing id is a silent no-op: deletions may race with edits.
    pub fn update_node(&mut self, node_id: &str, patch: &NodePatch) -> bool {
        let Some(node) = self.tree.nodes.get_mut(node_id) else {
            debug!("event=tree_update_skipped module=store status=skipped id={node_id}");
            return false;
        };
        node.apply_patch(patch);
        self.bump();
        true
    }

    /// Flips collapse state; returns whether `node_id` is now collapsed.
    pub fn toggle_collapsed(&mut self, node_id: &str) -> bool {
        let collapse = !self.collapsed.contains(node_id);
        self.set_collapsed(node_id, collapse);
        self.collapsed.contains(node_id)
    }

    /// Sets collapse state explicitly; returns whether anything changed.
    ///
    /// Unknown ids are ignored.
    pub fn set_collapsed(&mut self, node_id: &str, collapsed: bool) -> bool {
        if !self.tree.contains(node_id) {
            debug!("event=tree_toggle_collapsed module=store status=skipped id={node_id}");
            return false;
        }
        let changed = if collapsed {
            self.collapsed.insert(node_id.to_string())
        } else {
            self.collapsed.remove(node_id)
        };
        if changed {
            self.bump();
            debug!(
                "event=tree_toggle_collapsed module=store status=ok id={} collapsed={} revision={}",
                node_id, collapsed, self.revision
            );
        }
        changed
    }

    fn fresh_id(&self) -> NodeId {
        loop {
            let candidate = format!("node_{}", Uuid::new_v4().simple());
            if !self.tree.contains(&candidate) && !self.tree.children.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

fn build_node(id: &str, parent: &Node, default_label: &str, fields: &NodePatch) -> Node {
    let mut node = Node::new(id, default_label, Some(parent.id.clone()));
    node.inherit_presentation(parent);
    node.apply_patch(fields);
    node
}
