//! Plan use-case service.
//!
//! # Responsibility
//! - Own one `TreeStore` together with its config.
//! - Re-derive views on demand and persist named snapshots.
//!
//! # Invariants
//! - Loading a snapshot replaces the store only after it decoded fully.
//! - The service stays storage-agnostic behind `SnapshotRepository`.

use crate::config::PlanConfig;
use crate::model::node::{Node, NodeId, NodePatch};
use crate::projection::PlanViews;
use crate::repo::snapshot_repo::{RepoError, SnapshotRepository, SnapshotSummary};
use crate::store::tree_store::{TreeStore, TreeStoreError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Store(TreeStoreError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<TreeStoreError> for ServiceError {
    fn from(value: TreeStoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Store, config and snapshot repository behind one facade.
pub struct PlanService<R: SnapshotRepository> {
    repo: R,
    store: TreeStore,
    config: PlanConfig,
}

impl<R: SnapshotRepository> PlanService<R> {
    /// Starts with a store holding only `root`, using the configured legend.
    pub fn new(repo: R, root: Node, config: PlanConfig) -> Self {
        let store = TreeStore::with_legend(root, config.legend.clone());
        Self::with_store(repo, store, config)
    }

    pub fn with_store(repo: R, store: TreeStore, config: PlanConfig) -> Self {
        Self {
            repo,
            store,
            config,
        }
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    /// Mutable store access for edit paths (diagram, table, sync bridge).
    pub fn store_mut(&mut self) -> &mut TreeStore {
        &mut self.store
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    pub fn views(&self) -> PlanViews {
        PlanViews::derive(&self.store, &self.config)
    }

    pub fn add_child(&mut self, parent_id: &str, fields: NodePatch) -> ServiceResult<NodeId> {
        Ok(self.store.add_child(parent_id, fields)?)
    }

    pub fn add_sibling(&mut self, node_id: &str, fields: NodePatch) -> ServiceResult<NodeId> {
        Ok(self.store.add_sibling(node_id, fields)?)
    }

    pub fn delete_subtree(&mut self, node_id: &str) -> ServiceResult<Vec<NodeId>> {
        Ok(self.store.delete_subtree(node_id)?)
    }

    pub fn update_node(&mut self, node_id: &str, patch: &NodePatch) -> bool {
        self.store.update_node(node_id, patch)
    }

    pub fn toggle_collapsed(&mut self, node_id: &str) -> bool {
        self.store.toggle_collapsed(node_id)
    }

    pub fn save_as(&self, name: &str) -> ServiceResult<()> {
        Ok(self.repo.save_snapshot(name, &self.store.snapshot())?)
    }

    /// Replaces the store with the named snapshot.
    ///
    /// Returns `false` (store untouched) when no snapshot has that name.
    pub fn load(&mut self, name: &str) -> ServiceResult<bool> {
        let Some(snapshot) = self.repo.load_snapshot(name)? else {
            return Ok(false);
        };
        self.store.load_snapshot(snapshot);
        Ok(true)
    }

    pub fn list_saved(&self) -> ServiceResult<Vec<SnapshotSummary>> {
        Ok(self.repo.list_snapshots()?)
    }

    pub fn delete_saved(&self, name: &str) -> ServiceResult<()> {
        Ok(self.repo.delete_snapshot(name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::PlanService;
    use crate::config::PlanConfig;
    use crate::db::open_db_in_memory;
    use crate::model::node::{Node, NodePatch, ROOT_ID};
    use crate::repo::snapshot_repo::SqliteSnapshotRepository;

    #[test]
    fn load_replaces_store_and_bumps_revision() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSnapshotRepository::new(&conn);
        let mut service = PlanService::new(repo, Node::root("Programme"), PlanConfig::default());
        let coal = service.add_child(ROOT_ID, NodePatch::label("Coal")).unwrap();
        service.save_as("baseline").unwrap();

        service.delete_subtree(&coal).unwrap();
        let revision = service.store().revision();
        assert!(service.load("baseline").unwrap());

        assert!(service.store().contains(&coal));
        assert!(service.store().revision() > revision);
        assert_eq!(service.views().rows.len(), 1);
    }

    #[test]
    fn loading_unknown_name_keeps_store() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSnapshotRepository::new(&conn);
        let mut service = PlanService::new(repo, Node::root("Programme"), PlanConfig::default());
        service.add_child(ROOT_ID, NodePatch::default()).unwrap();
        let before = service.store().snapshot();

        assert!(!service.load("missing").unwrap());
        assert_eq!(service.store().snapshot(), before);
    }
}
