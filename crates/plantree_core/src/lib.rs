//! Core domain logic for PlanTree.
//! This crate is the single source of truth for plan-tree invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod projection;
pub mod repo;
pub mod seed;
pub mod service;
pub mod store;
pub mod sync;

pub use config::{ConfigError, LayoutMetrics, LoggingConfig, PlanConfig, ScheduleDefaults};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::node::{Level, Node, NodeId, NodePatch, ROOT_ID};
pub use model::snapshot::{CostLegend, Snapshot, SnapshotError};
pub use model::tree::{CollapsedSet, PlanTree};
pub use projection::PlanViews;
pub use repo::snapshot_repo::{
    RepoError, RepoResult, SnapshotRepository, SnapshotSummary, SqliteSnapshotRepository,
};
pub use service::plan_service::{PlanService, ServiceError, ServiceResult};
pub use store::tree_store::{TreeStore, TreeStoreError, TreeStoreResult};
pub use sync::bridge::{SyncBridge, SyncError, SyncOutcome, SyncState};
pub use sync::widget::{TimelineSnapshot, TimelineWidget, WidgetEvent, WidgetTask};
