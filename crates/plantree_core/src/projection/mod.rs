//! Derived read-only views of the plan tree.
//!
//! # Responsibility
//! - Re-derive diagram, schedule and rows from one immutable borrow of the
//!   store.
//!
//! # Invariants
//! - Projections never mutate the tree or the collapsed set.
//! - Every derivation is a full recomputation; nothing is cached across calls.

pub mod date;
pub mod layout;
pub mod priority;
pub mod rows;
pub mod schedule;

use crate::config::PlanConfig;
use crate::projection::layout::{layout, Diagram};
use crate::projection::rows::{project_rows, Row};
use crate::projection::schedule::{aggregate, Schedule};
use crate::store::tree_store::TreeStore;

/// All three presentations for one store revision.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanViews {
    pub revision: u64,
    pub diagram: Diagram,
    pub schedule: Schedule,
    pub rows: Vec<Row>,
}

impl PlanViews {
    pub fn derive(store: &TreeStore, config: &PlanConfig) -> Self {
        let tree = store.tree();
        let collapsed = store.collapsed();
        let schedule = aggregate(tree);
        let rows = project_rows(tree, collapsed, &schedule);
        Self {
            revision: store.revision(),
            diagram: layout(tree, collapsed, &config.layout),
            schedule,
            rows,
        }
    }

    pub fn review_queue(&self) -> Vec<&Row> {
        priority::review_queue(&self.rows)
    }
}
