//! Hierarchically numbered flat rows for the table view.
//!
//! # Responsibility
//! - Walk the tree depth-first in child order, skipping the root row.
//! - Number siblings from 1 and compose dotted paths (`"2.1.3"`).
//!
//! # Invariants
//! - Children of a collapsed non-root parent are skipped with their subtrees.
//! - Collapsing one node never renumbers rows outside its subtree.
//! - Parents show aggregated progress and dates, leaves their own values.

use crate::model::node::{Level, NodeId, ROOT_ID};
use crate::model::tree::{CollapsedSet, PlanTree};
use crate::projection::date::normalize_plan_date;
use crate::projection::schedule::Schedule;
use serde::Serialize;
use std::collections::HashSet;

/// One table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub id: NodeId,
    pub parent: NodeId,
    /// Dotted position, e.g. `"2.1"`.
    pub path: String,
    /// 1 for children of the root.
    pub depth: usize,
    /// Node has children, shown or not; drives the expand/collapse affordance.
    pub has_children: bool,
    pub collapsed: bool,
    pub label: String,
    pub category: String,
    pub key_question: Option<String>,
    pub decision_checkpoint: Option<String>,
    pub expected_data: Option<String>,
    pub owner: Option<String>,
    pub savings: Option<Level>,
    pub effort: Option<Level>,
    pub priority_review: bool,
    pub progress: f64,
    /// `round(progress * 100)`.
    pub status_percent: u8,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub duration: Option<u32>,
    pub date_required: Option<String>,
    pub date_completed: Option<String>,
}

/// Projects visible rows in pre-order.
pub fn project_rows(tree: &PlanTree, collapsed: &CollapsedSet, schedule: &Schedule) -> Vec<Row> {
    let mut walk = RowWalk {
        tree,
        collapsed,
        schedule,
        visited: HashSet::from([ROOT_ID]),
        rows: Vec::new(),
    };
    walk.descend(ROOT_ID, "", 1);
    walk.rows
}

struct RowWalk<'a> {
    tree: &'a PlanTree,
    collapsed: &'a CollapsedSet,
    schedule: &'a Schedule,
    visited: HashSet<&'a str>,
    rows: Vec<Row>,
}

impl<'a> RowWalk<'a> {
    fn descend(&mut self, parent: &'a str, prefix: &str, depth: usize) {
        if parent != ROOT_ID && self.collapsed.contains(parent) {
            return;
        }
        let tree = self.tree;
        for (index, id) in tree.present_children(parent).into_iter().enumerate() {
            if !self.visited.insert(id) {
                continue;
            }
            let path = if prefix.is_empty() {
                (index + 1).to_string()
            } else {
                format!("{prefix}.{}", index + 1)
            };
            self.push_row(id, parent, &path, depth);
            self.descend(id, &path, depth + 1);
        }
    }

    fn push_row(&mut self, id: &str, parent: &str, path: &str, depth: usize) {
        let Some(node) = self.tree.node(id) else {
            return;
        };
        let has_children = !self.tree.present_children(id).is_empty();
        let progress = self.schedule.progress_of(id);
        let entry = self.schedule.entry(id);
        let date_required = if has_children {
            entry.end_text()
        } else {
            node.date_required.as_deref().and_then(normalize_plan_date)
        };

        self.rows.push(Row {
            id: id.to_string(),
            parent: parent.to_string(),
            path: path.to_string(),
            depth,
            has_children,
            collapsed: self.collapsed.contains(id),
            label: node.label.clone(),
            category: node.category.clone(),
            key_question: node.key_question.clone(),
            decision_checkpoint: node.decision_checkpoint.clone(),
            expected_data: node.expected_data.clone(),
            owner: node.owner.clone(),
            savings: node.savings,
            effort: node.effort,
            priority_review: node.priority_review,
            progress,
            status_percent: status_percent(progress),
            start_date: entry.start_text(),
            end_date: entry.end_text(),
            duration: entry.duration,
            date_required,
            date_completed: node.date_completed.as_deref().and_then(normalize_plan_date),
        });
    }
}

fn status_percent(progress: f64) -> u8 {
    (progress.clamp(0.0, 1.0) * 100.0).round() as u8
}
