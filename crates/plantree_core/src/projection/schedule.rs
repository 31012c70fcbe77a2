//! Bottom-up progress and date-range aggregation.
//!
//! # Responsibility
//! - Fold leaf progress into unweighted means for every parent.
//! - Fold leaf date ranges into `[min start, max end]` for every parent.
//!
//! # Invariants
//! - Aggregated progress is always within `[0, 1]`.
//! - A parent's end is >= every child's end; its start is <= every child's
//!   start.
//! - Collapse state never affects aggregation.
//! - Each node is folded at most once per pass; a cycle contributes nothing.

use crate::model::node::{Node, NodeId};
use crate::model::tree::PlanTree;
use crate::projection::date::{add_days, day_span, format_plan_date, parse_optional};
use chrono::NaiveDate;
use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Aggregated schedule of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Days from `start` to `end` for parents; stored duration for leaves.
    pub duration: Option<u32>,
}

impl ScheduleEntry {
    pub fn start_text(&self) -> Option<String> {
        self.start.map(format_plan_date)
    }

    pub fn end_text(&self) -> Option<String> {
        self.end.map(format_plan_date)
    }
}

/// Result of one aggregation pass over a tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    pub progress: BTreeMap<NodeId, f64>,
    pub dates: BTreeMap<NodeId, ScheduleEntry>,
}

impl Schedule {
    /// Aggregated progress; `0.0` for unknown ids.
    pub fn progress_of(&self, id: &str) -> f64 {
        self.progress.get(id).copied().unwrap_or(0.0)
    }

    pub fn entry(&self, id: &str) -> ScheduleEntry {
        self.dates.get(id).copied().unwrap_or_default()
    }
}

/// Runs both folds over every node of `tree`.
pub fn aggregate(tree: &PlanTree) -> Schedule {
    let schedule = Schedule {
        progress: aggregate_progress(tree),
        dates: aggregate_dates(tree),
    };
    debug!(
        "event=schedule_pass module=schedule status=ok nodes={} dated={}",
        schedule.progress.len(),
        schedule.dates.values().filter(|entry| entry.end.is_some()).count()
    );
    schedule
}

/// Reads a stored progress value as a fraction.
///
/// Values above 1 are percentages and are divided by 100 once; the result
/// is clamped to `[0, 1]`. Missing or NaN values read as 0.
pub fn normalize_progress(raw: Option<f64>) -> f64 {
    let Some(value) = raw.filter(|value| !value.is_nan()) else {
        return 0.0;
    };
    let fraction = if value > 1.0 { value / 100.0 } else { value };
    fraction.clamp(0.0, 1.0)
}

/// Leaf progress is its own normalized value; a parent is the unweighted
/// mean of its direct children's aggregated values.
pub fn aggregate_progress(tree: &PlanTree) -> BTreeMap<NodeId, f64> {
    let mut fold = Fold::new(tree, |node: &Node, kids: &[f64]| {
        if kids.is_empty() {
            normalize_progress(node.progress)
        } else {
            kids.iter().sum::<f64>() / kids.len() as f64
        }
    });
    fold.run()
}

/// Leaf end is the required date, else start + duration, else absent.
/// Parents take the earliest child start and the latest child end, and
/// their duration is the span between the two.
pub fn aggregate_dates(tree: &PlanTree) -> BTreeMap<NodeId, ScheduleEntry> {
    let mut fold = Fold::new(tree, |node: &Node, kids: &[ScheduleEntry]| {
        let own = leaf_entry(node);
        if kids.is_empty() {
            return own;
        }
        let start = kids.iter().filter_map(|kid| kid.start).min().or(own.start);
        let end = kids.iter().filter_map(|kid| kid.end).max().or(own.end);
        let duration = match (start, end) {
            (Some(start), Some(end)) => Some(day_span(start, end)),
            _ => own.duration,
        };
        ScheduleEntry {
            start,
            end,
            duration,
        }
    });
    fold.run()
}

/// Schedule read from a node's own stored fields.
pub fn leaf_entry(node: &Node) -> ScheduleEntry {
    let start = parse_optional(node.start_date.as_deref());
    let end = parse_optional(node.date_required.as_deref()).or_else(|| {
        start
            .zip(node.duration)
            .and_then(|(start, days)| add_days(start, days))
    });
    let duration = node.duration.or_else(|| {
        start
            .zip(end)
            .map(|(start, end)| day_span(start, end))
    });
    ScheduleEntry {
        start,
        end,
        duration,
    }
}

/// Memoized post-order fold with an in-progress guard.
struct Fold<'a, T, F> {
    tree: &'a PlanTree,
    combine: F,
    memo: HashMap<&'a str, T>,
    in_progress: HashSet<&'a str>,
}

impl<'a, T, F> Fold<'a, T, F>
where
    T: Copy,
    F: Fn(&Node, &[T]) -> T,
{
    fn new(tree: &'a PlanTree, combine: F) -> Self {
        Self {
            tree,
            combine,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    fn run(&mut self) -> BTreeMap<NodeId, T> {
        let tree = self.tree;
        tree.nodes
            .keys()
            .filter_map(|id| self.visit(id).map(|value| (id.clone(), value)))
            .collect()
    }

    fn visit(&mut self, id: &'a str) -> Option<T> {
        if let Some(value) = self.memo.get(id) {
            return Some(*value);
        }
        let tree = self.tree;
        let (key, node) = tree.nodes.get_key_value(id)?;
        if !self.in_progress.insert(key.as_str()) {
            return None;
        }

        let kids: Vec<T> = tree
            .present_children(id)
            .into_iter()
            .filter_map(|kid| self.visit(kid))
            .collect();
        let value = (self.combine)(node, &kids);

        self.in_progress.remove(key.as_str());
        self.memo.insert(key.as_str(), value);
        Some(value)
    }
}
