//! Data contract at the timeline widget boundary.
//!
//! # Responsibility
//! - Define the widget task/link records and the events the widget raises.
//! - Build the full `{tasks, links}` feed from aggregated schedule data.
//!
//! # Invariants
//! - Parent `0` on the wire always means the root.
//! - The feed lists tasks in pre-order from the root, one link per
//!   parent/child pair.
//! - Every task in the feed has a start date and a duration.

use crate::config::ScheduleDefaults;
use crate::model::node::{Node, NodeId, NodePatch, ROOT_ID};
use crate::model::tree::{CollapsedSet, PlanTree};
use crate::projection::date::{add_days, format_plan_date, parse_optional, parse_plan_date};
use crate::projection::schedule::Schedule;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Link type code for finish-to-start dependencies.
pub const FINISH_TO_START: &str = "0";

/// Parent reference as the widget sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawParent", into = "RawParent")]
pub enum ParentRef {
    Root,
    Node(NodeId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawParent {
    Number(u64),
    Text(String),
}

impl From<RawParent> for ParentRef {
    fn from(value: RawParent) -> Self {
        match value {
            RawParent::Number(0) => Self::Root,
            RawParent::Number(other) => Self::Node(other.to_string()),
            RawParent::Text(text) if text == "0" || text == ROOT_ID => Self::Root,
            RawParent::Text(text) => Self::Node(text),
        }
    }
}

impl From<ParentRef> for RawParent {
    fn from(value: ParentRef) -> Self {
        match value {
            ParentRef::Root => Self::Number(0),
            ParentRef::Node(id) => Self::Text(id),
        }
    }
}

impl ParentRef {
    /// Store id of the referenced parent.
    pub fn node_id(&self) -> &str {
        match self {
            Self::Root => ROOT_ID,
            Self::Node(id) => id.as_str(),
        }
    }
}

/// One task record as held by the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetTask {
    pub id: NodeId,
    pub text: String,
    /// `dd-mm-yyyy` on output; either date order accepted on input.
    pub start_date: String,
    pub duration: u32,
    pub parent: ParentRef,
    #[serde(default)]
    pub progress: f64,
    #[serde(default = "default_open")]
    pub open: bool,
}

fn default_open() -> bool {
    true
}

impl WidgetTask {
    /// Node fields carried by this task.
    ///
    /// The required date is recomputed as start + duration; an unparseable
    /// start leaves both dates untouched.
    pub fn to_patch(&self) -> NodePatch {
        let start = parse_plan_date(&self.start_date);
        NodePatch {
            label: Some(self.text.clone()),
            start_date: start.map(format_plan_date),
            duration: Some(self.duration),
            date_required: start
                .and_then(|start| add_days(start, self.duration))
                .map(format_plan_date),
            progress: Some(self.progress),
            ..NodePatch::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetLink {
    pub id: u64,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Entire widget state, replaced wholesale on every push.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineSnapshot {
    pub tasks: Vec<WidgetTask>,
    pub links: Vec<WidgetLink>,
}

impl TimelineSnapshot {
    pub fn task(&self, id: &str) -> Option<&WidgetTask> {
        self.tasks.iter().find(|task| task.id == id)
    }
}

/// Event raised by the widget after a user action.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    TaskAdded(WidgetTask),
    TaskDeleted { id: NodeId },
    /// Drag or inline edit of date, duration, text or progress.
    TaskUpdated(WidgetTask),
    TaskOpened { id: NodeId },
    TaskClosed { id: NodeId },
}

impl WidgetEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TaskAdded(_) => "add",
            Self::TaskDeleted { .. } => "delete",
            Self::TaskUpdated(_) => "update",
            Self::TaskOpened { .. } => "open",
            Self::TaskClosed { .. } => "close",
        }
    }

    pub fn task_id(&self) -> &str {
        match self {
            Self::TaskAdded(task) | Self::TaskUpdated(task) => task.id.as_str(),
            Self::TaskDeleted { id } | Self::TaskOpened { id } | Self::TaskClosed { id } => {
                id.as_str()
            }
        }
    }
}

/// Seam to the external timeline editor.
pub trait TimelineWidget {
    /// Replaces the widget's whole task list.
    ///
    /// Returns any events the widget raised while reloading; the caller
    /// decides whether they are genuine.
    fn replace_all(&mut self, snapshot: &TimelineSnapshot) -> Vec<WidgetEvent>;
}

/// In-memory widget that keeps the last pushed feed.
///
/// With `echo_open_events` set it mimics editors that fire an open event
/// for every expanded task while parsing a feed.
#[derive(Debug, Clone, Default)]
pub struct MemoryWidget {
    pub current: TimelineSnapshot,
    pub loads: usize,
    pub echo_open_events: bool,
}

impl MemoryWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn echoing() -> Self {
        Self {
            echo_open_events: true,
            ..Self::default()
        }
    }
}

impl TimelineWidget for MemoryWidget {
    fn replace_all(&mut self, snapshot: &TimelineSnapshot) -> Vec<WidgetEvent> {
        self.current = snapshot.clone();
        self.loads += 1;
        if !self.echo_open_events {
            return Vec::new();
        }
        snapshot
            .tasks
            .iter()
            .filter(|task| task.open)
            .map(|task| WidgetEvent::TaskOpened {
                id: task.id.clone(),
            })
            .collect()
    }
}

/// Builds the widget feed from the tree and its aggregated schedule.
///
/// Unscheduled nodes first borrow their parent's own stored start and
/// duration (when the parent has both), then fall back to `defaults`.
pub fn timeline_snapshot(
    tree: &PlanTree,
    collapsed: &CollapsedSet,
    schedule: &Schedule,
    defaults: &ScheduleDefaults,
) -> TimelineSnapshot {
    let mut feed = TimelineSnapshot::default();
    if tree.root().is_none() {
        return feed;
    }

    let fallback_start = parse_plan_date(&defaults.start_date);
    let mut seen = HashSet::from([ROOT_ID]);
    let mut stack = vec![ROOT_ID];
    while let Some(id) = stack.pop() {
        let Some(node) = tree.node(id) else {
            continue;
        };
        let entry = schedule.entry(id);
        let inherited = node
            .parent
            .as_deref()
            .and_then(|parent| tree.node(parent))
            .and_then(own_schedule);

        let start = entry
            .start
            .or(inherited.map(|(start, _)| start))
            .or(fallback_start);
        let duration = entry
            .duration
            .or(inherited.map(|(_, days)| days))
            .unwrap_or(defaults.duration_days);

        let parent = match node.parent.as_deref() {
            None => ParentRef::Root,
            Some(parent) => ParentRef::Node(parent.to_string()),
        };
        if let ParentRef::Node(parent_id) = &parent {
            feed.links.push(WidgetLink {
                id: feed.links.len() as u64 + 1,
                source: parent_id.clone(),
                target: id.to_string(),
                kind: FINISH_TO_START.to_string(),
            });
        }
        feed.tasks.push(WidgetTask {
            id: id.to_string(),
            text: node.label.clone(),
            start_date: start
                .map(format_plan_date)
                .unwrap_or_else(|| defaults.start_date.clone()),
            duration,
            parent,
            progress: schedule.progress_of(id),
            open: !collapsed.contains(id),
        });

        let kids: Vec<&str> = tree
            .present_children(id)
            .into_iter()
            .filter(|kid| seen.insert(*kid))
            .collect();
        stack.extend(kids.into_iter().rev());
    }
    feed
}

fn own_schedule(node: &Node) -> Option<(NaiveDate, u32)> {
    parse_optional(node.start_date.as_deref()).zip(node.duration)
}
