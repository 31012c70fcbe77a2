//! Plan node domain model.
//!
//! # Responsibility
//! - Define the fixed-shape record for one project-plan item.
//! - Keep scheduling and review fields explicitly optional.
//!
//! # Invariants
//! - `id` is stable and never reused for another node.
//! - `parent` is `None` only for the root node.
//! - Date fields keep the caller's text; parsing happens in projections.

use serde::{Deserialize, Serialize};

/// Stable identifier for every plan node.
pub type NodeId = String;

/// Identifier of the single root node seeded at initialization.
pub const ROOT_ID: &str = "root";

/// Qualitative level used for savings and effort ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    /// Ranking weight, higher means "more".
    pub fn weight(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

/// Canonical record for one project-plan item.
///
/// Serialized field names follow the snapshot wire format, so snapshots
/// produced by earlier tooling load without conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    #[serde(default)]
    pub category: String,
    /// Background colour.
    #[serde(rename = "bg", default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Foreground (text) colour.
    #[serde(rename = "text", default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Duration in days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Completion-required date.
    #[serde(rename = "dateRequired", default, skip_serializing_if = "Option::is_none")]
    pub date_required: Option<String>,
    #[serde(rename = "dateCompleted", default, skip_serializing_if = "Option::is_none")]
    pub date_completed: Option<String>,
    /// Stored as a fraction; values above 1 are read as percentages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<Level>,
    /// Candidate for prioritized review.
    #[serde(rename = "priorityReview", default, skip_serializing_if = "is_false")]
    pub priority_review: bool,
    #[serde(rename = "keyQuestion", default, skip_serializing_if = "Option::is_none")]
    pub key_question: Option<String>,
    #[serde(rename = "decisionCheckpoint", default, skip_serializing_if = "Option::is_none")]
    pub decision_checkpoint: Option<String>,
    #[serde(rename = "expectedData", default, skip_serializing_if = "Option::is_none")]
    pub expected_data: Option<String>,
    /// Owner name.
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Node {
    /// Creates a node with only identity, label and parent set.
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category: String::new(),
            background: None,
            foreground: None,
            parent,
            start_date: None,
            duration: None,
            date_required: None,
            date_completed: None,
            progress: None,
            savings: None,
            effort: None,
            priority_review: false,
            key_question: None,
            decision_checkpoint: None,
            expected_data: None,
            owner: None,
        }
    }

    /// Creates the parentless root node.
    pub fn root(label: impl Into<String>) -> Self {
        Self::new(ROOT_ID, label, None)
    }

    /// Copies category and colours from `source`.
    pub fn inherit_presentation(&mut self, source: &Node) {
        self.category = source.category.clone();
        self.background = source.background.clone();
        self.foreground = source.foreground.clone();
    }

    /// Merges every `Some` field of `patch` into this node.
    ///
    /// Identity and parent are never touched by a patch.
    pub fn apply_patch(&mut self, patch: &NodePatch) {
        if let Some(label) = &patch.label {
            self.label = label.clone();
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(background) = &patch.background {
            self.background = Some(background.clone());
        }
        if let Some(foreground) = &patch.foreground {
            self.foreground = Some(foreground.clone());
        }
        if let Some(start_date) = &patch.start_date {
            self.start_date = Some(start_date.clone());
        }
        if let Some(duration) = patch.duration {
            self.duration = Some(duration);
        }
        if let Some(date_required) = &patch.date_required {
            self.date_required = Some(date_required.clone());
        }
        if let Some(date_completed) = &patch.date_completed {
            self.date_completed = Some(date_completed.clone());
        }
        if let Some(progress) = patch.progress {
            self.progress = Some(progress);
        }
        if let Some(savings) = patch.savings {
            self.savings = Some(savings);
        }
        if let Some(effort) = patch.effort {
            self.effort = Some(effort);
        }
        if let Some(priority_review) = patch.priority_review {
            self.priority_review = priority_review;
        }
        if let Some(key_question) = &patch.key_question {
            self.key_question = Some(key_question.clone());
        }
        if let Some(decision_checkpoint) = &patch.decision_checkpoint {
            self.decision_checkpoint = Some(decision_checkpoint.clone());
        }
        if let Some(expected_data) = &patch.expected_data {
            self.expected_data = Some(expected_data.clone());
        }
        if let Some(owner) = &patch.owner {
            self.owner = Some(owner.clone());
        }
    }
}

/// Partial update for one node. `None` leaves the field unchanged.
///
/// Also used as the field set for add-child/add-sibling requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub label: Option<String>,
    pub category: Option<String>,
    pub background: Option<String>,
    pub foreground: Option<String>,
    pub start_date: Option<String>,
    pub duration: Option<u32>,
    pub date_required: Option<String>,
    pub date_completed: Option<String>,
    pub progress: Option<f64>,
    pub savings: Option<Level>,
    pub effort: Option<Level>,
    pub priority_review: Option<bool>,
    pub key_question: Option<String>,
    pub decision_checkpoint: Option<String>,
    pub expected_data: Option<String>,
    pub owner: Option<String>,
}

impl NodePatch {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn progress(progress: f64) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Level, Node, NodePatch, ROOT_ID};

    #[test]
    fn patch_merges_only_present_fields() {
        let mut node = Node::new("a", "Alpha", Some(ROOT_ID.to_string()));
        node.savings = Some(Level::High);

        node.apply_patch(&NodePatch {
            label: Some("Renamed".to_string()),
            duration: Some(3),
            ..NodePatch::default()
        });

        assert_eq!(node.label, "Renamed");
        assert_eq!(node.duration, Some(3));
        assert_eq!(node.savings, Some(Level::High));
        assert_eq!(node.parent.as_deref(), Some(ROOT_ID));
    }

    #[test]
    fn wire_names_match_snapshot_format() {
        let mut node = Node::new("a", "Alpha", Some(ROOT_ID.to_string()));
        node.background = Some("#FEF3C7".to_string());
        node.date_required = Some("05-09-2025".to_string());
        node.priority_review = true;
        node.owner = Some("Thandi".to_string());

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["bg"], "#FEF3C7");
        assert_eq!(json["dateRequired"], "05-09-2025");
        assert_eq!(json["priorityReview"], true);
        assert_eq!(json["name"], "Thandi");
        assert!(json.get("progress").is_none());
    }

    #[test]
    fn level_weights_are_ordered() {
        assert!(Level::High.weight() > Level::Medium.weight());
        assert!(Level::Medium.weight() > Level::Low.weight());
    }
}
