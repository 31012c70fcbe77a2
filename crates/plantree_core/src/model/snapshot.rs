//! Save/load snapshot shape.
//!
//! # Responsibility
//! - Define the four-field JSON snapshot exchanged at the store boundary.
//! - Reject structurally incomplete snapshots wholesale.
//!
//! # Invariants
//! - A snapshot missing any of `dataMap`, `childrenMap`, `collapsed`,
//!   `costLegend` is never partially applied.
//! - Export followed by import reproduces identical map, index, collapsed
//!   set and legend.

use crate::model::node::ROOT_ID;
use crate::model::tree::{ChildrenIndex, CollapsedSet, NodeMap};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Required top-level snapshot fields, in wire order.
pub const SNAPSHOT_FIELDS: [&str; 4] = ["dataMap", "childrenMap", "collapsed", "costLegend"];

/// One legend band (`low|medium|high`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    /// Display value, e.g. `"50,000"`.
    pub value: String,
    pub bg: String,
    pub text: String,
}

impl LegendEntry {
    fn new(value: &str, bg: &str, text: &str) -> Self {
        Self {
            value: value.to_string(),
            bg: bg.to_string(),
            text: text.to_string(),
        }
    }
}

/// Colour legend for savings/effort levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLegend {
    pub low: LegendEntry,
    pub medium: LegendEntry,
    pub high: LegendEntry,
}

impl Default for CostLegend {
    fn default() -> Self {
        Self {
            low: LegendEntry::new("10,000", "#dbeafe", "#1e40af"),
            medium: LegendEntry::new("50,000", "#ffedd5", "#9a3412"),
            high: LegendEntry::new("100,000", "#fecaca", "#991b1b"),
        }
    }
}

/// Full persisted plan state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "dataMap")]
    pub data_map: NodeMap,
    #[serde(rename = "childrenMap")]
    pub children_map: ChildrenIndex,
    pub collapsed: CollapsedSet,
    #[serde(rename = "costLegend")]
    pub cost_legend: CostLegend,
}

/// Why a snapshot was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Payload is not valid JSON.
    InvalidJson(String),
    /// Payload is JSON but not an object.
    NotAnObject,
    /// A required top-level field is absent.
    MissingField(&'static str),
    /// A field is present but has the wrong shape.
    InvalidField { field: &'static str, message: String },
    /// `dataMap` has no root node.
    MissingRoot,
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(message) => write!(f, "snapshot is not valid JSON: {message}"),
            Self::NotAnObject => write!(f, "snapshot must be a JSON object"),
            Self::MissingField(field) => write!(f, "snapshot is missing `{field}`"),
            Self::InvalidField { field, message } => {
                write!(f, "snapshot field `{field}` is invalid: {message}")
            }
            Self::MissingRoot => write!(f, "snapshot has no `{ROOT_ID}` node"),
        }
    }
}

impl Error for SnapshotError {}

impl Snapshot {
    /// Parses and checks a JSON snapshot.
    ///
    /// # Errors
    /// - Any of the four top-level fields missing.
    /// - A field that does not decode into its typed shape.
    /// - No root node in `dataMap`.
    pub fn from_json_str(payload: &str) -> Result<Self, SnapshotError> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|err| SnapshotError::InvalidJson(err.to_string()))?;
        Self::from_json_value(value)
    }

    /// Same as [`Snapshot::from_json_str`] for an already-parsed value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, SnapshotError> {
        let serde_json::Value::Object(mut object) = value else {
            return Err(SnapshotError::NotAnObject);
        };
        for field in SNAPSHOT_FIELDS {
            if !object.contains_key(field) {
                return Err(SnapshotError::MissingField(field));
            }
        }

        let data_map: NodeMap = take_field(&mut object, "dataMap")?;
        let children_map: ChildrenIndex = take_field(&mut object, "childrenMap")?;
        let collapsed: CollapsedSet = take_field(&mut object, "collapsed")?;
        let cost_legend: CostLegend = take_field(&mut object, "costLegend")?;

        if !data_map.contains_key(ROOT_ID) {
            return Err(SnapshotError::MissingRoot);
        }

        Ok(Self {
            data_map,
            children_map,
            collapsed,
            cost_legend,
        })
    }

    /// Pretty-printed JSON payload.
    pub fn to_json_string(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|err| SnapshotError::InvalidJson(err.to_string()))
    }
}

fn take_field<T: serde::de::DeserializeOwned>(
    object: &mut serde_json::Map<String, serde_json::Value>,
    field: &'static str,
) -> Result<T, SnapshotError> {
    let value = object
        .remove(field)
        .ok_or(SnapshotError::MissingField(field))?;
    serde_json::from_value(value).map_err(|err| SnapshotError::InvalidField {
        field,
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{CostLegend, Snapshot, SnapshotError};
    use serde_json::json;

    fn minimal_payload() -> serde_json::Value {
        json!({
            "dataMap": { "root": { "id": "root", "label": "Programme" } },
            "childrenMap": { "root": [] },
            "collapsed": [],
            "costLegend": serde_json::to_value(CostLegend::default()).unwrap(),
        })
    }

    #[test]
    fn accepts_minimal_snapshot() {
        let snapshot = Snapshot::from_json_value(minimal_payload()).unwrap();
        assert_eq!(snapshot.data_map.len(), 1);
        assert!(snapshot.collapsed.is_empty());
    }

    #[test]
    fn rejects_each_missing_field() {
        for field in super::SNAPSHOT_FIELDS {
            let mut payload = minimal_payload();
            payload.as_object_mut().unwrap().remove(field);
            let err = Snapshot::from_json_value(payload).unwrap_err();
            assert_eq!(err, SnapshotError::MissingField(field));
        }
    }

    #[test]
    fn rejects_snapshot_without_root() {
        let mut payload = minimal_payload();
        payload["dataMap"] = json!({ "x": { "id": "x", "label": "Orphan", "parent": "root" } });
        let err = Snapshot::from_json_value(payload).unwrap_err();
        assert_eq!(err, SnapshotError::MissingRoot);
    }

    #[test]
    fn rejects_wrongly_shaped_field() {
        let mut payload = minimal_payload();
        payload["collapsed"] = json!("root");
        let err = Snapshot::from_json_value(payload).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidField { field: "collapsed", .. }));
    }

    #[test]
    fn rejects_non_object_payload() {
        assert_eq!(
            Snapshot::from_json_str("[1, 2]").unwrap_err(),
            SnapshotError::NotAnObject
        );
        assert!(matches!(
            Snapshot::from_json_str("{").unwrap_err(),
            SnapshotError::InvalidJson(_)
        ));
    }
}
