//! Timeline widget synchronization.
//!
//! # Responsibility
//! - Define the widget data contract and the bridge state machine.
//!
//! # Invariants
//! - Widget edits reach the tree only through `TreeStore` operations.

pub mod bridge;
pub mod widget;
