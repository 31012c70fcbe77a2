//! Plan domain model.
//!
//! # Responsibility
//! - Define canonical data structures shared by the store and projections.
//! - Keep one tree shape for diagram, timeline and table views.
//!
//! # Invariants
//! - Every node is identified by a stable `NodeId`.
//! - Node map and children index are only mutated together, by the store.

pub mod node;
pub mod snapshot;
pub mod tree;
