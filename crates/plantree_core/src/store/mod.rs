//! Mutable plan state.
//!
//! # Responsibility
//! - Own the canonical tree and expose its structural edit operations.
//!
//! # Invariants
//! - Only this module mutates the node map, children index and collapsed set.

pub mod tree_store;
