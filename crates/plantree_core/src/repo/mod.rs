//! Repository layer for persisted plan snapshots.
//!
//! # Responsibility
//! - Define the snapshot storage contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Payloads are validated on both write and read.
//! - Repository APIs return semantic errors (`NotFound`, `InvalidName`) in
//!   addition to DB transport errors.

pub mod snapshot_repo;
