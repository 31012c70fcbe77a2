//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store edits, projections and snapshot persistence.
//! - Keep the CLI decoupled from storage details.

pub mod plan_service;
