//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record shared by every layer.
//! - Own field validation so storage and service never duplicate it.
//!
//! # Invariants
//! - Every persisted task carries a positive, collection-unique `TaskId`.

pub mod task;
