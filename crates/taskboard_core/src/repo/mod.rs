//! Repository layer over the persisted task collection.
//!
//! # Responsibility
//! - Define the use-case oriented task data access contract.
//! - Isolate serialization and medium details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Task::validate()` before persistence.
//! - Repository APIs report semantic failures (`NotFound`, `DuplicateId`)
//!   alongside storage failures, all as one `TaskError` kind.

pub mod task_repo;
