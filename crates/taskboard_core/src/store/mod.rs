//! In-memory reactive state for task consumers.
//!
//! # Responsibility
//! - Hold the view-side copy of the task collection.
//! - Publish every change to subscribers synchronously.
//!
//! # Invariants
//! - The store never validates or persists; only the service mutates it.
//! - Every mutation publishes a new collection value.

pub mod task_store;
