//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and reactive store into consumer-level APIs.
//! - Keep consumers decoupled from storage details.

pub mod task_service;
