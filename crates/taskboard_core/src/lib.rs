//! Core domain logic for Taskboard.
//! This crate is the single source of truth for task invariants and for
//! keeping the reactive task list in step with persistent storage.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod stats;
pub mod storage;
pub mod store;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{NewTask, Task, TaskId, TaskValidationError};
pub use repo::task_repo::{
    LocalTaskRepository, TaskError, TaskErrorCause, TaskOperation, TaskRepository, TaskResult,
};
pub use service::task_service::{Clock, SystemClock, TaskService};
pub use stats::{format_duration, TaskStatistics};
pub use storage::memory::MemoryStorage;
pub use storage::sqlite::SqliteStorage;
pub use storage::task_storage::TaskStorage;
pub use storage::{KeyValueStorage, StorageError};
pub use store::task_store::{Subscription, TaskList, TaskStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
