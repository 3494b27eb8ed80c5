//! Task coordination service.
//!
//! # Responsibility
//! - Provide the only task entry points consumers are meant to call.
//! - Keep the reactive store in step with the repository.
//! - Assign task ids at creation time.
//!
//! # Invariants
//! - Every mutation persists first and is reflected in the store only after
//!   the repository call succeeded.
//! - A failed `initialize()` leaves the store empty.
//! - Issued ids strictly increase for the lifetime of one service.

use crate::model::task::{NewTask, Task, TaskId};
use crate::repo::task_repo::{
    TaskError, TaskErrorCause, TaskOperation, TaskRepository, TaskResult,
};
use crate::stats::TaskStatistics;
use crate::store::task_store::TaskStore;
use log::{error, info};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Time source for id assignment.
pub trait Clock: Send + Sync {
    /// Current time in Unix epoch milliseconds.
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
            })
    }
}

/// Time-based id source that never repeats or goes backwards.
struct IdGenerator {
    clock: Box<dyn Clock>,
    last: AtomicI64,
}

impl IdGenerator {
    fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            last: AtomicI64::new(0),
        }
    }

    /// Returns `None` once the last issued or observed id is `TaskId::MAX`.
    fn next_id(&self) -> Option<TaskId> {
        let now = self.clock.now_millis();
        self.last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                last.checked_add(1).map(|next| now.max(next))
            })
            .ok()
            .and_then(|previous| previous.checked_add(1))
            .map(|next| now.max(next))
    }

    /// Ensures later ids are issued above every id already in use.
    fn observe(&self, tasks: &[Task]) {
        if let Some(max_id) = tasks.iter().map(|task| task.id).max() {
            self.last.fetch_max(max_id, Ordering::SeqCst);
        }
    }
}

/// Coordinates a task repository with the reactive store.
///
/// Construct once at application start and pass it to consumers.
pub struct TaskService<R: TaskRepository> {
    repo: R,
    store: TaskStore,
    ids: IdGenerator,
    initialized: AtomicBool,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates a service with a fresh store and the wall clock.
    pub fn new(repo: R) -> Self {
        Self::with_store(repo, TaskStore::new())
    }

    /// Creates a service reflecting into an existing store handle.
    pub fn with_store(repo: R, store: TaskStore) -> Self {
        Self {
            repo,
            store,
            ids: IdGenerator::new(Box::new(SystemClock)),
            initialized: AtomicBool::new(false),
        }
    }

    /// Replaces the id time source.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.ids = IdGenerator::new(Box::new(clock));
        self
    }

    /// Store handle for reading and subscribing.
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Loads persisted tasks into the store.
    ///
    /// On failure the store is reset to empty and the error is returned.
    pub fn initialize(&self) -> TaskResult<()> {
        match self.get_all() {
            Ok(tasks) => {
                self.initialized.store(true, Ordering::SeqCst);
                info!(
                    "event=service_init module=service status=ok count={}",
                    tasks.len()
                );
                Ok(())
            }
            Err(err) => {
                self.store.replace_all(Vec::new());
                error!("event=service_init module=service status=error error={err}");
                Err(err)
            }
        }
    }

    /// Reloads from the repository and resynchronizes the store.
    pub fn get_all(&self) -> TaskResult<Vec<Task>> {
        let tasks = self.repo.get_all()?;
        self.ids.observe(&tasks);
        self.store.replace_all(tasks.clone());
        Ok(tasks)
    }

    /// Assigns a fresh id to `draft`, persists it, then reflects it.
    pub fn create(&self, draft: NewTask) -> TaskResult<Task> {
        let id = self.ids.next_id().ok_or_else(|| {
            error!("event=task_create module=service status=error reason=ids_exhausted");
            TaskError::new(TaskOperation::Create, TaskErrorCause::IdsExhausted)
        })?;
        let task = draft.with_id(id);
        self.repo.create(&task)?;
        self.store.create(task.clone());
        Ok(task)
    }

    pub fn update(&self, task: &Task) -> TaskResult<()> {
        self.repo.update(task)?;
        self.store.update(task.clone());
        Ok(())
    }

    pub fn delete(&self, id: TaskId) -> TaskResult<()> {
        self.repo.delete(id)?;
        self.store.delete(id);
        Ok(())
    }

    /// Flips completion and returns the persisted task.
    pub fn toggle_status(&self, id: TaskId) -> TaskResult<Task> {
        let toggled = self.repo.toggle_status(id)?;
        self.store.toggle_status(id);
        Ok(toggled)
    }

    pub fn delete_all(&self) -> TaskResult<()> {
        self.repo.delete_all()?;
        self.store.delete_all();
        Ok(())
    }

    /// Dashboard figures over the current store snapshot.
    pub fn statistics(&self) -> TaskStatistics {
        TaskStatistics::from_tasks(&self.store.get_all())
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, IdGenerator};
    use crate::model::task::NewTask;

    struct FrozenClock(i64);

    impl Clock for FrozenClock {
        fn now_millis(&self) -> i64 {
            self.0
        }
    }

    #[test]
    fn ids_increase_when_clock_stalls() {
        let ids = IdGenerator::new(Box::new(FrozenClock(1_000)));
        assert_eq!(ids.next_id(), Some(1_000));
        assert_eq!(ids.next_id(), Some(1_001));
        assert_eq!(ids.next_id(), Some(1_002));
    }

    #[test]
    fn ids_skip_past_observed_tasks() {
        let ids = IdGenerator::new(Box::new(FrozenClock(1_000)));
        ids.observe(&[NewTask::new("a", "b", 1.0).with_id(5_000)]);
        assert_eq!(ids.next_id(), Some(5_001));
    }

    #[test]
    fn ids_run_out_at_max_without_wrapping() {
        let ids = IdGenerator::new(Box::new(FrozenClock(1_000)));
        ids.observe(&[NewTask::new("a", "b", 1.0).with_id(i64::MAX - 1)]);
        assert_eq!(ids.next_id(), Some(i64::MAX));
        assert_eq!(ids.next_id(), None);
        assert_eq!(ids.next_id(), None);
    }
}
