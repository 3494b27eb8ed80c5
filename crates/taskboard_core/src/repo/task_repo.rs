//! Task repository contract and key-value backed implementation.
//!
//! # Responsibility
//! - Provide CRUD over the persisted task collection.
//! - Translate validation, lookup and storage failures into `TaskError`.
//!
//! # Invariants
//! - Write paths validate before loading or writing anything.
//! - Every mutation is a full read-modify-write of the collection.
//! - A failed operation leaves the persisted collection unchanged.

use crate::model::task::{validate_task_id, Task, TaskId, TaskValidationError};
use crate::storage::task_storage::TaskStorage;
use crate::storage::{KeyValueStorage, StorageError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type TaskResult<T> = Result<T, TaskError>;

/// High-level operation a `TaskError` was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOperation {
    Create,
    Update,
    Delete,
    ToggleStatus,
    DeleteAll,
    GetAll,
}

impl TaskOperation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create task",
            Self::Update => "update task",
            Self::Delete => "delete task",
            Self::ToggleStatus => "toggle task status",
            Self::DeleteAll => "delete all tasks",
            Self::GetAll => "retrieve tasks",
        }
    }

    fn event(self) -> &'static str {
        match self {
            Self::Create => "task_create",
            Self::Update => "task_update",
            Self::Delete => "task_delete",
            Self::ToggleStatus => "task_toggle",
            Self::DeleteAll => "task_delete_all",
            Self::GetAll => "task_get_all",
        }
    }
}

impl Display for TaskOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying reason of a `TaskError`.
#[derive(Debug)]
pub enum TaskErrorCause {
    Validation(TaskValidationError),
    NotFound(TaskId),
    DuplicateId(TaskId),
    /// No id above the largest one in use is representable.
    IdsExhausted,
    Storage(StorageError),
}

impl Display for TaskErrorCause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task with id {id} not found"),
            Self::DuplicateId(id) => write!(f, "task with id {id} already exists"),
            Self::IdsExhausted => {
                write!(f, "task ids are exhausted (largest id {})", TaskId::MAX)
            }
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl From<TaskValidationError> for TaskErrorCause {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for TaskErrorCause {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Domain error for every task operation.
///
/// Callers are expected to rely on the message, which always names the
/// failed operation: `failed to update task: task with id 9 not found`.
#[derive(Debug)]
pub struct TaskError {
    operation: TaskOperation,
    cause: TaskErrorCause,
}

impl TaskError {
    pub fn new(operation: TaskOperation, cause: impl Into<TaskErrorCause>) -> Self {
        Self {
            operation,
            cause: cause.into(),
        }
    }

    pub fn operation(&self) -> TaskOperation {
        self.operation
    }

    pub fn cause(&self) -> &TaskErrorCause {
        &self.cause
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.cause, TaskErrorCause::NotFound(_))
    }
}

impl Display for TaskError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to {}: {}", self.operation, self.cause)
    }
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            TaskErrorCause::Validation(err) => Some(err),
            TaskErrorCause::Storage(err) => Some(err),
            TaskErrorCause::NotFound(_)
            | TaskErrorCause::DuplicateId(_)
            | TaskErrorCause::IdsExhausted => None,
        }
    }
}

/// Repository interface for task CRUD operations.
pub trait TaskRepository {
    fn create(&self, task: &Task) -> TaskResult<()>;
    fn update(&self, task: &Task) -> TaskResult<()>;
    fn delete(&self, id: TaskId) -> TaskResult<()>;
    /// Flips `completed` and returns the stored result.
    fn toggle_status(&self, id: TaskId) -> TaskResult<Task>;
    fn delete_all(&self) -> TaskResult<()>;
    fn get_all(&self) -> TaskResult<Vec<Task>>;
}

/// Repository persisting the whole collection through a `TaskStorage`.
pub struct LocalTaskRepository<S: KeyValueStorage> {
    storage: TaskStorage<S>,
}

impl<S: KeyValueStorage> LocalTaskRepository<S> {
    pub fn new(storage: TaskStorage<S>) -> Self {
        Self { storage }
    }

    /// Convenience constructor using the default storage key.
    pub fn with_medium(medium: S) -> Self {
        Self::new(TaskStorage::new(medium))
    }

    pub fn storage(&self) -> &TaskStorage<S> {
        &self.storage
    }

    fn load(&self) -> Result<Vec<Task>, TaskErrorCause> {
        Ok(self.storage.read_all()?)
    }

    fn save(&self, tasks: &[Task]) -> Result<(), TaskErrorCause> {
        Ok(self.storage.write_all(tasks)?)
    }
}

impl<S: KeyValueStorage> TaskRepository for LocalTaskRepository<S> {
    fn create(&self, task: &Task) -> TaskResult<()> {
        run(TaskOperation::Create, Some(task.id), || {
            task.validate()?;
            let mut tasks = self.load()?;
            if tasks.iter().any(|existing| existing.id == task.id) {
                return Err(TaskErrorCause::DuplicateId(task.id));
            }
            tasks.push(task.clone());
            self.save(&tasks)
        })
    }

    fn update(&self, task: &Task) -> TaskResult<()> {
        run(TaskOperation::Update, Some(task.id), || {
            task.validate()?;
            let mut tasks = self.load()?;
            let slot = tasks
                .iter_mut()
                .find(|existing| existing.id == task.id)
                .ok_or(TaskErrorCause::NotFound(task.id))?;
            *slot = task.clone();
            self.save(&tasks)
        })
    }

    fn delete(&self, id: TaskId) -> TaskResult<()> {
        run(TaskOperation::Delete, Some(id), || {
            validate_task_id(id)?;
            let mut tasks = self.load()?;
            let index = position_of(&tasks, id)?;
            tasks.remove(index);
            self.save(&tasks)
        })
    }

    fn toggle_status(&self, id: TaskId) -> TaskResult<Task> {
        run(TaskOperation::ToggleStatus, Some(id), || {
            validate_task_id(id)?;
            let mut tasks = self.load()?;
            let index = position_of(&tasks, id)?;
            tasks[index].completed = !tasks[index].completed;
            self.save(&tasks)?;
            Ok(tasks.swap_remove(index))
        })
    }

    fn delete_all(&self) -> TaskResult<()> {
        run(TaskOperation::DeleteAll, None, || self.save(&[]))
    }

    fn get_all(&self) -> TaskResult<Vec<Task>> {
        run(TaskOperation::GetAll, None, || self.load())
    }
}

fn position_of(tasks: &[Task], id: TaskId) -> Result<usize, TaskErrorCause> {
    tasks
        .iter()
        .position(|task| task.id == id)
        .ok_or(TaskErrorCause::NotFound(id))
}

fn run<T>(
    operation: TaskOperation,
    task_id: Option<TaskId>,
    body: impl FnOnce() -> Result<T, TaskErrorCause>,
) -> TaskResult<T> {
    let task_id = task_id.map_or_else(|| "-".to_string(), |id| id.to_string());
    match body() {
        Ok(value) => {
            info!(
                "event={} module=repo status=ok task_id={}",
                operation.event(),
                task_id
            );
            Ok(value)
        }
        Err(cause) => {
            warn!(
                "event={} module=repo status=error task_id={} error={}",
                operation.event(),
                task_id,
                cause
            );
            Err(TaskError::new(operation, cause))
        }
    }
}
