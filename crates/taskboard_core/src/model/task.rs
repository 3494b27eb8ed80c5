//! Task domain model.
//!
//! # Responsibility
//! - Define the single persisted task record and its caller-facing draft.
//! - Enforce field-level invariants before any persisted write.
//! - Provide the structural check used when decoding persisted collections.
//!
//! # Invariants
//! - `id` is a positive integer and unique within one collection.
//! - `source` and `description` are non-empty after trimming.
//! - `duration` is a finite, non-negative number of minutes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Task identifier. Assigned by the service from an epoch-millisecond clock.
pub type TaskId = i64;

/// Persisted task record.
///
/// Field names double as the JSON wire names of the stored collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Short origin/title label.
    pub source: String,
    /// Free text body.
    pub description: String,
    /// Estimated effort in minutes.
    pub duration: f64,
    pub completed: bool,
}

/// Caller-supplied task fields for creation. The id is assigned later.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub source: String,
    pub description: String,
    pub duration: f64,
    pub completed: bool,
}

impl NewTask {
    /// Creates an open (not completed) task draft.
    pub fn new(source: impl Into<String>, description: impl Into<String>, duration: f64) -> Self {
        Self {
            source: source.into(),
            description: description.into(),
            duration,
            completed: false,
        }
    }

    /// Binds this draft to an id, producing a full record.
    pub fn with_id(self, id: TaskId) -> Task {
        Task {
            id,
            source: self.source,
            description: self.description,
            duration: self.duration,
            completed: self.completed,
        }
    }
}

/// Field-level validation failures.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskValidationError {
    /// `id` is zero or negative.
    InvalidId(TaskId),
    /// `source` is empty after trim.
    EmptySource,
    /// `description` is empty after trim.
    EmptyDescription,
    /// `duration` is negative, NaN or infinite.
    InvalidDuration(f64),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(id) => write!(f, "task id is required and must be > 0, got {id}"),
            Self::EmptySource => write!(f, "task source is required and must be non-empty"),
            Self::EmptyDescription => {
                write!(f, "task description is required and must be non-empty")
            }
            Self::InvalidDuration(value) => {
                write!(f, "task duration must be a non-negative number, got {value}")
            }
        }
    }
}

impl Error for TaskValidationError {}

impl Task {
    /// Validates every field of this task.
    ///
    /// Pure check, no side effects. Fails on the first violated invariant in
    /// field order `id`, `source`, `description`, `duration`.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_task_id(self.id)?;
        if self.source.trim().is_empty() {
            return Err(TaskValidationError::EmptySource);
        }
        if self.description.trim().is_empty() {
            return Err(TaskValidationError::EmptyDescription);
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(TaskValidationError::InvalidDuration(self.duration));
        }
        Ok(())
    }

    /// Returns a copy with `completed` flipped.
    pub fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }
}

/// Checks that `id` can address a stored task.
pub fn validate_task_id(id: TaskId) -> Result<(), TaskValidationError> {
    if id <= 0 {
        return Err(TaskValidationError::InvalidId(id));
    }
    Ok(())
}

/// Structural check for one decoded entry of the persisted collection.
///
/// Only types are checked here; value rules live in [`Task::validate`].
pub fn is_valid_shape(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };

    object.get("id").is_some_and(|id| id.as_i64().is_some())
        && object.get("source").is_some_and(Value::is_string)
        && object.get("description").is_some_and(Value::is_string)
        && object.get("duration").is_some_and(Value::is_number)
        && object.get("completed").is_some_and(Value::is_boolean)
}
