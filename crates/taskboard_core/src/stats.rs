//! Dashboard statistics derived from a task snapshot.
//!
//! Pure functions; nothing here touches storage.

use crate::model::task::Task;

/// Aggregate figures over one task collection.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStatistics {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Sum of all durations, in minutes.
    pub total_minutes: f64,
    /// Sum of completed durations, in minutes.
    pub completed_minutes: f64,
    /// Completed share as a whole percentage, `0` for an empty collection.
    pub completion_rate: u32,
}

impl TaskStatistics {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total_tasks = tasks.len();
        let completed_tasks = tasks.iter().filter(|task| task.completed).count();
        let total_minutes = tasks.iter().map(|task| task.duration).sum();
        let completed_minutes = tasks
            .iter()
            .filter(|task| task.completed)
            .map(|task| task.duration)
            .sum();

        Self {
            total_tasks,
            completed_tasks,
            total_minutes,
            completed_minutes,
            completion_rate: completion_rate(total_tasks, completed_tasks),
        }
    }

    /// Rate rendered as `"NN%"`.
    pub fn completion_label(&self) -> String {
        format!("{}%", self.completion_rate)
    }

    pub fn total_duration_label(&self) -> String {
        format_duration(self.total_minutes)
    }

    pub fn completed_duration_label(&self) -> String {
        format_duration(self.completed_minutes)
    }
}

fn completion_rate(total: usize, completed: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let rate = (completed as f64 * 100.0 / total as f64).round();
    rate as u32
}

/// Formats minutes as `45min`, `2h` or `1h30m`.
///
/// Fractional minutes are rounded to the nearest whole minute; negative or
/// non-finite input renders as `0min`.
pub fn format_duration(minutes: f64) -> String {
    let minutes = if minutes.is_finite() && minutes > 0.0 {
        minutes.round() as u64
    } else {
        0
    };

    if minutes < 60 {
        return format!("{minutes}min");
    }

    let hours = minutes / 60;
    match minutes % 60 {
        0 => format!("{hours}h"),
        rest => format!("{hours}h{rest}m"),
    }
}
