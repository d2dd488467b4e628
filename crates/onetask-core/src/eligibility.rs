//! Eligibility filter for daily selection.
//!
//! A task is eligible when it is not Completed and its cooldown, if any,
//! has expired. `postponed_until` is authoritative: a Postponed task whose
//! cooldown has passed re-enters selection without its status reverting to
//! Pending. This is the single gate used both for selection and for
//! pending-count display.

use chrono::{DateTime, Utc};

use crate::task::{Task, TaskStatus};

/// Whether a single task is currently assignable.
pub fn is_eligible(task: &Task, now: DateTime<Utc>) -> bool {
    if task.status == TaskStatus::Completed {
        return false;
    }
    match task.postponed_until {
        Some(until) => until <= now,
        None => true,
    }
}

/// Filter `tasks` down to the currently assignable subset.
pub fn eligible_tasks(tasks: &[Task], now: DateTime<Utc>) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| is_eligible(t, now))
        .cloned()
        .collect()
}
