//! Daily task prioritization engine.
//!
//! Pure scoring and selection over an eligible task set. The score combines
//! three signals:
//!
//! - importance: level × 10 (10-50 points)
//! - deadline urgency: 0-40 points by calendar-day distance
//! - age in queue: up to 20 points, so old tasks cannot starve forever but
//!   also cannot outgrow the importance and deadline signals
//!
//! Selection additionally applies a soft duration preference from the day's
//! time-availability band and breaks score ties toward the shorter task.

use chrono::{DateTime, Utc};

use crate::state::TimeAvailability;
use crate::task::{DurationBucket, Task};

/// Points granted per importance level.
const IMPORTANCE_WEIGHT: i64 = 10;

/// Cap on the anti-starvation age contribution, in points.
const MAX_AGE_POINTS: i64 = 20;

/// Deterministic priority score for a task at `now`. No side effects; a pure
/// function of one task and the clock.
pub fn score(task: &Task, now: DateTime<Utc>) -> i64 {
    let mut score = i64::from(task.importance.level()) * IMPORTANCE_WEIGHT;

    if let Some(deadline) = task.deadline {
        let days_until = (deadline.date_naive() - now.date_naive()).num_days();
        score += match days_until {
            d if d < 0 => 40, // overdue
            0 => 35,          // due today
            1..=3 => 30,
            4..=7 => 20,
            8..=14 => 10,
            _ => 0,
        };
    }

    let days_in_queue = (now.date_naive() - task.created_at.date_naive()).num_days();
    score += days_in_queue.clamp(0, MAX_AGE_POINTS);

    score
}

/// Apply the duration preference for `availability`. The preference is soft:
/// when it would empty the set, the original set is returned unfiltered.
pub fn filter_by_duration(tasks: &[Task], availability: TimeAvailability) -> Vec<Task> {
    let preferred: Vec<Task> = match availability {
        TimeAvailability::Extra => tasks
            .iter()
            .filter(|t| t.estimated_duration >= DurationBucket::TwoHours)
            .cloned()
            .collect(),
        TimeAvailability::Limited => tasks
            .iter()
            .filter(|t| t.estimated_duration <= DurationBucket::OneHour)
            .cloned()
            .collect(),
        TimeAvailability::Normal => return tasks.to_vec(),
    };

    if preferred.is_empty() {
        tasks.to_vec()
    } else {
        preferred
    }
}

/// Select the one task the user should act on today.
///
/// Returns `None` only when `eligible` is empty. Deterministic: repeated
/// calls with the same inputs and `now` return the same task.
pub fn select_daily_task(
    eligible: &[Task],
    availability: TimeAvailability,
    now: DateTime<Utc>,
) -> Option<Task> {
    if eligible.is_empty() {
        return None;
    }

    let candidates = filter_by_duration(eligible, availability);

    let mut scored: Vec<(i64, &Task)> = candidates.iter().map(|t| (score(t, now), t)).collect();
    // Highest score first; among equals prefer the quicker win.
    scored.sort_by(|(score_a, task_a), (score_b, task_b)| {
        score_b
            .cmp(score_a)
            .then(task_a.estimated_duration.cmp(&task_b.estimated_duration))
    });

    scored.first().map(|(_, task)| (*task).clone())
}
