//! Task types for the daily backlog.
//!
//! A task moves between three informational statuses:
//!
//!   PENDING ─────────> COMPLETED   (complete / previous-day reconciliation)
//!      ^   postpone
//!      |      |
//!      |      v
//!      +── POSTPONED
//!
//! Status is informational: a POSTPONED task whose cooldown has expired is
//! selectable again without its status reverting to PENDING. Eligibility is
//! governed solely by `postponed_until` (see [`crate::eligibility`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Ordinal importance level, 1 (very low) to 5 (critical).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub enum Importance {
    VeryLow = 1,
    Low = 2,
    Medium = 3,
    High = 4,
    Critical = 5,
}

impl Importance {
    /// Numeric level, 1..=5.
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Importance::VeryLow => "Very low",
            Importance::Low => "Low",
            Importance::Medium => "Medium",
            Importance::High => "High",
            Importance::Critical => "Critical",
        }
    }
}

impl Default for Importance {
    fn default() -> Self {
        Importance::Medium
    }
}

impl TryFrom<u8> for Importance {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Importance::VeryLow),
            2 => Ok(Importance::Low),
            3 => Ok(Importance::Medium),
            4 => Ok(Importance::High),
            5 => Ok(Importance::Critical),
            other => Err(format!("importance must be 1..=5, got {other}")),
        }
    }
}

impl From<Importance> for u8 {
    fn from(value: Importance) -> Self {
        value as u8
    }
}

/// Estimated duration bucket in minutes.
///
/// Serialized as the raw minute count ({15, 30, 60, 120, 240, 480}) so the
/// wire format matches the export/import document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "u32", into = "u32")]
pub enum DurationBucket {
    FifteenMin,
    ThirtyMin,
    OneHour,
    TwoHours,
    FourHours,
    FullDay,
}

impl DurationBucket {
    pub const ALL: [DurationBucket; 6] = [
        DurationBucket::FifteenMin,
        DurationBucket::ThirtyMin,
        DurationBucket::OneHour,
        DurationBucket::TwoHours,
        DurationBucket::FourHours,
        DurationBucket::FullDay,
    ];

    /// Bucket size in minutes.
    pub fn minutes(self) -> u32 {
        match self {
            DurationBucket::FifteenMin => 15,
            DurationBucket::ThirtyMin => 30,
            DurationBucket::OneHour => 60,
            DurationBucket::TwoHours => 120,
            DurationBucket::FourHours => 240,
            DurationBucket::FullDay => 480,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            DurationBucket::FifteenMin => "15 minutes",
            DurationBucket::ThirtyMin => "30 minutes",
            DurationBucket::OneHour => "1 hour",
            DurationBucket::TwoHours => "2 hours",
            DurationBucket::FourHours => "4 hours",
            DurationBucket::FullDay => "Full day",
        }
    }
}

impl Default for DurationBucket {
    fn default() -> Self {
        DurationBucket::OneHour
    }
}

impl TryFrom<u32> for DurationBucket {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            15 => Ok(DurationBucket::FifteenMin),
            30 => Ok(DurationBucket::ThirtyMin),
            60 => Ok(DurationBucket::OneHour),
            120 => Ok(DurationBucket::TwoHours),
            240 => Ok(DurationBucket::FourHours),
            480 => Ok(DurationBucket::FullDay),
            other => Err(format!(
                "duration must be one of 15/30/60/120/240/480 minutes, got {other}"
            )),
        }
    }
}

impl From<DurationBucket> for u32 {
    fn from(value: DurationBucket) -> Self {
        value.minutes()
    }
}

/// Task status. Informational only; cooldown eligibility is governed by
/// `postponed_until`, not by this field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Postponed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Postponed => write!(f, "postponed"),
        }
    }
}

/// A unit of work the user may be asked to do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, immutable
    pub id: String,
    /// Display name, non-empty
    pub name: String,
    /// Optional free text
    #[serde(default)]
    pub description: Option<String>,
    /// Ordinal importance, 1..=5
    pub importance: Importance,
    /// Estimated duration bucket
    pub estimated_duration: DurationBucket,
    /// Point in time after which the task counts as overdue
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    /// Creation timestamp, immutable
    pub created_at: DateTime<Utc>,
    /// Set exactly once, when status transitions to Completed
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Cooldown expiry; while `now < postponed_until` the task is ineligible
    #[serde(default)]
    pub postponed_until: Option<DateTime<Utc>>,
    /// Free text recorded at postponement
    #[serde(default)]
    pub postpone_reason: Option<String>,
    /// Informational status
    pub status: TaskStatus,
    /// Manual pending-list ordering; unique increasing at creation
    #[serde(default)]
    pub order: i64,
}

impl Task {
    /// Create a task from creation input. The repository assigns `order`.
    pub fn new(input: NewTask, now: DateTime<Utc>) -> Self {
        Task {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
            importance: input.importance,
            estimated_duration: input.estimated_duration,
            deadline: input.deadline,
            created_at: now,
            completed_at: None,
            postponed_until: None,
            postpone_reason: None,
            status: TaskStatus::Pending,
            order: 0,
        }
    }

    /// Whether the deadline has passed relative to `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Pending
            && self.deadline.map(|d| d < now).unwrap_or(false)
    }
}

/// Creation input for a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub importance: Importance,
    #[serde(default)]
    pub estimated_duration: DurationBucket,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn named(name: impl Into<String>) -> Self {
        NewTask {
            name: name.into(),
            description: None,
            importance: Importance::default(),
            estimated_duration: DurationBucket::default(),
            deadline: None,
        }
    }
}

/// Partial update for a task. `None` leaves a field unchanged; for
/// clearable fields, `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub importance: Option<Importance>,
    pub estimated_duration: Option<DurationBucket>,
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub postponed_until: Option<Option<DateTime<Utc>>>,
    pub postpone_reason: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub order: Option<i64>,
}

impl TaskPatch {
    /// Merge this patch into `task`.
    pub fn apply(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(importance) = self.importance {
            task.importance = importance;
        }
        if let Some(duration) = self.estimated_duration {
            task.estimated_duration = duration;
        }
        if let Some(deadline) = self.deadline {
            task.deadline = deadline;
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = completed_at;
        }
        if let Some(postponed_until) = self.postponed_until {
            task.postponed_until = postponed_until;
        }
        if let Some(postpone_reason) = &self.postpone_reason {
            task.postpone_reason = postpone_reason.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(order) = self.order {
            task.order = order;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_conversions() {
        assert_eq!(Importance::try_from(1).unwrap(), Importance::VeryLow);
        assert_eq!(Importance::try_from(5).unwrap(), Importance::Critical);
        assert!(Importance::try_from(0).is_err());
        assert!(Importance::try_from(6).is_err());
        assert_eq!(u8::from(Importance::High), 4);
    }

    #[test]
    fn duration_conversions() {
        assert_eq!(DurationBucket::try_from(15).unwrap(), DurationBucket::FifteenMin);
        assert_eq!(DurationBucket::try_from(480).unwrap(), DurationBucket::FullDay);
        assert!(DurationBucket::try_from(45).is_err());
        assert_eq!(u32::from(DurationBucket::TwoHours), 120);
    }

    #[test]
    fn display_labels() {
        assert_eq!(Importance::Critical.label(), "Critical");
        assert_eq!(Importance::VeryLow.label(), "Very low");
        assert_eq!(DurationBucket::TwoHours.label(), "2 hours");
        assert_eq!(DurationBucket::FullDay.label(), "Full day");
    }

    #[test]
    fn duration_ordering_matches_minutes() {
        let mut sorted = DurationBucket::ALL;
        sorted.sort();
        for pair in sorted.windows(2) {
            assert!(pair[0].minutes() < pair[1].minutes());
        }
    }

    #[test]
    fn task_creation_defaults() {
        let now = Utc::now();
        let task = Task::new(NewTask::named("Water the plants"), now);
        assert_eq!(task.name, "Water the plants");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_at, now);
        assert!(task.completed_at.is_none());
        assert!(task.postponed_until.is_none());
    }

    #[test]
    fn task_serializes_camel_case() {
        let now = Utc::now();
        let task = Task::new(NewTask::named("Test"), now);
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("estimatedDuration").is_some());
        assert_eq!(json["status"], "pending");

        let decoded: Task = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, task);
    }

    #[test]
    fn duration_serializes_as_minutes() {
        let json = serde_json::to_value(DurationBucket::TwoHours).unwrap();
        assert_eq!(json, serde_json::json!(120));
        let decoded: DurationBucket = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, DurationBucket::TwoHours);
    }

    #[test]
    fn patch_merges_and_clears() {
        let now = Utc::now();
        let mut task = Task::new(NewTask::named("Test"), now);
        task.description = Some("old".to_string());

        let patch = TaskPatch {
            name: Some("Renamed".to_string()),
            description: Some(None),
            deadline: Some(Some(now)),
            ..Default::default()
        };
        patch.apply(&mut task);

        assert_eq!(task.name, "Renamed");
        assert!(task.description.is_none());
        assert_eq!(task.deadline, Some(now));
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn overdue_requires_pending_status() {
        let now = Utc::now();
        let mut task = Task::new(NewTask::named("Test"), now);
        task.deadline = Some(now - chrono::Duration::hours(1));
        assert!(task.is_overdue(now));

        task.status = TaskStatus::Completed;
        assert!(!task.is_overdue(now));
    }
}
