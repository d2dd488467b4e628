//! Day-boundary state machine.
//!
//! `DailyFlow` sequences the daily ritual: previous-day reconciliation,
//! the time-availability prompt, task assignment, and completion or
//! postponement. It owns its repository handle and is the only place that
//! mutates ritual state; there are no ambient globals.
//!
//! State precedence on every (re)evaluation:
//!
//!   PreviousDayCheck ──> TimeAvailabilityCheck ──> TaskAssigned ──> Empty
//!
//! All operations take `now` explicitly so the day boundary is a pure
//! function of the clock, and run to completion before the next is accepted
//! (one logical actor, at most one in-flight transition). Repository
//! failures propagate uncaught and leave the machine in its pre-operation
//! state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::eligibility::eligible_tasks;
use crate::error::{CoreError, Result, ValidationError};
use crate::prioritization::select_daily_task;
use crate::repo::Repository;
use crate::state::{AppStatePatch, TimeAvailability};
use crate::task::{NewTask, Task, TaskPatch, TaskStatus};

/// Why the machine is in the Empty state.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EmptyReason {
    /// A task was already completed today; no re-assignment until tomorrow
    CompletedToday,
    /// No eligible task exists and none is assigned
    NoTasks,
}

/// UI-facing state of the daily ritual. Mutually exclusive; one active at a
/// time.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DailyState {
    /// Initial; no repository read performed yet
    Loading,
    /// Yesterday's assigned task is still outstanding
    PreviousDayCheck { task: Task },
    /// Today's availability band has not been recorded yet
    TimeAvailabilityCheck,
    /// A daily task is selected and awaiting completion or postponement
    TaskAssigned { task: Task },
    /// Nothing to do
    Empty { reason: EmptyReason },
}

impl DailyState {
    /// Short state name for error messages and display.
    pub fn name(&self) -> &'static str {
        match self {
            DailyState::Loading => "loading",
            DailyState::PreviousDayCheck { .. } => "previousDayCheck",
            DailyState::TimeAvailabilityCheck => "timeAvailabilityCheck",
            DailyState::TaskAssigned { .. } => "taskAssigned",
            DailyState::Empty { .. } => "empty",
        }
    }
}

/// Orchestrator for the daily ritual.
pub struct DailyFlow<R: Repository> {
    repo: R,
    state: DailyState,
}

impl<R: Repository> DailyFlow<R> {
    pub fn new(repo: R) -> Self {
        DailyFlow {
            repo,
            state: DailyState::Loading,
        }
    }

    /// Current UI-facing state.
    pub fn state(&self) -> &DailyState {
        &self.state
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    /// Number of currently assignable tasks, as shown in pending counts.
    pub fn eligible_count(&self, now: DateTime<Utc>) -> Result<usize> {
        let tasks = self.repo.list_tasks()?;
        Ok(eligible_tasks(&tasks, now).len())
    }

    /// Evaluate the initial transition. Runs on every app start, explicit
    /// refresh, and day rollover; the machine has no terminal state.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> Result<&DailyState> {
        let app = self.repo.get_app_state()?;
        let today = now.date_naive();
        let yesterday = today - chrono::Duration::days(1);
        let has_completed_today = app.last_completion_date == Some(today);

        if !has_completed_today {
            // Yesterday's assignment still outstanding?
            if let Some(id) = &app.daily_task_id {
                if app.last_daily_check_date == Some(yesterday) {
                    if let Some(task) = self.repo.get_task(id)? {
                        if task.status == TaskStatus::Pending {
                            self.state = DailyState::PreviousDayCheck { task };
                            return Ok(&self.state);
                        }
                    }
                }
            }

            if app.last_daily_check_date != Some(today) {
                self.state = DailyState::TimeAvailabilityCheck;
                return Ok(&self.state);
            }

            if let Some(id) = &app.daily_task_id {
                if let Some(task) = self.repo.get_task(id)? {
                    self.state = DailyState::TaskAssigned { task };
                    return Ok(&self.state);
                }
            }
        }

        self.state = DailyState::Empty {
            reason: if has_completed_today {
                EmptyReason::CompletedToday
            } else {
                EmptyReason::NoTasks
            },
        };
        Ok(&self.state)
    }

    /// The user confirms yesterday's task was done. Records the completion
    /// against yesterday (when the work actually happened) and proceeds to
    /// today's availability prompt.
    pub fn previous_day_completed(&mut self, now: DateTime<Utc>) -> Result<&DailyState> {
        let task = match &self.state {
            DailyState::PreviousDayCheck { task } => task.clone(),
            other => {
                return Err(CoreError::InvalidTransition {
                    state: other.name(),
                    action: "confirm yesterday's task",
                })
            }
        };

        self.repo.update_task(
            &task.id,
            &TaskPatch {
                status: Some(TaskStatus::Completed),
                completed_at: Some(Some(now)),
                ..Default::default()
            },
        )?;

        let yesterday = now.date_naive() - chrono::Duration::days(1);
        self.repo.update_app_state(&AppStatePatch {
            last_completion_date: Some(Some(yesterday)),
            daily_task_id: Some(None),
            ..Default::default()
        })?;

        self.state = DailyState::TimeAvailabilityCheck;
        Ok(&self.state)
    }

    /// The user declines yesterday's task. Nothing is cleared; the stale
    /// task remains Pending and re-enters scoring on the next selection.
    pub fn previous_day_not_completed(&mut self) -> Result<&DailyState> {
        match &self.state {
            DailyState::PreviousDayCheck { .. } => {
                self.state = DailyState::TimeAvailabilityCheck;
                Ok(&self.state)
            }
            other => Err(CoreError::InvalidTransition {
                state: other.name(),
                action: "dismiss yesterday's task",
            }),
        }
    }

    /// Record today's availability band and run selection.
    pub fn submit_availability(
        &mut self,
        availability: TimeAvailability,
        now: DateTime<Utc>,
    ) -> Result<&DailyState> {
        if !matches!(self.state, DailyState::TimeAvailabilityCheck) {
            return Err(CoreError::InvalidTransition {
                state: self.state.name(),
                action: "submit time availability",
            });
        }

        let tasks = self.repo.list_tasks()?;
        let eligible = eligible_tasks(&tasks, now);
        let selected = select_daily_task(&eligible, availability, now);

        self.repo.update_app_state(&AppStatePatch {
            last_daily_check_date: Some(Some(now.date_naive())),
            today_time_availability: Some(Some(availability)),
            daily_task_id: Some(selected.as_ref().map(|t| t.id.clone())),
            ..Default::default()
        })?;

        self.state = match selected {
            Some(task) => DailyState::TaskAssigned { task },
            None => DailyState::Empty {
                reason: EmptyReason::NoTasks,
            },
        };
        Ok(&self.state)
    }

    /// Mark the assigned task complete; the day is done.
    pub fn complete_current(&mut self, now: DateTime<Utc>) -> Result<&DailyState> {
        let task = match &self.state {
            DailyState::TaskAssigned { task } => task.clone(),
            other => {
                return Err(CoreError::InvalidTransition {
                    state: other.name(),
                    action: "complete the daily task",
                })
            }
        };

        self.repo.update_task(
            &task.id,
            &TaskPatch {
                status: Some(TaskStatus::Completed),
                completed_at: Some(Some(now)),
                ..Default::default()
            },
        )?;
        self.repo.update_app_state(&AppStatePatch {
            last_completion_date: Some(Some(now.date_naive())),
            daily_task_id: Some(None),
            ..Default::default()
        })?;

        self.state = DailyState::Empty {
            reason: EmptyReason::CompletedToday,
        };
        Ok(&self.state)
    }

    /// Put the assigned task into cooldown for `days` days and immediately
    /// re-select using the availability recorded for today.
    pub fn postpone_current(
        &mut self,
        days: i64,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<&DailyState> {
        if days < 1 {
            return Err(ValidationError::InvalidValue {
                field: "days".to_string(),
                message: format!("must be at least 1, got {days}"),
            }
            .into());
        }
        let task = match &self.state {
            DailyState::TaskAssigned { task } => task.clone(),
            other => {
                return Err(CoreError::InvalidTransition {
                    state: other.name(),
                    action: "postpone the daily task",
                })
            }
        };

        self.repo.update_task(
            &task.id,
            &TaskPatch {
                status: Some(TaskStatus::Postponed),
                postponed_until: Some(Some(now + chrono::Duration::days(days))),
                postpone_reason: Some(reason),
                ..Default::default()
            },
        )?;
        self.repo.update_app_state(&AppStatePatch {
            daily_task_id: Some(None),
            ..Default::default()
        })?;

        let availability = self
            .repo
            .get_app_state()?
            .today_time_availability
            .unwrap_or(TimeAvailability::Normal);
        let tasks = self.repo.list_tasks()?;
        let eligible = eligible_tasks(&tasks, now);

        self.state = match select_daily_task(&eligible, availability, now) {
            Some(next) => {
                self.repo.update_app_state(&AppStatePatch {
                    daily_task_id: Some(Some(next.id.clone())),
                    ..Default::default()
                })?;
                DailyState::TaskAssigned { task: next }
            }
            None => DailyState::Empty {
                reason: EmptyReason::NoTasks,
            },
        };
        Ok(&self.state)
    }

    /// Create a task. A freshly added task can immediately become today's
    /// task when nothing is assigned yet.
    pub fn create_task(&mut self, input: NewTask, now: DateTime<Utc>) -> Result<Task> {
        if input.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let task = self.repo.create_task(input, now)?;
        self.reselect_if_unassigned(now)?;
        Ok(task)
    }

    /// Partially update a task, keeping the displayed assignment consistent.
    pub fn update_task(&mut self, id: &str, patch: &TaskPatch, now: DateTime<Utc>) -> Result<Task> {
        self.repo.update_task(id, patch)?;

        if let DailyState::TaskAssigned { task } = &self.state {
            if task.id == id {
                if let Some(fresh) = self.repo.get_task(id)? {
                    self.state = DailyState::TaskAssigned { task: fresh };
                }
            }
        }
        self.reselect_if_unassigned(now)?;

        self.repo
            .get_task(id)?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    /// Delete a task. Clears the assignment when the daily task was deleted,
    /// then re-selects if today's availability is already recorded.
    pub fn delete_task(&mut self, id: &str, now: DateTime<Utc>) -> Result<()> {
        self.repo.delete_task(id)?;

        let app = self.repo.get_app_state()?;
        if app.daily_task_id.as_deref() == Some(id) {
            self.repo.update_app_state(&AppStatePatch {
                daily_task_id: Some(None),
                ..Default::default()
            })?;
        }
        if matches!(&self.state, DailyState::TaskAssigned { task } if task.id == id) {
            self.state = DailyState::Empty {
                reason: EmptyReason::NoTasks,
            };
        }

        self.reselect_if_unassigned(now)?;
        Ok(())
    }

    /// Move a task up among Pending tasks ordered by `order`. No-op at the
    /// top boundary.
    pub fn move_up(&mut self, id: &str) -> Result<()> {
        let tasks = self.pending_sorted()?;
        match tasks.iter().position(|t| t.id == id) {
            Some(0) | None => self.reorder_noop(id, tasks.iter().any(|t| t.id == id)),
            Some(idx) => self.swap_order(&tasks[idx], &tasks[idx - 1]),
        }
    }

    /// Move a task down among Pending tasks ordered by `order`. No-op at the
    /// bottom boundary.
    pub fn move_down(&mut self, id: &str) -> Result<()> {
        let tasks = self.pending_sorted()?;
        match tasks.iter().position(|t| t.id == id) {
            Some(idx) if idx + 1 < tasks.len() => self.swap_order(&tasks[idx], &tasks[idx + 1]),
            Some(_) => Ok(()),
            None => self.reorder_noop(id, false),
        }
    }

    /// Backlog mutations re-run selection only when today's availability is
    /// recorded, nothing is assigned, and the day is not already completed.
    fn reselect_if_unassigned(&mut self, now: DateTime<Utc>) -> Result<()> {
        let app = self.repo.get_app_state()?;
        let today = now.date_naive();

        if app.last_completion_date == Some(today)
            || app.daily_task_id.is_some()
            || app.last_daily_check_date != Some(today)
        {
            return Ok(());
        }
        let Some(availability) = app.today_time_availability else {
            return Ok(());
        };

        let tasks = self.repo.list_tasks()?;
        let eligible = eligible_tasks(&tasks, now);
        if let Some(task) = select_daily_task(&eligible, availability, now) {
            self.repo.update_app_state(&AppStatePatch {
                daily_task_id: Some(Some(task.id.clone())),
                ..Default::default()
            })?;
            self.state = DailyState::TaskAssigned { task };
        }
        Ok(())
    }

    fn pending_sorted(&self) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .repo
            .list_tasks()?
            .into_iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .collect();
        tasks.sort_by_key(|t| t.order);
        Ok(tasks)
    }

    fn swap_order(&mut self, a: &Task, b: &Task) -> Result<()> {
        self.repo.update_task(
            &a.id,
            &TaskPatch {
                order: Some(b.order),
                ..Default::default()
            },
        )?;
        self.repo.update_task(
            &b.id,
            &TaskPatch {
                order: Some(a.order),
                ..Default::default()
            },
        )
    }

    fn reorder_noop(&self, id: &str, found_in_pending: bool) -> Result<()> {
        if found_in_pending || self.repo.get_task(id)?.is_some() {
            Ok(())
        } else {
            Err(CoreError::NotFound(id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Theme;
    use crate::storage::TaskDb;
    use crate::task::{DurationBucket, Importance};
    use chrono::TimeZone;

    fn flow() -> DailyFlow<TaskDb> {
        DailyFlow::new(TaskDb::open_memory().unwrap())
    }

    fn day(offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap() + chrono::Duration::days(offset)
    }

    fn new_task(name: &str, importance: Importance, duration: DurationBucket) -> NewTask {
        NewTask {
            name: name.to_string(),
            description: None,
            importance,
            estimated_duration: duration,
            deadline: None,
        }
    }

    #[test]
    fn first_run_enters_time_availability_check() {
        let mut flow = flow();
        assert!(matches!(flow.state(), DailyState::Loading));
        flow.refresh(day(0)).unwrap();
        assert!(matches!(flow.state(), DailyState::TimeAvailabilityCheck));
    }

    #[test]
    fn submit_availability_assigns_best_task() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        let low = flow
            .create_task(new_task("low", Importance::Low, DurationBucket::OneHour), day(0))
            .unwrap();
        let high = flow
            .create_task(new_task("high", Importance::Critical, DurationBucket::OneHour), day(0))
            .unwrap();

        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();
        match flow.state() {
            DailyState::TaskAssigned { task } => assert_eq!(task.id, high.id),
            other => panic!("unexpected state: {other:?}"),
        }

        let app = flow.repo().get_app_state().unwrap();
        assert_eq!(app.daily_task_id, Some(high.id));
        assert_eq!(app.last_daily_check_date, Some(day(0).date_naive()));
        assert_eq!(app.today_time_availability, Some(TimeAvailability::Normal));
        let _ = low;
    }

    #[test]
    fn submit_availability_with_empty_backlog() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        flow.submit_availability(TimeAvailability::Limited, day(0)).unwrap();
        assert_eq!(
            flow.state(),
            &DailyState::Empty {
                reason: EmptyReason::NoTasks
            }
        );

        // Re-evaluating the same day does not re-prompt for availability.
        flow.refresh(day(0)).unwrap();
        assert_eq!(
            flow.state(),
            &DailyState::Empty {
                reason: EmptyReason::NoTasks
            }
        );
    }

    #[test]
    fn outstanding_task_enters_previous_day_check_next_morning() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        let task = flow
            .create_task(new_task("big one", Importance::High, DurationBucket::TwoHours), day(0))
            .unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();

        // Next day, nothing completed nor declined: reconcile first.
        flow.refresh(day(1)).unwrap();
        match flow.state() {
            DailyState::PreviousDayCheck { task: stale } => assert_eq!(stale.id, task.id),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn previous_day_completed_records_yesterday() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        let task = flow
            .create_task(new_task("t", Importance::High, DurationBucket::OneHour), day(0))
            .unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();

        flow.refresh(day(1)).unwrap();
        flow.previous_day_completed(day(1)).unwrap();
        assert!(matches!(flow.state(), DailyState::TimeAvailabilityCheck));

        let stored = flow.repo().get_task(&task.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
        assert!(stored.completed_at.is_some());

        let app = flow.repo().get_app_state().unwrap();
        assert_eq!(app.last_completion_date, Some(day(0).date_naive()));
        assert!(app.daily_task_id.is_none());

        // The completion belongs to yesterday, so today still prompts.
        flow.refresh(day(1)).unwrap();
        assert!(matches!(flow.state(), DailyState::TimeAvailabilityCheck));
    }

    #[test]
    fn previous_day_not_completed_leaves_task_untouched() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        let task = flow
            .create_task(new_task("t", Importance::High, DurationBucket::OneHour), day(0))
            .unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();

        flow.refresh(day(1)).unwrap();
        flow.previous_day_not_completed().unwrap();
        assert!(matches!(flow.state(), DailyState::TimeAvailabilityCheck));

        let stored = flow.repo().get_task(&task.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Pending);

        // The stale task re-enters scoring on the next selection.
        flow.submit_availability(TimeAvailability::Normal, day(1)).unwrap();
        match flow.state() {
            DailyState::TaskAssigned { task: assigned } => assert_eq!(assigned.id, task.id),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn completing_today_never_reassigns_same_day() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        flow.create_task(new_task("a", Importance::High, DurationBucket::OneHour), day(0))
            .unwrap();
        flow.create_task(new_task("b", Importance::Low, DurationBucket::OneHour), day(0))
            .unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();

        flow.complete_current(day(0)).unwrap();
        assert_eq!(
            flow.state(),
            &DailyState::Empty {
                reason: EmptyReason::CompletedToday
            }
        );

        // Re-evaluation and backlog growth stay quiet for the rest of the day.
        flow.refresh(day(0)).unwrap();
        assert_eq!(
            flow.state(),
            &DailyState::Empty {
                reason: EmptyReason::CompletedToday
            }
        );
        flow.create_task(new_task("c", Importance::Critical, DurationBucket::OneHour), day(0))
            .unwrap();
        assert_eq!(
            flow.state(),
            &DailyState::Empty {
                reason: EmptyReason::CompletedToday
            }
        );

        // Tomorrow the ritual restarts.
        flow.refresh(day(1)).unwrap();
        assert!(matches!(flow.state(), DailyState::TimeAvailabilityCheck));
    }

    #[test]
    fn postpone_sets_cooldown_and_reselects() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        let first = flow
            .create_task(new_task("first", Importance::Critical, DurationBucket::OneHour), day(0))
            .unwrap();
        let second = flow
            .create_task(new_task("second", Importance::Low, DurationBucket::OneHour), day(0))
            .unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();

        flow.postpone_current(3, Some("not today".to_string()), day(0)).unwrap();
        match flow.state() {
            DailyState::TaskAssigned { task } => assert_eq!(task.id, second.id),
            other => panic!("unexpected state: {other:?}"),
        }

        let stored = flow.repo().get_task(&first.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Postponed);
        assert_eq!(stored.postpone_reason.as_deref(), Some("not today"));
        assert_eq!(stored.postponed_until, Some(day(0) + chrono::Duration::days(3)));

        // Postponing the only remaining task empties the day.
        flow.postpone_current(1, None, day(0)).unwrap();
        assert_eq!(
            flow.state(),
            &DailyState::Empty {
                reason: EmptyReason::NoTasks
            }
        );
    }

    #[test]
    fn postponed_task_returns_after_cooldown() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        let task = flow
            .create_task(new_task("t", Importance::High, DurationBucket::OneHour), day(0))
            .unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();
        flow.postpone_current(3, None, day(0)).unwrap();

        // Day 2: still cooling down.
        flow.refresh(day(2)).unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(2)).unwrap();
        assert_eq!(
            flow.state(),
            &DailyState::Empty {
                reason: EmptyReason::NoTasks
            }
        );

        // Day 3: cooldown expired; selectable again while still Postponed.
        flow.refresh(day(3)).unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(3)).unwrap();
        match flow.state() {
            DailyState::TaskAssigned { task: assigned } => {
                assert_eq!(assigned.id, task.id);
                assert_eq!(assigned.status, TaskStatus::Postponed);
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn postpone_rejects_non_positive_days() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        flow.create_task(new_task("t", Importance::High, DurationBucket::OneHour), day(0))
            .unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();

        let err = flow.postpone_current(0, None, day(0)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(matches!(flow.state(), DailyState::TaskAssigned { .. }));
    }

    #[test]
    fn fresh_task_becomes_daily_task_when_none_assigned() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();
        assert_eq!(
            flow.state(),
            &DailyState::Empty {
                reason: EmptyReason::NoTasks
            }
        );

        let task = flow
            .create_task(new_task("fresh", Importance::Medium, DurationBucket::OneHour), day(0))
            .unwrap();
        match flow.state() {
            DailyState::TaskAssigned { task: assigned } => assert_eq!(assigned.id, task.id),
            other => panic!("unexpected state: {other:?}"),
        }
        assert_eq!(
            flow.repo().get_app_state().unwrap().daily_task_id,
            Some(task.id)
        );
    }

    #[test]
    fn fresh_task_does_not_override_assignment() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        let original = flow
            .create_task(new_task("original", Importance::Low, DurationBucket::OneHour), day(0))
            .unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();

        flow.create_task(new_task("shiny", Importance::Critical, DurationBucket::OneHour), day(0))
            .unwrap();
        match flow.state() {
            DailyState::TaskAssigned { task } => assert_eq!(task.id, original.id),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn no_reselection_before_todays_check() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        flow.create_task(new_task("t", Importance::High, DurationBucket::OneHour), day(0))
            .unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();
        flow.complete_current(day(0)).unwrap();

        // Next day, before the availability prompt: creating a task must not
        // assign anything (yesterday's availability is stale).
        flow.refresh(day(1)).unwrap();
        flow.create_task(new_task("early bird", Importance::High, DurationBucket::OneHour), day(1))
            .unwrap();
        assert!(matches!(flow.state(), DailyState::TimeAvailabilityCheck));
        assert!(flow.repo().get_app_state().unwrap().daily_task_id.is_none());
    }

    #[test]
    fn deleting_assigned_task_reselects() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        let first = flow
            .create_task(new_task("first", Importance::Critical, DurationBucket::OneHour), day(0))
            .unwrap();
        let second = flow
            .create_task(new_task("second", Importance::Low, DurationBucket::OneHour), day(0))
            .unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();

        flow.delete_task(&first.id, day(0)).unwrap();
        match flow.state() {
            DailyState::TaskAssigned { task } => assert_eq!(task.id, second.id),
            other => panic!("unexpected state: {other:?}"),
        }

        flow.delete_task(&second.id, day(0)).unwrap();
        assert_eq!(
            flow.state(),
            &DailyState::Empty {
                reason: EmptyReason::NoTasks
            }
        );
        assert!(flow.repo().get_app_state().unwrap().daily_task_id.is_none());
    }

    #[test]
    fn updating_assigned_task_refreshes_display() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        let task = flow
            .create_task(new_task("draft", Importance::High, DurationBucket::OneHour), day(0))
            .unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();

        let patch = TaskPatch {
            name: Some("final".to_string()),
            ..Default::default()
        };
        flow.update_task(&task.id, &patch, day(0)).unwrap();
        match flow.state() {
            DailyState::TaskAssigned { task } => assert_eq!(task.name, "final"),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn create_rejects_empty_name() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        let err = flow
            .create_task(new_task("   ", Importance::Medium, DurationBucket::OneHour), day(0))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::EmptyName)));
    }

    #[test]
    fn transitions_fail_outside_their_state() {
        let mut flow = flow();
        let err = flow
            .submit_availability(TimeAvailability::Normal, day(0))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { state: "loading", .. }));

        flow.refresh(day(0)).unwrap();
        let err = flow.complete_current(day(0)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                state: "timeAvailabilityCheck",
                ..
            }
        ));
        let err = flow.previous_day_completed(day(0)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn manual_reorder_swaps_neighbors() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        let a = flow
            .create_task(new_task("a", Importance::Medium, DurationBucket::OneHour), day(0))
            .unwrap();
        let b = flow
            .create_task(new_task("b", Importance::Medium, DurationBucket::OneHour), day(0))
            .unwrap();
        let c = flow
            .create_task(new_task("c", Importance::Medium, DurationBucket::OneHour), day(0))
            .unwrap();
        assert_eq!((a.order, b.order, c.order), (0, 1, 2));

        flow.move_up(&b.id).unwrap();
        let order_of = |flow: &DailyFlow<TaskDb>, id: &str| {
            flow.repo().get_task(id).unwrap().unwrap().order
        };
        assert_eq!(order_of(&flow, &b.id), 0);
        assert_eq!(order_of(&flow, &a.id), 1);

        // Boundary no-ops.
        flow.move_up(&b.id).unwrap();
        assert_eq!(order_of(&flow, &b.id), 0);
        flow.move_down(&c.id).unwrap();
        assert_eq!(order_of(&flow, &c.id), 2);

        flow.move_down(&b.id).unwrap();
        assert_eq!(order_of(&flow, &b.id), 1);
        assert_eq!(order_of(&flow, &a.id), 0);

        let err = flow.move_up("missing").unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn eligible_count_uses_the_selection_gate() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        flow.create_task(new_task("a", Importance::Medium, DurationBucket::OneHour), day(0))
            .unwrap();
        flow.create_task(new_task("b", Importance::Medium, DurationBucket::OneHour), day(0))
            .unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();
        assert_eq!(flow.eligible_count(day(0)).unwrap(), 2);

        flow.postpone_current(2, None, day(0)).unwrap();
        assert_eq!(flow.eligible_count(day(0)).unwrap(), 1);
    }

    #[test]
    fn settings_pass_through_untouched_by_ritual() {
        let mut flow = flow();
        flow.refresh(day(0)).unwrap();
        flow.repo_mut()
            .update_app_state(&AppStatePatch {
                notification_time: Some("06:30".to_string()),
                theme: Some(Theme::Dark),
                has_completed_onboarding: Some(true),
                ..Default::default()
            })
            .unwrap();

        flow.create_task(new_task("t", Importance::Medium, DurationBucket::OneHour), day(0))
            .unwrap();
        flow.submit_availability(TimeAvailability::Normal, day(0)).unwrap();
        flow.complete_current(day(0)).unwrap();

        let app = flow.repo().get_app_state().unwrap();
        assert_eq!(app.notification_time, "06:30");
        assert_eq!(app.theme, Theme::Dark);
        assert!(app.has_completed_onboarding);
    }
}
