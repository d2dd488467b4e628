//! Repository contract consumed by the daily state machine.
//!
//! The persistence collaborator implements this trait; the core only relies
//! on per-record atomic updates (a failed write leaves the stored record
//! unchanged). [`crate::storage::TaskDb`] is the SQLite implementation.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::state::{AppState, AppStatePatch};
use crate::task::{NewTask, Task, TaskPatch};

/// Durable store of `Task` records and the singleton `AppState`.
pub trait Repository {
    /// Persist a new task: fresh id, `created_at = now`, Pending status, and
    /// `order` one past the current maximum (0 when the store is empty).
    fn create_task(&mut self, input: NewTask, now: DateTime<Utc>) -> Result<Task>;

    /// Fetch one task by id.
    fn get_task(&self, id: &str) -> Result<Option<Task>>;

    /// All tasks, in unspecified order.
    fn list_tasks(&self) -> Result<Vec<Task>>;

    /// Partial update. Fails with `NotFound` when the id is absent.
    fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<()>;

    /// Remove a task. Fails with `NotFound` when the id is absent.
    fn delete_task(&mut self, id: &str) -> Result<()>;

    /// The singleton app state; defaulted when nothing is persisted yet.
    fn get_app_state(&self) -> Result<AppState>;

    /// Partial update of the singleton app state.
    fn update_app_state(&mut self, patch: &AppStatePatch) -> Result<()>;

    /// Replace all tasks and upsert the app state in one shot. Used by
    /// import, which is a full overwrite by contract.
    fn import(&mut self, tasks: &[Task], app_state: &AppState) -> Result<()>;

    /// Clear all tasks and restore the default app state.
    fn reset_all(&mut self) -> Result<()>;
}
