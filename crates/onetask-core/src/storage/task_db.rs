//! SQLite-based storage for tasks and the app-state singleton.
//!
//! Records are stored row-per-task plus a single app_state row. Every
//! update is read-merge-write inside one transaction, so a failed write
//! leaves the stored record unchanged (the atomicity the state machine
//! relies on).

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::data_dir;
use crate::error::{CoreError, Result, StoreError};
use crate::repo::Repository;
use crate::state::{AppState, AppStatePatch, Theme, TimeAvailability, APP_STATE_ID};
use crate::task::{DurationBucket, Importance, NewTask, Task, TaskPatch, TaskStatus};

// === Helper functions ===

/// Parse task status from database string
fn parse_status(status_str: &str) -> TaskStatus {
    match status_str {
        "completed" => TaskStatus::Completed,
        "postponed" => TaskStatus::Postponed,
        _ => TaskStatus::Pending,
    }
}

/// Format task status for database storage
fn format_status(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Completed => "completed",
        TaskStatus::Postponed => "postponed",
    }
}

/// Parse theme from database string
fn parse_theme(theme_str: &str) -> Theme {
    match theme_str {
        "dark" => Theme::Dark,
        _ => Theme::Light,
    }
}

/// Format theme for database storage
fn format_theme(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
    }
}

/// Parse importance level with fallback to Medium
fn parse_importance(level: u8) -> Importance {
    Importance::try_from(level).unwrap_or(Importance::Medium)
}

/// Parse duration bucket with fallback to one hour
fn parse_duration(minutes: u32) -> DurationBucket {
    DurationBucket::try_from(minutes).unwrap_or(DurationBucket::OneHour)
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_opt_datetime(dt_str: Option<String>) -> Option<DateTime<Utc>> {
    dt_str.map(|s| parse_datetime_fallback(&s))
}

fn parse_opt_date(date_str: Option<String>) -> Option<NaiveDate> {
    date_str.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

/// Build a Task from a database row
fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
    let importance: u8 = row.get(3)?;
    let estimated_minutes: u32 = row.get(4)?;
    let status_str: String = row.get(10)?;
    let created_at_str: String = row.get(6)?;

    Ok(Task {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        importance: parse_importance(importance),
        estimated_duration: parse_duration(estimated_minutes),
        deadline: parse_opt_datetime(row.get(5)?),
        created_at: parse_datetime_fallback(&created_at_str),
        completed_at: parse_opt_datetime(row.get(7)?),
        postponed_until: parse_opt_datetime(row.get(8)?),
        postpone_reason: row.get(9)?,
        status: parse_status(&status_str),
        order: row.get(11)?,
    })
}

const TASK_COLUMNS: &str = "id, name, description, importance, estimated_minutes, deadline, \
     created_at, completed_at, postponed_until, postpone_reason, status, task_order";

fn read_task(conn: &Connection, id: &str) -> Result<Option<Task>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        row_to_task,
    )
    .optional()
}

fn write_task(conn: &Connection, task: &Task) -> Result<usize, rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO tasks
             (id, name, description, importance, estimated_minutes, deadline,
              created_at, completed_at, postponed_until, postpone_reason, status, task_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            task.id,
            task.name,
            task.description,
            task.importance.level(),
            task.estimated_duration.minutes(),
            task.deadline.map(|d| d.to_rfc3339()),
            task.created_at.to_rfc3339(),
            task.completed_at.map(|d| d.to_rfc3339()),
            task.postponed_until.map(|d| d.to_rfc3339()),
            task.postpone_reason,
            format_status(task.status),
            task.order,
        ],
    )
}

fn read_app_state(conn: &Connection) -> Result<Option<AppState>, rusqlite::Error> {
    conn.query_row(
        "SELECT id, last_daily_check_date, last_completion_date, daily_task_id,
                today_time_availability, notification_time, notifications_enabled,
                theme, has_completed_onboarding
         FROM app_state WHERE id = ?1",
        params![APP_STATE_ID],
        |row| {
            let availability: Option<String> = row.get(4)?;
            let theme: String = row.get(7)?;
            Ok(AppState {
                id: row.get(0)?,
                last_daily_check_date: parse_opt_date(row.get(1)?),
                last_completion_date: parse_opt_date(row.get(2)?),
                daily_task_id: row.get(3)?,
                today_time_availability: availability
                    .as_deref()
                    .and_then(TimeAvailability::parse),
                notification_time: row.get(5)?,
                notifications_enabled: row.get(6)?,
                theme: parse_theme(&theme),
                has_completed_onboarding: row.get(8)?,
            })
        },
    )
    .optional()
}

fn write_app_state(conn: &Connection, state: &AppState) -> Result<usize, rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_state
             (id, last_daily_check_date, last_completion_date, daily_task_id,
              today_time_availability, notification_time, notifications_enabled,
              theme, has_completed_onboarding)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            state.id,
            state.last_daily_check_date.map(|d| d.to_string()),
            state.last_completion_date.map(|d| d.to_string()),
            state.daily_task_id,
            state.today_time_availability.map(|a| a.to_string()),
            state.notification_time,
            state.notifications_enabled,
            format_theme(state.theme),
            state.has_completed_onboarding,
        ],
    )
}

/// SQLite database for the task backlog and app state.
pub struct TaskDb {
    conn: Connection,
}

impl TaskDb {
    /// Open the database at `~/.config/onetask/onetask.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("onetask.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id                TEXT PRIMARY KEY,
                name              TEXT NOT NULL,
                description       TEXT,
                importance        INTEGER NOT NULL DEFAULT 3,
                estimated_minutes INTEGER NOT NULL DEFAULT 60,
                deadline          TEXT,
                created_at        TEXT NOT NULL,
                completed_at      TEXT,
                postponed_until   TEXT,
                postpone_reason   TEXT,
                status            TEXT NOT NULL DEFAULT 'pending',
                task_order        INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS app_state (
                id                        TEXT PRIMARY KEY,
                last_daily_check_date     TEXT,
                last_completion_date      TEXT,
                daily_task_id             TEXT,
                today_time_availability   TEXT,
                notification_time         TEXT NOT NULL DEFAULT '07:00',
                notifications_enabled     INTEGER NOT NULL DEFAULT 1,
                theme                     TEXT NOT NULL DEFAULT 'light',
                has_completed_onboarding  INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
            CREATE INDEX IF NOT EXISTS idx_tasks_order ON tasks(task_order);",
        )?;
        Ok(())
    }
}

impl Repository for TaskDb {
    fn create_task(&mut self, input: NewTask, now: DateTime<Utc>) -> Result<Task> {
        let tx = self.conn.transaction().map_err(StoreError::from)?;

        let max_order: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(task_order), -1) FROM tasks",
                [],
                |row| row.get(0),
            )
            .map_err(StoreError::from)?;

        let mut task = Task::new(input, now);
        task.order = max_order + 1;

        write_task(&tx, &task).map_err(StoreError::from)?;
        tx.commit().map_err(StoreError::from)?;
        Ok(task)
    }

    fn get_task(&self, id: &str) -> Result<Option<Task>> {
        Ok(read_task(&self.conn, id).map_err(StoreError::from)?)
    }

    fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks"))
            .map_err(StoreError::from)?;
        let rows = stmt
            .query_map([], row_to_task)
            .map_err(StoreError::from)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row.map_err(StoreError::from)?);
        }
        Ok(tasks)
    }

    fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<()> {
        let tx = self.conn.transaction().map_err(StoreError::from)?;

        let mut task = read_task(&tx, id)
            .map_err(StoreError::from)?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        patch.apply(&mut task);

        write_task(&tx, &task).map_err(StoreError::from)?;
        tx.commit().map_err(StoreError::from)?;
        Ok(())
    }

    fn delete_task(&mut self, id: &str) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .map_err(StoreError::from)?;
        if affected == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn get_app_state(&self) -> Result<AppState> {
        Ok(read_app_state(&self.conn)
            .map_err(StoreError::from)?
            .unwrap_or_default())
    }

    fn update_app_state(&mut self, patch: &AppStatePatch) -> Result<()> {
        let tx = self.conn.transaction().map_err(StoreError::from)?;

        let mut state = read_app_state(&tx)
            .map_err(StoreError::from)?
            .unwrap_or_default();
        patch.apply(&mut state);

        write_app_state(&tx, &state).map_err(StoreError::from)?;
        tx.commit().map_err(StoreError::from)?;
        Ok(())
    }

    fn import(&mut self, tasks: &[Task], app_state: &AppState) -> Result<()> {
        let tx = self.conn.transaction().map_err(StoreError::from)?;

        tx.execute("DELETE FROM tasks", []).map_err(StoreError::from)?;
        for task in tasks {
            write_task(&tx, task).map_err(StoreError::from)?;
        }
        write_app_state(&tx, app_state).map_err(StoreError::from)?;

        tx.commit().map_err(StoreError::from)?;
        Ok(())
    }

    fn reset_all(&mut self) -> Result<()> {
        let tx = self.conn.transaction().map_err(StoreError::from)?;

        tx.execute("DELETE FROM tasks", []).map_err(StoreError::from)?;
        tx.execute("DELETE FROM app_state", []).map_err(StoreError::from)?;
        write_app_state(&tx, &AppState::default()).map_err(StoreError::from)?;

        tx.commit().map_err(StoreError::from)?;
        Ok(())
    }
}
