//! # OneTask Core Library
//!
//! This library provides the core business logic for OneTask: pick one task
//! from a personal backlog once per day, and walk the user through a small
//! reconciliation ritual whenever the day rolls over. It implements a
//! CLI-first philosophy where all operations are available via a standalone
//! CLI binary, with any GUI being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Prioritization Engine**: pure scoring and selection over the eligible
//!   task set, biased by the day's time-availability band
//! - **Daily State Machine**: [`DailyFlow`], the orchestrator sequencing
//!   previous-day reconciliation, the availability prompt, assignment, and
//!   completion/postponement
//! - **Storage**: SQLite-backed [`TaskDb`] behind the [`Repository`] trait
//! - **Export/Import**: versioned JSON document of the full backlog
//! - **Reminder**: pure due-time computation plus a tokio-based daily timer

pub mod daily;
pub mod eligibility;
pub mod error;
pub mod export;
pub mod prioritization;
pub mod reminder;
pub mod repo;
pub mod state;
pub mod storage;
pub mod task;

pub use daily::{DailyFlow, DailyState, EmptyReason};
pub use error::{CoreError, Result, StoreError, ValidationError};
pub use export::{export_data, import_data, parse_import, ExportDocument, EXPORT_VERSION};
pub use repo::Repository;
pub use state::{AppState, AppStatePatch, Theme, TimeAvailability};
pub use storage::TaskDb;
pub use task::{DurationBucket, Importance, NewTask, Task, TaskPatch, TaskStatus};
