//! Application state singleton.
//!
//! One `AppState` record describes the current day's ritual progress plus
//! pass-through settings (notification time, theme, onboarding flag) that
//! the core stores but never interprets. It is created defaulted on first
//! read and mutated in place; only a full reset deletes it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Singleton key for the app state record.
pub const APP_STATE_ID: &str = "state";

/// Coarse time-availability band for the current day, used to bias task
/// selection toward shorter or longer tasks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeAvailability {
    /// Less time than usual; prefer tasks of at most one hour
    Limited,
    /// A regular day; no duration preference
    Normal,
    /// More time than usual; prefer tasks of two hours or more
    Extra,
}

impl TimeAvailability {
    /// Parse a band name as used on the CLI and the wire.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "limited" => Some(TimeAvailability::Limited),
            "normal" => Some(TimeAvailability::Normal),
            "extra" => Some(TimeAvailability::Extra),
            _ => None,
        }
    }
}

impl fmt::Display for TimeAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeAvailability::Limited => write!(f, "limited"),
            TimeAvailability::Normal => write!(f, "normal"),
            TimeAvailability::Extra => write!(f, "extra"),
        }
    }
}

/// UI theme, stored and passed through unchanged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Light
    }
}

/// Process-wide singleton describing the current day's ritual progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Fixed singleton key
    pub id: String,
    /// Date of the last time-availability check
    #[serde(default)]
    pub last_daily_check_date: Option<NaiveDate>,
    /// Date a task was last marked complete; suppresses re-assignment same day
    #[serde(default)]
    pub last_completion_date: Option<NaiveDate>,
    /// Id of the task currently assigned as today's task
    #[serde(default)]
    pub daily_task_id: Option<String>,
    /// Availability band chosen for the current cycle
    #[serde(default)]
    pub today_time_availability: Option<TimeAvailability>,
    /// Daily reminder time, "HH:mm"
    pub notification_time: String,
    pub notifications_enabled: bool,
    pub theme: Theme,
    pub has_completed_onboarding: bool,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            id: APP_STATE_ID.to_string(),
            last_daily_check_date: None,
            last_completion_date: None,
            daily_task_id: None,
            today_time_availability: None,
            notification_time: "07:00".to_string(),
            notifications_enabled: true,
            theme: Theme::default(),
            has_completed_onboarding: false,
        }
    }
}

/// Partial update for the app state. `None` leaves a field unchanged; for
/// clearable fields, `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct AppStatePatch {
    pub last_daily_check_date: Option<Option<NaiveDate>>,
    pub last_completion_date: Option<Option<NaiveDate>>,
    pub daily_task_id: Option<Option<String>>,
    pub today_time_availability: Option<Option<TimeAvailability>>,
    pub notification_time: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub theme: Option<Theme>,
    pub has_completed_onboarding: Option<bool>,
}

impl AppStatePatch {
    /// Merge this patch into `state`.
    pub fn apply(&self, state: &mut AppState) {
        if let Some(date) = self.last_daily_check_date {
            state.last_daily_check_date = date;
        }
        if let Some(date) = self.last_completion_date {
            state.last_completion_date = date;
        }
        if let Some(id) = &self.daily_task_id {
            state.daily_task_id = id.clone();
        }
        if let Some(availability) = self.today_time_availability {
            state.today_time_availability = availability;
        }
        if let Some(time) = &self.notification_time {
            state.notification_time = time.clone();
        }
        if let Some(enabled) = self.notifications_enabled {
            state.notifications_enabled = enabled;
        }
        if let Some(theme) = self.theme {
            state.theme = theme;
        }
        if let Some(done) = self.has_completed_onboarding {
            state.has_completed_onboarding = done;
        }
    }
}
