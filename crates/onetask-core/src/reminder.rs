//! Daily reminder scheduling.
//!
//! The core decides *that* a reminder is due as a pure function of the
//! clock and the app state; delivering it is the caller's concern. For
//! callers that want a live timer, [`spawn_daily`] runs a tokio task that
//! fires a callback once per day at the configured time, rescheduling for
//! the following day after each firing.

use chrono::{DateTime, NaiveTime, Utc};
use tokio::task::JoinHandle;

use crate::error::{Result, ValidationError};
use crate::state::AppState;

/// Parse a notification time in `HH:mm` form.
pub fn parse_notification_time(s: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| ValidationError::InvalidValue {
        field: "notification_time".to_string(),
        message: format!("expected HH:mm, got '{s}'"),
    })
}

/// The next instant at or after `now` when the daily reminder fires: today
/// at `time`, or tomorrow when that has already passed.
pub fn next_reminder_at(now: DateTime<Utc>, time: NaiveTime) -> DateTime<Utc> {
    let today_at = now.date_naive().and_time(time).and_utc();
    if today_at > now {
        today_at
    } else {
        today_at + chrono::Duration::days(1)
    }
}

/// Whether a reminder is currently due: notifications are enabled, the
/// configured time has passed, and the daily check has not been done today.
pub fn reminder_due(state: &AppState, now: DateTime<Utc>) -> Result<bool> {
    if !state.notifications_enabled {
        return Ok(false);
    }
    if state.last_daily_check_date == Some(now.date_naive()) {
        return Ok(false);
    }
    let time = parse_notification_time(&state.notification_time)?;
    Ok(now.time() >= time)
}

/// Spawn a tokio task that invokes `on_fire` once daily at `time`,
/// rescheduling for the following day after each firing. Abort the returned
/// handle to stop the schedule.
pub fn spawn_daily<F>(time: NaiveTime, mut on_fire: F) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_reminder_at(now, time);
            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
            on_fire();
        }
    })
}
