//! Export/import of the full backlog as a JSON document.
//!
//! Wire format (camelCase keys, ISO-8601 dates):
//!
//! ```json
//! { "tasks": [...], "appState": {...}, "exportedAt": "...", "version": 1 }
//! ```
//!
//! Imported payloads are untrusted: the shape is checked explicitly before
//! typed deserialization, and a missing `tasks` or `appState` key reports
//! `InvalidFormat` rather than failing deep in processing. Import replaces
//! all existing tasks and upserts the app state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::repo::Repository;
use crate::state::AppState;
use crate::task::Task;

/// Current export document version.
pub const EXPORT_VERSION: u32 = 1;

fn default_version() -> u32 {
    EXPORT_VERSION
}

/// The export/import wire document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub tasks: Vec<Task>,
    pub app_state: AppState,
    #[serde(default = "Utc::now")]
    pub exported_at: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: u32,
}

/// Serialize the full repository contents.
pub fn export_data<R: Repository>(repo: &R, now: DateTime<Utc>) -> Result<String> {
    let doc = ExportDocument {
        tasks: repo.list_tasks()?,
        app_state: repo.get_app_state()?,
        exported_at: now,
        version: EXPORT_VERSION,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Validate and parse an import payload.
pub fn parse_import(json: &str) -> Result<ExportDocument> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| CoreError::InvalidFormat(format!("not valid JSON: {e}")))?;

    let object = value
        .as_object()
        .ok_or_else(|| CoreError::InvalidFormat("expected a JSON object".to_string()))?;
    for key in ["tasks", "appState"] {
        if !object.contains_key(key) {
            return Err(CoreError::InvalidFormat(format!("missing '{key}' key")));
        }
    }

    serde_json::from_value(value)
        .map_err(|e| CoreError::InvalidFormat(format!("malformed document: {e}")))
}

/// Replace all tasks and upsert the app state from a parsed document.
pub fn import_data<R: Repository>(repo: &mut R, doc: &ExportDocument) -> Result<()> {
    repo.import(&doc.tasks, &doc.app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppStatePatch, TimeAvailability};
    use crate::storage::TaskDb;
    use crate::task::{DurationBucket, Importance, NewTask};

    #[test]
    fn round_trip_reproduces_tasks_and_state() {
        let now = Utc::now();
        let mut source = TaskDb::open_memory().unwrap();
        let mut input = NewTask::named("Pack boxes");
        input.importance = Importance::High;
        input.estimated_duration = DurationBucket::FourHours;
        input.deadline = Some(now + chrono::Duration::days(5));
        source.create_task(input, now).unwrap();
        source.create_task(NewTask::named("Call plumber"), now).unwrap();
        source
            .update_app_state(&AppStatePatch {
                today_time_availability: Some(Some(TimeAvailability::Limited)),
                last_daily_check_date: Some(Some(now.date_naive())),
                ..Default::default()
            })
            .unwrap();

        let json = export_data(&source, now).unwrap();

        let mut target = TaskDb::open_memory().unwrap();
        target.create_task(NewTask::named("stale"), now).unwrap();
        let doc = parse_import(&json).unwrap();
        import_data(&mut target, &doc).unwrap();

        let mut original = source.list_tasks().unwrap();
        let mut imported = target.list_tasks().unwrap();
        original.sort_by(|a, b| a.id.cmp(&b.id));
        imported.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(original, imported);
        assert_eq!(
            source.get_app_state().unwrap(),
            target.get_app_state().unwrap()
        );
    }

    #[test]
    fn import_is_a_full_overwrite() {
        let now = Utc::now();
        let mut db = TaskDb::open_memory().unwrap();
        db.create_task(NewTask::named("existing"), now).unwrap();

        let doc = ExportDocument {
            tasks: vec![],
            app_state: AppState::default(),
            exported_at: now,
            version: EXPORT_VERSION,
        };
        import_data(&mut db, &doc).unwrap();
        assert!(db.list_tasks().unwrap().is_empty());
    }

    #[test]
    fn missing_keys_fail_with_invalid_format() {
        let err = parse_import(r#"{ "appState": {} }"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat(m) if m.contains("tasks")));

        let err = parse_import(r#"{ "tasks": [] }"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat(m) if m.contains("appState")));

        let err = parse_import("[1, 2]").unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat(_)));

        let err = parse_import("not json").unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat(_)));
    }

    #[test]
    fn version_and_timestamp_default_when_absent() {
        let json = r#"{
            "tasks": [],
            "appState": {
                "id": "state",
                "notificationTime": "07:00",
                "notificationsEnabled": true,
                "theme": "light",
                "hasCompletedOnboarding": false
            }
        }"#;
        let doc = parse_import(json).unwrap();
        assert_eq!(doc.version, EXPORT_VERSION);
        assert!(doc.tasks.is_empty());
    }

    #[test]
    fn exported_document_shape() {
        let now = Utc::now();
        let db = TaskDb::open_memory().unwrap();
        let json = export_data(&db, now).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("tasks").is_some());
        assert!(value.get("appState").is_some());
        assert!(value.get("exportedAt").is_some());
        assert_eq!(value["version"], 1);
    }
}
