//! Settings commands for CLI.

use clap::Subcommand;
use onetask_core::reminder::parse_notification_time;
use onetask_core::storage::TaskDb;
use onetask_core::{AppStatePatch, Repository, Theme};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show all settings and ritual state
    Get,
    /// Set a settings value
    Set {
        /// Settings key (notification-time, notifications, theme, onboarding)
        key: String,
        /// New value
        value: String,
    },
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = TaskDb::open()?;

    match action {
        SettingsAction::Get => {
            let state = db.get_app_state()?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        SettingsAction::Set { key, value } => {
            let patch = match key.as_str() {
                "notification-time" => {
                    parse_notification_time(&value)?;
                    AppStatePatch {
                        notification_time: Some(value),
                        ..Default::default()
                    }
                }
                "notifications" => AppStatePatch {
                    notifications_enabled: Some(value.parse::<bool>().map_err(|_| {
                        format!("notifications must be true or false, got '{value}'")
                    })?),
                    ..Default::default()
                },
                "theme" => AppStatePatch {
                    theme: Some(match value.as_str() {
                        "light" => Theme::Light,
                        "dark" => Theme::Dark,
                        other => return Err(format!("theme must be light or dark, got '{other}'").into()),
                    }),
                    ..Default::default()
                },
                "onboarding" => AppStatePatch {
                    has_completed_onboarding: Some(value.parse::<bool>().map_err(|_| {
                        format!("onboarding must be true or false, got '{value}'")
                    })?),
                    ..Default::default()
                },
                other => {
                    eprintln!("unknown key: {other}");
                    std::process::exit(1);
                }
            };
            db.update_app_state(&patch)?;
            println!("ok");
        }
    }
    Ok(())
}
