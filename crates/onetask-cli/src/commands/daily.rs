//! Daily ritual commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use onetask_core::storage::TaskDb;
use onetask_core::{reminder, DailyFlow, DailyState, Repository, TimeAvailability};
use serde::Serialize;

#[derive(Subcommand)]
pub enum DailyAction {
    /// Show the current ritual state
    Status,
    /// Record today's time availability (limited, normal, extra) and get a task
    Check {
        /// Availability band
        availability: String,
    },
    /// Mark today's task complete
    Complete,
    /// Postpone today's task and get a replacement
    Postpone {
        /// Cooldown length in days (commonly 1, 3, 7, or 14)
        #[arg(long, default_value = "1")]
        days: i64,
        /// Why the task is being postponed
        #[arg(long)]
        reason: Option<String>,
    },
    /// Answer the previous-day check
    Yesterday {
        #[command(subcommand)]
        answer: YesterdayAnswer,
    },
}

#[derive(Subcommand)]
pub enum YesterdayAnswer {
    /// Yesterday's task was completed
    Done,
    /// Yesterday's task was not completed; it returns to the backlog
    Skip,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DailyStatus<'a> {
    #[serde(flatten)]
    state: &'a DailyState,
    eligible_count: usize,
    reminder_due: bool,
}

fn print_status(flow: &DailyFlow<TaskDb>) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let status = DailyStatus {
        state: flow.state(),
        eligible_count: flow.eligible_count(now)?,
        reminder_due: reminder::reminder_due(&flow.repo().get_app_state()?, now)?,
    };
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

pub fn run(action: DailyAction) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let mut flow = DailyFlow::new(TaskDb::open()?);
    flow.refresh(now)?;

    match action {
        DailyAction::Status => {}
        DailyAction::Check { availability } => {
            let band = TimeAvailability::parse(&availability)
                .ok_or(format!("availability must be limited, normal, or extra, got '{availability}'"))?;
            flow.submit_availability(band, now)?;
        }
        DailyAction::Complete => {
            flow.complete_current(now)?;
            println!("Task completed. See you tomorrow.");
        }
        DailyAction::Postpone { days, reason } => {
            flow.postpone_current(days, reason, now)?;
        }
        DailyAction::Yesterday { answer } => match answer {
            YesterdayAnswer::Done => {
                flow.previous_day_completed(now)?;
            }
            YesterdayAnswer::Skip => {
                flow.previous_day_not_completed()?;
            }
        },
    }

    print_status(&flow)
}
