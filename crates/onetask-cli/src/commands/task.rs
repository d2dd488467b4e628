//! Task backlog commands for CLI.

use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;
use onetask_core::storage::TaskDb;
use onetask_core::{DailyFlow, DurationBucket, Importance, NewTask, Repository, TaskPatch, TaskStatus};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task name
        name: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Importance 1 (very low) to 5 (critical)
        #[arg(long, default_value = "3")]
        importance: u8,
        /// Estimated duration in minutes (15/30/60/120/240/480)
        #[arg(long, default_value = "60")]
        duration: u32,
        /// Deadline, YYYY-MM-DD or RFC 3339
        #[arg(long)]
        deadline: Option<String>,
    },
    /// List tasks
    List {
        /// Filter by status (pending, completed, postponed)
        #[arg(long)]
        status: Option<String>,
        /// Only tasks whose deadline has passed
        #[arg(long)]
        overdue: bool,
        /// Output JSON instead of one line per task
        #[arg(long)]
        json: bool,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New importance (1..=5)
        #[arg(long)]
        importance: Option<u8>,
        /// New estimated duration in minutes
        #[arg(long)]
        duration: Option<u32>,
        /// New deadline, YYYY-MM-DD or RFC 3339
        #[arg(long)]
        deadline: Option<String>,
        /// Remove the deadline
        #[arg(long)]
        clear_deadline: bool,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Move a task up in the pending ordering
    MoveUp {
        /// Task ID
        id: String,
    },
    /// Move a task down in the pending ordering
    MoveDown {
        /// Task ID
        id: String,
    },
}

/// Accepts either a bare date (midnight UTC) or a full RFC 3339 timestamp.
fn parse_deadline(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| format!("invalid date: {s}"));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| format!("expected YYYY-MM-DD or RFC 3339, got '{s}'"))
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();

    match action {
        TaskAction::Create {
            name,
            description,
            importance,
            duration,
            deadline,
        } => {
            let mut flow = DailyFlow::new(TaskDb::open()?);
            flow.refresh(now)?;
            let input = NewTask {
                name,
                description,
                importance: Importance::try_from(importance)?,
                estimated_duration: DurationBucket::try_from(duration)?,
                deadline: deadline.as_deref().map(parse_deadline).transpose()?,
            };
            let task = flow.create_task(input, now)?;
            println!("Task created: {}", task.id);
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List { status, overdue, json } => {
            let db = TaskDb::open()?;
            let mut tasks = db.list_tasks()?;
            if let Some(ref s) = status {
                tasks.retain(|t| t.status.to_string() == *s);
            }
            if overdue {
                tasks.retain(|t| t.is_overdue(now));
            }
            // Pending tasks in manual order first, the rest newest-first.
            tasks.sort_by(|a, b| {
                let rank = |t: &onetask_core::Task| match t.status {
                    TaskStatus::Pending => 0,
                    _ => 1,
                };
                rank(a)
                    .cmp(&rank(b))
                    .then_with(|| match a.status {
                        TaskStatus::Pending => a.order.cmp(&b.order),
                        _ => b.created_at.cmp(&a.created_at),
                    })
            });

            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for t in &tasks {
                    let mut line = format!(
                        "{}  [{}] {} ({}, {}",
                        t.id,
                        t.status,
                        t.name,
                        t.importance.label(),
                        t.estimated_duration.label(),
                    );
                    if let Some(deadline) = t.deadline {
                        line.push_str(&format!(", due {}", deadline.date_naive()));
                        if t.is_overdue(now) {
                            line.push_str(", overdue");
                        }
                    }
                    line.push(')');
                    println!("{line}");
                }
            }
        }
        TaskAction::Get { id } => {
            let db = TaskDb::open()?;
            match db.get_task(&id)? {
                Some(task) => println!("{}", serde_json::to_string_pretty(&task)?),
                None => {
                    eprintln!("Task not found: {id}");
                    std::process::exit(1);
                }
            }
        }
        TaskAction::Update {
            id,
            name,
            description,
            importance,
            duration,
            deadline,
            clear_deadline,
        } => {
            let mut flow = DailyFlow::new(TaskDb::open()?);
            flow.refresh(now)?;
            let patch = TaskPatch {
                name,
                description: description.map(Some),
                importance: importance.map(Importance::try_from).transpose()?,
                estimated_duration: duration.map(DurationBucket::try_from).transpose()?,
                deadline: match (deadline, clear_deadline) {
                    (Some(s), _) => Some(Some(parse_deadline(&s)?)),
                    (None, true) => Some(None),
                    (None, false) => None,
                },
                ..Default::default()
            };
            let task = flow.update_task(&id, &patch, now)?;
            println!("Task updated:");
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::Delete { id } => {
            let mut flow = DailyFlow::new(TaskDb::open()?);
            flow.refresh(now)?;
            flow.delete_task(&id, now)?;
            println!("Task deleted: {id}");
        }
        TaskAction::MoveUp { id } => {
            let mut flow = DailyFlow::new(TaskDb::open()?);
            flow.move_up(&id)?;
            println!("ok");
        }
        TaskAction::MoveDown { id } => {
            let mut flow = DailyFlow::new(TaskDb::open()?);
            flow.move_down(&id)?;
            println!("ok");
        }
    }
    Ok(())
}
