//! Export, import, and reset commands for CLI.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;
use onetask_core::storage::TaskDb;
use onetask_core::{export_data, import_data, parse_import, Repository};

#[derive(Subcommand)]
pub enum DataAction {
    /// Export all tasks and app state as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Import a previously exported document, replacing all current data
    Import {
        /// Path to the export file
        file: PathBuf,
    },
    /// Delete all tasks and reset the app state
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: DataAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = TaskDb::open()?;

    match action {
        DataAction::Export { output } => {
            let json = export_data(&db, Utc::now())?;
            match output {
                Some(path) => {
                    fs::write(&path, &json)?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        DataAction::Import { file } => {
            let json = fs::read_to_string(&file)?;
            let doc = parse_import(&json)?;
            let count = doc.tasks.len();
            import_data(&mut db, &doc)?;
            println!("Imported {count} tasks from {}", file.display());
        }
        DataAction::Reset { yes } => {
            if !yes {
                eprintln!("This deletes all tasks and settings. Re-run with --yes to confirm.");
                std::process::exit(1);
            }
            db.reset_all()?;
            println!("All data reset.");
        }
    }
    Ok(())
}
