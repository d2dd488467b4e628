use clap::{CommandFactory, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "onetask-cli", version, about = "OneTask CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task backlog management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Daily ritual: status, availability check, complete, postpone
    Daily {
        #[command(subcommand)]
        action: commands::daily::DailyAction,
    },
    /// Settings management
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Export, import, and reset
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action),
        Commands::Daily { action } => commands::daily::run(action),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Data { action } => commands::data::run(action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "onetask-cli", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
