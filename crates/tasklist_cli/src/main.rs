//! Terminal front-end for the task list.
//!
//! # Responsibility
//! - Stand in for the phone screen: render the list, capture intents.
//! - Route every intent through `TaskListController`.

mod shell;
mod view;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tasklist_core::db::open_db;
use tasklist_core::{
    default_log_level, init_logging, LogLevel, SqliteTaskStore, TaskIntent, TaskListController,
};
use view::TerminalView;

const DEFAULT_DB_FILE: &str = "tasklist.sqlite3";

#[derive(Parser)]
#[command(name = "tasklist")]
#[command(version)]
#[command(about = "Single-screen task list backed by SQLite")]
struct Cli {
    /// Task database file
    #[arg(long, env = "TASKLIST_DB_PATH", default_value = DEFAULT_DB_FILE)]
    db: PathBuf,
    /// Directory for rolling log files; logging is off when unset
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// trace|debug|info|warn|error
    #[arg(long, requires = "log_dir", value_parser = parse_log_level)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the task list
    List {
        /// Emit the committed tasks as JSON
        #[arg(long)]
        json: bool,
    },
    /// Append a task
    Add { title: String },
    /// Rename the task at a 1-based row
    Rename {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        row: u32,
        title: String,
    },
    /// Delete the task at a 1-based row
    Remove {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        row: u32,
    },
    /// Interactive session with add/edit dialogs
    Shell,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(message) = start_logging(&cli) {
        eprintln!("{message}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("{message}");
            }
            ExitCode::FAILURE
        }
    }
}

fn parse_log_level(raw: &str) -> Result<LogLevel, String> {
    raw.parse().map_err(|err: tasklist_core::LoggingError| err.to_string())
}

fn start_logging(cli: &Cli) -> Result<(), String> {
    let Some(log_dir) = &cli.log_dir else {
        return Ok(());
    };
    let log_dir = std::path::absolute(log_dir)
        .map_err(|err| format!("invalid --log-dir `{}`: {err}", log_dir.display()))?;
    let level = cli.log_level.unwrap_or_else(default_log_level);
    init_logging(level.as_str(), log_dir).map_err(|err| err.to_string())
}

fn run(cli: Cli) -> Result<(), String> {
    let conn = open_db(&cli.db)
        .map_err(|err| format!("cannot open task database `{}`: {err}", cli.db.display()))?;
    let store = SqliteTaskStore::try_new(&conn).map_err(|err| err.to_string())?;

    let quiet = matches!(cli.command, Commands::List { json: true });
    let mut controller = TaskListController::new(store, TerminalView::new(quiet));
    controller.load().map_err(|err| err.to_string())?;

    let intent = match cli.command {
        Commands::List { json } => {
            if json {
                let rendered = serde_json::to_string_pretty(controller.tasks())
                    .map_err(|err| format!("cannot encode tasks: {err}"))?;
                println!("{rendered}");
            }
            return Ok(());
        }
        Commands::Shell => return shell::run(&mut controller),
        Commands::Add { title } => TaskIntent::Add { title },
        Commands::Rename { row, title } => TaskIntent::Rename {
            index: row_to_index(row),
            title,
        },
        Commands::Remove { row } => TaskIntent::Remove {
            index: row_to_index(row),
        },
    };

    // The view already printed the notice; only the exit code is left.
    controller
        .apply(intent)
        .map(|_| ())
        .map_err(|_| String::new())
}

/// Converts a 1-based row as shown to the user into a list index.
pub(crate) fn row_to_index(row: u32) -> usize {
    (row as usize).saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::{row_to_index, Cli, Commands};
    use clap::{CommandFactory, Parser};
    use tasklist_core::LogLevel;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rows_are_one_based() {
        assert_eq!(row_to_index(1), 0);
        assert_eq!(row_to_index(7), 6);
    }

    #[test]
    fn rename_parses_row_and_title() {
        let cli = Cli::try_parse_from(["tasklist", "--db", "x.sqlite3", "rename", "2", "Walk dog"])
            .unwrap();
        match cli.command {
            Commands::Rename { row, title } => {
                assert_eq!(row, 2);
                assert_eq!(title, "Walk dog");
            }
            _ => panic!("expected rename"),
        }
    }

    #[test]
    fn row_zero_and_orphan_log_level_are_rejected() {
        assert!(Cli::try_parse_from(["tasklist", "remove", "0"]).is_err());
        assert!(Cli::try_parse_from(["tasklist", "--log-level", "info", "list"]).is_err());

        let cli = Cli::try_parse_from([
            "tasklist",
            "--log-dir",
            "/tmp/tasklist-logs",
            "--log-level",
            "WARNING",
            "list",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Warn));
    }
}
