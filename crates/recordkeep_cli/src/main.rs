//! `recordkeep` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments (with environment fallbacks) and bootstrap logging and
//!   the record store.
//! - Print exactly one JSON envelope per invocation on stdout.
//!
//! # Invariants
//! - Exit code 0: command succeeded.
//! - Exit code 2: command rejected with a structured error.
//! - Exit code 1: startup failed or storage is unusable.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use recordkeep_core::{
    default_log_level, init_logging, open_db, EntityStore, RemovePolicy, StoreConfig,
};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "recordkeep",
    author,
    version,
    about = "Real-estate and music catalog records over a local SQLite store"
)]
struct Cli {
    /// SQLite database file (created on first use)
    #[arg(long, env = "RECORDKEEP_DB", default_value = "recordkeep.sqlite3")]
    db: PathBuf,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, env = "RECORDKEEP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files (defaults to a temp dir)
    #[arg(long, env = "RECORDKEEP_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Refuse to remove records that are still linked or referenced
    #[arg(long, env = "RECORDKEEP_REJECT_REFERENCED")]
    reject_referenced: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every record of a kind in insertion order
    List { kind: String },
    /// Fetch one record by id
    Get { kind: String, id: String },
    /// First record whose field equals the value
    FindByField {
        kind: String,
        field: String,
        value: String,
    },
    /// First record whose text field contains the value
    FindContains {
        kind: String,
        field: String,
        text: String,
    },
    /// Add a record from a JSON body (omit `id` or pass 0 to assign one)
    Add { kind: String, json: String },
    /// Add a client request from `full name, type, address, phone`
    AddRequest { text: String },
    /// Replace the fields of an existing record from a JSON body
    Update {
        kind: String,
        id: String,
        json: String,
    },
    /// Remove a record by id
    Remove { kind: String, id: String },
    /// Link two records inside an association set
    Link {
        set: String,
        left_id: String,
        right_id: String,
    },
    /// Unlink two records inside an association set
    Unlink {
        set: String,
        left_id: String,
        right_id: String,
    },
    /// Records paired with a record inside an association set
    Associations {
        set: String,
        kind: String,
        id: String,
    },
    /// Description of a property
    Describe { id: String },
    /// Rendered track listing of a playlist
    Playlist { id: String },
    /// Load a sample dataset into empty kinds
    Seed {
        #[arg(value_enum)]
        target: SeedTarget,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum SeedTarget {
    RealEstate,
    Music,
    All,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            error!("event=cli_start module=cli status=error error={err:#}");
            commands::print_startup_failure(&err);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let log_dir = match cli.log_dir {
        Some(dir) => dir,
        None => std::env::temp_dir().join("recordkeep-logs"),
    };
    let log_level = resolve_log_level(cli.log_level.as_deref());
    init_logging(log_level, &log_dir).context("Failed to initialize logging")?;

    let conn = open_db(&cli.db)
        .with_context(|| format!("Failed to open record store at {}", cli.db.display()))?;
    let config = StoreConfig {
        remove_policy: if cli.reject_referenced {
            RemovePolicy::Reject
        } else {
            RemovePolicy::Cascade
        },
    };
    let store = EntityStore::with_config(&conn, config).context("Record store is not usable")?;
    info!(
        "event=cli_start module=cli status=ok db={} remove_policy={:?}",
        cli.db.display(),
        config.remove_policy
    );

    Ok(commands::execute(&store, cli.command))
}

fn resolve_log_level(requested: Option<&str>) -> &str {
    requested.unwrap_or(default_log_level())
}

#[cfg(test)]
mod tests {
    use super::{resolve_log_level, Cli, Command, SeedTarget};
    use clap::Parser;
    use recordkeep_core::default_log_level;

    #[test]
    fn log_level_falls_back_to_build_default() {
        let cli = Cli::try_parse_from(["recordkeep", "--db", "catalog.sqlite3", "list", "track"])
            .unwrap();
        assert_eq!(resolve_log_level(cli.log_level.as_deref()), default_log_level());
        assert!(matches!(cli.command, Command::List { ref kind } if kind == "track"));

        let cli = Cli::try_parse_from(["recordkeep", "--log-level", "warn", "seed", "music"])
            .unwrap();
        assert_eq!(resolve_log_level(cli.log_level.as_deref()), "warn");
        assert!(matches!(
            cli.command,
            Command::Seed {
                target: SeedTarget::Music
            }
        ));
    }
}
