//! `snowy` entry point.
//!
//! Loads configuration from `SNOWY_*` variables, starts file logging when a
//! log directory is configured, opens the SQLite store and dispatches.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use snowy_cli::content::{run_content, ContentArgs};
use snowy_cli::doc::{run_doc, DocArgs};
use snowy_core::{core_version, init_logging_from_config, open_sqlite_store, StoreConfig};

/// Snowy content-addressed document store.
#[derive(Parser, Debug)]
#[command(name = "snowy", version, about, long_about = None)]
struct Cli {
    /// SQLite database path; overrides SNOWY_DB_PATH.
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Content blob operations (put, get).
    Content(ContentArgs),

    /// Document operations (insert, append, get, list, delete, history).
    Doc(DocArgs),

    /// Print the core version.
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_exit module=cli status=error error={err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = StoreConfig::from_env().context("failed to load configuration")?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    init_logging_from_config(&config)
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Version => {
            writeln!(out, "snowy {}", core_version())?;
            Ok(())
        }
        Commands::Content(args) => {
            let store = open_store(&config)?;
            run_content(&args, &store, &mut out)
        }
        Commands::Doc(args) => {
            let store = open_store(&config)?;
            run_doc(&args, &store, &mut out)
        }
    }
}

fn open_store(config: &StoreConfig) -> Result<snowy_core::SqliteStore> {
    open_sqlite_store(config)
        .with_context(|| format!("failed to open store at {}", config.db_path.display()))
}
