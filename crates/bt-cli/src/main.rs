use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bt_cli::commands::{
    delete, diaper, edit, export, import, log, resume, start, stats, status, stop, undo,
};
use bt_cli::{Cli, Commands, Config};

/// Load config and open the database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(bt_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = bt_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Start { activity }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            start::run(&mut db, activity)?;
        }
        Some(Commands::Diaper { kind }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            diaper::run(&mut db, *kind)?;
        }
        Some(Commands::Stop) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            stop::run(&mut db)?;
        }
        Some(Commands::Resume { id }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            resume::run(&mut db, id)?;
        }
        Some(Commands::Log(args)) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let mut stdout = std::io::stdout().lock();
            log::run(&mut stdout, &db, args, Local::now())?;
            stdout.flush()?;
        }
        Some(Commands::Stats { day }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let mut stdout = std::io::stdout().lock();
            stats::run(&mut stdout, &db, day.as_deref(), Local::now())?;
            stdout.flush()?;
        }
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let mut stdout = std::io::stdout().lock();
            status::run(&mut stdout, &db, &config, Local::now())?;
            stdout.flush()?;
        }
        Some(Commands::Edit(args)) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            edit::run(&mut db, args)?;
        }
        Some(Commands::Delete { id }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            delete::run(&mut db, id)?;
        }
        Some(Commands::Undo) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            undo::run(&mut db)?;
        }
        Some(Commands::Export { output }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            export::run(&db, output.as_deref(), Local::now())?;
        }
        Some(Commands::Import { file }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            import::run(&mut db, file)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
