mod args;
mod commands;
mod error;
mod paths;
mod render;
mod terminal;

use std::fs;
use std::fs::File;
use std::sync::Arc;

use clap::Parser;
use coursedesk_lib::AdminClient;
use coursedesk_lib::ClientConfig;
use coursedesk_lib::auth::SqliteTokenStore;
use log::debug;
use log::error;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::WriteLogger;

use crate::args::Cli;
use crate::error::CliError;
use crate::terminal::TerminalNavigator;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs to `latest.log` in the cache directory, archiving the previous run.
fn init_logging(verbose: bool) {
    paths::rotate_logs();
    let Some(path) = paths::log_file() else { return };
    if let Some(dir) = path.parent()
        && let Err(e) = fs::create_dir_all(dir)
    {
        eprintln!("Could not create log directory {}: {}", dir.display(), e);
        return;
    }

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    match File::create(&path) {
        Ok(file) => {
            if let Err(e) = WriteLogger::init(level, Config::default(), file) {
                eprintln!("Could not start logging: {}", e);
            }
        }
        Err(e) => eprintln!("Could not create log file {}: {}", path.display(), e),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.api_url {
        Some(url) => ClientConfig::new(url)?,
        None => ClientConfig::from_env()?,
    };

    let db = paths::session_db().ok_or(CliError::NoDataDir)?;
    if let Some(dir) = db.parent() {
        fs::create_dir_all(dir)?;
    }
    debug!("Session database at {}", db.display());
    let store = SqliteTokenStore::open(&db).await?;

    let client = AdminClient::builder()
        .config(config)
        .token_store(store)
        .navigator(Arc::new(TerminalNavigator))
        .build()?;
    client.restore_session().await?;

    commands::dispatch(&client, cli.command).await
}
