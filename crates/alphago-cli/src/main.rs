//! AlphaGo CLI - queue delivery orders from a terminal
//!
//! Every command records its change locally first; `alphago sync` replays
//! the queue once the order service is reachable.

mod cli;
mod commands;
mod config_profiles;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::clear::run_clear;
use crate::commands::common::{open_session, resolve_db_path};
use crate::commands::config::run_config;
use crate::commands::create::run_create;
use crate::commands::delete::run_delete;
use crate::commands::list::run_list;
use crate::commands::pending::run_pending;
use crate::commands::refresh::run_refresh;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::commands::update::run_update;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "alphago=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Config { command } = cli.command {
        return run_config(command, cli.profile.as_deref());
    }

    let db_path = resolve_db_path(cli.db_path)?;
    let session = open_session(&db_path, cli.profile.as_deref()).await?;

    match cli.command {
        Commands::Create(args) => run_create(args, &session).await,
        Commands::Update(args) => run_update(args, &session).await,
        Commands::Delete { id } => run_delete(&id, &session).await,
        Commands::List { limit, json } => run_list(limit, json, &session).await,
        Commands::Pending { json } => run_pending(json, &session).await,
        Commands::Sync { json } => run_sync(json, &session).await,
        Commands::Refresh => run_refresh(&session).await,
        Commands::Status { json, acknowledge } => run_status(json, acknowledge, &session).await,
        Commands::Clear { force } => run_clear(force, &session).await,
        Commands::Config { .. } => Ok(()),
    }
}
