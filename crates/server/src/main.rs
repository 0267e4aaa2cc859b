use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::database::connection::DbConnection;

pub(crate) mod auth;
pub(crate) mod config;
pub(crate) mod database;
pub(crate) mod error;
pub(crate) mod models;
pub(crate) mod server;
pub(crate) mod storage;

#[cfg(test)]
mod tests;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the YAML config file.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Create tables and indexes, then exit.
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_yaml_file(&args.config)?;
    config.apply_env_overrides(|key| std::env::var(key).ok());

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            config.validate()?;
            server::run_all(&config).await?;
        }
        Command::InitDb => {
            let db = DbConnection::connect(&config.database).await?;
            db.init_schema().await?;
            info!("database schema is ready");
        }
    }

    Ok(())
}
