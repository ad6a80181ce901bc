//! htmlshelf command-line entry point.

use anyhow::{Context, Result};
use clap::Parser;
use htmlshelf_core::{init_logging, Hydration, ShelfConfig, SqliteSnapshotRepository, StorageTarget};
use log::info;

mod cli;
mod commands;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config_from_cli(&cli)?;

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }

    let target = if cli.memory {
        StorageTarget::Memory
    } else {
        config.storage_target()
    };
    info!("event=cli_start module=cli status=ok target={target:?}");

    let mut store = Hydration::new(SqliteSnapshotRepository::new(target))
        .hydrate()
        .await;
    let outcome = commands::run(&mut store, cli.command).await;
    store.flush().await;
    outcome
}

/// Environment first, then command-line flags.
fn config_from_cli(cli: &Cli) -> Result<ShelfConfig> {
    let mut config = ShelfConfig::from_env().context("invalid HTMLSHELF_* environment")?;
    if let Some(db) = &cli.db {
        config.db_path = Some(db.clone());
        config.persistence_enabled = true;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level.as_str().to_string();
    }
    if let Some(dir) = &cli.log_dir {
        let dir = if dir.is_absolute() {
            dir.clone()
        } else {
            std::env::current_dir()
                .context("failed to resolve current directory")?
                .join(dir)
        };
        config.log_dir = Some(dir);
    }
    Ok(config)
}
