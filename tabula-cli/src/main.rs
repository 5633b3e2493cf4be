//! Tabula operator CLI
//!
//! Usage:
//!   tabula --config tabula.toml init
//!   tabula purge --days 30
//!   tabula empty-trash --owner 7
//!   tabula audit --base 5 --as-user 7 --limit 20

use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Parser;
use tabula_cli::{Command, execute};
use tabula_core::{Platform, PlatformConfig};
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "tabula")]
#[command(about = "Tabula database maintenance")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "tabula.toml")]
    config: PathBuf,

    /// Database file, overriding `database.path` from the config
    #[arg(long)]
    database: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let mut config = PlatformConfig::load_from(&args.config);
    if let Some(path) = args.database {
        config.database.path = path;
    }
    debug!("Opening {:?}", config.database.path);
    let platform = Platform::open(config).context("failed to open database")?;

    for line in execute(&platform, &args.command)? {
        println!("{line}");
    }
    Ok(())
}
