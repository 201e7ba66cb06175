//! # splitstack
//!
//! Command-line front end for SplitStack.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()            stderr, RUST_LOG or default filter       │
//! │  2. SplitConfig::load()       defaults → splitstack.toml → env         │
//! │  3. Database::new()           open/create SQLite, run migrations       │
//! │  4. Command::parse(argv)                                                │
//! │  5. execute(command, ctx, stdout)                                      │
//! │                                                                         │
//! │  Any error: "Error: <message>" on stderr, exit code 1                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod commands;
mod config;
mod error;

use std::io::Write;
use std::process;

use splitstack_db::Database;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::{execute, Command, Context};
use crate::config::SplitConfig;
use crate::error::CliResult;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let command = Command::parse(std::env::args().skip(1))?;

    let mut stdout = std::io::stdout().lock();
    if command == Command::Help {
        writeln!(stdout, "{}", commands::USAGE)?;
        return Ok(());
    }

    let config = SplitConfig::load(None)?;
    let roster = config.roster()?;
    debug!(participants = roster.len(), "Configuration loaded");

    let db = Database::new(config.db_config()?).await?;
    let ctx = Context { db, roster };

    let result = execute(command, &ctx, &mut stdout).await;
    ctx.db.close().await;
    result
}

/// Initializes the tracing subscriber.
///
/// Logs go to stderr so stdout carries only command output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,splitstack=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
