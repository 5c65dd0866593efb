//! covidz - sync and inspect daily COVID-19 series per country.
//!
//! An interactive prompt over the local cache: `sync` refreshes stale
//! countries from the public API, `plot` prints their 7-day averages.

mod app;
mod commands;
mod config;
mod render;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use covidz_core::{ApiClient, CacheManager, SyncEngine, SyncOptions};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use commands::Command;
use config::Config;

const GREETER: &str = "Welcome to covidz!";

/// Log file name in the data directory
const LOG_FILE: &str = "covidz.log";

/// Initialize the tracing subscriber, logging to a file so the prompt stays
/// readable. Use RUST_LOG to control the level (e.g., RUST_LOG=debug).
fn init_tracing(data_dir: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let appender = tracing_appender::rolling::never(data_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    let data_dir = config.data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let _guard = init_tracing(&data_dir);
    info!(base_url = config.base_url(), data_dir = %data_dir.display(), "covidz starting");

    let api = ApiClient::new(config.base_url())?;
    let cache = CacheManager::new(data_dir.clone())?;
    let engine = SyncEngine::new(api, cache, SyncOptions { backoff: config.backoff() });
    let mut app = App::new(engine).await;

    let splitter = "#".repeat(GREETER.len());
    println!("{}", splitter);
    println!("{}", GREETER);
    println!("{}", splitter);
    println!("  . version: {}", env!("CARGO_PKG_VERSION"));
    println!("  . base url: {}", config.base_url());
    println!("  . base folder: {}", data_dir.display());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = app.interrupted() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        match app.execute(Command::parse(&line)).await {
            Ok(true) => break,
            Ok(false) => {}
            Err(e) => println!("error: {:#}", e),
        }
    }

    println!("See you later !");
    info!("covidz shutting down");
    Ok(())
}
