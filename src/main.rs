mod cli;
mod document;
mod error;
mod metrics;
mod model;
mod orchestrator;
mod service;
mod storage;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;
mod views;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Headless modes log to stderr; the TUI logs to a file so the screen stays clean.
fn init_tracing(args: &cli::Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docsum=info"));
    if args.is_headless() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        let path = cli::data_dir(args)?.join("docsum.log");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = args.is_headless();
    init_tracing(&args)?;

    cli::run(args).await?;
    // Explicitly exit on success in headless modes so lingering side tasks don't hold the process.
    if is_non_tui {
        std::process::exit(0);
    }
    Ok(())
}
