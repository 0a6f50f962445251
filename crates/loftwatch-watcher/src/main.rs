//! Loftwatch - watch a live event page and report changes.

use anyhow::{anyhow, Context};
use clap::Parser;
use loftwatch_document::HttpProviderFactory;
use loftwatch_domain::MonitorTarget;
use loftwatch_reporter::ReportingClient;
use loftwatch_watcher::{Cli, WatcherWorker};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Log to stderr; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = cli.resolve_config().context("Failed to load configuration")?;
    let target = MonitorTarget::new(&cli.url).ok_or_else(|| anyhow!("Invalid target URL: {}", cli.url))?;

    let factory = HttpProviderFactory::new(config.poll_interval()).context("Failed to start document provider")?;
    let reporter = ReportingClient::with_timeout(&config.base_url, config.request_timeout())
        .context("Failed to create reporting client")?;

    let mut worker = WatcherWorker::new(config, target, factory, reporter)?;
    worker.run().await?;

    Ok(())
}
