//! animedex entry point.
//!
//! Boots an interactive shell over stdin. Logging goes to stderr so stdout
//! only carries the rendered screens.

use std::sync::Arc;

use animedex_client::{ApiClient, QueryCache, StalePolicy};
use animedex_core::{AppConfig, UrlSync};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

mod command;
mod render;
mod shell;

/// Browse the anime catalog from the terminal.
#[derive(Parser, Debug)]
#[command(name = "animedex", version, about)]
struct Cli {
    /// Initial location, e.g. `http://localhost/?search=naruto&page=2`.
    #[arg(long, value_name = "LOCATION", default_value = "http://localhost/")]
    url: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;
    let sync = UrlSync::parse(&cli.url).with_context(|| format!("invalid --url {:?}", cli.url))?;

    let client = ApiClient::from_app_config(&config)?;
    tracing::info!(base_url = %client.base_url(), location = %sync.location(), "starting animedex shell");

    let cache = Arc::new(QueryCache::new(Arc::new(client), StalePolicy::from(&config)));
    let shell = shell::Shell::new(sync, cache, config.search_debounce(), std::io::stdout());

    shell.run(BufReader::new(tokio::io::stdin())).await
}
