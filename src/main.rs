mod cli;

use artfetch::config::{Config, ConfigError};
use artfetch::fetch::HttpFetcher;
use artfetch::pipeline::{ImportPipeline, ListingSource};
use artfetch::{generate, links};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Import(args) => {
            let config = load_config(args.config)?;
            let fetcher = Arc::new(HttpFetcher::new(&config.http.client_config())?);
            let source = match args.snapshot {
                Some(path) => ListingSource::Snapshot(path),
                None => ListingSource::Live,
            };
            let mut pipeline = ImportPipeline::new(config, fetcher);
            pipeline.run(source).await?;
        }
        Commands::Links(args) => {
            let config = load_config(args.config)?;
            let fetcher = Arc::new(HttpFetcher::new(&config.http.client_config())?);
            links::run(&config, fetcher).await?;
        }
        Commands::Generate(args) => {
            let config = load_config(args.config)?;
            generate::run(&config).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}
