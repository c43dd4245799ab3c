//! Metal Ingest - catalog scraper

use anyhow::{Context, Result};
use clap::Parser;
use metal_common::logging::{init_logging, LogConfig, LogLevel};
use metal_ingest::config::expand_letters;
use metal_ingest::{
    FailurePolicy, HttpPageSource, IngestConfig, IngestDepth, IngestOrchestrator, TabularLoader,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "metal-ingest")]
#[command(author, version, about = "Scrape the metal band catalog into SQLite")]
struct Cli {
    /// Index letters to scrape (comma-separated, or ALL)
    #[arg(short, long, value_delimiter = ',')]
    letters: Option<Vec<String>>,

    /// Destination SQLite file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Maximum concurrent requests
    #[arg(short, long)]
    workers: Option<usize>,

    /// Also scrape each band's discography
    #[arg(long)]
    with_albums: bool,

    /// Also scrape each album's track list (implies --with-albums)
    #[arg(long)]
    with_songs: bool,

    /// Skip pages that fail instead of aborting the run
    #[arg(long)]
    keep_going: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Command-line flags take precedence over the environment
    fn apply(self, mut config: IngestConfig) -> Result<IngestConfig> {
        if let Some(letters) = self.letters {
            config.letters = expand_letters(
                letters
                    .into_iter()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect(),
            );
        }
        if let Some(database) = self.database {
            config.database_path = database;
        }
        if let Some(workers) = self.workers {
            config.max_workers = workers;
        }
        if self.with_songs {
            config.depth = IngestDepth::Songs;
        } else if self.with_albums {
            config.depth = config.depth.max(IngestDepth::Albums);
        }
        if self.keep_going {
            config.failure_policy = FailurePolicy::CollectAll;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("metal-ingest")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    let config = cli.apply(IngestConfig::from_env()?)?;

    info!(
        database = %config.database_path.display(),
        "Starting Metal Archives scraper"
    );

    let source = Arc::new(HttpPageSource::new(&config)?);
    let loader = TabularLoader::connect(&config.database_path)
        .await
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;

    let orchestrator = IngestOrchestrator::new(config, source, loader).with_progress(true);
    let result = orchestrator.run().await;
    orchestrator.close().await;

    let summary = result.context("Ingestion failed")?;
    if summary.failed_items > 0 {
        info!("{} pages were skipped", summary.failed_items);
    }

    info!("Ingestion complete");
    Ok(())
}
