//! Metal Ingest Library
//!
//! Scrapes the Encyclopaedia Metallum band catalog and loads it into SQLite.
//!
//! # Pipeline
//!
//! - **Discovery**: page through the alphabetical band listing of each letter
//! - **Fetch**: download detail pages on a shared bounded-concurrency pool
//! - **Extract**: turn band, discography and track-list pages into records
//! - **Load**: normalize records and replace the `band`, `album` and `song` tables
//!
//! # Example
//!
//! ```no_run
//! use metal_ingest::{HttpPageSource, IngestConfig, IngestOrchestrator, TabularLoader};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let source = Arc::new(HttpPageSource::new(&config)?);
//!     let loader = TabularLoader::connect(&config.database_path).await?;
//!
//!     let orchestrator = IngestOrchestrator::new(config, source, loader);
//!     let summary = orchestrator.run().await?;
//!     println!("{} bands loaded", summary.bands.rows_inserted);
//!     orchestrator.close().await;
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod http;
pub mod models;
pub mod orchestrator;
pub mod pool;
pub mod progress;
pub mod storage;

pub use config::{IngestConfig, IngestDepth};
pub use error::{Result, ScrapeError};
pub use http::{HttpPageSource, PageSource};
pub use models::{EntityReference, PartitionKey, Record, RecordKind};
pub use orchestrator::{IngestOrchestrator, RunSummary};
pub use pool::{FailurePolicy, FetchPool};
pub use storage::{LoadStats, TabularLoader};
