//! Ingestion run orchestrator
//!
//! Runs the stages of one ingestion in order: partition discovery, band
//! detail pages, then (depending on depth) discographies and track lists,
//! and finally the table loads. Every fan-out stage shares one fetch pool
//! and each stage completes before the next one starts.

use crate::config::IngestConfig;
use crate::discovery::PaginationDiscoverer;
use crate::error::Result;
use crate::extract::{extract_albums, extract_band, extract_songs};
use crate::http::PageSource;
use crate::models::{fields, EntityReference, PartitionKey, Record};
use crate::pool::{BatchOutcome, FetchPool};
use crate::progress::BarObserver;
use crate::storage::{LoadStats, TabularLoader, ALBUM_TABLE, BAND_TABLE, SONG_TABLE};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Result of a complete run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub references_discovered: usize,
    pub bands: LoadStats,
    pub albums: Option<LoadStats>,
    pub songs: Option<LoadStats>,
    /// Items skipped under the collect-all policy
    pub failed_items: usize,
    pub duration_seconds: f64,
}

pub struct IngestOrchestrator {
    config: Arc<IngestConfig>,
    source: Arc<dyn PageSource>,
    discoverer: Arc<PaginationDiscoverer>,
    pool: FetchPool,
    loader: TabularLoader,
    show_progress: bool,
    failed_items: AtomicUsize,
}

impl IngestOrchestrator {
    /// Create a new orchestrator; the pool is sized once from `max_workers`
    pub fn new(config: IngestConfig, source: Arc<dyn PageSource>, loader: TabularLoader) -> Self {
        let config = Arc::new(config);
        let discoverer = Arc::new(PaginationDiscoverer::new(
            Arc::clone(&config),
            Arc::clone(&source),
        ));

        Self {
            pool: FetchPool::new(config.max_workers),
            config,
            source,
            discoverer,
            loader,
            show_progress: false,
            failed_items: AtomicUsize::new(0),
        }
    }

    /// Draw progress bars on the console
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn loader(&self) -> &TabularLoader {
        &self.loader
    }

    /// Release the database connection
    pub async fn close(self) {
        self.loader.close().await;
    }

    /// Run every configured stage and load the results
    pub async fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        self.failed_items.store(0, Ordering::SeqCst);

        info!(
            letters = ?self.config.letters,
            depth = %self.config.depth,
            max_workers = self.pool.max_in_flight(),
            "Starting ingestion"
        );

        let references = self.discover().await?;
        let references_discovered = references.len();
        info!("Fetching band links completed: {} links", references_discovered);

        let bands = self.fetch_bands(references).await?;
        let bands_elapsed = start_time.elapsed();
        info!(
            "Total bands scraping time: {} seconds",
            bands_elapsed.as_secs()
        );

        let albums = if self.config.depth.includes_albums() {
            let albums = self.fetch_albums(&bands).await?;
            info!(
                "Total albums scraping time: {} seconds",
                (start_time.elapsed() - bands_elapsed).as_secs()
            );
            Some(albums)
        } else {
            None
        };

        let songs = match &albums {
            Some(albums) if self.config.depth.includes_songs() => {
                let stage_start = Instant::now();
                let songs = self.fetch_songs(albums).await?;
                info!(
                    "Total songs scraping time: {} seconds",
                    stage_start.elapsed().as_secs()
                );
                Some(songs)
            },
            _ => None,
        };

        for table in [&BAND_TABLE, &ALBUM_TABLE, &SONG_TABLE] {
            self.loader.ensure_schema(table).await?;
        }

        let band_stats = self.loader.load(&bands, &BAND_TABLE).await?;
        let album_stats = match &albums {
            Some(albums) => Some(self.loader.load(albums, &ALBUM_TABLE).await?),
            None => None,
        };
        let song_stats = match &songs {
            Some(songs) => Some(self.loader.load(songs, &SONG_TABLE).await?),
            None => None,
        };

        let summary = RunSummary {
            references_discovered,
            bands: band_stats,
            albums: album_stats,
            songs: song_stats,
            failed_items: self.failed_items.load(Ordering::SeqCst),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        };

        info!(
            "Ingestion complete: {} references, {} bands, {} albums, {} songs in {:.2}s",
            summary.references_discovered,
            summary.bands.rows_inserted,
            summary.albums.as_ref().map_or(0, |s| s.rows_inserted),
            summary.songs.as_ref().map_or(0, |s| s.rows_inserted),
            summary.duration_seconds
        );

        Ok(summary)
    }

    /// Discover the entity references of every configured partition
    pub async fn discover(&self) -> Result<Vec<EntityReference>> {
        let partitions: Vec<PartitionKey> =
            self.config.letters.iter().map(PartitionKey::new).collect();
        let observer = BarObserver::for_stage("Fetching band links", self.show_progress);

        let outcome = self
            .discoverer
            .discover_all(partitions, &self.pool, self.config.failure_policy, &observer)
            .await?;

        Ok(self.record_failures("Fetching band links", outcome))
    }

    /// Fetch and extract one band record per reference
    pub async fn fetch_bands(&self, references: Vec<EntityReference>) -> Result<Vec<Record>> {
        let source = Arc::clone(&self.source);
        self.run_stage("Scraping band info", references, move |reference: EntityReference| {
            let source = Arc::clone(&source);
            async move {
                let body = source.fetch(reference.url()).await?;
                Ok(extract_band(&body, &reference))
            }
        })
        .await
    }

    /// Fetch the discography of every band
    pub async fn fetch_albums(&self, bands: &[Record]) -> Result<Vec<Record>> {
        let band_ids: Vec<String> = bands
            .iter()
            .filter_map(|band| band.id().map(str::to_string))
            .collect();
        let source = Arc::clone(&self.source);
        let config = Arc::clone(&self.config);

        let per_band = self
            .run_stage("Scraping discographies", band_ids, move |band_id: String| {
                let source = Arc::clone(&source);
                let url = config.discography_url(&band_id);
                async move {
                    let body = source.fetch(&url).await?;
                    Ok(extract_albums(&body, &band_id))
                }
            })
            .await?;

        Ok(per_band.into_iter().flatten().collect())
    }

    /// Fetch the track list of every album
    pub async fn fetch_songs(&self, albums: &[Record]) -> Result<Vec<Record>> {
        let album_refs: Vec<EntityReference> = albums
            .iter()
            .filter_map(|album| album.get(fields::ALBUM_URL).map(EntityReference::new))
            .collect();
        let source = Arc::clone(&self.source);

        let per_album = self
            .run_stage("Scraping track lists", album_refs, move |album: EntityReference| {
                let source = Arc::clone(&source);
                async move {
                    let body = source.fetch(album.url()).await?;
                    Ok(extract_songs(&body, &album))
                }
            })
            .await?;

        Ok(per_album.into_iter().flatten().collect())
    }

    async fn run_stage<I, R, F, Fut>(&self, label: &str, items: Vec<I>, worker: F) -> Result<Vec<R>>
    where
        I: Send + 'static,
        R: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        let observer = BarObserver::for_stage(label, self.show_progress);
        let outcome = self
            .pool
            .map_concurrently(items, worker, self.config.failure_policy, &observer)
            .await?;

        Ok(self.record_failures(label, outcome))
    }

    /// Count skipped items toward the run summary and keep the successes
    fn record_failures<R>(&self, label: &str, outcome: BatchOutcome<R>) -> Vec<R> {
        if !outcome.is_complete() {
            for error in &outcome.failures {
                warn!(stage = label, remote = error.is_remote(), "Skipped item: {}", error);
            }
            warn!("{}: {} items failed and were skipped", label, outcome.failures.len());
            self.failed_items
                .fetch_add(outcome.failures.len(), Ordering::SeqCst);
        }

        outcome.into_successes()
    }
}
