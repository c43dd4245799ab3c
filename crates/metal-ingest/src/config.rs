//! Ingestion configuration
//!
//! Defaults reproduce the reference deployment; every value can be
//! overridden from `METAL_*` environment variables (a `.env` file is honoured)
//! and then from command-line flags.

use crate::error::{Result, ScrapeError};
use crate::pool::FailurePolicy;
use metal_common::env;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Defaults
// ============================================================================

/// Catalog host.
pub const DEFAULT_BASE_URL: &str = "https://www.metal-archives.com";

/// Entries per listing page; the endpoint serves at most this many rows.
pub const DEFAULT_PAGE_SIZE: u64 = 500;

/// Requests allowed in flight at once across the whole run.
pub const DEFAULT_MAX_WORKERS: usize = 20;

/// SQLite file receiving the `band`, `album` and `song` tables.
pub const DEFAULT_DATABASE_PATH: &str = "metal_db.sqlite";

/// User agent sent with every request; the catalog rejects empty agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Index letters ingested when none are configured.
pub const DEFAULT_LETTERS: &[&str] = &["Q", "J"];

/// Every index partition the listing endpoint knows about.
pub const ALL_LETTERS: &[&str] = &[
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S",
    "T", "U", "V", "W", "X", "Y", "Z", "NBR", "~",
];

/// How far down the Band → Album → Song relation a run goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IngestDepth {
    #[default]
    Bands,
    Albums,
    Songs,
}

impl IngestDepth {
    pub fn includes_albums(self) -> bool {
        self >= IngestDepth::Albums
    }

    pub fn includes_songs(self) -> bool {
        self >= IngestDepth::Songs
    }
}

impl std::str::FromStr for IngestDepth {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bands" | "band" => Ok(IngestDepth::Bands),
            "albums" | "album" => Ok(IngestDepth::Albums),
            "songs" | "song" => Ok(IngestDepth::Songs),
            other => Err(ScrapeError::config(format!(
                "unknown ingest depth '{}', expected bands|albums|songs",
                other
            ))),
        }
    }
}

impl std::fmt::Display for IngestDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestDepth::Bands => f.write_str("bands"),
            IngestDepth::Albums => f.write_str("albums"),
            IngestDepth::Songs => f.write_str("songs"),
        }
    }
}

/// Configuration for one ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Catalog host, without trailing slash
    pub base_url: String,

    /// Listing partitions to discover (index letters)
    pub letters: Vec<String>,

    /// Entries per listing page
    pub page_size: u64,

    /// Size of the shared request pool
    pub max_workers: usize,

    /// Destination SQLite file
    pub database_path: PathBuf,

    /// User-Agent header value
    pub user_agent: String,

    /// Per-request timeout; `None` waits indefinitely
    pub timeout_secs: Option<u64>,

    /// Which record types to fetch and load
    pub depth: IngestDepth,

    /// What a failed fetch does to the rest of its stage
    pub failure_policy: FailurePolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            letters: DEFAULT_LETTERS.iter().map(|l| l.to_string()).collect(),
            page_size: DEFAULT_PAGE_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: None,
            depth: IngestDepth::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment and defaults
    ///
    /// Environment variables:
    /// - `METAL_BASE_URL`
    /// - `METAL_LETTERS`: comma-separated, or `ALL` for every partition
    /// - `METAL_PAGE_SIZE`
    /// - `METAL_MAX_WORKERS`
    /// - `METAL_DATABASE`
    /// - `METAL_USER_AGENT`
    /// - `METAL_TIMEOUT_SECS`
    /// - `METAL_DEPTH`: bands, albums, songs
    /// - `METAL_FAILURE_POLICY`: abort, collect
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(url) = env::var("METAL_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(letters) = env::list("METAL_LETTERS") {
            config.letters = expand_letters(letters);
        }
        if let Some(size) = env::parse("METAL_PAGE_SIZE")? {
            config.page_size = size;
        }
        if let Some(workers) = env::parse("METAL_MAX_WORKERS")? {
            config.max_workers = workers;
        }
        if let Some(path) = env::var("METAL_DATABASE") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(agent) = env::var("METAL_USER_AGENT") {
            config.user_agent = agent;
        }
        if let Some(secs) = env::parse("METAL_TIMEOUT_SECS")? {
            config.timeout_secs = Some(secs);
        }
        if let Some(depth) = env::var("METAL_DEPTH") {
            config.depth = depth.parse()?;
        }
        if let Some(policy) = env::var("METAL_FAILURE_POLICY") {
            config.failure_policy = policy.parse()?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ScrapeError::config(format!(
                "base URL must be http(s), got '{}'",
                self.base_url
            )));
        }
        if self.letters.is_empty() {
            return Err(ScrapeError::config("at least one listing letter is required"));
        }
        if self.page_size == 0 {
            return Err(ScrapeError::config("page size must be greater than 0"));
        }
        if self.max_workers == 0 {
            return Err(ScrapeError::config("max workers must be greater than 0"));
        }
        if self.timeout_secs == Some(0) {
            return Err(ScrapeError::config("timeout must be greater than 0 when set"));
        }
        Ok(())
    }

    /// Listing request for one page of a letter; `page` is zero-based
    pub fn listing_url(&self, letter: &str, page: u64) -> String {
        format!(
            "{}/browse/ajax-letter/l/{}/json/1?sEcho={}&iDisplayStart={}&iSortCol_0=0&sSortDir_0=asc",
            self.base_url,
            letter,
            page + 1,
            page * self.page_size
        )
    }

    /// Full discography of one band
    pub fn discography_url(&self, band_id: &str) -> String {
        format!("{}/band/discography/id/{}/tab/all", self.base_url, band_id)
    }
}

/// Expand the `ALL` shorthand into every partition
pub fn expand_letters(letters: Vec<String>) -> Vec<String> {
    if letters.iter().any(|l| l.eq_ignore_ascii_case("all")) {
        ALL_LETTERS.iter().map(|l| l.to_string()).collect()
    } else {
        letters
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config = IngestConfig::default();
        assert_eq!(config.page_size, 500);
        assert_eq!(config.max_workers, 20);
        assert_eq!(config.letters, vec!["Q", "J"]);
        assert_eq!(config.depth, IngestDepth::Bands);
        assert_eq!(config.failure_policy, FailurePolicy::AbortOnFirst);
        assert!(config.timeout_secs.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_listing_url_offsets() {
        let config = IngestConfig {
            base_url: "http://localhost:8080".to_string(),
            page_size: 5,
            ..Default::default()
        };

        assert_eq!(
            config.listing_url("Q", 0),
            "http://localhost:8080/browse/ajax-letter/l/Q/json/1?sEcho=1&iDisplayStart=0&iSortCol_0=0&sSortDir_0=asc"
        );
        assert!(config.listing_url("Q", 2).contains("sEcho=3&iDisplayStart=10"));
    }

    #[test]
    fn test_discography_url() {
        let config = IngestConfig::default();
        assert_eq!(
            config.discography_url("3540"),
            "https://www.metal-archives.com/band/discography/id/3540/tab/all"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_workers = IngestConfig {
            max_workers: 0,
            ..Default::default()
        };
        assert!(zero_workers.validate().is_err());

        let no_letters = IngestConfig {
            letters: vec![],
            ..Default::default()
        };
        assert!(no_letters.validate().is_err());

        let ftp = IngestConfig {
            base_url: "ftp://example.org".to_string(),
            ..Default::default()
        };
        assert!(ftp.validate().is_err());
    }

    #[test]
    fn test_depth_ordering() {
        assert!(!IngestDepth::Bands.includes_albums());
        assert!(IngestDepth::Albums.includes_albums());
        assert!(!IngestDepth::Albums.includes_songs());
        assert!(IngestDepth::Songs.includes_albums());
        assert_eq!("Songs".parse::<IngestDepth>().unwrap(), IngestDepth::Songs);
        assert!("lyrics".parse::<IngestDepth>().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        std::env::set_var("METAL_LETTERS", "all");
        std::env::set_var("METAL_MAX_WORKERS", "4");
        std::env::set_var("METAL_DEPTH", "albums");
        std::env::set_var("METAL_BASE_URL", "http://127.0.0.1:9000/");
        let config = IngestConfig::from_env();
        for key in ["METAL_LETTERS", "METAL_MAX_WORKERS", "METAL_DEPTH", "METAL_BASE_URL"] {
            std::env::remove_var(key);
        }

        let config = config.unwrap();
        assert_eq!(config.letters.len(), ALL_LETTERS.len());
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.depth, IngestDepth::Albums);
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage_numbers() {
        std::env::set_var("METAL_PAGE_SIZE", "lots");
        let result = IngestConfig::from_env();
        std::env::remove_var("METAL_PAGE_SIZE");

        assert!(matches!(result, Err(ScrapeError::Config(_))));
    }
}
