//! Error types for catalog ingestion

use thiserror::Error;

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Error types for catalog ingestion
///
/// Extraction gaps and malformed child rows are not errors; extractors drop
/// them silently. Everything here aborts the stage it occurs in.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Row {row} of table '{table}' has no value for required column '{column}'")]
    MissingIdentifier {
        table: String,
        column: String,
        row: usize,
    },

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Transport and parse failures come from the remote catalog; the rest are local
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ScrapeError::Transport { .. } | ScrapeError::Status { .. } | ScrapeError::Parse(_)
        )
    }
}

impl From<serde_json::Error> for ScrapeError {
    fn from(err: serde_json::Error) -> Self {
        ScrapeError::Parse(err.to_string())
    }
}

impl From<metal_common::CommonError> for ScrapeError {
    fn from(err: metal_common::CommonError) -> Self {
        ScrapeError::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ScrapeError {
    fn from(err: tokio::task::JoinError) -> Self {
        ScrapeError::Worker(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_classification() {
        assert!(ScrapeError::parse("no total").is_remote());
        assert!(ScrapeError::Status {
            url: "http://x".into(),
            status: 503
        }
        .is_remote());
        assert!(!ScrapeError::config("bad").is_remote());
        assert!(!ScrapeError::Worker("panicked".into()).is_remote());
    }

    #[test]
    fn test_missing_identifier_message() {
        let err = ScrapeError::MissingIdentifier {
            table: "band".into(),
            column: "id".into(),
            row: 3,
        };
        assert_eq!(
            err.to_string(),
            "Row 3 of table 'band' has no value for required column 'id'"
        );
    }
}
