//! Listing pagination
//!
//! The listing endpoint reports its total record count on every page. The
//! first page decides how many more pages to request; pages of one partition
//! are fetched sequentially, partitions run in parallel on the shared pool.

use crate::config::IngestConfig;
use crate::error::{Result, ScrapeError};
use crate::http::PageSource;
use crate::models::{EntityReference, PartitionKey};
use crate::pool::{BatchOutcome, FailurePolicy, FetchPool, ProgressObserver};
use serde_json::Value;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{debug, info};

/// One decoded page of the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub total_records: u64,
    pub references: Vec<EntityReference>,
}

/// Decode a listing body
///
/// The total may be a number or a numeric string. Each row's first cell holds
/// an anchor; the link is the text between the first pair of single quotes.
pub fn parse_listing_page(body: &str) -> Result<ListingPage> {
    let json: Value = serde_json::from_str(body)?;

    let total = json
        .get("iTotalRecords")
        .or_else(|| json.get("totalRecords"))
        .ok_or_else(|| ScrapeError::parse("listing page has no total record count"))?;
    let total_records = match total {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| ScrapeError::parse(format!("invalid total record count: {}", total)))?;

    let rows = match json.get("aaData").or_else(|| json.get("rows")) {
        Some(Value::Array(rows)) => rows.as_slice(),
        Some(other) => {
            return Err(ScrapeError::parse(format!(
                "listing rows are not an array: {}",
                other
            )))
        },
        None => &[],
    };

    let references = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.get(0)
                .and_then(Value::as_str)
                .and_then(quoted_link)
                .map(EntityReference::new)
                .ok_or_else(|| ScrapeError::parse(format!("listing row {} has no link", i)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ListingPage {
        total_records,
        references,
    })
}

fn quoted_link(cell: &str) -> Option<&str> {
    cell.split('\'').nth(1).filter(|link| !link.is_empty())
}

/// Page numbers still to request once page 0 reported `total_records`
///
/// `floor(total / page_size)` more pages, so an exact multiple of the page
/// size ends with an empty trailing page.
pub fn remaining_pages(total_records: u64, page_size: u64) -> Result<RangeInclusive<u64>> {
    if page_size == 0 {
        return Err(ScrapeError::config("page size must be greater than 0"));
    }
    Ok(1..=total_records / page_size)
}

/// Walks the listing of each partition
pub struct PaginationDiscoverer {
    config: Arc<IngestConfig>,
    source: Arc<dyn PageSource>,
}

impl PaginationDiscoverer {
    pub fn new(config: Arc<IngestConfig>, source: Arc<dyn PageSource>) -> Self {
        Self { config, source }
    }

    /// Collect every entity reference listed under one partition
    pub async fn discover(&self, partition: &PartitionKey) -> Result<Vec<EntityReference>> {
        let letter = partition.as_str();
        if self.config.page_size == 0 {
            return Err(ScrapeError::config("page size must be greater than 0"));
        }

        let first = self.fetch_page(letter, 0).await?;
        let pages = remaining_pages(first.total_records, self.config.page_size)?;

        debug!(
            letter,
            total_records = first.total_records,
            extra_pages = *pages.end(),
            "Listing size known"
        );

        let mut references = first.references;
        for page in pages {
            let listing = self.fetch_page(letter, page).await?;
            references.extend(listing.references);
        }

        info!("Fetched {} links for letter {}", references.len(), letter);
        Ok(references)
    }

    /// Discover every partition on the pool; partitions finish in any order
    ///
    /// References of every finished partition are flattened into
    /// `successes`; under [`FailurePolicy::CollectAll`] each failed partition
    /// leaves one entry in `failures`.
    pub async fn discover_all(
        self: &Arc<Self>,
        partitions: Vec<PartitionKey>,
        pool: &FetchPool,
        policy: FailurePolicy,
        observer: &dyn ProgressObserver,
    ) -> Result<BatchOutcome<EntityReference>> {
        let discoverer = Arc::clone(self);
        let outcome = pool
            .map_concurrently(
                partitions,
                move |partition| {
                    let discoverer = Arc::clone(&discoverer);
                    async move { discoverer.discover(&partition).await }
                },
                policy,
                observer,
            )
            .await?;

        Ok(BatchOutcome {
            successes: outcome.successes.into_iter().flatten().collect(),
            failures: outcome.failures,
        })
    }

    async fn fetch_page(&self, letter: &str, page: u64) -> Result<ListingPage> {
        let url = self.config.listing_url(letter, page);
        let body = self.source.fetch(&url).await?;
        parse_listing_page(&body)
    }
}
