//! Bounded-concurrency fetch pool
//!
//! One [`FetchPool`] is created per run and shared by every stage. Each item
//! runs in its own task and holds a semaphore permit for as long as its
//! worker future is alive, so at most `max_in_flight` workers are active at
//! any instant no matter how many items a stage submits. Results are
//! gathered through a `JoinSet` and therefore arrive in completion order.

use crate::error::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// What a failed item does to the rest of its batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The first failure cancels everything still pending or in flight
    #[default]
    AbortOnFirst,
    /// Keep going; failures are returned next to the successes
    CollectAll,
}

impl std::str::FromStr for FailurePolicy {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "abort" | "abort_on_first" | "fail-fast" => Ok(FailurePolicy::AbortOnFirst),
            "collect" | "collect_all" | "keep-going" => Ok(FailurePolicy::CollectAll),
            other => Err(ScrapeError::config(format!(
                "unknown failure policy '{}', expected abort|collect",
                other
            ))),
        }
    }
}

/// Receives one notification per completed item
pub trait ProgressObserver: Send + Sync {
    fn on_complete(&self, completed: usize, total: usize);

    fn on_finish(&self) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_complete(&self, _completed: usize, _total: usize) {}
}

/// Result of one batch
#[derive(Debug)]
pub struct BatchOutcome<R> {
    /// Successful results, in completion order
    pub successes: Vec<R>,
    /// Per-item failures; always empty under [`FailurePolicy::AbortOnFirst`]
    pub failures: Vec<ScrapeError>,
}

impl<R> BatchOutcome<R> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_successes(self) -> Vec<R> {
        self.successes
    }
}

/// Shared pool of request slots
#[derive(Debug, Clone)]
pub struct FetchPool {
    permits: Arc<Semaphore>,
    max_in_flight: usize,
}

impl FetchPool {
    /// Create a pool; a size of zero is raised to one
    pub fn new(max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Run `worker` over every item with at most `max_in_flight` active at once
    pub async fn map_concurrently<I, R, F, Fut>(
        &self,
        items: Vec<I>,
        worker: F,
        policy: FailurePolicy,
        observer: &dyn ProgressObserver,
    ) -> Result<BatchOutcome<R>>
    where
        I: Send + 'static,
        R: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        let total = items.len();
        let worker = Arc::new(worker);
        let mut tasks = JoinSet::new();

        for item in items {
            let permits = Arc::clone(&self.permits);
            let worker = Arc::clone(&worker);
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|_| ScrapeError::Worker("fetch pool closed".to_string()))?;
                worker(item).await
            });
        }

        debug!(total, max_in_flight = self.max_in_flight, "Submitted batch");

        let mut outcome = BatchOutcome {
            successes: Vec::with_capacity(total),
            failures: Vec::new(),
        };
        let mut completed = 0;

        while let Some(joined) = tasks.join_next().await {
            completed += 1;
            observer.on_complete(completed, total);

            let error = match joined {
                Ok(Ok(result)) => {
                    outcome.successes.push(result);
                    continue;
                },
                Ok(Err(e)) => e,
                Err(join_err) => ScrapeError::from(join_err),
            };

            match policy {
                FailurePolicy::AbortOnFirst => {
                    tasks.abort_all();
                    observer.on_finish();
                    warn!(completed, total, "Aborting batch: {}", error);
                    return Err(error);
                },
                FailurePolicy::CollectAll => {
                    warn!(completed, total, "Item failed: {}", error);
                    outcome.failures.push(error);
                },
            }
        }

        observer.on_finish();
        Ok(outcome)
    }
}
