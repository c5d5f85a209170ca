//! Resolve -> fetch -> store for one ingestion run.

use chrono::NaiveDate;

use crate::apod::ApodClient;
use crate::client::ApiClient;
use crate::config::Config;
use crate::dates::{resolve_date_range, DateRange};
use crate::error::IngestResult;
use crate::store::Store;

/// What the caller asked to ingest, before defaulting and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestRequest {
    pub days: i64,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Default for IngestRequest {
    fn default() -> Self {
        Self {
            days: 30,
            start: None,
            end: None,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub range: DateRange,
    /// Entries that survived normalization.
    pub fetched: usize,
    /// Candidates dropped during normalization.
    pub dropped: usize,
    /// Entries written to the store.
    pub stored: usize,
}

/// The ingestion pipeline.
///
/// Failures from any step propagate unchanged. A failed run is meant to be
/// re-run as a whole; the upsert makes that safe.
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    fetcher: ApodClient,
    store: Store,
}

impl IngestPipeline {
    /// Build the pipeline from configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &Config) -> IngestResult<Self> {
        let api = ApiClient::new(config.retry_policy())?;
        let fetcher = ApodClient::new(api, &config.base_url, config.api_key_or_demo());
        Ok(Self::from_parts(fetcher, Store::new(&config.database_path)))
    }

    pub fn from_parts(fetcher: ApodClient, store: Store) -> Self {
        Self { fetcher, store }
    }

    /// Whether the fetcher asks for video thumbnails.
    #[must_use]
    pub fn with_thumbs(mut self, thumbs: bool) -> Self {
        self.fetcher = self.fetcher.with_thumbs(thumbs);
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Run once for `request`, treating `today` as the latest fetchable day.
    ///
    /// # Errors
    /// Returns `InvalidRange` before any request is made if the range cannot
    /// be resolved; otherwise the first fetch or store failure.
    pub async fn run(&self, request: IngestRequest, today: NaiveDate) -> IngestResult<IngestReport> {
        let range = resolve_date_range(request.days, request.start, request.end, today)?;
        log::info!("Fetching APOD entries from {}", range);

        let normalized = self.fetcher.fetch_range(range).await?;
        let stored = self.store.upsert(&normalized.entries)?;
        log::info!(
            "Stored {} entries into {}",
            stored,
            self.store.path().display()
        );

        Ok(IngestReport {
            range,
            fetched: normalized.entries.len(),
            dropped: normalized.dropped,
            stored,
        })
    }
}
