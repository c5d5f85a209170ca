//! Astronomy Picture of the Day fetcher.
//!
//! Queries the APOD endpoint for a resolved date range and normalizes the
//! payload into [`Entry`] records. The API answers a single-day query with
//! an object and a range query with an array; both are treated as a list of
//! candidates. Candidates without a usable `date` or `title` are dropped and
//! counted; every other field is kept only when it is a string.

use chrono::NaiveDate;
use serde_json::Value;

use stargazer_core::model::{Entry, DATE_FORMAT};

use crate::client::ApiClient;
use crate::dates::DateRange;
use crate::error::IngestResult;

/// Path of the APOD endpoint below the API base URL.
pub const APOD_PATH: &str = "/planetary/apod";

/// Result of normalizing one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    /// Accepted entries, in payload order.
    pub entries: Vec<Entry>,
    /// Candidates discarded for a missing or unusable `date` or `title`.
    pub dropped: usize,
}

/// Normalize an APOD payload into entries.
pub fn normalize(payload: Value) -> Normalized {
    let candidates = match payload {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut normalized = Normalized::default();
    for candidate in candidates {
        match to_entry(candidate) {
            Some(entry) => normalized.entries.push(entry),
            None => normalized.dropped += 1,
        }
    }
    normalized
}

fn to_entry(candidate: Value) -> Option<Entry> {
    let Value::Object(fields) = candidate else {
        log::debug!("Skipping non-object entry");
        return None;
    };
    let text = |key: &str| fields.get(key).and_then(Value::as_str);

    let Some(date_str) = text("date").map(str::trim).filter(|s| !s.is_empty()) else {
        log::debug!("Skipping entry missing date: {:?}", text("title"));
        return None;
    };
    let Some(title) = text("title").filter(|s| !s.is_empty()) else {
        log::debug!("Skipping entry missing title for {}", date_str);
        return None;
    };
    let Ok(date) = NaiveDate::parse_from_str(date_str, DATE_FORMAT) else {
        log::debug!("Skipping entry with malformed date '{}'", date_str);
        return None;
    };

    // Optional fields of an unexpected type are treated as absent.
    let optional = |key: &str| text(key).map(str::to_string);
    Some(Entry {
        date,
        title: title.to_string(),
        explanation: optional("explanation"),
        media_type: optional("media_type"),
        url: optional("url"),
        hd_url: optional("hdurl"),
        thumbnail_url: optional("thumbnail_url"),
        service_version: optional("service_version"),
        copyright: optional("copyright"),
    })
}

/// APOD API client.
#[derive(Debug, Clone)]
pub struct ApodClient {
    api: ApiClient,
    base_url: String,
    api_key: String,
    thumbs: bool,
}

impl ApodClient {
    /// Create a client for the API rooted at `base_url`
    /// (e.g. `https://api.nasa.gov`).
    pub fn new(api: ApiClient, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            thumbs: true,
        }
    }

    /// Whether to ask for video thumbnails (`thumbs=true`). On by default.
    #[must_use]
    pub fn with_thumbs(mut self, thumbs: bool) -> Self {
        self.thumbs = thumbs;
        self
    }

    fn query(&self, range: DateRange) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("api_key", self.api_key.clone()),
            ("start_date", range.start.format(DATE_FORMAT).to_string()),
            ("end_date", range.end.format(DATE_FORMAT).to_string()),
        ];
        if self.thumbs {
            query.push(("thumbs", "true".to_string()));
        }
        query
    }

    /// Fetch and normalize every entry in `range`.
    ///
    /// Either the whole normalized list comes back or the call fails; there
    /// is no partial result.
    pub async fn fetch_range(&self, range: DateRange) -> IngestResult<Normalized> {
        let url = format!("{}{}", self.base_url, APOD_PATH);
        let payload = self.api.get_json(&url, &self.query(range)).await?;

        let normalized = normalize(payload);
        if normalized.dropped > 0 {
            log::info!(
                "Dropped {} entries without a date or title",
                normalized.dropped
            );
        }
        Ok(normalized)
    }
}
