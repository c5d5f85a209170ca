use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Calendar date format used by the APOD API and the `apod_entries` table.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One day's Astronomy Picture of the Day record.
///
/// `date` and `title` are the only fields guaranteed to be present; everything
/// else is whatever the API returned for that day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// The publication day. Primary key of the store.
    pub date: NaiveDate,

    pub title: String,

    pub explanation: Option<String>,

    /// Usually "image", "video" or "other". Not validated.
    pub media_type: Option<String>,

    pub url: Option<String>,

    /// High resolution image URL (`hdurl` in the API payload).
    #[serde(rename = "hdurl")]
    pub hd_url: Option<String>,

    /// Only returned for videos when thumbnails are requested.
    pub thumbnail_url: Option<String>,

    pub service_version: Option<String>,

    pub copyright: Option<String>,
}

impl Entry {
    /// Create an entry with only the required fields set.
    #[must_use]
    pub fn new(date: NaiveDate, title: impl Into<String>) -> Self {
        Self {
            date,
            title: title.into(),
            explanation: None,
            media_type: None,
            url: None,
            hd_url: None,
            thumbnail_url: None,
            service_version: None,
            copyright: None,
        }
    }

    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// The entry date formatted the way it is stored.
    #[must_use]
    pub fn date_key(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// An entry as read back from the store, with the time it was last written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    #[serde(flatten)]
    pub entry: Entry,

    /// Refreshed on every upsert, including ones that change nothing.
    pub fetched_at: DateTime<Utc>,
}
