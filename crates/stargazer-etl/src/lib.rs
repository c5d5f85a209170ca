//! Fetch, normalize and persist pipeline for stargazer.
//!
//! Resolves a date range, pulls Astronomy Picture of the Day entries for it
//! from the NASA API with bounded retries, and upserts them into the local
//! SQLite store. Also fetches Mars rover photos for a single Earth date.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod apod;
pub mod client;
pub mod config;
pub mod dates;
pub mod error;
pub mod mars;
pub mod pipeline;
pub mod retry;
pub mod store;

pub use apod::{normalize, ApodClient, Normalized};
pub use client::{ApiClient, Sleeper, TokioSleeper};
pub use config::Config;
pub use dates::{parse_date, resolve_date_range, DateRange};
pub use error::{IngestError, IngestResult};
pub use mars::{write_photos, MarsClient};
pub use pipeline::{IngestPipeline, IngestReport, IngestRequest};
pub use retry::{Attempt, RetryPolicy, RetryState};
pub use store::Store;
