//! Retry state machine for one logical API fetch.
//!
//! A fetch moves through `Attempting -> (Backoff -> Attempting)* ->
//! Success | Failed`. Every physical request is classified into an
//! [`Attempt`], and [`RetryPolicy::transition`] decides the next state from
//! that classification and whether attempts remain. The table:
//!
//! | attempt            | attempts remain           | last attempt        |
//! |--------------------|---------------------------|---------------------|
//! | `Payload`          | Success                   | Success             |
//! | `Transport`        | Backoff(retry_wait)       | Failed(Network)     |
//! | `RateLimited`      | Backoff(Retry-After or retry_wait) | Failed(ExhaustedRetries) |
//! | `ServerError`      | Backoff(retry_wait)       | Failed(ExhaustedRetries) |
//! | `Rejected`         | Failed(Api)               | Failed(Api)         |
//! | `Malformed`        | Failed(Api)               | Failed(Api)         |

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;

use crate::error::IngestError;

/// Longest error body kept in errors and logs.
const BODY_SNIPPET_CHARS: usize = 200;

/// How a single physical request turned out.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    /// HTTP 200 with a JSON body.
    Payload(serde_json::Value),

    /// The request never produced a response (connect error, timeout,
    /// interrupted body).
    Transport(String),

    /// HTTP 429, with the server's `Retry-After` hint if it sent a usable one.
    RateLimited {
        retry_after: Option<Duration>,
        body: String,
    },

    /// HTTP 5xx.
    ServerError { status: u16, body: String },

    /// Any other non-200 status.
    Rejected { status: u16, body: String },

    /// HTTP 200 whose body is not JSON.
    Malformed { status: u16, body: String },
}

impl Attempt {
    /// Classify a response from its status, headers and body text.
    pub fn classify(status: StatusCode, headers: &HeaderMap, body: String) -> Self {
        let code = status.as_u16();
        if status == StatusCode::OK {
            return match serde_json::from_str(&body) {
                Ok(payload) => Self::Payload(payload),
                Err(_) => Self::Malformed {
                    status: code,
                    body: snippet(&body),
                },
            };
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Self::RateLimited {
                retry_after: parse_retry_after(headers),
                body: snippet(&body),
            };
        }
        if status.is_server_error() {
            return Self::ServerError {
                status: code,
                body: snippet(&body),
            };
        }
        Self::Rejected {
            status: code,
            body: snippet(&body),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Payload(_) => "ok".to_string(),
            Self::Transport(message) => message.clone(),
            Self::RateLimited { body, .. } => format!("HTTP 429: {body}"),
            Self::ServerError { status, body }
            | Self::Rejected { status, body }
            | Self::Malformed { status, body } => format!("HTTP {status}: {body}"),
        }
    }
}

/// Where a fetch currently is.
#[derive(Debug)]
pub enum RetryState {
    /// About to send request number `attempt` (zero-based).
    Attempting { attempt: u32 },

    /// Attempt `attempt` failed transiently; wait before the next one.
    Backoff {
        attempt: u32,
        wait: Duration,
        reason: String,
    },

    Success(serde_json::Value),

    Failed(IngestError),
}

/// Retry budget for one logical fetch: `max_retries + 1` attempts in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_wait: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_wait: Duration) -> Self {
        Self {
            max_retries,
            retry_wait,
        }
    }

    /// Total number of physical requests this policy allows.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Next state after attempt number `attempt` (zero-based) came back as
    /// `outcome`.
    pub fn transition(&self, attempt: u32, outcome: Attempt) -> RetryState {
        let remaining = attempt < self.max_retries;
        let reason = outcome.describe();

        match (outcome, remaining) {
            (Attempt::Payload(payload), _) => RetryState::Success(payload),

            (Attempt::Transport(_), true) | (Attempt::ServerError { .. }, true) => {
                RetryState::Backoff {
                    attempt,
                    wait: self.retry_wait,
                    reason,
                }
            }
            (Attempt::RateLimited { retry_after, .. }, true) => RetryState::Backoff {
                attempt,
                wait: retry_after.unwrap_or(self.retry_wait),
                reason,
            },

            (Attempt::Transport(message), false) => {
                RetryState::Failed(IngestError::Network { message })
            }
            (Attempt::RateLimited { .. }, false) | (Attempt::ServerError { .. }, false) => {
                RetryState::Failed(IngestError::ExhaustedRetries {
                    attempts: attempt + 1,
                    last_error: reason,
                })
            }

            (Attempt::Rejected { status, body }, _) | (Attempt::Malformed { status, body }, _) => {
                RetryState::Failed(IngestError::Api { status, body })
            }
        }
    }
}

/// Read a `Retry-After` header given in whole seconds.
///
/// HTTP-date values and garbage yield `None`, which falls back to the
/// policy's `retry_wait`.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}
