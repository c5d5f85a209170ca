//! HTTP client that runs the retry state machine for JSON GET requests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::IngestResult;
use crate::retry::{Attempt, RetryPolicy, RetryState};

/// Fixed per-request timeout, independent of the retry budget.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!(
    "stargazer/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/oxur/stargazer)"
);

/// Something that can wait between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    async fn sleep(&self, duration: Duration);
}

/// Waits on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// JSON API client with bounded retries.
///
/// One call to [`ApiClient::get_json`] is one logical fetch that may send up
/// to `max_retries + 1` requests.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ApiClient {
    /// Create a client that sleeps on the tokio timer between attempts.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(policy: RetryPolicy) -> IngestResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            policy,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replace the sleeper used between attempts.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// GET `url` with `query` and return the decoded JSON body.
    ///
    /// Network errors, 429 and 5xx responses are retried per the policy;
    /// anything else fails on the spot.
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> IngestResult<serde_json::Value> {
        let total = self.policy.total_attempts();
        let mut state = RetryState::Attempting { attempt: 0 };

        loop {
            state = match state {
                RetryState::Attempting { attempt } => {
                    log::debug!("GET {} (attempt {}/{})", url, attempt + 1, total);
                    let outcome = self.send(url, query).await;
                    self.policy.transition(attempt, outcome)
                }
                RetryState::Backoff {
                    attempt,
                    wait,
                    reason,
                } => {
                    log::warn!(
                        "Request to {} failed (attempt {}/{}): {}; retrying in {}s",
                        url,
                        attempt + 1,
                        total,
                        reason,
                        wait.as_secs_f64()
                    );
                    self.sleeper.sleep(wait).await;
                    RetryState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                RetryState::Success(payload) => return Ok(payload),
                RetryState::Failed(err) => {
                    log::error!("Request to {} failed: {}", url, err);
                    return Err(err);
                }
            };
        }
    }

    async fn send(&self, url: &str, query: &[(&str, String)]) -> Attempt {
        let response = match self.http.get(url).query(query).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Transport(e.to_string()),
        };

        let status = response.status();
        let headers = response.headers().clone();
        match response.text().await {
            Ok(body) => Attempt::classify(status, &headers, body),
            Err(e) => Attempt::Transport(e.to_string()),
        }
    }
}
