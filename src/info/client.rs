//! Resilient metadata retrieval client.
//!
//! One public entry point, [`InfoClient::fetch_metadata`]: canonicalize the
//! submitted URL, then run a bounded, strictly sequential attempt loop
//! against the service's info endpoint. Each attempt carries its own
//! deadline; each failure passes through the classifier, and only
//! retryable classifications consume further attempts.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, REFERER, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::ApiConfig;
use crate::normalize::normalize;
use crate::user_agent::BROWSER_USER_AGENT;

use super::error::{AttemptFailure, InfoError, classify};
use super::metadata::VideoMetadata;
use super::retry::RetryPolicy;

/// Default per-attempt deadline for the info request.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Structured error body returned by the service on failure statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Client for the metadata endpoint with bounded retry orchestration.
///
/// Cheap to clone; the underlying connection pool is shared. Independent
/// retrievals may run concurrently, each loop holding its own attempt
/// counter.
#[derive(Debug, Clone)]
pub struct InfoClient {
    http: Client,
    config: ApiConfig,
    retry: RetryPolicy,
    attempt_timeout: Duration,
}

impl InfoClient {
    /// Creates a client with the default retry schedule and deadline.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(config: ApiConfig) -> Self {
        Self::with_retry_policy(config, RetryPolicy::default())
    }

    /// Creates a client with a custom retry schedule.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_retry_policy(config: ApiConfig, retry: RetryPolicy) -> Self {
        let http = Client::builder()
            .gzip(true)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            http,
            config,
            retry,
            attempt_timeout: ATTEMPT_TIMEOUT,
        }
    }

    /// Overrides the per-attempt deadline.
    #[must_use]
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Retrieves metadata for one submitted URL.
    ///
    /// The URL is canonicalized first ([`normalize`]); empty or
    /// whitespace-only input fails with [`InfoError::EmptyUrl`] before any
    /// network activity. Attempts never overlap: each one is fully awaited
    /// before the next is scheduled, with exponential backoff in between.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::Failed`] on a non-retryable classification and
    /// [`InfoError::RetriesExhausted`] when the attempt ceiling is reached
    /// on a retryable one.
    #[instrument(skip(self), fields(url = %raw_url))]
    pub async fn fetch_metadata(&self, raw_url: &str) -> Result<VideoMetadata, InfoError> {
        if raw_url.trim().is_empty() {
            return Err(InfoError::EmptyUrl);
        }

        let canonical = normalize(raw_url.trim());
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;

        loop {
            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                debug!(attempt, delay_ms = delay.as_millis(), "waiting before retry");
                tokio::time::sleep(delay).await;
            }

            match self.attempt_fetch(&canonical).await {
                Ok(metadata) => {
                    info!(attempt, title = %metadata.title, "metadata retrieved");
                    return Ok(metadata);
                }
                Err(failure) => {
                    let classified = classify(&failure);
                    warn!(
                        attempt,
                        kind = ?classified.kind,
                        retryable = classified.retryable,
                        detail = classified.raw_detail.as_deref().unwrap_or_default(),
                        "attempt failed"
                    );

                    if !classified.retryable {
                        return Err(InfoError::Failed(classified));
                    }
                    if attempt + 1 >= max_attempts {
                        return Err(InfoError::RetriesExhausted {
                            attempts: max_attempts,
                            last: classified,
                        });
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Issues a single info request and shapes any failure for the
    /// classifier.
    async fn attempt_fetch(&self, canonical_url: &str) -> Result<VideoMetadata, AttemptFailure> {
        let endpoint = self.config.info_url(canonical_url);

        let response = self
            .http
            .get(endpoint)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(REFERER, self.config.referer())
            .timeout(self.attempt_timeout)
            .send()
            .await
            .map_err(AttemptFailure::Transport)?;

        let status = response.status();
        if !status.is_success() {
            // Error bodies are best-effort JSON; an unreadable one just
            // leaves the detail empty.
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail);
            return Err(AttemptFailure::Status {
                status: status.as_u16(),
                detail,
            });
        }

        response.json().await.map_err(AttemptFailure::Transport)
    }
}
