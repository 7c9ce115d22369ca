//! Per-format download dispatch tracking.
//!
//! Starting a download is a fire-and-forget side effect: the service owns
//! the transfer and reports nothing back. [`DispatchTracker`] is the small
//! state machine in front of that side effect. It records which format ids
//! currently have a dispatch in flight so rapid repeat requests for the
//! same format collapse into one, and it frees each slot after a fixed
//! settle period regardless of what the transfer did.
//!
//! Per format id the machine is Idle → Dispatching → Idle. There is no
//! Dispatching → Dispatching transition and the settle timer is never
//! cancelled.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::config::ApiConfig;

/// Settle period after which a dispatched format id is considered free
/// again, independent of actual transfer completion.
pub const SETTLE_PERIOD: Duration = Duration::from_secs(2);

/// One download request: the originally submitted URL plus a format id
/// from the most recently fetched metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// The URL as the user submitted it (not the canonical form).
    pub url: String,
    /// Chosen format id.
    pub format_id: String,
}

/// Errors from triggering the download side effect.
///
/// These never affect tracker state: a failed launch still occupies its
/// slot until the settle period elapses.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The download endpoint could not be reached.
    #[error("failed to start download for format {format_id}: {source}")]
    Endpoint {
        /// Format whose launch failed.
        format_id: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The environment refused to start the download (e.g. the navigation
    /// was blocked).
    #[error("download for format {format_id} was blocked: {reason}")]
    Blocked {
        /// Format whose launch was blocked.
        format_id: String,
        /// Why initiation was refused.
        reason: String,
    },
}

/// Outcome of a dispatch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The download side effect was triggered.
    Started,
    /// The format already had a dispatch in flight; nothing was done.
    AlreadyInFlight,
}

/// Side effect that actually starts a download.
///
/// The tracker never inspects the transfer; implementations fire the
/// initiation and report only whether initiation itself failed.
#[async_trait]
pub trait DownloadLauncher: Send + Sync {
    /// Triggers the download for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when initiation fails.
    async fn launch(&self, request: &DownloadRequest) -> Result<(), DispatchError>;
}

/// Launcher that hits the service's download endpoint.
///
/// The response body is dropped unread; the service streams the file to
/// whatever follows the URL.
#[derive(Debug, Clone)]
pub struct HttpDownloadLauncher {
    http: Client,
    config: ApiConfig,
}

impl HttpDownloadLauncher {
    /// Creates a launcher against the configured service.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(config: ApiConfig) -> Self {
        let http = Client::builder()
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { http, config }
    }
}

#[async_trait]
impl DownloadLauncher for HttpDownloadLauncher {
    async fn launch(&self, request: &DownloadRequest) -> Result<(), DispatchError> {
        let endpoint = self.config.download_url(&request.url, &request.format_id);
        debug!(format_id = %request.format_id, endpoint = %endpoint, "starting download");

        self.http
            .get(endpoint)
            .send()
            .await
            .map_err(|source| DispatchError::Endpoint {
                format_id: request.format_id.clone(),
                source,
            })?;
        Ok(())
    }
}

/// Tracks which format ids currently have a download dispatch in flight.
///
/// The in-flight set is an owned mapping of format id to dispatch
/// timestamp, mutated only through [`begin_dispatch`](Self::begin_dispatch)
/// and the settle timer. `DashMap` keeps the guard that concurrent
/// `begin_dispatch` and timer removal race safely on the same key.
#[derive(Clone)]
pub struct DispatchTracker {
    launcher: Arc<dyn DownloadLauncher>,
    settle_period: Duration,
    in_flight: Arc<DashMap<String, Instant>>,
}

impl DispatchTracker {
    /// Creates a tracker with the default settle period.
    #[must_use]
    pub fn new(launcher: Arc<dyn DownloadLauncher>) -> Self {
        Self::with_settle_period(launcher, SETTLE_PERIOD)
    }

    /// Creates a tracker with a custom settle period.
    #[must_use]
    pub fn with_settle_period(launcher: Arc<dyn DownloadLauncher>, settle_period: Duration) -> Self {
        Self {
            launcher,
            settle_period,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Dispatches a download unless its format id already has one in
    /// flight.
    ///
    /// Idempotent within the settle period: a second call for the same
    /// format id is a no-op returning
    /// [`DispatchOutcome::AlreadyInFlight`]. The id is recorded before the
    /// launcher runs and removed only by the settle timer, so a failed
    /// launch still occupies the slot for the full settle period.
    ///
    /// # Errors
    ///
    /// Propagates [`DispatchError`] from the launcher; tracker state is
    /// unaffected by launcher failure.
    #[instrument(skip(self), fields(format_id = %request.format_id))]
    pub async fn begin_dispatch(
        &self,
        request: &DownloadRequest,
    ) -> Result<DispatchOutcome, DispatchError> {
        use dashmap::mapref::entry::Entry;

        match self.in_flight.entry(request.format_id.clone()) {
            Entry::Occupied(_) => {
                debug!("dispatch already in flight; ignoring");
                return Ok(DispatchOutcome::AlreadyInFlight);
            }
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
            }
        }

        self.schedule_release(request.format_id.clone());

        if let Err(error) = self.launcher.launch(request).await {
            warn!(%error, "download launch failed; slot clears after settle period");
            return Err(error);
        }

        Ok(DispatchOutcome::Started)
    }

    /// Whether the given format id currently has a dispatch in flight.
    /// Pure query, no side effect.
    #[must_use]
    pub fn is_dispatching(&self, format_id: &str) -> bool {
        self.in_flight.contains_key(format_id)
    }

    /// Removes the id unconditionally once the settle period elapses.
    fn schedule_release(&self, format_id: String) {
        let in_flight = Arc::clone(&self.in_flight);
        let settle_period = self.settle_period;
        tokio::spawn(async move {
            tokio::time::sleep(settle_period).await;
            in_flight.remove(&format_id);
            debug!(format_id = %format_id, "dispatch slot released");
        });
    }
}

impl std::fmt::Debug for DispatchTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTracker")
            .field("settle_period", &self.settle_period)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Launcher that counts calls and optionally fails.
    #[derive(Debug, Default)]
    struct RecordingLauncher {
        calls: AtomicUsize,
        fail: bool,
    }

    impl RecordingLauncher {
        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DownloadLauncher for RecordingLauncher {
        async fn launch(&self, request: &DownloadRequest) -> Result<(), DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DispatchError::Blocked {
                    format_id: request.format_id.clone(),
                    reason: "refused by test".to_string(),
                });
            }
            Ok(())
        }
    }

    fn request(format_id: &str) -> DownloadRequest {
        DownloadRequest {
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            format_id: format_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_begin_dispatch_marks_format_in_flight() {
        let launcher = Arc::new(RecordingLauncher::default());
        let tracker = DispatchTracker::new(Arc::clone(&launcher) as Arc<dyn DownloadLauncher>);

        let outcome = tracker.begin_dispatch(&request("f1")).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Started);
        assert!(tracker.is_dispatching("f1"));
        assert_eq!(launcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_dispatch_within_settle_period_is_noop() {
        let launcher = Arc::new(RecordingLauncher::default());
        let tracker = DispatchTracker::with_settle_period(
            Arc::clone(&launcher) as Arc<dyn DownloadLauncher>,
            Duration::from_secs(60),
        );

        let first = tracker.begin_dispatch(&request("f1")).await.unwrap();
        let second = tracker.begin_dispatch(&request("f1")).await.unwrap();

        assert_eq!(first, DispatchOutcome::Started);
        assert_eq!(second, DispatchOutcome::AlreadyInFlight);
        assert_eq!(launcher.call_count(), 1, "side effect must fire once");
        assert!(tracker.is_dispatching("f1"));
    }

    #[tokio::test]
    async fn test_independent_formats_do_not_block_each_other() {
        let launcher = Arc::new(RecordingLauncher::default());
        let tracker = DispatchTracker::with_settle_period(
            Arc::clone(&launcher) as Arc<dyn DownloadLauncher>,
            Duration::from_secs(60),
        );

        tracker.begin_dispatch(&request("f1")).await.unwrap();
        tracker.begin_dispatch(&request("f2")).await.unwrap();

        assert!(tracker.is_dispatching("f1"));
        assert!(tracker.is_dispatching("f2"));
        assert_eq!(launcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_slot_released_after_settle_period() {
        let launcher = Arc::new(RecordingLauncher::default());
        let tracker = DispatchTracker::with_settle_period(
            Arc::clone(&launcher) as Arc<dyn DownloadLauncher>,
            Duration::from_millis(50),
        );

        tracker.begin_dispatch(&request("f1")).await.unwrap();
        assert!(tracker.is_dispatching("f1"));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!tracker.is_dispatching("f1"));

        // A fresh dispatch for the same id goes through again.
        let outcome = tracker.begin_dispatch(&request("f1")).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Started);
        assert_eq!(launcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_launch_failure_reported_but_slot_still_settles() {
        let launcher = Arc::new(RecordingLauncher::failing());
        let tracker = DispatchTracker::with_settle_period(
            Arc::clone(&launcher) as Arc<dyn DownloadLauncher>,
            Duration::from_millis(50),
        );

        let result = tracker.begin_dispatch(&request("f1")).await;
        assert!(matches!(result, Err(DispatchError::Blocked { .. })));

        // The failed launch occupies the slot until the settle period ends.
        assert!(tracker.is_dispatching("f1"));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!tracker.is_dispatching("f1"));
    }

    #[tokio::test]
    async fn test_is_dispatching_unknown_id_false() {
        let launcher = Arc::new(RecordingLauncher::default());
        let tracker = DispatchTracker::new(launcher as Arc<dyn DownloadLauncher>);
        assert!(!tracker.is_dispatching("nope"));
    }
}
