//! Failure classification for metadata retrieval.
//!
//! Every failed attempt is reduced to a [`ClassifiedFailure`]: a taxonomy
//! entry, a retry decision, and a user-facing message. The message comes
//! from a fixed per-kind table and never carries transport internals; the
//! raw diagnostic text survives in `raw_detail` for logs.

use std::fmt;

use thiserror::Error;

/// Marker the upstream video site embeds in error detail text when it
/// answers with an authentication challenge instead of metadata. Treated
/// as rate limiting.
const SIGN_IN_CHALLENGE_MARKER: &str = "Sign in to confirm";

/// Fixed user-facing messages keyed by failure kind.
const RATE_LIMITED_MESSAGE: &str =
    "The video service is limiting requests right now. Wait a few minutes and try again.";
const INVALID_REQUEST_MESSAGE: &str =
    "Invalid link or unavailable video. Check the submitted URL.";
const UPSTREAM_SERVER_MESSAGE: &str = "Temporary server error. Try again in a few seconds.";
const NETWORK_OR_TIMEOUT_MESSAGE: &str =
    "Connection problem. Check your network and try again.";

/// Failure taxonomy for metadata retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The service or its upstream is throttling requests.
    RateLimited,
    /// The submitted link is invalid or the video is unavailable.
    InvalidRequest,
    /// The service failed upstream (5xx).
    UpstreamServerError,
    /// Connectivity failure or per-attempt deadline exceeded.
    NetworkOrTimeout,
    /// A non-success status outside the known taxonomy.
    UnexpectedStatus,
    /// Anything that resists classification.
    Unknown,
}

impl ErrorKind {
    /// Whether a failure of this kind may succeed on retry.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::UpstreamServerError | Self::NetworkOrTimeout
        )
    }
}

/// One raw failed attempt, before classification.
#[derive(Debug)]
pub enum AttemptFailure {
    /// Non-success HTTP response, with the `detail` text of a structured
    /// error body when one was readable.
    Status {
        /// The HTTP status code.
        status: u16,
        /// `detail` field of the error body, if any.
        detail: Option<String>,
    },
    /// Transport-level error: connect failure, deadline exceeded, or a
    /// body/decode problem.
    Transport(reqwest::Error),
}

/// A classified failure: taxonomy entry, retry decision, and the message
/// shown to the user.
#[derive(Debug, Clone)]
pub struct ClassifiedFailure {
    /// Taxonomy entry.
    pub kind: ErrorKind,
    /// Whether the fetch loop may spend another attempt on this.
    pub retryable: bool,
    /// Stable message for presentation; never contains raw detail.
    pub user_message: String,
    /// Raw diagnostic text for logs.
    pub raw_detail: Option<String>,
}

impl ClassifiedFailure {
    fn new(kind: ErrorKind, user_message: String, raw_detail: Option<String>) -> Self {
        Self {
            kind,
            retryable: kind.is_retryable(),
            user_message,
            raw_detail,
        }
    }
}

impl fmt::Display for ClassifiedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message)
    }
}

/// Reduces a raw failed attempt to its classification.
///
/// Rules apply in priority order: rate limiting (status 429 or a sign-in
/// challenge in the error detail) before the specific status buckets, and
/// transport failures after all status handling.
#[must_use]
pub fn classify(failure: &AttemptFailure) -> ClassifiedFailure {
    match failure {
        AttemptFailure::Status { status, detail } => classify_status(*status, detail.as_deref()),
        AttemptFailure::Transport(error) => classify_transport(error),
    }
}

fn classify_status(status: u16, detail: Option<&str>) -> ClassifiedFailure {
    let raw_detail = detail.map(str::to_string);

    if status == 429 || detail.is_some_and(|text| text.contains(SIGN_IN_CHALLENGE_MARKER)) {
        return ClassifiedFailure::new(
            ErrorKind::RateLimited,
            RATE_LIMITED_MESSAGE.to_string(),
            raw_detail,
        );
    }

    if status == 400 {
        return ClassifiedFailure::new(
            ErrorKind::InvalidRequest,
            INVALID_REQUEST_MESSAGE.to_string(),
            raw_detail,
        );
    }

    if status >= 500 {
        return ClassifiedFailure::new(
            ErrorKind::UpstreamServerError,
            UPSTREAM_SERVER_MESSAGE.to_string(),
            raw_detail,
        );
    }

    ClassifiedFailure::new(
        ErrorKind::UnexpectedStatus,
        format!("Unexpected response from the service (HTTP {status})."),
        raw_detail.or_else(|| Some(format!("HTTP {status}"))),
    )
}

fn classify_transport(error: &reqwest::Error) -> ClassifiedFailure {
    let raw_detail = Some(error.to_string());

    // Decode failures are checked first: a 2xx with a malformed body is not
    // a connectivity problem and retrying it would not help.
    if error.is_decode() {
        return ClassifiedFailure::new(ErrorKind::Unknown, error.to_string(), raw_detail);
    }

    if error.is_timeout() || error.is_connect() || error.is_request() || error.is_body() {
        return ClassifiedFailure::new(
            ErrorKind::NetworkOrTimeout,
            NETWORK_OR_TIMEOUT_MESSAGE.to_string(),
            raw_detail,
        );
    }

    ClassifiedFailure::new(ErrorKind::Unknown, error.to_string(), raw_detail)
}

/// Terminal error for one metadata retrieval.
#[derive(Debug, Error)]
pub enum InfoError {
    /// Submission rejected before any network activity.
    #[error("no URL provided")]
    EmptyUrl,

    /// A non-retryable classified failure.
    #[error("{}", .0.user_message)]
    Failed(ClassifiedFailure),

    /// The attempt ceiling was reached; wraps the last classified failure.
    #[error("failed after {attempts} attempts: {}", .last.user_message)]
    RetriesExhausted {
        /// Total attempts made.
        attempts: u32,
        /// Classification of the final attempt.
        last: ClassifiedFailure,
    },
}

impl InfoError {
    /// The classification behind this error, when one exists.
    #[must_use]
    pub fn classification(&self) -> Option<&ClassifiedFailure> {
        match self {
            Self::EmptyUrl => None,
            Self::Failed(failure) => Some(failure),
            Self::RetriesExhausted { last, .. } => Some(last),
        }
    }
}
