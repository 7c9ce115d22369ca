//! Resilient metadata retrieval for submitted video URLs.
//!
//! The flow: a raw pasted link is canonicalized, then [`InfoClient`]
//! queries the service's info endpoint under a bounded retry loop with
//! exponential backoff. Failed attempts pass through the classifier in
//! [`error`]; only retryable classifications consume further attempts, and
//! callers only ever see [`ClassifiedFailure`] values, never raw transport
//! errors.
//!
//! # Example
//!
//! ```no_run
//! use sobaixa_core::{ApiConfig, InfoClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = InfoClient::new(ApiConfig::from_env()?);
//! let metadata = client
//!     .fetch_metadata("https://youtu.be/dQw4w9WgXcQ")
//!     .await?;
//! println!("{} ({})", metadata.title, metadata.duration_string);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod error;
mod metadata;
mod retry;

pub use client::{ATTEMPT_TIMEOUT, InfoClient};
pub use error::{AttemptFailure, ClassifiedFailure, ErrorKind, InfoError, classify};
pub use metadata::{Format, VideoMetadata};
pub use retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};
