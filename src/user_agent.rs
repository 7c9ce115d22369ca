//! Shared User-Agent string for service requests.

/// Browser-identifying User-Agent sent on metadata requests.
///
/// The upstream video site challenges clients that do not look like a
/// browser, so info requests identify as a desktop one.
pub(crate) const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
