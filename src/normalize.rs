//! Canonical form for submitted video URLs.
//!
//! Pasted links arrive in many shapes: `watch` URLs dragging playlist and
//! tracking parameters, `youtu.be` short links, mobile-host variants.
//! Everything that names a video by id is rewritten to one stable watch
//! form carrying only the `v` parameter, so request keys stay comparable.
//! Links that match no known shape pass through unchanged; normalization
//! is never a reason to block a submission.

use tracing::{debug, warn};
use url::Url;

/// Canonical watch-page prefix for normalized video URLs.
const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Host used by short video links.
const SHORT_LINK_HOST: &str = "youtu.be";

/// Rewrites `raw` to the canonical watch form when it identifies a video.
///
/// Rules, in order:
/// 1. A `v` query parameter wins regardless of host; the output carries
///    only that parameter.
/// 2. On the short-link host, the first path segment is the video id.
/// 3. Any other well-formed URL passes through unchanged.
///
/// Unparseable input is returned as-is with a diagnostic warning; the
/// caller decides whether to submit it. Idempotent: normalizing an
/// already-canonical URL returns it unchanged.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let parsed = match Url::parse(raw) {
        Ok(parsed) => parsed,
        Err(error) => {
            warn!(url = %raw, %error, "URL did not parse; submitting unnormalized");
            return raw.to_string();
        }
    };

    if let Some((_, id)) = parsed.query_pairs().find(|(key, _)| key == "v")
        && !id.is_empty()
    {
        let canonical = format!("{WATCH_URL_PREFIX}{id}");
        debug!(url = %raw, canonical = %canonical, "normalized watch URL");
        return canonical;
    }

    if parsed.host_str() == Some(SHORT_LINK_HOST)
        && let Some(id) = parsed.path_segments().and_then(|mut segments| segments.next())
        && !id.is_empty()
    {
        let canonical = format!("{WATCH_URL_PREFIX}{id}");
        debug!(url = %raw, canonical = %canonical, "normalized short link");
        return canonical;
    }

    raw.to_string()
}
