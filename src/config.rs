//! Service endpoint configuration.
//!
//! A single base-address value selects the remote API. Resolution order:
//! explicit override, the `SOBAIXA_API_BASE_URL` environment variable, then
//! the built-in default. Endpoint URLs are built here so query parameters
//! are percent-encoded in exactly one place.

use thiserror::Error;
use url::Url;

/// Default remote service base address, used when no override is set.
pub const DEFAULT_API_BASE_URL: &str = "https://sobaixa-api.onrender.com";

/// Environment variable overriding the service base address.
pub const API_BASE_URL_ENV: &str = "SOBAIXA_API_BASE_URL";

/// Errors from resolving the service configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configured base address is not a usable http(s) URL.
    #[error("invalid API base address {base}: {reason}")]
    InvalidBase {
        /// The rejected base address.
        base: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Remote service configuration shared by the info client and the
/// download launcher.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base: Url,
    referer: String,
}

impl ApiConfig {
    /// Creates a configuration for the given base address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBase`] when the address does not parse
    /// or is not http(s).
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base = Url::parse(base_url).map_err(|error| ConfigError::InvalidBase {
            base: base_url.to_string(),
            reason: error.to_string(),
        })?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBase {
                base: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", base.scheme()),
            });
        }

        let referer = base.origin().ascii_serialization();
        Ok(Self { base, referer })
    }

    /// Resolves the configuration from the environment.
    ///
    /// Uses [`API_BASE_URL_ENV`] when set and non-empty, otherwise
    /// [`DEFAULT_API_BASE_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBase`] when the override value is not
    /// a usable base address.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(API_BASE_URL_ENV) {
            Ok(value) if !value.trim().is_empty() => Self::new(value.trim()),
            _ => Self::new(DEFAULT_API_BASE_URL),
        }
    }

    /// The configured base address.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Referer sent with info requests (the calling origin).
    #[must_use]
    pub fn referer(&self) -> &str {
        &self.referer
    }

    /// Overrides the referer origin.
    #[must_use]
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    /// Builds the metadata endpoint URL for a canonical video URL.
    #[must_use]
    pub fn info_url(&self, canonical_url: &str) -> Url {
        let mut endpoint = self.base.clone();
        endpoint.set_path("/api/info");
        endpoint
            .query_pairs_mut()
            .clear()
            .append_pair("url", canonical_url);
        endpoint
    }

    /// Builds the download endpoint URL for an originally submitted URL and
    /// a format id.
    #[must_use]
    pub fn download_url(&self, original_url: &str, format_id: &str) -> Url {
        let mut endpoint = self.base.clone();
        endpoint.set_path("/api/download");
        endpoint
            .query_pairs_mut()
            .clear()
            .append_pair("url", original_url)
            .append_pair("format_id", format_id);
        endpoint
    }
}

impl Default for ApiConfig {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL).expect("default base address is valid")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_address_parses() {
        let config = ApiConfig::default();
        assert_eq!(config.base().as_str(), "https://sobaixa-api.onrender.com/");
        assert_eq!(config.referer(), "https://sobaixa-api.onrender.com");
    }

    #[test]
    fn test_new_rejects_unparseable_base() {
        let result = ApiConfig::new("not a url");
        assert!(matches!(result, Err(ConfigError::InvalidBase { .. })));
    }

    #[test]
    fn test_new_rejects_non_http_scheme() {
        let result = ApiConfig::new("ftp://files.example.com");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("ftp"), "should name the scheme");
    }

    #[test]
    fn test_info_url_percent_encodes_query() {
        let config = ApiConfig::new("http://localhost:8000").unwrap();
        let endpoint = config.info_url("https://www.youtube.com/watch?v=abc123");

        assert_eq!(endpoint.path(), "/api/info");
        assert_eq!(
            endpoint.query(),
            Some("url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3Dabc123")
        );
    }

    #[test]
    fn test_download_url_carries_both_parameters() {
        let config = ApiConfig::new("http://localhost:8000").unwrap();
        let endpoint = config.download_url("https://youtu.be/abc123", "137");

        assert_eq!(endpoint.path(), "/api/download");
        let pairs: Vec<(String, String)> = endpoint
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("url".to_string(), "https://youtu.be/abc123".to_string()),
                ("format_id".to_string(), "137".to_string()),
            ]
        );
    }

    #[test]
    fn test_with_referer_overrides_origin() {
        let config = ApiConfig::new("http://localhost:8000")
            .unwrap()
            .with_referer("https://sobaixa.app");
        assert_eq!(config.referer(), "https://sobaixa.app");
    }

    #[test]
    fn test_from_env_prefers_override() {
        // Set-and-remove in one test to avoid races with parallel env reads.
        unsafe { std::env::set_var(API_BASE_URL_ENV, "http://127.0.0.1:9999") };
        let config = ApiConfig::from_env().unwrap();
        unsafe { std::env::remove_var(API_BASE_URL_ENV) };

        assert_eq!(config.base().as_str(), "http://127.0.0.1:9999/");

        let fallback = ApiConfig::from_env().unwrap();
        assert_eq!(fallback.base().as_str(), "https://sobaixa-api.onrender.com/");
    }
}
