//! Client configuration.
//!
//! Plain data with consuming `with_*` setters, resolvable from the
//! environment (`WORKWAY_API_URL`, `WORKWAY_API_TOKEN`). The bearer token
//! lives in a [`SecretString`] so it never appears in Debug output or logs.

use std::time::Duration;

use secrecy::SecretString;
use workway_core::{Result, WorkwayError};

/// Environment variable naming the API base URL.
pub const ENV_API_URL: &str = "WORKWAY_API_URL";
/// Environment variable carrying a static bearer token.
pub const ENV_API_TOKEN: &str = "WORKWAY_API_TOKEN";

/// Deadline for one request, send to last response byte.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A token expiring within this much of "now" is refreshed before the
/// request is attempted, instead of burning a guaranteed-failing round trip.
pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::from_secs(60);

/// Configuration for an [`HttpClient`](crate::client::HttpClient).
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL every request path is joined onto.
    pub base_url: String,
    /// Per-request deadline.
    pub timeout: Duration,
    /// Proactive token refresh window.
    pub refresh_threshold: Duration,
    /// Outbound request budget; `None` disables the limiter entirely.
    pub requests_per_second: Option<u32>,
    /// Static bearer token, for callers without a refresh provider.
    pub bearer_token: Option<SecretString>,
}

impl HttpClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            refresh_threshold: DEFAULT_REFRESH_THRESHOLD,
            requests_per_second: None,
            bearer_token: None,
        }
    }

    /// Read the base URL and optional token from the environment.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(ENV_API_URL)
            .map_err(|_| WorkwayError::missing_field(ENV_API_URL))?;
        let mut config = Self::new(base_url);
        if let Ok(token) = std::env::var(ENV_API_TOKEN) {
            if !token.is_empty() {
                config.bearer_token = Some(SecretString::from(token));
            }
        }
        Ok(config)
    }

    /// Set the per-request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the proactive refresh window.
    pub fn with_refresh_threshold(mut self, threshold: Duration) -> Self {
        self.refresh_threshold = threshold;
        self
    }

    /// Cap outbound requests per second.
    pub fn with_requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = Some(rps);
        self
    }

    /// Attach a static bearer token.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(SecretString::from(token.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = HttpClientConfig::new("https://api.workway.test");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.refresh_threshold, Duration::from_secs(60));
        assert!(config.requests_per_second.is_none());
        assert!(config.bearer_token.is_none());
    }

    #[test]
    fn debug_output_never_contains_the_token() {
        let config =
            HttpClientConfig::new("https://api.workway.test").with_bearer_token("sk-very-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"), "{debug}");
    }

    #[test]
    fn from_env_requires_the_url() {
        // Sequential set/remove in one test: env vars are process-global.
        std::env::remove_var(ENV_API_URL);
        let err = HttpClientConfig::from_env().unwrap_err();
        assert_eq!(err.code, workway_core::ErrorCode::MissingField);

        std::env::set_var(ENV_API_URL, "https://api.workway.test");
        std::env::set_var(ENV_API_TOKEN, "tok");
        let config = HttpClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, "https://api.workway.test");
        assert!(config.bearer_token.is_some());
        std::env::remove_var(ENV_API_URL);
        std::env::remove_var(ENV_API_TOKEN);
    }
}
