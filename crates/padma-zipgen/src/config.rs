//! Archive worker client configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the archive worker HTTP client.
///
/// All fields can be provided via command-line arguments or environment
/// variables when the `config` feature is enabled.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(clap::Args))]
pub struct ZipGenConfig {
    /// Endpoint accepting archive job submissions.
    #[cfg_attr(feature = "config", arg(long, env = "ZIPGEN_ENDPOINT"))]
    pub zipgen_endpoint: Url,

    /// Shared secret for HMAC-SHA256 payload signing.
    ///
    /// Submissions are sent unsigned when no secret is configured.
    #[cfg_attr(feature = "config", arg(long, env = "ZIPGEN_SECRET"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zipgen_secret: Option<String>,

    /// HTTP request timeout in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "ZIPGEN_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_timeout_secs")]
    pub zipgen_timeout: u64,

    /// User-Agent header to send with requests.
    #[cfg_attr(feature = "config", arg(long, env = "ZIPGEN_USER_AGENT"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipgen_user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ZipGenConfig {
    /// Creates a new configuration for the given worker endpoint.
    pub fn new(endpoint: Url) -> Self {
        Self {
            zipgen_endpoint: endpoint,
            zipgen_secret: None,
            zipgen_timeout: default_timeout_secs(),
            zipgen_user_agent: None,
        }
    }

    /// Returns the timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.zipgen_timeout)
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.zipgen_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.zipgen_timeout)
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.zipgen_user_agent
            .clone()
            .unwrap_or_else(Self::default_user_agent)
    }

    /// Returns the default user agent string.
    fn default_user_agent() -> String {
        format!("padma/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Sets the signing secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.zipgen_secret = Some(secret.into());
        self
    }

    /// Sets the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.zipgen_timeout = timeout_secs;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.zipgen_user_agent = Some(user_agent.into());
        self
    }
}

impl fmt::Debug for ZipGenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipGenConfig")
            .field("zipgen_endpoint", &self.zipgen_endpoint.as_str())
            .field("zipgen_secret", &self.zipgen_secret.as_ref().map(|_| "***"))
            .field("zipgen_timeout", &self.zipgen_timeout)
            .field("zipgen_user_agent", &self.zipgen_user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Url {
        Url::parse("https://worker.example.com/jobs").unwrap()
    }

    #[test]
    fn new_config_uses_default_timeout() {
        let config = ZipGenConfig::new(endpoint());
        assert_eq!(config.zipgen_timeout, 30);
        assert!(config.zipgen_secret.is_none());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn builder_pattern() {
        let config = ZipGenConfig::new(endpoint())
            .with_secret("shared-secret")
            .with_timeout(120)
            .with_user_agent("custom-agent/1.0");

        assert_eq!(config.zipgen_timeout, 120);
        assert_eq!(config.zipgen_secret.as_deref(), Some("shared-secret"));
        assert_eq!(config.zipgen_user_agent.as_deref(), Some("custom-agent/1.0"));
    }

    #[test]
    fn effective_timeout_uses_default_when_zero() {
        let config = ZipGenConfig::new(endpoint()).with_timeout(0);
        assert_eq!(
            config.effective_timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn effective_user_agent_uses_default_when_none() {
        let config = ZipGenConfig::new(endpoint());
        assert!(config.effective_user_agent().contains("padma"));
    }

    #[test]
    fn debug_masks_secret() {
        let config = ZipGenConfig::new(endpoint()).with_secret("shared-secret");

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("shared-secret"));
        assert!(rendered.contains("***"));
    }
}
