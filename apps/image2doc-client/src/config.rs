//! Client configuration

use std::env;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, without a trailing slash
    pub base_url: String,
    /// Whole-request timeout; OCR on a large page can take a while
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            timeout: Duration::from_secs(180),
        }
    }
}

impl ClientConfig {
    /// Read `IMAGE2DOC_SERVER_URL` and `IMAGE2DOC_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = env::var("IMAGE2DOC_SERVER_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.base_url);

        let timeout = env::var("IMAGE2DOC_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self::new(base_url).with_timeout(timeout)
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve a server-relative path (`/files/...`) against the base URL
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }
}
