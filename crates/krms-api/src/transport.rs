// Shared transport configuration for building reqwest::Client instances.
//
// The KRMS and ipinfo clients share timeout and user-agent settings
// through this module, avoiding duplicated builder logic.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::error::Error;

/// The KRMS API rejects requests without a browser-like agent.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.into(),
        }
    }
}

impl TransportConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.build_client_with_headers(HeaderMap::new())
    }

    /// Build a `reqwest::Client` with additional default headers.
    ///
    /// Every client sends `Content-Type: application/json;charset=utf-8`
    /// unless the caller overrides it.
    pub fn build_client_with_headers(&self, mut headers: HeaderMap) -> Result<reqwest::Client, Error> {
        headers
            .entry(CONTENT_TYPE)
            .or_insert_with(|| HeaderValue::from_static("application/json;charset=utf-8"));

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
