// KRMS API HTTP client
//
// Wraps `reqwest::Client` with KRMS URL construction, bearer-token
// injection and status mapping. Endpoint groups (auth, devices) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::retry::RetryPolicy;
use crate::transport::TransportConfig;

/// Raw HTTP client for the KRMS device inventory API.
///
/// Obtain a session with [`login`](Self::login); every other call sends the
/// stored token as `Authorization: Bearer`.
pub struct KrmsClient {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
    retry: RetryPolicy,
}

impl KrmsClient {
    /// Create a client for `base_url` (e.g. `https://www.krms.openview.co.za`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            token: RwLock::new(None),
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy used for page fetches.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Whether a token has been obtained.
    pub fn is_authenticated(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    // ── Token management ─────────────────────────────────────────────

    pub(crate) fn set_token(&self, token: SecretString) {
        debug!("storing session token");
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token);
        }
    }

    fn bearer(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> {
        let guard = self.token.read().map_err(|_| Error::NotAuthenticated)?;
        let token = guard.as_ref().ok_or(Error::NotAuthenticated)?;
        Ok(builder.bearer_auth(token.expose_secret()))
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join an absolute API path (e.g. `"api/v1/devices/connects/page"`)
    /// onto the base URL, keeping any path prefix the base carries.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Authenticated GET.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.bearer(self.http.get(url))?.send().await?;
        Self::handle_response(resp).await
    }

    /// Authenticated POST with JSON body.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self.bearer(self.http.post(url).json(body))?.send().await?;
        Self::handle_response(resp).await
    }

    /// Map the HTTP status, then decode the JSON body.
    pub(crate) async fn handle_response<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        trace!(%status, "response received");

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "token expired or invalid credentials".into(),
            });
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                message: "insufficient permissions (HTTP 403)".into(),
            });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(1);
            return Err(Error::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            return Err(Error::Api {
                status: status.as_u16(),
                message: if preview.is_empty() {
                    status.to_string()
                } else {
                    preview
                },
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_keeps_base_path_prefix() {
        let base = Url::parse("https://example.test/krms/").expect("valid");
        let client = KrmsClient::with_client(reqwest::Client::new(), base);
        let url = client.url("/auth/v1/token").expect("valid");
        assert_eq!(url.as_str(), "https://example.test/krms/auth/v1/token");
    }

    #[test]
    fn unauthenticated_until_token_is_set() {
        let base = Url::parse("https://example.test").expect("valid");
        let client = KrmsClient::with_client(reqwest::Client::new(), base);
        assert!(!client.is_authenticated());
        client.set_token("abc".to_owned().into());
        assert!(client.is_authenticated());
    }
}
