// ipinfo.io HTTP client
//
// One GET per address, bearer-token authenticated. Lookups are retried on
// transient failures; the caller decides what a permanent failure means.

use std::net::IpAddr;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::ipinfo::models::IpInfo;
use crate::krms::KrmsClient;
use crate::retry::RetryPolicy;
use crate::transport::TransportConfig;

/// Default public endpoint.
pub const DEFAULT_BASE_URL: &str = "https://ipinfo.io";

/// Async client for ipinfo.io.
pub struct IpInfoClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    retry: RetryPolicy,
}

impl IpInfoClient {
    /// Build a client for `base_url`. Without a token, lookups run against
    /// the anonymous (rate-limited) tier.
    pub fn new(
        base_url: Url,
        token: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, token))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, token: Option<SecretString>) -> Self {
        Self {
            http,
            base_url,
            token,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy used for lookups.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// `{base}/{ip}`, keeping any path prefix on the base.
    fn lookup_url(&self, ip: IpAddr) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(&ip.to_string());
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<IpInfo, Error> {
        let mut builder = self.http.get(url);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        let resp = builder.send().await?;
        KrmsClient::handle_response(resp).await
    }

    /// Look up one address.
    pub async fn lookup(&self, ip: IpAddr) -> Result<IpInfo, Error> {
        let url = self.lookup_url(ip)?;
        debug!(%ip, "GET {}", url);
        self.retry
            .run("ip lookup", || self.fetch(url.clone()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_url_appends_address_segment() {
        let client = IpInfoClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://ipinfo.example/v1/").expect("valid"),
            None,
        );
        let v4 = client.lookup_url("203.0.113.5".parse().expect("ip")).expect("url");
        assert_eq!(v4.as_str(), "https://ipinfo.example/v1/203.0.113.5");

        let v6 = client.lookup_url("2001:db8::1".parse().expect("ip")).expect("url");
        assert_eq!(v6.path(), "/v1/2001:db8::1");
    }
}
