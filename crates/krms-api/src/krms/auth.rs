// KRMS API authentication
//
// Token login and session verification. The token returned by
// `/auth/v1/token` is stored on the client and sent as a bearer token on
// every subsequent request.

use secrecy::SecretString;
use tracing::debug;

use crate::auth::Credentials;
use crate::error::Error;
use crate::krms::client::KrmsClient;
use crate::krms::models::TokenResponse;

impl KrmsClient {
    /// Request an API token with username, password and client key.
    ///
    /// `POST /auth/v1/token` with `{"user", "password", "clientKey"}`.
    /// The API answers HTTP 200 in both cases; only `code == "success"`
    /// carrying a token counts as a successful login.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), Error> {
        let url = self.url("auth/v1/token")?;
        debug!(user = %credentials.username, "requesting token at {}", url);

        let resp = self
            .http()
            .post(url)
            .json(&credentials.token_request())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("token request failed (HTTP {status}): {body}"),
            });
        }

        let reply: TokenResponse = Self::handle_response(resp).await?;
        match (reply.code.as_deref(), reply.token) {
            (Some("success"), Some(token)) if !token.is_empty() => {
                self.set_token(SecretString::from(token));
                debug!("token received");
                Ok(())
            }
            (code, _) => Err(Error::Authentication {
                message: format!(
                    "token request rejected (code: {}){}",
                    code.unwrap_or("<none>"),
                    reply
                        .message
                        .map(|m| format!(": {m}"))
                        .unwrap_or_default()
                ),
            }),
        }
    }

    /// Fetch the authenticated account's profile.
    ///
    /// `GET /auth/v1/profile`. Used to verify the session before paging
    /// through devices; the body is returned as-is.
    pub async fn profile(&self) -> Result<serde_json::Value, Error> {
        let url = self.url("auth/v1/profile")?;
        self.get(url).await
    }
}
