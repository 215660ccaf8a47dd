use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

/// Credentials for requesting a KRMS API token.
///
/// The password and client key never appear in `Debug` output.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub client_key: SecretString,
}

/// Wire shape of `POST /auth/v1/token`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenRequest<'a> {
    user: &'a str,
    password: &'a str,
    client_key: &'a str,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString, client_key: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            client_key,
        }
    }

    pub(crate) fn token_request(&self) -> TokenRequest<'_> {
        TokenRequest {
            user: &self.username,
            password: self.password.expose_secret(),
            client_key: self.client_key.expose_secret(),
        }
    }
}
