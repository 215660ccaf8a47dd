use thiserror::Error;

/// Top-level error type for the `krms-api` crate.
///
/// Covers every failure mode of both HTTP surfaces: the KRMS device
/// inventory API and the ipinfo geolocation service.
/// `krms-core` maps these into domain-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token request rejected, or the API refused the bearer token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A session-scoped call was made before `login()` succeeded.
    #[error("No session token -- call login() first")]
    NotAuthenticated,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Rate limited by the remote service. Includes retry-after in seconds.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success HTTP status with whatever body the service returned.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the credentials or token
    /// were rejected.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::NotAuthenticated)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }
}
