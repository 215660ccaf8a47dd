// ── Core error types ──
//
// Domain-level errors from krms-core. Consumers never see reqwest or serde
// errors directly: the `From<krms_api::Error>` impl translates
// transport-layer failures into the variants below.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Output errors ────────────────────────────────────────────────
    #[error("Failed to write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    // ── Email errors ─────────────────────────────────────────────────
    #[error("Email delivery failed: {message}")]
    Email { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn write(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn email(message: impl std::fmt::Display) -> Self {
        Self::Email {
            message: message.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<krms_api::Error> for CoreError {
    fn from(err: krms_api::Error) -> Self {
        match err {
            krms_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            krms_api::Error::NotAuthenticated => CoreError::AuthenticationFailed {
                message: "no session token".into(),
            },
            krms_api::Error::Transport(ref e) => {
                let url = e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string);
                if e.is_timeout() {
                    CoreError::Timeout { url }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            krms_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            krms_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            krms_api::Error::RateLimited { retry_after_secs } => CoreError::Api {
                message: format!("Rate limited -- retry after {retry_after_secs}s"),
                status: Some(429),
            },
            krms_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            krms_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_auth_errors_map_to_authentication_failed() {
        let err: CoreError = krms_api::Error::Authentication {
            message: "token request rejected".into(),
        }
        .into();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }

    #[test]
    fn write_error_names_the_path() {
        let err = CoreError::write(Path::new("out/devices.csv"), "permission denied");
        assert_eq!(
            err.to_string(),
            "Failed to write out/devices.csv: permission denied"
        );
    }
}
