//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use krms_config::ConfigError;
use krms_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────

    #[error("Missing required variable {name}")]
    #[diagnostic(
        code(krms::missing_variable),
        help(
            "Set {name} in the environment or in a .env file.\n\
             Check what was loaded with: krms check-config"
        )
    )]
    MissingVariable { name: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(krms::validation))]
    Validation { field: String, reason: String },

    #[error("Could not load configuration: {message}")]
    #[diagnostic(
        code(krms::config),
        help("Check krms.toml and any KRMS_* environment variables.")
    )]
    Config { message: String },

    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(krms::connection_failed),
        help("Check network access to the KRMS API and the api_url setting.")
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request to {url} timed out")]
    #[diagnostic(
        code(krms::timeout),
        help("Raise timeout_secs in krms.toml or KRMS_TIMEOUT_SECS.")
    )]
    Timeout { url: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(krms::auth_failed),
        help("Verify API_USERNAME, PASSWORD and CLIENT_KEY.")
    )]
    AuthFailed { message: String },

    // ── API / output ─────────────────────────────────────────────────

    #[error("API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    #[diagnostic(code(krms::api_error))]
    ApiError { message: String, status: Option<u16> },

    #[error("{message}")]
    #[diagnostic(
        code(krms::write_failed),
        help("Check that the output directory exists and is writable.")
    )]
    WriteFailed { message: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(krms::internal))]
    Internal { message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingVariable { .. } | Self::Validation { .. } | Self::Config { .. } => {
                exit_code::CONFIG
            }
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::ApiError { .. } | Self::WriteFailed { .. } | Self::Internal { .. } => {
                exit_code::GENERAL
            }
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Missing { name } => CliError::MissingVariable { name: name.into() },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other @ (ConfigError::EnvFile { .. } | ConfigError::Figment(_)) => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::Timeout { url } => CliError::Timeout { url },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Api { message, status } => CliError::ApiError { message, status },
            err @ CoreError::Write { .. } => CliError::WriteFailed {
                message: err.to_string(),
            },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Email { message } | CoreError::Internal(message) => {
                CliError::Internal { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn config_errors_exit_with_config_code() {
        let err = CliError::from(ConfigError::Missing { name: "PASSWORD" });
        assert_eq!(err.exit_code(), exit_code::CONFIG);
        assert!(err.to_string().contains("PASSWORD"));

        let err = CliError::from(ConfigError::Validation {
            field: "LIMIT".into(),
            reason: "not a number".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONFIG);
    }

    #[test]
    fn core_errors_map_to_distinct_codes() {
        let cases = [
            (
                CoreError::AuthenticationFailed {
                    message: "rejected".into(),
                },
                exit_code::AUTH,
            ),
            (
                CoreError::ConnectionFailed {
                    url: "https://krms.test".into(),
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (
                CoreError::Timeout {
                    url: "https://krms.test".into(),
                },
                exit_code::TIMEOUT,
            ),
            (
                CoreError::Write {
                    path: PathBuf::from("devices.csv"),
                    reason: "disk full".into(),
                },
                exit_code::GENERAL,
            ),
            (
                CoreError::Api {
                    message: "boom".into(),
                    status: Some(500),
                },
                exit_code::GENERAL,
            ),
        ];
        for (core, expected) in cases {
            let label = core.to_string();
            assert_eq!(CliError::from(core).exit_code(), expected, "{label}");
        }
    }

    #[test]
    fn api_error_message_includes_status() {
        let err = CliError::ApiError {
            message: "bad gateway".into(),
            status: Some(502),
        };
        assert_eq!(err.to_string(), "API error (HTTP 502): bad gateway");
    }
}
