//! Configuration loading for the KRMS device report.
//!
//! Two sources feed one immutable [`PipelineConfig`]:
//!
//! - the process environment (optionally pre-populated from a `.env` file),
//!   which carries credentials, paging, output paths and SMTP settings;
//! - an optional `krms.toml` settings file merged with `KRMS_`-prefixed
//!   environment variables, which carries endpoints, timeouts, retry tuning
//!   and summary rules.
//!
//! Flags and numbers are typed here; nothing downstream sees raw strings.

mod view;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use krms_core::config::DEFAULT_API_URL;
use krms_core::{
    ApiConfig, EmailConfig, GeoConfig, OutputConfig, PipelineConfig, RetryPolicy, SmtpLogin,
    SummaryRules,
};

pub use view::{ConfigView, EmailView};

/// Settings file looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "krms.toml";

const DEFAULT_IPINFO_URL: &str = "https://ipinfo.io";
const DEFAULT_ORDERS: &str = r#"["syncTime DESC"]"#;
const DEFAULT_SUBJECT: &str = "KRMS Devices Report";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required variable {name}")]
    Missing { name: &'static str },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to load env file {}: {reason}", path.display())]
    EnvFile { path: PathBuf, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── Settings file ───────────────────────────────────────────────────

/// Tuning that has no plain environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub ipinfo_url: String,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    /// Empty string disables the on-disk IP cache.
    pub ip_cache_file: PathBuf,
    /// Empty string disables the HTML report.
    pub report_file: PathBuf,
    pub home_country: String,
    pub required_fields: Vec<String>,
    /// Overridden by the `MAX_ROWS` variable.
    pub max_rows: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        let rules = SummaryRules::default();
        Self {
            api_url: DEFAULT_API_URL.into(),
            ipinfo_url: DEFAULT_IPINFO_URL.into(),
            timeout_secs: 30,
            retry_attempts: 3,
            retry_backoff_ms: 500,
            ip_cache_file: "ip_info.json".into(),
            report_file: "krms_devices_report.html".into(),
            home_country: rules.home_country,
            required_fields: rules.required_fields,
            max_rows: None,
        }
    }
}

/// Load settings: defaults, then the TOML file (if present), then `KRMS_*`.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let path = path.map_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE), Path::to_path_buf);
    debug!(path = %path.display(), exists = path.exists(), "loading settings");

    let settings = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("KRMS_"))
        .extract()?;
    Ok(settings)
}

// ── .env file ───────────────────────────────────────────────────────

/// Populate the process environment from a `.env` file. Variables already
/// set win.
///
/// With an explicit `path` the file must exist. Without one, `.env` is
/// searched from the working directory upwards and silently skipped when
/// absent.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match path {
        Some(path) => dotenvy::from_path(path)
            .map(|()| Some(path.to_path_buf()))
            .map_err(|e| ConfigError::EnvFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        None => match dotenvy::dotenv() {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(ConfigError::EnvFile {
                path: PathBuf::from(".env"),
                reason: e.to_string(),
            }),
        },
    }
}

// ── Typed variable access ───────────────────────────────────────────

/// Parse a boolean flag: `true/false/1/0/yes/no/on/off`, any case.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated address list, dropping blanks.
pub fn parse_recipients(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Blank values count as unset.
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing { name })
    }

    fn secret(&self, name: &'static str) -> Result<SecretString, ConfigError> {
        self.required(name).map(SecretString::from)
    }

    fn flag(&self, name: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                ConfigError::invalid(name, format!("expected true/false, got {raw:?}"))
            }),
        }
    }

    fn number<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(name)
            .map(|raw| {
                raw.trim()
                    .parse()
                    .map_err(|e| ConfigError::invalid(name, format!("{raw:?}: {e}")))
            })
            .transpose()
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::invalid(field, format!("{raw:?}: {e}")))
}

fn non_empty(path: PathBuf) -> Option<PathBuf> {
    (!path.as_os_str().is_empty()).then_some(path)
}

// ── Resolution ──────────────────────────────────────────────────────

/// Build a `PipelineConfig` from the process environment and `settings`.
pub fn from_env(settings: &Settings) -> Result<PipelineConfig, ConfigError> {
    resolve(|name| std::env::var(name).ok(), settings)
}

/// Build a `PipelineConfig` from `lookup` (variable name to value) and
/// `settings`.
pub fn resolve<F>(lookup: F, settings: &Settings) -> Result<PipelineConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let vars = Vars { lookup };

    let orders_raw = vars.get("ORDERS").unwrap_or_else(|| DEFAULT_ORDERS.into());
    let orders: Vec<String> = serde_json::from_str(&orders_raw).map_err(|e| {
        ConfigError::invalid("ORDERS", format!("expected a JSON array of strings: {e}"))
    })?;

    let page = vars.number("PAGE")?.unwrap_or(1);
    if page == 0 {
        return Err(ConfigError::invalid("PAGE", "pages start at 1"));
    }
    let limit = vars.number("LIMIT")?.unwrap_or(10_000_000);
    if limit == 0 {
        return Err(ConfigError::invalid("LIMIT", "must be at least 1"));
    }

    let api = ApiConfig {
        url: parse_url("api_url", &settings.api_url)?,
        username: vars.required("API_USERNAME")?,
        password: vars.secret("PASSWORD")?,
        client_key: vars.secret("CLIENT_KEY")?,
        page,
        limit,
        max_rows: vars.number("MAX_ROWS")?.or(settings.max_rows),
        orders,
    };

    let geo = GeoConfig {
        url: parse_url("ipinfo_url", &settings.ipinfo_url)?,
        token: vars.get("IPINFO_TOKEN").map(SecretString::from),
        cache_file: non_empty(settings.ip_cache_file.clone()),
    };

    let home_country = settings.home_country.trim().to_ascii_uppercase();
    if home_country.is_empty() {
        return Err(ConfigError::invalid("home_country", "must not be empty"));
    }
    let rules = SummaryRules {
        required_fields: settings.required_fields.clone(),
        home_country,
    };

    let output = OutputConfig {
        csv: vars
            .get("CSV_OUTPUT_FILE")
            .map_or_else(|| OutputConfig::default().csv, PathBuf::from),
        xlsx: vars
            .get("XLSX_OUTPUT_FILE")
            .map_or_else(|| OutputConfig::default().xlsx, PathBuf::from),
        html: non_empty(settings.report_file.clone()),
    };

    let email = if vars.flag("SEND_EMAIL", true)? {
        Some(resolve_email(&vars)?)
    } else {
        None
    };

    if settings.retry_attempts == 0 {
        return Err(ConfigError::invalid("retry_attempts", "must be at least 1"));
    }
    if settings.timeout_secs == 0 {
        return Err(ConfigError::invalid("timeout_secs", "must be at least 1 second"));
    }

    Ok(PipelineConfig {
        api,
        geo,
        rules,
        output,
        email,
        timeout: Duration::from_secs(settings.timeout_secs),
        retry: RetryPolicy {
            max_attempts: settings.retry_attempts,
            backoff: Duration::from_millis(settings.retry_backoff_ms),
        },
    })
}

fn resolve_email<F>(vars: &Vars<F>) -> Result<EmailConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let server = vars.required("SMTP_SERVER")?;
    let port = vars.number("SMTP_PORT")?.unwrap_or(587);
    let starttls = vars.flag("TTLS", true)?;

    let login = if vars.flag("LOGIN_REQUIRED", true)? {
        Some(SmtpLogin {
            username: vars.required("EMAIL_USERNAME")?,
            password: vars.secret("EMAIL_PASSWORD")?,
        })
    } else {
        None
    };

    let from = vars
        .get("EMAIL_FROM")
        .or_else(|| vars.get("EMAIL_USERNAME"))
        .ok_or(ConfigError::Missing { name: "EMAIL_FROM" })?;

    let to = parse_recipients(&vars.required("EMAIL_TO")?);
    if to.is_empty() {
        return Err(ConfigError::invalid("EMAIL_TO", "no recipients"));
    }

    Ok(EmailConfig {
        server,
        port,
        starttls,
        login,
        from,
        to,
        subject: vars.get("EMAIL_SUBJECT").unwrap_or_else(|| DEFAULT_SUBJECT.into()),
    })
}
