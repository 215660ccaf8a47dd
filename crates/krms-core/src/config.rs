// ── Runtime pipeline configuration ──
//
// These types describe *what* a run fetches, writes and sends. They carry
// credential data and tuning, but never read the environment or disk.
// `krms-config` builds a `PipelineConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use krms_api::{Credentials, RetryPolicy};
use secrecy::SecretString;
use url::Url;

/// Default KRMS API root.
pub const DEFAULT_API_URL: &str = "https://www.krms.openview.co.za";

/// Device API access and paging.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API root (e.g., `https://www.krms.openview.co.za`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub client_key: SecretString,
    /// First page index requested.
    pub page: u32,
    /// Page size sent as `limit`.
    pub limit: u64,
    /// Cap on devices collected over all pages.
    pub max_rows: Option<usize>,
    /// Sort clauses, e.g. `["syncTime DESC"]`.
    pub orders: Vec<String>,
}

impl ApiConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.username.clone(),
            self.password.clone(),
            self.client_key.clone(),
        )
    }
}

/// Geolocation lookup settings.
#[derive(Debug, Clone)]
pub struct GeoConfig {
    pub url: Url,
    /// Bearer token; anonymous lookups when absent.
    pub token: Option<SecretString>,
    /// JSON file caching lookups across runs. `None` keeps the cache in memory.
    pub cache_file: Option<PathBuf>,
}

/// Inclusion rules and summary dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRules {
    /// Records missing any of these (absent, null or empty) are excluded.
    pub required_fields: Vec<String>,
    /// Country code counted as "in country".
    pub home_country: String,
}

impl Default for SummaryRules {
    fn default() -> Self {
        Self {
            required_fields: vec!["device_id".into()],
            home_country: "ZA".into(),
        }
    }
}

/// Where the report artifacts go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
    /// Rendered HTML summary; skipped when `None`.
    pub html: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv: "devices.csv".into(),
            xlsx: "devices.xlsx".into(),
            html: Some("krms_devices_report.html".into()),
        }
    }
}

/// SMTP login, present only when the server requires authentication.
#[derive(Debug, Clone)]
pub struct SmtpLogin {
    pub username: String,
    pub password: SecretString,
}

/// Email delivery settings. Absent from [`PipelineConfig`] when sending is
/// disabled.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub server: String,
    pub port: u16,
    /// Upgrade the connection with STARTTLS.
    pub starttls: bool,
    pub login: Option<SmtpLogin>,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
}

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub api: ApiConfig,
    pub geo: GeoConfig,
    pub rules: SummaryRules,
    pub output: OutputConfig,
    pub email: Option<EmailConfig>,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Retry policy for device pages and IP lookups.
    pub retry: RetryPolicy,
}
