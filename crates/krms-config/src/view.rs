// Redacted, serializable view of a resolved configuration.

use std::path::Path;

use serde::Serialize;

use krms_core::{EmailConfig, PipelineConfig};

const REDACTED: &str = "********";

fn display_path(path: Option<&Path>) -> String {
    path.map_or_else(|| "(disabled)".into(), |p| p.display().to_string())
}

/// Email settings without the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailView {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub starttls: bool,
    pub login: Option<String>,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
}

impl From<&EmailConfig> for EmailView {
    fn from(email: &EmailConfig) -> Self {
        Self {
            smtp_server: email.server.clone(),
            smtp_port: email.port,
            starttls: email.starttls,
            login: email.login.as_ref().map(|l| l.username.clone()),
            from: email.from.clone(),
            to: email.to.clone(),
            subject: email.subject.clone(),
        }
    }
}

/// Every setting of a [`PipelineConfig`], secrets masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigView {
    pub api_url: String,
    pub api_username: String,
    pub password: &'static str,
    pub client_key: &'static str,
    pub page: u32,
    pub limit: u64,
    pub max_rows: Option<usize>,
    pub orders: Vec<String>,
    pub ipinfo_url: String,
    pub ipinfo_token: &'static str,
    pub ip_cache_file: String,
    pub csv_output_file: String,
    pub xlsx_output_file: String,
    pub report_file: String,
    pub home_country: String,
    pub required_fields: Vec<String>,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    pub email: Option<EmailView>,
}

impl From<&PipelineConfig> for ConfigView {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            api_url: cfg.api.url.to_string(),
            api_username: cfg.api.username.clone(),
            password: REDACTED,
            client_key: REDACTED,
            page: cfg.api.page,
            limit: cfg.api.limit,
            max_rows: cfg.api.max_rows,
            orders: cfg.api.orders.clone(),
            ipinfo_url: cfg.geo.url.to_string(),
            ipinfo_token: if cfg.geo.token.is_some() {
                REDACTED
            } else {
                "(none)"
            },
            ip_cache_file: display_path(cfg.geo.cache_file.as_deref()),
            csv_output_file: cfg.output.csv.display().to_string(),
            xlsx_output_file: cfg.output.xlsx.display().to_string(),
            report_file: display_path(cfg.output.html.as_deref()),
            home_country: cfg.rules.home_country.clone(),
            required_fields: cfg.rules.required_fields.clone(),
            timeout_secs: cfg.timeout.as_secs(),
            retry_attempts: cfg.retry.max_attempts,
            retry_backoff_ms: u64::try_from(cfg.retry.backoff.as_millis()).unwrap_or(u64::MAX),
            email: cfg.email.as_ref().map(EmailView::from),
        }
    }
}

impl ConfigView {
    /// Flattened `(key, value)` pairs for table and plain output.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let opt = |v: Option<usize>| v.map_or_else(|| "(none)".into(), |n| n.to_string());
        let mut rows = vec![
            ("api_url", self.api_url.clone()),
            ("api_username", self.api_username.clone()),
            ("password", self.password.into()),
            ("client_key", self.client_key.into()),
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("max_rows", opt(self.max_rows)),
            ("orders", self.orders.join(", ")),
            ("ipinfo_url", self.ipinfo_url.clone()),
            ("ipinfo_token", self.ipinfo_token.into()),
            ("ip_cache_file", self.ip_cache_file.clone()),
            ("csv_output_file", self.csv_output_file.clone()),
            ("xlsx_output_file", self.xlsx_output_file.clone()),
            ("report_file", self.report_file.clone()),
            ("home_country", self.home_country.clone()),
            ("required_fields", self.required_fields.join(", ")),
            ("timeout_secs", self.timeout_secs.to_string()),
            ("retry_attempts", self.retry_attempts.to_string()),
            ("retry_backoff_ms", self.retry_backoff_ms.to_string()),
        ];
        match self.email {
            None => rows.push(("send_email", "false".into())),
            Some(ref email) => rows.extend([
                ("send_email", "true".into()),
                ("smtp_server", email.smtp_server.clone()),
                ("smtp_port", email.smtp_port.to_string()),
                ("starttls", email.starttls.to_string()),
                (
                    "smtp_login",
                    email.login.clone().unwrap_or_else(|| "(none)".into()),
                ),
                ("email_from", email.from.clone()),
                ("email_to", email.to.join(", ")),
                ("email_subject", email.subject.clone()),
            ]),
        }
        rows
    }
}
