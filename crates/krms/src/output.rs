//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders the run outcome and the configuration view in the format
//! selected by `--output`. Table uses `tabled`, structured formats use serde.

use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use krms_config::ConfigView;
use krms_core::{EmailStatus, RunOutcome, Summary};

use crate::cli::OutputFormat;

// ── Row types ────────────────────────────────────────────────────────

#[derive(Tabled)]
struct KeyValue {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct RetailerRow {
    #[tabled(rename = "Retailer")]
    name: String,
    #[tabled(rename = "CAS Activated")]
    activated: usize,
    #[tabled(rename = "Total Devices")]
    total: usize,
    #[tabled(rename = "In Home Country")]
    in_home_country: usize,
}

#[derive(Tabled)]
struct CountryRow {
    #[tabled(rename = "Country")]
    country: String,
    #[tabled(rename = "Devices")]
    devices: usize,
}

// ── Serializable run report ──────────────────────────────────────────

#[derive(Serialize)]
struct Artifacts<'a> {
    csv: &'a PathBuf,
    xlsx: &'a PathBuf,
    html: Option<&'a PathBuf>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum EmailReport<'a> {
    Disabled,
    Sent { recipients: usize },
    Failed { reason: &'a str },
}

#[derive(Serialize)]
struct RunReport<'a> {
    fetched: usize,
    excluded: usize,
    summary: &'a Summary,
    reports: Artifacts<'a>,
    email: EmailReport<'a>,
}

impl<'a> From<&'a RunOutcome> for RunReport<'a> {
    fn from(outcome: &'a RunOutcome) -> Self {
        Self {
            fetched: outcome.fetched,
            excluded: outcome.excluded,
            summary: &outcome.summary,
            reports: Artifacts {
                csv: &outcome.reports.csv,
                xlsx: &outcome.reports.xlsx,
                html: outcome.reports.html.as_ref(),
            },
            email: match outcome.email {
                EmailStatus::Disabled => EmailReport::Disabled,
                EmailStatus::Sent { recipients } => EmailReport::Sent { recipients },
                EmailStatus::Failed { ref reason } => EmailReport::Failed { reason },
            },
        }
    }
}

fn email_line(status: &EmailStatus) -> String {
    match status {
        EmailStatus::Disabled => "disabled".into(),
        EmailStatus::Sent { recipients } => format!("sent to {recipients} recipient(s)"),
        EmailStatus::Failed { reason } => format!("FAILED: {reason}"),
    }
}

/// Headline figures and run facts as `(key, value)` pairs.
fn outcome_entries(outcome: &RunOutcome) -> Vec<(String, String)> {
    let s = &outcome.summary;
    let home = &s.home_country;
    let mut rows = vec![
        ("Devices fetched".to_owned(), outcome.fetched.to_string()),
        ("Devices excluded".to_owned(), outcome.excluded.to_string()),
        ("Devices reported".to_owned(), s.total.to_string()),
        ("CAS activated".to_owned(), s.cas_activated.to_string()),
        (format!("In {home}"), s.in_home_country.to_string()),
        (format!("Activated outside {home}"), s.activated_outside_home.to_string()),
        ("Online".to_owned(), s.online.to_string()),
        ("Synced last 24h".to_owned(), s.synced_last_24h.to_string()),
        ("New last 24h".to_owned(), s.new_last_24h.to_string()),
        ("New last 7 days".to_owned(), s.new_last_7_days.to_string()),
        ("New this month".to_owned(), s.new_since_month_start.to_string()),
        ("CSV".to_owned(), outcome.reports.csv.display().to_string()),
        ("XLSX".to_owned(), outcome.reports.xlsx.display().to_string()),
    ];
    if let Some(ref html) = outcome.reports.html {
        rows.push(("HTML".to_owned(), html.display().to_string()));
    }
    rows.push(("Email".to_owned(), email_line(&outcome.email)));
    rows
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a completed run in the chosen format.
pub fn render_outcome(format: OutputFormat, outcome: &RunOutcome) -> String {
    match format {
        OutputFormat::Table => {
            let summary = &outcome.summary;
            let mut sections = vec![render_table(
                outcome_entries(outcome)
                    .into_iter()
                    .map(|(key, value)| KeyValue { key, value }),
            )];
            if !summary.by_retailer.is_empty() {
                sections.push(render_table(summary.by_retailer.iter().map(
                    |(name, counts)| RetailerRow {
                        name: name.clone(),
                        activated: counts.activated,
                        total: counts.total,
                        in_home_country: counts.in_home_country,
                    },
                )));
            }
            if !summary.by_country.is_empty() {
                sections.push(render_table(summary.by_country.iter().map(
                    |(country, devices)| CountryRow {
                        country: country.clone(),
                        devices: *devices,
                    },
                )));
            }
            sections.join("\n")
        }
        OutputFormat::Json => render_json(&RunReport::from(outcome)),
        OutputFormat::Yaml => render_yaml(&RunReport::from(outcome)),
        OutputFormat::Plain => render_plain(outcome_entries(outcome)),
    }
}

/// Render the redacted configuration view in the chosen format.
pub fn render_config(format: OutputFormat, view: &ConfigView) -> String {
    let entries = || {
        view.entries()
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value))
    };
    match format {
        OutputFormat::Table => render_table(entries().map(|(key, value)| KeyValue { key, value })),
        OutputFormat::Json => render_json(view),
        OutputFormat::Yaml => render_yaml(view),
        OutputFormat::Plain => render_plain(entries()),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: impl IntoIterator<Item = R>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_plain(entries: impl IntoIterator<Item = (String, String)>) -> String {
    entries
        .into_iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_json<T: Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: {e}"))
}
