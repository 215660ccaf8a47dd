// ── Report writer stage ──
//
// One `ReportTable` feeds both the CSV and the XLSX renderers so the two
// files always hold the same rows and values. Every artifact is rendered in
// memory, written to a temp file next to its target and renamed over it.

mod csv;
pub mod html;
mod xlsx;

use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Number, Value};
use tracing::info;

use crate::config::OutputConfig;
use crate::error::CoreError;
use crate::model::{EnrichedRecord, Summary};

pub use self::csv::render_csv;
pub use self::xlsx::render_xlsx;

/// Columns appended after the device fields.
pub const GEO_COLUMNS: [&str; 5] = [
    "ip_city",
    "ip_region",
    "ip_country",
    "ip_latitude",
    "ip_longitude",
];

/// A single report value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(Number),
    Bool(bool),
}

impl Cell {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Empty,
            Some(Value::Bool(b)) => Self::Bool(*b),
            Some(Value::Number(n)) => Self::Number(n.clone()),
            Some(Value::String(s)) if s.is_empty() => Self::Empty,
            Some(Value::String(s)) => Self::Text(s.clone()),
            Some(nested @ (Value::Array(_) | Value::Object(_))) => Self::Text(nested.to_string()),
        }
    }

    fn from_text(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_owned())
        }
    }

    fn from_coordinate(v: Option<f64>) -> Self {
        v.and_then(Number::from_f64).map_or(Self::Empty, Self::Number)
    }

    /// Textual form, as written to the CSV.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Empty => Cow::Borrowed(""),
            Self::Text(s) => Cow::Borrowed(s),
            Self::Number(n) => Cow::Owned(n.to_string()),
            Self::Bool(true) => Cow::Borrowed("true"),
            Self::Bool(false) => Cow::Borrowed("false"),
        }
    }
}

/// Header plus rows, shared by the CSV and XLSX renderers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ReportTable {
    /// Device fields in first-seen order across all records, then the
    /// geolocation columns. A device field named like a geolocation column
    /// is shadowed by it.
    pub fn build(records: &[EnrichedRecord]) -> Self {
        let mut device_columns: Vec<&str> = Vec::new();
        for record in records {
            for name in record.device.fields().keys() {
                if !GEO_COLUMNS.contains(&name.as_str()) && !device_columns.contains(&name.as_str())
                {
                    device_columns.push(name);
                }
            }
        }

        let headers = device_columns
            .iter()
            .copied()
            .chain(GEO_COLUMNS)
            .map(str::to_owned)
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                let geo = &record.geo;
                device_columns
                    .iter()
                    .map(|name| Cell::from_value(record.device.get(name)))
                    .chain([
                        Cell::from_text(&geo.city),
                        Cell::from_text(&geo.region),
                        Cell::from_text(&geo.country),
                        Cell::from_coordinate(geo.latitude),
                        Cell::from_coordinate(geo.longitude),
                    ])
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Paths of the artifacts a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReports {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
    pub html: Option<PathBuf>,
}

/// Replace `path` with `bytes` atomically: temp file in the same directory,
/// then rename.
pub(crate) fn replace_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Write CSV, XLSX and (optionally) HTML. The first failure aborts.
pub fn write_reports(
    records: &[EnrichedRecord],
    summary: &Summary,
    output: &OutputConfig,
) -> Result<WrittenReports, CoreError> {
    let table = ReportTable::build(records);

    let csv = render_csv(&table).map_err(|e| CoreError::write(&output.csv, e))?;
    replace_file(&output.csv, &csv).map_err(|e| CoreError::write(&output.csv, e))?;
    info!(path = %output.csv.display(), rows = table.rows.len(), "CSV written");

    let xlsx = render_xlsx(&table).map_err(|e| CoreError::write(&output.xlsx, e))?;
    replace_file(&output.xlsx, &xlsx).map_err(|e| CoreError::write(&output.xlsx, e))?;
    info!(path = %output.xlsx.display(), rows = table.rows.len(), "spreadsheet written");

    if let Some(ref path) = output.html {
        let page = html::render_html(summary).map_err(|e| CoreError::write(path, e))?;
        replace_file(path, page.as_bytes()).map_err(|e| CoreError::write(path, e))?;
        info!(path = %path.display(), "HTML report written");
    }

    Ok(WrittenReports {
        csv: output.csv.clone(),
        xlsx: output.xlsx.clone(),
        html: output.html.clone(),
    })
}
