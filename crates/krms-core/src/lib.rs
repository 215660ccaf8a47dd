//! Pipeline stages for the KRMS device report.
//!
//! The run is strictly sequential; each stage consumes the previous
//! stage's complete output:
//!
//! - **[`fetch`]**: token login, session check, paginated device listing
//!   via [`krms_api::KrmsClient`].
//! - **[`enrich`]**: per-IP geolocation via [`krms_api::IpInfoClient`],
//!   backed by a persistent [`IpCache`]. Lookup failures never abort the run.
//! - **[`summarize`]**: required-field filtering and the aggregate
//!   [`Summary`] over the kept records.
//! - **[`report`]**: CSV, XLSX and HTML artifacts, each atomically replacing
//!   the previous run's file.
//! - **[`notify`]**: SMTP delivery of the summary with the spreadsheet
//!   attached.
//!
//! [`Pipeline`] wires the stages together from an immutable
//! [`PipelineConfig`].

pub mod config;
pub mod convert;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod report;
pub mod summarize;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    ApiConfig, EmailConfig, GeoConfig, OutputConfig, PipelineConfig, SmtpLogin, SummaryRules,
};
pub use enrich::{Enricher, IpCache};
pub use error::CoreError;
pub use model::{DeviceRecord, EnrichedRecord, Geolocation, RetailerCounts, Summary};
pub use pipeline::{EmailStatus, Pipeline, RunOutcome};
pub use report::{ReportTable, WrittenReports};

pub use krms_api::RetryPolicy;
