// ── Pipeline ──
//
// Config → Fetch → Enrich → Filter/Summarize → Write → Email.
// Each stage completes before the next starts. Fetch and write failures
// abort the run; email failures are recorded in the outcome.

use chrono::{DateTime, Utc};
use krms_api::{IpInfoClient, KrmsClient, TransportConfig};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::enrich::{Enricher, IpCache};
use crate::error::CoreError;
use crate::fetch::fetch_devices;
use crate::model::Summary;
use crate::notify::send_report;
use crate::report::{WrittenReports, write_reports};
use crate::summarize::{filter_records, summarize};

/// What happened to the report email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailStatus {
    /// Sending is switched off.
    Disabled,
    Sent { recipients: usize },
    Failed { reason: String },
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Devices returned by the API.
    pub fetched: usize,
    /// Devices dropped for missing required fields.
    pub excluded: usize,
    pub summary: Summary,
    pub reports: WrittenReports,
    pub email: EmailStatus,
}

/// One configured report run.
pub struct Pipeline {
    config: PipelineConfig,
    krms: KrmsClient,
    ipinfo: IpInfoClient,
}

impl Pipeline {
    /// Build the HTTP clients. Does not touch the network.
    pub fn new(config: PipelineConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);

        let krms = KrmsClient::new(config.api.url.clone(), &transport)?.with_retry(config.retry);
        let ipinfo = IpInfoClient::new(config.geo.url.clone(), config.geo.token.clone(), &transport)?
            .with_retry(config.retry);

        Ok(Self {
            config,
            krms,
            ipinfo,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage with the current time as the summary reference.
    pub async fn run(&self) -> Result<RunOutcome, CoreError> {
        self.run_at(Utc::now()).await
    }

    /// Run every stage, computing time windows relative to `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunOutcome, CoreError> {
        let cfg = &self.config;

        let devices = fetch_devices(&self.krms, &cfg.api).await?;
        let fetched = devices.len();

        let cache = cfg
            .geo
            .cache_file
            .as_ref()
            .map_or_else(IpCache::in_memory, IpCache::load);
        let mut enricher = Enricher::new(&self.ipinfo, cache);
        let enriched = enricher.enrich(devices).await;

        let filtered = filter_records(enriched, &cfg.rules.required_fields);
        let summary = summarize(&filtered.kept, &cfg.rules, now);
        info!(
            total = summary.total,
            excluded = filtered.excluded,
            activated = summary.cas_activated,
            online = summary.online,
            "summary computed"
        );

        let reports = write_reports(&filtered.kept, &summary, &cfg.output)?;

        let email = match cfg.email {
            None => {
                info!("email disabled, skipping notification");
                EmailStatus::Disabled
            }
            Some(ref email) => {
                match send_report(email, &summary, &reports.xlsx, cfg.timeout).await {
                    Ok(()) => EmailStatus::Sent {
                        recipients: email.to.len(),
                    },
                    Err(e) => {
                        warn!(error = %e, "report email not sent");
                        EmailStatus::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
        };

        Ok(RunOutcome {
            fetched,
            excluded: filtered.excluded,
            summary,
            reports,
            email,
        })
    }
}
