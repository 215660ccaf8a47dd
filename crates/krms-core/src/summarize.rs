// ── Filter / summary stage ──
//
// The summary is computed over the *kept* records only.

use chrono::{DateTime, Datelike, TimeDelta, Utc};
use tracing::warn;

use crate::config::SummaryRules;
use crate::model::{EnrichedRecord, Summary};

/// Label for records with no known country.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Records split by the required-field predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filtered {
    pub kept: Vec<EnrichedRecord>,
    pub excluded: usize,
}

/// Keep records that carry a value for every required field, in input order.
pub fn filter_records(records: Vec<EnrichedRecord>, required_fields: &[String]) -> Filtered {
    let mut filtered = Filtered::default();

    for record in records {
        let missing: Vec<&str> = required_fields
            .iter()
            .map(String::as_str)
            .filter(|field| !record.device.has_value(field))
            .collect();

        if missing.is_empty() {
            filtered.kept.push(record);
        } else {
            warn!(
                missing = ?missing,
                device_id = record.device.id().unwrap_or("<none>"),
                "excluding device with missing fields"
            );
            filtered.excluded += 1;
        }
    }

    filtered
}

/// 00:00 UTC on the first day of `now`'s month.
fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(now, |d| d.and_utc())
}

/// Aggregate counts over `records` as of `now`.
pub fn summarize(records: &[EnrichedRecord], rules: &SummaryRules, now: DateTime<Utc>) -> Summary {
    let day_ago = now - TimeDelta::days(1);
    let week_ago = now - TimeDelta::days(7);
    let month_start = month_start(now);

    let mut summary = Summary {
        generated_at: now,
        home_country: rules.home_country.clone(),
        ..Summary::default()
    };

    for record in records {
        let device = &record.device;
        let activated = device.is_cas_activated();
        let country = record.effective_country();
        let in_home = !country.is_empty() && country.eq_ignore_ascii_case(&rules.home_country);

        summary.total += 1;
        if activated {
            summary.cas_activated += 1;
            if !in_home {
                summary.activated_outside_home += 1;
            }
        }
        if in_home {
            summary.in_home_country += 1;
        }
        if device.is_online() {
            summary.online += 1;
        }
        if device.sync_time().is_some_and(|t| t >= day_ago) {
            summary.synced_last_24h += 1;
        }
        if let Some(connected) = device.connected_time() {
            if connected >= day_ago {
                summary.new_last_24h += 1;
            }
            if connected >= week_ago {
                summary.new_last_7_days += 1;
            }
            if connected >= month_start {
                summary.new_since_month_start += 1;
            }
        }

        let retailer = summary
            .by_retailer
            .entry(device.retailer().to_owned())
            .or_default();
        retailer.total += 1;
        if activated {
            retailer.activated += 1;
        }
        if in_home {
            retailer.in_home_country += 1;
        }

        let country_key = if country.is_empty() {
            UNKNOWN_COUNTRY.to_owned()
        } else {
            country.to_ascii_uppercase()
        };
        *summary.by_country.entry(country_key).or_default() += 1;
    }

    summary
}
