// ── Aggregate summary ──

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

/// Per-retailer breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RetailerCounts {
    pub total: usize,
    pub activated: usize,
    pub in_home_country: usize,
}

/// Counts over the filtered record set. Recomputed every run.
///
/// `by_retailer` totals and `by_country` counts each sum to `total`.
/// Keys appear in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub generated_at: DateTime<Utc>,
    pub home_country: String,
    pub total: usize,
    pub cas_activated: usize,
    pub in_home_country: usize,
    pub activated_outside_home: usize,
    pub online: usize,
    pub synced_last_24h: usize,
    pub new_last_24h: usize,
    pub new_last_7_days: usize,
    pub new_since_month_start: usize,
    pub by_retailer: IndexMap<String, RetailerCounts>,
    pub by_country: IndexMap<String, usize>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
