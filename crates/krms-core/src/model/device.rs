// ── Device records ──

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field names the pipeline reads from device objects.
pub mod fields {
    pub const DEVICE_ID: &str = "device_id";
    pub const LOCATION_IP: &str = "locationIp";
    pub const CPE_SERVICE_STATUS: &str = "cpeServiceStatus";
    pub const ONLINE: &str = "online";
    pub const SYNC_TIME: &str = "syncTime";
    pub const CONNECTED_TIME: &str = "connectedTime";
    pub const RETAILER: &str = "retailer";
    pub const COUNTRY: &str = "country";
}

/// Label used when a device carries no retailer.
pub const NO_RETAILER: &str = "No Retailer Added";

/// One device exactly as the inventory API returned it.
///
/// Field order is preserved; report columns follow it. Never mutated after
/// the fetch -- enrichment wraps it in an [`EnrichedRecord`](super::EnrichedRecord).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceRecord(IndexMap<String, Value>);

impl From<IndexMap<String, Value>> for DeviceRecord {
    fn from(fields: IndexMap<String, Value>) -> Self {
        Self(fields)
    }
}

impl DeviceRecord {
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Present, non-null, and not an empty (or whitespace-only) string.
    pub fn has_value(&self, name: &str) -> bool {
        match self.0.get(name) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// A non-empty string field, trimmed.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn id(&self) -> Option<&str> {
        self.str_field(fields::DEVICE_ID)
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.str_field(fields::LOCATION_IP)
    }

    /// The device's own `country` field, if any.
    pub fn country(&self) -> Option<&str> {
        self.str_field(fields::COUNTRY)
    }

    pub fn retailer(&self) -> &str {
        self.str_field(fields::RETAILER).unwrap_or(NO_RETAILER)
    }

    /// `cpeServiceStatus` is either a boolean or the string `"activated"`.
    pub fn is_cas_activated(&self) -> bool {
        match self.0.get(fields::CPE_SERVICE_STATUS) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("activated"),
            _ => false,
        }
    }

    /// `online` is either a boolean or the string `"true"`.
    pub fn is_online(&self) -> bool {
        match self.0.get(fields::ONLINE) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Last sync, from epoch seconds.
    pub fn sync_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp(fields::SYNC_TIME)
    }

    /// First connection, from epoch seconds.
    pub fn connected_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp(fields::CONNECTED_TIME)
    }

    fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        let secs = match self.0.get(name)? {
            Value::Number(n) => n.as_i64()?,
            Value::String(s) => s.trim().parse::<i64>().ok()?,
            _ => return None,
        };
        // Zero is treated as unset.
        if secs == 0 {
            return None;
        }
        DateTime::from_timestamp(secs, 0)
    }
}
