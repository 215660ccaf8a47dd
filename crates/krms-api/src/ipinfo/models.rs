use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of `GET /{ip}` on ipinfo.io.
///
/// Only the fields the report uses are modeled; unknown fields are
/// ignored. The same shape is persisted in the on-disk IP cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// `"latitude,longitude"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Set for private and reserved ranges; no location data follows.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bogon: bool,
    /// Present when the lookup failed server-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl IpInfo {
    /// Whether the response carries usable location data.
    pub fn is_resolved(&self) -> bool {
        !self.bogon && self.error.is_none()
    }
}
