// ── Geolocation and enriched records ──

use serde::Serialize;

use super::device::DeviceRecord;

/// Location derived from a device's IP address.
///
/// Unknown parts are empty strings / `None`, never absent: every enriched
/// record carries a `Geolocation`, resolved or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Geolocation {
    pub city: String,
    pub region: String,
    /// ISO 3166-1 alpha-2 code.
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Geolocation {
    pub fn is_empty(&self) -> bool {
        self.city.is_empty()
            && self.region.is_empty()
            && self.country.is_empty()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }
}

/// A device record plus its geolocation. One per fetched device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    pub device: DeviceRecord,
    pub geo: Geolocation,
}

impl EnrichedRecord {
    pub fn new(device: DeviceRecord, geo: Geolocation) -> Self {
        Self { device, geo }
    }

    /// The resolved geolocation country, falling back to the device's own
    /// `country` field, or `""`.
    pub fn effective_country(&self) -> &str {
        if self.geo.country.is_empty() {
            self.device.country().unwrap_or("")
        } else {
            &self.geo.country
        }
    }
}
