// ── API-to-domain type conversions ──
//
// Bridges krms-api wire types into the canonical domain model.

use krms_api::IpInfo;

use crate::model::Geolocation;

/// Parse `"lat,lng"`. Anything else yields `(None, None)`.
pub(crate) fn parse_loc(loc: &str) -> (Option<f64>, Option<f64>) {
    let mut parts = loc.split(',').map(str::trim);
    let lat = parts.next().and_then(|s| s.parse::<f64>().ok());
    let lng = parts.next().and_then(|s| s.parse::<f64>().ok());
    match (lat, lng, parts.next()) {
        (Some(lat), Some(lng), None) if lat.is_finite() && lng.is_finite() => {
            (Some(lat), Some(lng))
        }
        _ => (None, None),
    }
}

impl From<&IpInfo> for Geolocation {
    fn from(info: &IpInfo) -> Self {
        if !info.is_resolved() {
            return Self::default();
        }
        let text = |v: Option<&str>| v.map(str::trim).unwrap_or_default().to_owned();
        let (latitude, longitude) = info.loc.as_deref().map_or((None, None), parse_loc);
        Self {
            city: text(info.city.as_deref()),
            region: text(info.region.as_deref()),
            country: text(info.country.as_deref()),
            latitude,
            longitude,
        }
    }
}
