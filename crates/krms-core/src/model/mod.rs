// ── Domain model ──
//
// Device records as the API returns them, geolocation attached by the
// enricher, and the aggregate summary built over the filtered set.

pub mod device;
pub mod geo;
pub mod summary;

pub use device::{DeviceRecord, fields};
pub use geo::{EnrichedRecord, Geolocation};
pub use summary::{RetailerCounts, Summary};
