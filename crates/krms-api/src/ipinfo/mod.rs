// ipinfo.io geolocation lookups keyed by IP address.

pub mod client;
pub mod models;

pub use client::IpInfoClient;
pub use models::IpInfo;
