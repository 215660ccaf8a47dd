// KRMS device inventory API: token auth, session check, paginated device listing.

mod auth;
pub mod client;
mod devices;
pub mod models;

pub use client::KrmsClient;
pub use models::{DeviceObject, DevicePage, DeviceQuery};
