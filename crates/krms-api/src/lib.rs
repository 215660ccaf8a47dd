// krms-api: async clients for the KRMS device inventory API and ipinfo.io

pub mod auth;
pub mod error;
pub mod ipinfo;
pub mod krms;
pub mod retry;
pub mod transport;

pub use auth::Credentials;
pub use error::Error;
pub use ipinfo::{IpInfo, IpInfoClient};
pub use krms::{DeviceObject, DevicePage, DeviceQuery, KrmsClient};
pub use retry::RetryPolicy;
pub use transport::TransportConfig;
