// KRMS API wire types.
//
// Device objects are kept as ordered JSON maps: the report columns follow
// whatever fields the API returns, in the order it returns them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One raw device object, field order preserved.
pub type DeviceObject = IndexMap<String, Value>;

/// Response of `POST /auth/v1/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
}

/// Request body of `POST /api/v1/devices/connects/page`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceQuery {
    pub page: u32,
    pub limit: u64,
    /// Keyword filters -- always sent, always empty.
    pub keyword: IndexMap<String, Value>,
    /// Sort clauses such as `"syncTime DESC"`.
    pub orders: Vec<String>,
}

impl DeviceQuery {
    pub fn new(page: u32, limit: u64, orders: Vec<String>) -> Self {
        Self {
            page,
            limit,
            keyword: IndexMap::new(),
            orders,
        }
    }
}

/// One page of devices.
///
/// `data` may be absent or `null` on an empty page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevicePage {
    #[serde(default)]
    pub data: Option<Vec<DeviceObject>>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl DevicePage {
    pub fn into_devices(self) -> Vec<DeviceObject> {
        self.data.unwrap_or_default()
    }
}
