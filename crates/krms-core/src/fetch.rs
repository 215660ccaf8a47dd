// ── Device fetch stage ──
//
// Token login, session check, then every page of devices. Any failure here
// is fatal for the run: nothing downstream runs on a partial fetch.

use krms_api::{DeviceQuery, KrmsClient};
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::error::CoreError;
use crate::model::DeviceRecord;

/// Authenticate and collect all devices in API order.
pub async fn fetch_devices(
    client: &KrmsClient,
    api: &ApiConfig,
) -> Result<Vec<DeviceRecord>, CoreError> {
    client.login(&api.credentials()).await?;
    info!(user = %api.username, "token received");

    let profile = client.profile().await?;
    let account = ["username", "userName", "name", "email"]
        .iter()
        .find_map(|key| profile.get(*key).and_then(serde_json::Value::as_str))
        .unwrap_or(api.username.as_str());
    info!(account, "session verified");
    debug!(profile_fields = profile.as_object().map_or(0, serde_json::Map::len), "profile received");

    let query = DeviceQuery::new(api.page, api.limit, api.orders.clone());
    let devices = client.list_devices(query, api.max_rows).await?;
    info!(count = devices.len(), "devices received");

    Ok(devices.into_iter().map(DeviceRecord::from).collect())
}
