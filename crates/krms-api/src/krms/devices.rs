// KRMS device endpoints
//
// `POST /api/v1/devices/connects/page` returns one page per call; the
// listing helper walks pages until the API runs dry or the row cap is hit.

use tracing::{debug, warn};

use crate::error::Error;
use crate::krms::client::KrmsClient;
use crate::krms::models::{DeviceObject, DevicePage, DeviceQuery};

impl KrmsClient {
    /// Fetch a single page of devices.
    pub async fn list_devices_page(&self, query: &DeviceQuery) -> Result<DevicePage, Error> {
        let url = self.url("api/v1/devices/connects/page")?;
        debug!(page = query.page, limit = query.limit, "fetching device page");
        self.post(url, query).await
    }

    /// Collect pages starting at `query.page` into a single `Vec`.
    ///
    /// Stops at the first empty page, once the reported `total` is reached,
    /// or once `max_rows` devices have been collected (the result is
    /// truncated to exactly `max_rows`). A page shorter than `query.limit`
    /// does not end the walk: servers may cap the page size. A page whose
    /// first device repeats the previous page's first device means the
    /// server ignores `page`, and ends the walk without adding it.
    /// Each page is retried according to the client's retry policy.
    pub async fn list_devices(
        &self,
        mut query: DeviceQuery,
        max_rows: Option<usize>,
    ) -> Result<Vec<DeviceObject>, Error> {
        let retry = self.retry();
        let mut all: Vec<DeviceObject> = Vec::new();
        let mut previous_first: Option<DeviceObject> = None;

        loop {
            let page = retry
                .run("device page", || self.list_devices_page(&query))
                .await?;
            let total = page.total;
            let devices = page.into_devices();
            let received = devices.len();

            let Some(first) = devices.first() else {
                debug!(page = query.page, "empty page, listing complete");
                break;
            };
            if previous_first.as_ref() == Some(first) {
                warn!(page = query.page, "page repeats the previous one, stopping");
                break;
            }
            previous_first = Some(first.clone());
            all.extend(devices);

            debug!(page = query.page, received, collected = all.len(), "device page received");

            if let Some(cap) = max_rows {
                if all.len() >= cap {
                    all.truncate(cap);
                    break;
                }
            }

            let reached_total = total
                .and_then(|t| usize::try_from(t).ok())
                .is_some_and(|t| all.len() >= t);

            if reached_total {
                break;
            }

            match query.page.checked_add(1) {
                Some(next) => query.page = next,
                None => break,
            }
        }

        Ok(all)
    }
}
