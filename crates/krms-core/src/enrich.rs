// ── Geolocation enrichment stage ──
//
// Each record's `locationIp` is looked up once per run (and once across
// runs, via the on-disk cache). Unresolvable addresses yield an empty
// `Geolocation`; the run never aborts here.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use krms_api::{IpInfo, IpInfoClient};
use tracing::{debug, info, warn};

use crate::model::{DeviceRecord, EnrichedRecord, Geolocation};
use crate::report::replace_file;

/// IP → lookup result, optionally persisted as JSON.
///
/// Load and save failures are logged and otherwise ignored: a broken cache
/// only costs extra lookups.
#[derive(Debug, Default)]
pub struct IpCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, IpInfo>,
    dirty: bool,
}

impl IpCache {
    /// A cache that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache at `path`. A missing or unreadable file starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<BTreeMap<String, IpInfo>>(&bytes) {
                Ok(entries) => {
                    info!(path = %path.display(), entries = entries.len(), "loaded IP cache");
                    entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring unreadable IP cache");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable IP cache");
                BTreeMap::new()
            }
        };
        Self {
            path: Some(path),
            entries,
            dirty: false,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, ip: &str) -> Option<&IpInfo> {
        self.entries.get(ip)
    }

    pub fn insert(&mut self, ip: String, info: IpInfo) {
        self.entries.insert(ip, info);
        self.dirty = true;
    }

    /// Persist if anything changed since load.
    pub fn save(&mut self) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        if !self.dirty {
            return;
        }
        let result = serde_json::to_vec_pretty(&self.entries)
            .map_err(std::io::Error::other)
            .and_then(|bytes| replace_file(path, &bytes));
        match result {
            Ok(()) => {
                self.dirty = false;
                info!(path = %path.display(), entries = self.entries.len(), "saved IP cache");
            }
            Err(e) => warn!(path = %path.display(), error = %e, "failed to save IP cache"),
        }
    }
}

/// Resolves device IPs to [`Geolocation`]s.
pub struct Enricher<'a> {
    client: &'a IpInfoClient,
    cache: IpCache,
}

impl<'a> Enricher<'a> {
    pub fn new(client: &'a IpInfoClient, cache: IpCache) -> Self {
        Self { client, cache }
    }

    /// Enrich every record, preserving order and length, then save the cache.
    pub async fn enrich(&mut self, devices: Vec<DeviceRecord>) -> Vec<EnrichedRecord> {
        let mut enriched = Vec::with_capacity(devices.len());
        let mut unresolved = 0usize;

        for device in devices {
            let geo = self.locate(device.ip_address()).await;
            if geo.is_empty() {
                unresolved += 1;
            }
            enriched.push(EnrichedRecord::new(device, geo));
        }

        info!(records = enriched.len(), unresolved, "enrichment complete");
        self.cache.save();
        enriched
    }

    /// Geolocation for one raw `locationIp` value.
    pub async fn locate(&mut self, raw_ip: Option<&str>) -> Geolocation {
        let Some(raw) = raw_ip else {
            return Geolocation::default();
        };
        let ip: IpAddr = match raw.parse() {
            Ok(ip) => ip,
            Err(_) => {
                debug!(ip = raw, "not an IP address, skipping lookup");
                return Geolocation::default();
            }
        };
        let key = ip.to_string();

        if let Some(info) = self.cache.get(&key) {
            return Geolocation::from(info);
        }

        match self.client.lookup(ip).await {
            Ok(info) => {
                let geo = Geolocation::from(&info);
                self.cache.insert(key, info);
                geo
            }
            Err(e) => {
                warn!(%ip, error = %e, "geolocation lookup failed");
                Geolocation::default()
            }
        }
    }

    pub fn cache(&self) -> &IpCache {
        &self.cache
    }

    pub fn into_cache(self) -> IpCache {
        self.cache
    }
}
