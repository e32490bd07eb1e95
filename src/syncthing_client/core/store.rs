use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::super::api::{
    CompletionLookup, ConnectionsResponse, DeviceStats, FolderScanProgressData, FolderStats,
    FolderStatus, PendingDeviceInfo, PendingDevicesChangedData, StateChangedData,
    SyncthingConfig, SystemStatus, SystemVersion,
};
use super::super::models::{
    ConnectionSample, DeviceProjection, FolderProjection, PendingDevice, ScanProgress,
    SharedFolder, ThisDevice,
};

/// Authoritative local mirror of the daemon's state.
///
/// Owned by the dashboard's single update loop; every mutation goes through
/// one of the `apply_*`/`merge_*` methods and re-applying the same content
/// leaves the store unchanged.
#[derive(Debug, Clone)]
pub struct ProjectionStore {
    folders: BTreeMap<String, FolderProjection>,
    devices: BTreeMap<String, DeviceProjection>,
    pending: BTreeMap<String, PendingDevice>,
    this_device: ThisDevice,
    config: Option<SyncthingConfig>,
    folder_stats: HashMap<String, FolderStats>,
    device_stats: HashMap<String, DeviceStats>,
    now: DateTime<Utc>,
}

impl Default for ProjectionStore {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl ProjectionStore {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            folders: BTreeMap::new(),
            devices: BTreeMap::new(),
            pending: BTreeMap::new(),
            this_device: ThisDevice::default(),
            config: None,
            folder_stats: HashMap::new(),
            device_stats: HashMap::new(),
            now,
        }
    }

    pub fn folders(&self) -> impl Iterator<Item = &FolderProjection> {
        self.folders.values()
    }

    pub fn folder(&self, id: &str) -> Option<&FolderProjection> {
        self.folders.get(id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceProjection> {
        self.devices.values()
    }

    pub fn device(&self, id: &str) -> Option<&DeviceProjection> {
        self.devices.get(id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingDevice> {
        self.pending.values()
    }

    pub fn pending_device(&self, id: &str) -> Option<&PendingDevice> {
        self.pending.get(id)
    }

    pub fn this_device(&self) -> &ThisDevice {
        &self.this_device
    }

    pub fn config(&self) -> Option<&SyncthingConfig> {
        self.config.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Display name of a configured device, this device included.
    pub fn device_name<'a>(&'a self, device_id: &'a str) -> &'a str {
        self.config
            .as_ref()
            .and_then(|config| config.device_name(device_id))
            .filter(|name| !name.is_empty())
            .unwrap_or(device_id)
    }

    /// `(device, folder)` pairs the dashboard tracks completion for.
    pub fn completion_pairs(&self) -> Vec<(String, String)> {
        self.devices
            .values()
            .flat_map(|device| {
                device
                    .folders
                    .iter()
                    .map(move |folder| (device.id().to_string(), folder.id.clone()))
            })
            .collect()
    }

    pub fn set_now(&mut self, now: DateTime<Utc>) {
        self.now = now;
    }

    /// Replace folder and device configuration by ID and drop what is gone.
    pub fn merge_config(&mut self, config: SyncthingConfig) {
        let my_id = self.this_device.my_id.clone();

        self.folders
            .retain(|id, _| config.folders.iter().any(|folder| &folder.id == id));
        for folder in &config.folders {
            let stats = self.folder_stats.get(&folder.id).cloned();
            let projection = self
                .folders
                .entry(folder.id.clone())
                .or_insert_with(|| FolderProjection {
                    stats,
                    ..FolderProjection::new(folder.clone())
                });
            projection.config = folder.clone();
        }

        self.devices.retain(|id, _| {
            id != &my_id && config.devices.iter().any(|device| &device.device_id == id)
        });
        for device in &config.devices {
            if device.device_id.is_empty() || device.device_id == my_id {
                continue;
            }

            let stats = self.device_stats.get(&device.device_id).cloned();
            let projection = self
                .devices
                .entry(device.device_id.clone())
                .or_insert_with(|| DeviceProjection {
                    stats,
                    ..DeviceProjection::new(device.clone())
                });
            projection.config = device.clone();
            projection.folders = config
                .folders
                .iter()
                .filter(|folder| folder.is_shared_with(&device.device_id))
                .map(|folder| SharedFolder {
                    id: folder.id.clone(),
                    label: folder.display_label().to_string(),
                })
                .collect();

            let shared: Vec<String> = projection.folders.iter().map(|f| f.id.clone()).collect();
            projection
                .completion
                .retain(|folder_id, _| shared.contains(folder_id));
        }

        debug!(
            folders = self.folders.len(),
            devices = self.devices.len(),
            "Merged configuration"
        );
        self.config = Some(config);
    }

    /// Returns `true` when this device's ID changed and the device list was rebuilt.
    pub fn apply_system_status(&mut self, status: SystemStatus) -> bool {
        let changed = !status.my_id.is_empty() && status.my_id != self.this_device.my_id;
        if changed {
            info!(my_id = %status.my_id, "Learned this device's ID");
            self.this_device.my_id = status.my_id.clone();
        }
        self.this_device.status = Some(status);

        if changed {
            if let Some(config) = self.config.clone() {
                self.merge_config(config);
            }
        }
        changed
    }

    pub fn apply_version(&mut self, version: SystemVersion) {
        self.this_device.version = Some(version);
    }

    /// Shift current samples to previous ones; a repeated sample is ignored.
    pub fn apply_connections(&mut self, connections: ConnectionsResponse) {
        if let Some(total) = ConnectionSample::from_total(&connections.total) {
            if self.this_device.total.map(|current| current.at) != Some(total.at) {
                self.this_device.previous_total = self.this_device.total.replace(total);
            }
        }

        for (id, device) in self.devices.iter_mut() {
            match connections.connections.get(id) {
                Some(connection) => {
                    let current_at = device.connection.as_ref().and_then(|c| c.at);
                    if device.connection.is_none() || current_at != connection.at {
                        device.previous_connection = device.connection.replace(connection.clone());
                    }
                }
                None => {
                    device.connection = None;
                    device.previous_connection = None;
                }
            }
        }
    }

    pub fn set_folder_status(&mut self, folder_id: &str, status: FolderStatus) {
        match self.folders.get_mut(folder_id) {
            Some(folder) => folder.status = Some(status),
            None => debug!(folder = folder_id, "Status for unknown folder ignored"),
        }
    }

    pub fn clear_folder_status(&mut self, folder_id: &str) {
        if let Some(folder) = self.folders.get_mut(folder_id) {
            folder.status = None;
        }
    }

    pub fn apply_scan_progress(&mut self, progress: FolderScanProgressData) {
        if let Some(folder) = self.folders.get_mut(&progress.folder) {
            folder.scan = Some(ScanProgress {
                current: progress.current,
                total: progress.total,
                rate: progress.rate,
            });
        }
    }

    pub fn apply_state_changed(&mut self, change: &StateChangedData) {
        let Some(folder) = self.folders.get_mut(&change.folder) else {
            return;
        };
        if change.to == "scanning" {
            folder.scan = None;
        }
        if let Some(status) = folder.status.as_mut() {
            status.state = change.to.clone();
            status.error = change.error.clone().unwrap_or_default();
        }
    }

    pub fn apply_completion(&mut self, device_id: &str, folder_id: &str, lookup: CompletionLookup) {
        let Some(device) = self.devices.get_mut(device_id) else {
            debug!(device = device_id, folder = folder_id, "Completion for unknown device ignored");
            return;
        };
        match lookup {
            CompletionLookup::Found(completion) => {
                device.completion.insert(folder_id.to_string(), completion);
            }
            CompletionLookup::NotFound => {
                device.completion.remove(folder_id);
            }
        }
    }

    pub fn apply_folder_stats(&mut self, stats: HashMap<String, FolderStats>) {
        for (id, folder) in self.folders.iter_mut() {
            folder.stats = stats.get(id).cloned();
        }
        self.folder_stats = stats;
    }

    pub fn apply_device_stats(&mut self, stats: HashMap<String, DeviceStats>) {
        for (id, device) in self.devices.iter_mut() {
            device.stats = stats.get(id).cloned();
        }
        self.device_stats = stats;
    }

    /// A full pending-devices snapshot replaces the known set.
    pub fn replace_pending(&mut self, pending: HashMap<String, PendingDeviceInfo>) {
        self.pending = pending
            .into_iter()
            .map(|(device_id, info)| {
                let entry = PendingDevice {
                    device_id: device_id.clone(),
                    name: info.name,
                    address: info.address,
                    time: info.time,
                };
                (device_id, entry)
            })
            .collect();
    }

    pub fn apply_pending_changes(&mut self, changes: PendingDevicesChangedData, at: DateTime<Utc>) {
        for added in changes.added {
            self.pending.insert(
                added.device_id.clone(),
                PendingDevice {
                    device_id: added.device_id,
                    name: added.name,
                    address: added.address,
                    time: Some(at),
                },
            );
        }
        for removed in changes.removed {
            self.pending.remove(&removed.device_id);
        }
    }

    pub fn remove_pending(&mut self, device_id: &str) -> Option<PendingDevice> {
        self.pending.remove(device_id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::syncthing_client::api::{
        Completion, Connection, ConnectionTotal, DeviceConfig, FolderConfig, FolderDevice,
        PendingDeviceAdded, PendingDeviceRemoved,
    };

    const ME: &str = "ME";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn folder(id: &str, devices: &[&str]) -> FolderConfig {
        FolderConfig {
            id: id.to_string(),
            label: id.to_uppercase(),
            folder_type: "sendreceive".to_string(),
            devices: devices
                .iter()
                .map(|device| FolderDevice {
                    device_id: device.to_string(),
                    ..FolderDevice::default()
                })
                .collect(),
            ..FolderConfig::default()
        }
    }

    fn device(id: &str) -> DeviceConfig {
        DeviceConfig {
            device_id: id.to_string(),
            name: id.to_lowercase(),
            ..DeviceConfig::default()
        }
    }

    fn config() -> SyncthingConfig {
        SyncthingConfig {
            folders: vec![folder("docs", &[ME, "PEER"]), folder("music", &[ME])],
            devices: vec![device(ME), device("PEER"), device("SPARE")],
            ..SyncthingConfig::default()
        }
    }

    fn store() -> ProjectionStore {
        let mut store = ProjectionStore::new(t0());
        store.apply_system_status(SystemStatus {
            my_id: ME.to_string(),
            ..SystemStatus::default()
        });
        store.merge_config(config());
        store
    }

    fn completion(need_bytes: i64) -> Completion {
        Completion {
            global_bytes: 1000,
            need_bytes,
            ..Completion::default()
        }
    }

    #[test]
    fn config_merge_excludes_this_device() {
        let store = store();
        let ids: Vec<&str> = store.devices().map(|device| device.id()).collect();
        assert_eq!(ids, vec!["PEER", "SPARE"]);

        let peer = store.device("PEER").unwrap();
        assert_eq!(
            peer.folders,
            vec![SharedFolder {
                id: "docs".to_string(),
                label: "DOCS".to_string(),
            }]
        );
        assert!(store.device("SPARE").unwrap().is_unused());
        assert_eq!(
            store.completion_pairs(),
            vec![("PEER".to_string(), "docs".to_string())]
        );
        assert_eq!(store.device_name(ME), "me");
    }

    #[test]
    fn config_merge_keeps_status_and_drops_removed_entities() {
        let mut store = store();
        store.set_folder_status(
            "docs",
            FolderStatus {
                state: "idle".to_string(),
                ..FolderStatus::default()
            },
        );
        store.apply_completion("PEER", "docs", CompletionLookup::Found(completion(10)));

        let mut next = config();
        next.folders[0].label = "Documents".to_string();
        next.folders.retain(|folder| folder.id != "music");
        next.devices.retain(|device| device.device_id != "SPARE");
        store.merge_config(next);

        let docs = store.folder("docs").unwrap();
        assert_eq!(docs.config.label, "Documents");
        assert_eq!(docs.status.as_ref().unwrap().state, "idle");
        assert!(store.folder("music").is_none());
        assert!(store.device("SPARE").is_none());
        assert_eq!(store.device("PEER").unwrap().completion.len(), 1);
    }

    #[test]
    fn unsharing_a_folder_prunes_its_completion() {
        let mut store = store();
        store.apply_completion("PEER", "docs", CompletionLookup::Found(completion(10)));

        let mut next = config();
        next.folders[0].devices.retain(|device| device.device_id == ME);
        store.merge_config(next);

        let peer = store.device("PEER").unwrap();
        assert!(peer.completion.is_empty());
        assert!(peer.is_unused());
    }

    #[test]
    fn learning_my_id_late_rebuilds_devices() {
        let mut store = ProjectionStore::new(t0());
        store.merge_config(config());
        assert!(store.device(ME).is_some());

        let changed = store.apply_system_status(SystemStatus {
            my_id: ME.to_string(),
            uptime: 60,
            ..SystemStatus::default()
        });
        assert!(changed);
        assert!(store.device(ME).is_none());
        assert_eq!(store.this_device().my_id, ME);
    }

    #[test]
    fn folder_status_is_idempotent() {
        let status = FolderStatus {
            state: "syncing".to_string(),
            need_total_items: 3,
            ..FolderStatus::default()
        };
        let mut once = store();
        once.set_folder_status("docs", status.clone());
        let mut twice = once.clone();
        twice.set_folder_status("docs", status);

        assert_eq!(once.folder("docs"), twice.folder("docs"));
    }

    #[test]
    fn failed_folder_status_clears() {
        let mut store = store();
        store.set_folder_status("docs", FolderStatus::default());
        store.clear_folder_status("docs");
        assert!(store.folder("docs").unwrap().status.is_none());
    }

    #[test]
    fn not_found_completion_removes_entry() {
        let mut store = store();
        store.apply_completion("PEER", "docs", CompletionLookup::Found(completion(10)));
        assert_eq!(store.device("PEER").unwrap().completion.len(), 1);

        store.apply_completion("PEER", "docs", CompletionLookup::NotFound);
        assert!(store.device("PEER").unwrap().completion.is_empty());
    }

    #[test]
    fn scan_progress_cleared_when_scanning_starts() {
        let mut store = store();
        store.set_folder_status("docs", FolderStatus::default());
        store.apply_scan_progress(FolderScanProgressData {
            folder: "docs".to_string(),
            current: 10,
            total: 100,
            rate: 5.0,
        });
        assert!(store.folder("docs").unwrap().scan.is_some());

        store.apply_state_changed(&StateChangedData {
            folder: "docs".to_string(),
            from: "idle".to_string(),
            to: "scanning".to_string(),
            duration: None,
            error: None,
        });
        let docs = store.folder("docs").unwrap();
        assert!(docs.scan.is_none());
        assert_eq!(docs.status.as_ref().unwrap().state, "scanning");
    }

    #[test]
    fn leaving_the_error_state_clears_the_error() {
        let mut store = store();
        store.set_folder_status(
            "docs",
            FolderStatus {
                state: "idle".to_string(),
                ..FolderStatus::default()
            },
        );
        let change = |from: &str, to: &str, error: Option<&str>| StateChangedData {
            folder: "docs".to_string(),
            from: from.to_string(),
            to: to.to_string(),
            duration: None,
            error: error.map(str::to_string),
        };

        store.apply_state_changed(&change("idle", "error", Some("folder path missing")));
        let status = store.folder("docs").unwrap().status.clone().unwrap();
        assert_eq!(status.error, "folder path missing");

        store.apply_state_changed(&change("error", "idle", None));
        let status = store.folder("docs").unwrap().status.clone().unwrap();
        assert_eq!(status.state, "idle");
        assert_eq!(status.error, "");
    }

    #[test]
    fn pending_added_then_removed() {
        let mut store = store();
        store.apply_pending_changes(
            PendingDevicesChangedData {
                added: vec![PendingDeviceAdded {
                    device_id: "A".to_string(),
                    name: "phone".to_string(),
                    address: "10.0.0.5:22000".to_string(),
                }],
                removed: Vec::new(),
            },
            t0(),
        );
        assert_eq!(store.pending_device("A").unwrap().time, Some(t0()));

        store.apply_pending_changes(
            PendingDevicesChangedData {
                added: Vec::new(),
                removed: vec![PendingDeviceRemoved {
                    device_id: "A".to_string(),
                }],
            },
            t0() + Duration::seconds(30),
        );
        assert!(store.pending_device("A").is_none());
    }

    #[test]
    fn pending_snapshot_replaces_set() {
        let mut store = store();
        store.apply_pending_changes(
            PendingDevicesChangedData {
                added: vec![PendingDeviceAdded {
                    device_id: "OLD".to_string(),
                    name: String::new(),
                    address: String::new(),
                }],
                removed: Vec::new(),
            },
            t0(),
        );

        let mut snapshot = HashMap::new();
        snapshot.insert(
            "NEW".to_string(),
            PendingDeviceInfo {
                time: Some(t0()),
                name: "tablet".to_string(),
                address: String::new(),
            },
        );
        store.replace_pending(snapshot);

        let ids: Vec<&str> = store.pending().map(|p| p.device_id.as_str()).collect();
        assert_eq!(ids, vec!["NEW"]);
    }

    #[test]
    fn connection_samples_shift_once_per_reading() {
        let mut store = store();
        let reading = |at: DateTime<Utc>, bytes: i64| {
            let mut connections = HashMap::new();
            connections.insert(
                "PEER".to_string(),
                Connection {
                    at: Some(at),
                    in_bytes_total: bytes,
                    connected: true,
                    ..Connection::default()
                },
            );
            ConnectionsResponse {
                connections,
                total: ConnectionTotal {
                    at: Some(at),
                    in_bytes_total: bytes,
                    out_bytes_total: 0,
                },
            }
        };

        store.apply_connections(reading(t0(), 100));
        store.apply_connections(reading(t0() + Duration::seconds(10), 600));
        store.apply_connections(reading(t0() + Duration::seconds(10), 600));

        let peer = store.device("PEER").unwrap();
        assert_eq!(peer.previous_connection.as_ref().unwrap().in_bytes_total, 100);
        assert_eq!(peer.connection.as_ref().unwrap().in_bytes_total, 600);
        assert_eq!(store.this_device().previous_total.unwrap().in_bytes_total, 100);

        // SPARE was never reported
        assert!(store.device("SPARE").unwrap().connection.is_none());
    }

    #[test]
    fn stats_arriving_before_config_are_kept() {
        let mut store = ProjectionStore::new(t0());
        let mut stats = HashMap::new();
        stats.insert(
            "docs".to_string(),
            FolderStats {
                last_scan: Some(t0()),
                ..FolderStats::default()
            },
        );
        store.apply_folder_stats(stats);
        store.merge_config(config());

        assert_eq!(
            store.folder("docs").unwrap().stats.as_ref().unwrap().last_scan,
            Some(t0())
        );
    }
}
