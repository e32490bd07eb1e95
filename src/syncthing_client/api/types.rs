use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Full `/rest/config` document.
///
/// Unknown keys are kept in `extra` so the document can be written back
/// with `PUT /rest/config` without losing settings this client ignores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncthingConfig {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub folders: Vec<FolderConfig>,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub remote_ignored_devices: Vec<RemoteIgnoredDevice>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SyncthingConfig {
    pub fn device_name(&self, device_id: &str) -> Option<&str> {
        self.devices
            .iter()
            .find(|device| device.device_id == device_id)
            .map(|device| device.name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderConfig {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, rename = "type")]
    pub folder_type: String,
    #[serde(default)]
    pub devices: Vec<FolderDevice>,
    #[serde(default)]
    pub rescan_interval_s: i64,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub versioning: Versioning,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Folder sharing mode as configured on the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderType {
    SendReceive,
    SendOnly,
    ReceiveOnly,
    ReceiveEncrypted,
    Other,
}

impl FolderConfig {
    pub fn kind(&self) -> FolderType {
        match self.folder_type.as_str() {
            "sendreceive" | "readwrite" => FolderType::SendReceive,
            "sendonly" | "readonly" => FolderType::SendOnly,
            "receiveonly" => FolderType::ReceiveOnly,
            "receiveencrypted" => FolderType::ReceiveEncrypted,
            _ => FolderType::Other,
        }
    }

    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }

    pub fn is_shared_with(&self, device_id: &str) -> bool {
        self.devices.iter().any(|device| device.device_id == device_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDevice {
    #[serde(rename = "deviceID")]
    pub device_id: String,
    #[serde(default)]
    pub introduced_by: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioning {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    #[serde(default, rename = "deviceID")]
    pub device_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub compression: String,
    #[serde(default)]
    pub introducer: bool,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub auto_accept_folders: bool,
    #[serde(default)]
    pub max_send_kbps: i64,
    #[serde(default)]
    pub max_recv_kbps: i64,
    #[serde(default)]
    pub untrusted: bool,
    #[serde(default)]
    pub num_connections: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    #[serde(default)]
    pub max_send_kbps: i64,
    #[serde(default)]
    pub max_recv_kbps: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteIgnoredDevice {
    #[serde(rename = "deviceID")]
    pub device_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub time: DateTime<Utc>,
}

/// `/rest/db/status` and the `summary` of a `FolderSummary` event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FolderStatus {
    pub errors: u64,
    pub pull_errors: u64,
    pub invalid: String,
    pub error: String,
    pub global_files: u64,
    pub global_directories: u64,
    pub global_bytes: i64,
    pub global_total_items: u64,
    pub local_files: u64,
    pub local_directories: u64,
    pub local_bytes: i64,
    pub local_total_items: u64,
    pub need_files: u64,
    pub need_directories: u64,
    pub need_deletes: u64,
    pub need_bytes: i64,
    pub need_total_items: u64,
    pub receive_only_changed_files: u64,
    pub receive_only_changed_bytes: i64,
    pub receive_only_total_items: u64,
    pub in_sync_files: u64,
    pub in_sync_bytes: i64,
    pub state: String,
    pub state_changed: Option<DateTime<Utc>>,
    pub sequence: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FolderStats {
    pub last_file: LastFile,
    pub last_scan: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LastFile {
    pub at: Option<DateTime<Utc>>,
    pub filename: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceStats {
    pub last_seen: Option<DateTime<Utc>>,
    pub last_connection_duration_s: f64,
}

#[derive(Debug, Deserialize, Default)]
pub struct ConnectionsResponse {
    #[serde(default)]
    pub connections: HashMap<String, Connection>,
    #[serde(default)]
    pub total: ConnectionTotal,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Connection {
    pub at: Option<DateTime<Utc>>,
    pub in_bytes_total: i64,
    pub out_bytes_total: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub connected: bool,
    pub paused: bool,
    pub client_version: String,
    pub address: String,
    #[serde(rename = "type")]
    pub connection_type: String,
    pub is_local: bool,
    pub crypto: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionTotal {
    pub at: Option<DateTime<Utc>>,
    pub in_bytes_total: i64,
    pub out_bytes_total: i64,
}

/// `/rest/db/completion` for one `(device, folder)` pair.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Completion {
    pub completion: f64,
    pub global_bytes: i64,
    pub need_bytes: i64,
    pub global_items: i64,
    pub need_items: i64,
    pub need_deletes: i64,
    pub remote_state: String,
    pub sequence: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PendingDeviceInfo {
    pub time: Option<DateTime<Utc>>,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemStatus {
    #[serde(rename = "myID")]
    pub my_id: String,
    pub uptime: i64,
    pub start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemVersion {
    pub version: String,
    pub long_version: String,
    pub codename: String,
    pub os: String,
    pub arch: String,
}

/// One entry of `/rest/events`, payload still undecoded.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub id: u64,
    #[serde(default, rename = "globalID")]
    pub global_id: u64,
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FolderSummaryData {
    pub folder: String,
    pub summary: FolderStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FolderScanProgressData {
    pub folder: String,
    #[serde(default)]
    pub current: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateChangedData {
    pub folder: String,
    #[serde(default)]
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FolderCompletionData {
    pub device: String,
    pub folder: String,
    #[serde(flatten)]
    pub completion: Completion,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PendingDevicesChangedData {
    #[serde(default)]
    pub added: Vec<PendingDeviceAdded>,
    #[serde(default)]
    pub removed: Vec<PendingDeviceRemoved>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PendingDeviceAdded {
    #[serde(rename = "deviceID")]
    pub device_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PendingDeviceRemoved {
    #[serde(rename = "deviceID")]
    pub device_id: String,
}
