use std::collections::HashMap;

use async_trait::async_trait;

use crate::types::MonitorError;

use super::api::{
    CompletionLookup, ConnectionsResponse, DeviceConfig, DeviceStats, FolderStats, FolderStatus,
    PendingDeviceInfo, RawEvent, SyncthingConfig, SystemStatus, SystemVersion,
};

/// Everything the dashboard engine needs from a Syncthing daemon.
///
/// `SyncthingClient` implements it over HTTP; tests substitute an in-memory fake.
#[async_trait]
pub trait RemoteState: Send + Sync + 'static {
    async fn system_status(&self) -> Result<SystemStatus, MonitorError>;
    async fn system_version(&self) -> Result<SystemVersion, MonitorError>;
    async fn connections(&self) -> Result<ConnectionsResponse, MonitorError>;
    async fn config(&self) -> Result<SyncthingConfig, MonitorError>;
    async fn folder_status(&self, folder: &str) -> Result<FolderStatus, MonitorError>;
    async fn completion(&self, device: &str, folder: &str) -> Result<CompletionLookup, MonitorError>;
    async fn folder_stats(&self) -> Result<HashMap<String, FolderStats>, MonitorError>;
    async fn device_stats(&self) -> Result<HashMap<String, DeviceStats>, MonitorError>;
    async fn pending_devices(&self) -> Result<HashMap<String, PendingDeviceInfo>, MonitorError>;

    /// Long-poll the event log for events newer than `since`.
    async fn events(&self, since: u64, limit: Option<u32>) -> Result<Vec<RawEvent>, MonitorError>;

    async fn set_folder_paused(&self, folder: &str, paused: bool) -> Result<(), MonitorError>;
    async fn scan_folder(&self, folder: &str) -> Result<(), MonitorError>;
    async fn revert_folder(&self, folder: &str) -> Result<(), MonitorError>;
    async fn put_config(&self, config: &SyncthingConfig) -> Result<(), MonitorError>;
    async fn add_device(&self, device: &DeviceConfig) -> Result<(), MonitorError>;
    async fn dismiss_pending_device(&self, device: &str) -> Result<(), MonitorError>;
}
