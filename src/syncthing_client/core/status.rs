use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::syncthing_client::api::{Completion, FolderStatus, FolderType};
use crate::syncthing_client::models::{DeviceProjection, FolderProjection};

/// Folder status as shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderStatusCode {
    Idle,
    SyncPrepare,
    Syncing,
    Error,
    Paused,
    Unshared,
    Scanning,
    OutOfSync,
    FailedItems,
    LocalAdditions,
    LocalUnencrypted,
    Unknown,
}

impl FolderStatusCode {
    pub fn label(self) -> &'static str {
        match self {
            FolderStatusCode::Idle => "Up to Date",
            FolderStatusCode::Scanning => "Scanning",
            FolderStatusCode::Syncing | FolderStatusCode::SyncPrepare => "Syncing",
            FolderStatusCode::Paused => "Paused",
            FolderStatusCode::Unshared => "Unshared",
            FolderStatusCode::Error => "Error",
            FolderStatusCode::OutOfSync => "Out of Sync",
            FolderStatusCode::FailedItems => "Failed Items",
            FolderStatusCode::LocalAdditions => "Local Additions",
            FolderStatusCode::LocalUnencrypted => "Local Unencrypted",
            FolderStatusCode::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatusCode {
    Disconnected,
    DisconnectedInactive,
    InSync,
    Paused,
    UnusedDisconnected,
    UnusedInSync,
    UnusedPaused,
    Syncing,
    Unknown,
}

impl DeviceStatusCode {
    pub fn label(self) -> &'static str {
        match self {
            DeviceStatusCode::Disconnected => "Disconnected",
            DeviceStatusCode::DisconnectedInactive => "Disconnected (Inactive)",
            DeviceStatusCode::InSync => "Up to Date",
            DeviceStatusCode::Paused => "Paused",
            DeviceStatusCode::UnusedDisconnected => "Disconnected (Unused)",
            DeviceStatusCode::UnusedInSync => "Connected (Unused)",
            DeviceStatusCode::UnusedPaused => "Paused (Unused)",
            DeviceStatusCode::Syncing => "Syncing",
            DeviceStatusCode::Unknown => "Unknown",
        }
    }
}

/// Per-folder completion entries of one device, summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupedCompletion {
    pub completion: i64,
    pub need_bytes: i64,
    pub need_items: i64,
    pub need_deletes: i64,
    pub total_bytes: i64,
}

impl GroupedCompletion {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a Completion>) -> Self {
        let mut grouped = GroupedCompletion::default();
        for entry in entries {
            grouped.need_bytes += entry.need_bytes;
            grouped.need_items += entry.need_items;
            grouped.need_deletes += entry.need_deletes;
            grouped.total_bytes += entry.global_bytes;
        }

        grouped.completion = if grouped.total_bytes == 0 {
            100
        } else {
            let ratio = grouped.need_bytes as f64 / grouped.total_bytes as f64;
            (100.0 * (1.0 - ratio)).floor() as i64
        };
        grouped
    }

    /// Fully synced by bytes. A grouping without bytes is never complete by
    /// itself; its need counters decide.
    pub fn is_complete(&self) -> bool {
        self.total_bytes > 0 && self.need_bytes == 0 && self.completion == 100
    }

    pub fn needs_something(&self) -> bool {
        self.need_bytes != 0 || self.need_items != 0 || self.need_deletes != 0
    }
}

/// Derive a folder's status; the first matching rule wins.
pub fn folder_status(folder: &FolderProjection) -> FolderStatusCode {
    let fallback = FolderStatus::default();
    let status = folder.status.as_ref().unwrap_or(&fallback);

    match status.state.as_str() {
        "syncing" => return FolderStatusCode::Syncing,
        "sync-preparing" => return FolderStatusCode::SyncPrepare,
        "scanning" => return FolderStatusCode::Scanning,
        _ => {}
    }

    if !status.invalid.is_empty() || !status.error.is_empty() {
        return FolderStatusCode::Error;
    }

    if folder.config.paused {
        return FolderStatusCode::Paused;
    }

    // the only configured device is this one
    if folder.config.devices.len() == 1 {
        return FolderStatusCode::Unshared;
    }

    if status.need_total_items > 0 {
        return FolderStatusCode::OutOfSync;
    }

    if status.receive_only_total_items > 0 {
        match folder.config.kind() {
            FolderType::ReceiveOnly => return FolderStatusCode::LocalAdditions,
            FolderType::ReceiveEncrypted => return FolderStatusCode::LocalUnencrypted,
            _ => {}
        }
    }

    if status.state == "idle" {
        return FolderStatusCode::Idle;
    }

    FolderStatusCode::Unknown
}

const INACTIVE_AFTER_DAYS: i64 = 7;

pub fn device_status(device: &DeviceProjection, now: DateTime<Utc>) -> DeviceStatusCode {
    let unused = device.is_unused();

    let Some(connection) = device.connection.as_ref() else {
        return DeviceStatusCode::Unknown;
    };

    if device.config.paused {
        return if unused {
            DeviceStatusCode::UnusedPaused
        } else {
            DeviceStatusCode::Paused
        };
    }

    if connection.connected {
        let grouped = GroupedCompletion::from_entries(device.completion.values());
        if grouped.is_complete() || !grouped.needs_something() {
            return if unused {
                DeviceStatusCode::UnusedInSync
            } else {
                DeviceStatusCode::InSync
            };
        }
        return DeviceStatusCode::Syncing;
    }

    let inactive = device
        .stats
        .as_ref()
        .and_then(|stats| stats.last_seen)
        .map_or(true, |last_seen| now - last_seen > Duration::days(INACTIVE_AFTER_DAYS));

    if unused {
        DeviceStatusCode::UnusedDisconnected
    } else if inactive {
        DeviceStatusCode::DisconnectedInactive
    } else {
        DeviceStatusCode::Disconnected
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::syncthing_client::api::{
        Connection, DeviceConfig, DeviceStats, FolderConfig, FolderDevice,
    };
    use crate::syncthing_client::models::SharedFolder;

    fn folder(devices: usize, folder_type: &str, status: FolderStatus) -> FolderProjection {
        let mut projection = FolderProjection::new(FolderConfig {
            id: "docs".to_string(),
            folder_type: folder_type.to_string(),
            devices: (0..devices)
                .map(|idx| FolderDevice {
                    device_id: format!("DEV{idx}"),
                    ..FolderDevice::default()
                })
                .collect(),
            ..FolderConfig::default()
        });
        projection.status = Some(status);
        projection
    }

    fn state(state: &str) -> FolderStatus {
        FolderStatus {
            state: state.to_string(),
            ..FolderStatus::default()
        }
    }

    #[test]
    fn error_beats_paused_beats_idle() {
        let mut projection = folder(
            2,
            "sendreceive",
            FolderStatus {
                error: "folder path missing".to_string(),
                ..state("idle")
            },
        );
        projection.config.paused = true;
        assert_eq!(folder_status(&projection), FolderStatusCode::Error);

        projection.status = Some(state("idle"));
        assert_eq!(folder_status(&projection), FolderStatusCode::Paused);

        projection.config.paused = false;
        assert_eq!(folder_status(&projection), FolderStatusCode::Idle);
    }

    #[test]
    fn remote_state_wins_over_everything() {
        let mut projection = folder(
            1,
            "sendreceive",
            FolderStatus {
                invalid: "broken".to_string(),
                ..state("scanning")
            },
        );
        projection.config.paused = true;
        assert_eq!(folder_status(&projection), FolderStatusCode::Scanning);

        projection.status = Some(state("sync-preparing"));
        assert_eq!(folder_status(&projection), FolderStatusCode::SyncPrepare);

        projection.status = Some(state("syncing"));
        assert_eq!(folder_status(&projection), FolderStatusCode::Syncing);
    }

    #[test]
    fn unshared_and_out_of_sync() {
        let unshared = folder(
            1,
            "sendreceive",
            FolderStatus {
                need_total_items: 4,
                ..state("idle")
            },
        );
        assert_eq!(folder_status(&unshared), FolderStatusCode::Unshared);

        let behind = folder(
            3,
            "sendreceive",
            FolderStatus {
                need_total_items: 4,
                ..state("idle")
            },
        );
        assert_eq!(folder_status(&behind), FolderStatusCode::OutOfSync);
    }

    #[test]
    fn receive_only_changes() {
        let changed = FolderStatus {
            receive_only_total_items: 2,
            ..state("idle")
        };
        assert_eq!(
            folder_status(&folder(2, "receiveonly", changed.clone())),
            FolderStatusCode::LocalAdditions
        );
        assert_eq!(
            folder_status(&folder(2, "receiveencrypted", changed.clone())),
            FolderStatusCode::LocalUnencrypted
        );
        assert_eq!(
            folder_status(&folder(2, "sendreceive", changed)),
            FolderStatusCode::Idle
        );
    }

    #[test]
    fn unknown_state_without_status() {
        let mut projection = folder(2, "sendreceive", FolderStatus::default());
        projection.status = None;
        assert_eq!(folder_status(&projection), FolderStatusCode::Unknown);
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn device(connected: bool, used: bool) -> DeviceProjection {
        let mut projection = DeviceProjection::new(DeviceConfig {
            device_id: "PEER".to_string(),
            name: "laptop".to_string(),
            ..DeviceConfig::default()
        });
        projection.connection = Some(Connection {
            connected,
            ..Connection::default()
        });
        if used {
            projection.folders.push(SharedFolder {
                id: "docs".to_string(),
                label: "Docs".to_string(),
            });
        }
        projection
    }

    fn completion(global_bytes: i64, need_bytes: i64) -> Completion {
        Completion {
            global_bytes,
            need_bytes,
            need_items: if need_bytes > 0 { 1 } else { 0 },
            ..Completion::default()
        }
    }

    #[test]
    fn connected_device_in_sync_or_syncing() {
        let mut projection = device(true, true);
        projection
            .completion
            .insert("docs".to_string(), completion(1000, 0));
        projection
            .completion
            .insert("music".to_string(), completion(5000, 0));
        assert_eq!(device_status(&projection, now()), DeviceStatusCode::InSync);

        projection
            .completion
            .insert("music".to_string(), completion(5000, 2000));
        assert_eq!(device_status(&projection, now()), DeviceStatusCode::Syncing);
    }

    #[test]
    fn a_single_needed_byte_keeps_device_syncing() {
        let mut projection = device(true, true);
        projection
            .completion
            .insert("docs".to_string(), completion(1000, 1));

        let grouped = GroupedCompletion::from_entries(projection.completion.values());
        assert_eq!(grouped.completion, 99);
        assert!(!grouped.is_complete());
        assert_eq!(device_status(&projection, now()), DeviceStatusCode::Syncing);
    }

    #[test]
    fn pending_deletes_without_bytes_keep_device_syncing() {
        let mut projection = device(true, true);
        projection.completion.insert(
            "docs".to_string(),
            Completion {
                global_bytes: 0,
                need_deletes: 5,
                need_items: 5,
                ..Completion::default()
            },
        );

        let grouped = GroupedCompletion::from_entries(projection.completion.values());
        assert_eq!(grouped.completion, 100);
        assert!(!grouped.is_complete());
        assert_eq!(device_status(&projection, now()), DeviceStatusCode::Syncing);
    }

    #[test]
    fn connected_unused_device() {
        assert_eq!(
            device_status(&device(true, false), now()),
            DeviceStatusCode::UnusedInSync
        );
    }

    #[test]
    fn no_connection_record_is_unknown() {
        let mut projection = device(false, true);
        projection.connection = None;
        projection.config.paused = true;
        assert_eq!(device_status(&projection, now()), DeviceStatusCode::Unknown);
    }

    #[test]
    fn paused_device() {
        let mut projection = device(true, true);
        projection.config.paused = true;
        assert_eq!(device_status(&projection, now()), DeviceStatusCode::Paused);

        let mut unused = device(true, false);
        unused.config.paused = true;
        assert_eq!(device_status(&unused, now()), DeviceStatusCode::UnusedPaused);
    }

    #[test]
    fn disconnected_device_goes_inactive_after_a_week() {
        let mut projection = device(false, true);
        projection.stats = Some(DeviceStats {
            last_seen: Some(now() - Duration::days(2)),
            ..DeviceStats::default()
        });
        assert_eq!(device_status(&projection, now()), DeviceStatusCode::Disconnected);

        projection.stats = Some(DeviceStats {
            last_seen: Some(now() - Duration::days(8)),
            ..DeviceStats::default()
        });
        assert_eq!(
            device_status(&projection, now()),
            DeviceStatusCode::DisconnectedInactive
        );

        let mut unused = device(false, false);
        unused.stats = projection.stats.clone();
        assert_eq!(
            device_status(&unused, now()),
            DeviceStatusCode::UnusedDisconnected
        );
    }

    #[test]
    fn grouped_completion_tolerates_zero_total() {
        let grouped = GroupedCompletion::from_entries(&[Completion::default()]);
        assert_eq!(grouped.completion, 100);
        assert!(!grouped.needs_something());

        let grouped = GroupedCompletion::from_entries(&[completion(1000, 250), completion(1000, 0)]);
        assert_eq!(grouped.completion, 87);
        assert_eq!(grouped.need_bytes, 250);
        assert_eq!(grouped.total_bytes, 2000);
    }
}
