use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::syncthing_client::core::rate::{throughput, Throughput};
use crate::syncthing_client::core::status::{device_status, DeviceStatusCode, GroupedCompletion};
use crate::syncthing_client::helpers::{format_relative_time, short_identification};

use super::projection::{ConnectionSample, DeviceProjection};

/// Represents the sync state of a folder as seen from a peer's perspective.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct PeerFolderState {
    pub folder_id: String,
    pub folder_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub need_bytes: Option<i64>,
}

/// Complete peer information for UI display.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PeerPayload {
    pub id: String,
    pub short_id: String,
    pub name: String,
    pub status: DeviceStatusCode,
    pub state: String,
    pub connected: bool,
    pub paused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<String>,
    pub compression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
    pub completion: GroupedCompletion,
    pub rates: Throughput,
    pub in_bytes_total: i64,
    pub out_bytes_total: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub folders: Vec<PeerFolderState>,
}

impl PeerPayload {
    pub fn from_projection(device: &DeviceProjection, now: DateTime<Utc>) -> Self {
        let status = device_status(device, now);
        let connection = device.connection.as_ref();
        let connected = connection.is_some_and(|c| c.connected);

        let rates = throughput(
            device
                .previous_connection
                .as_ref()
                .and_then(ConnectionSample::from_connection),
            connection.and_then(ConnectionSample::from_connection),
        );

        let folders = device
            .folders
            .iter()
            .map(|folder| {
                let entry = device.completion.get(&folder.id);
                PeerFolderState {
                    folder_id: folder.id.clone(),
                    folder_label: folder.label.clone(),
                    completion: entry.map(|c| c.completion),
                    need_bytes: entry.map(|c| c.need_bytes),
                }
            })
            .collect();

        let non_empty = |value: &str| Some(value.to_string()).filter(|v| !v.is_empty());

        Self {
            id: device.id().to_string(),
            short_id: short_identification(device.id()),
            name: device.display_name().to_string(),
            status,
            state: status.label().to_string(),
            connected,
            paused: device.config.paused || connection.is_some_and(|c| c.paused),
            address: connection.and_then(|c| non_empty(&c.address)),
            client_version: connection.and_then(|c| non_empty(&c.client_version)),
            connection_type: connection.and_then(|c| non_empty(&c.connection_type)),
            compression: device.config.compression.clone(),
            last_seen: if connected {
                None
            } else {
                device
                    .stats
                    .as_ref()
                    .and_then(|stats| stats.last_seen)
                    .map(|at| format_relative_time(at, now))
            },
            completion: GroupedCompletion::from_entries(device.completion.values()),
            rates,
            in_bytes_total: connection.map_or(0, |c| c.in_bytes_total),
            out_bytes_total: connection.map_or(0, |c| c.out_bytes_total),
            folders,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::syncthing_client::api::{Completion, Connection, DeviceConfig, DeviceStats};
    use crate::syncthing_client::models::SharedFolder;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn peer() -> DeviceProjection {
        let mut device = DeviceProjection::new(DeviceConfig {
            device_id: "mfzwi3d-bnzgk4t".to_string(),
            name: "Laptop".to_string(),
            compression: "metadata".to_string(),
            ..DeviceConfig::default()
        });
        device.folders.push(SharedFolder {
            id: "docs".to_string(),
            label: "Docs".to_string(),
        });
        device
    }

    #[test]
    fn connected_peer_with_rates() {
        let mut device = peer();
        device.previous_connection = Some(Connection {
            at: Some(now() - Duration::seconds(10)),
            in_bytes_total: 1_000,
            out_bytes_total: 2_000,
            connected: true,
            ..Connection::default()
        });
        device.connection = Some(Connection {
            at: Some(now()),
            in_bytes_total: 11_000,
            out_bytes_total: 2_500,
            connected: true,
            address: "192.168.1.20:22000".to_string(),
            ..Connection::default()
        });
        device.completion.insert(
            "docs".to_string(),
            Completion {
                completion: 50.0,
                global_bytes: 1000,
                need_bytes: 500,
                need_items: 3,
                ..Completion::default()
            },
        );

        let payload = PeerPayload::from_projection(&device, now());
        assert_eq!(payload.short_id, "MFZWI3D");
        assert_eq!(payload.status, DeviceStatusCode::Syncing);
        assert_eq!(
            payload.rates,
            Throughput {
                in_bytes_per_sec: 1_000,
                out_bytes_per_sec: 50,
            }
        );
        assert_eq!(payload.address.as_deref(), Some("192.168.1.20:22000"));
        assert_eq!(payload.completion.completion, 50);
        assert_eq!(payload.folders[0].need_bytes, Some(500));
        assert_eq!(payload.last_seen, None);
    }

    #[test]
    fn disconnected_peer_shows_last_seen() {
        let mut device = peer();
        device.connection = Some(Connection::default());
        device.stats = Some(DeviceStats {
            last_seen: Some(now() - Duration::hours(3)),
            ..DeviceStats::default()
        });

        let payload = PeerPayload::from_projection(&device, now());
        assert_eq!(payload.status, DeviceStatusCode::Disconnected);
        assert_eq!(payload.last_seen.as_deref(), Some("3 h ago"));
        assert_eq!(payload.rates, Throughput::default());
        assert_eq!(payload.client_version, None);
    }
}
