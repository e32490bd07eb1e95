use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::syncthing_client::api::{
    Completion, Connection, ConnectionTotal, DeviceConfig, DeviceStats, FolderConfig,
    FolderStats, FolderStatus, SystemStatus, SystemVersion,
};

/// Local mirror of one configured folder.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderProjection {
    pub config: FolderConfig,
    pub status: Option<FolderStatus>,
    pub stats: Option<FolderStats>,
    pub scan: Option<ScanProgress>,
}

impl FolderProjection {
    pub fn new(config: FolderConfig) -> Self {
        Self {
            config,
            status: None,
            stats: None,
            scan: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }
}

/// In-progress scan counters reported by `FolderScanProgress` events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanProgress {
    pub current: i64,
    pub total: i64,
    pub rate: f64,
}

impl ScanProgress {
    pub fn percent(&self) -> f64 {
        if self.total <= 0 {
            return 0.0;
        }
        (self.current as f64 / self.total as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Seconds left at the reported rate, if the rate is usable.
    pub fn remaining_seconds(&self) -> Option<i64> {
        if self.rate <= 0.0 || self.current >= self.total {
            return None;
        }
        Some(((self.total - self.current) as f64 / self.rate).round() as i64)
    }
}

/// Local mirror of one remote device (never this device).
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProjection {
    pub config: DeviceConfig,
    pub stats: Option<DeviceStats>,
    pub connection: Option<Connection>,
    pub previous_connection: Option<Connection>,
    /// Completion counters keyed by folder ID.
    pub completion: BTreeMap<String, Completion>,
    pub folders: Vec<SharedFolder>,
}

impl DeviceProjection {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            stats: None,
            connection: None,
            previous_connection: None,
            completion: BTreeMap::new(),
            folders: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.config.device_id
    }

    pub fn display_name(&self) -> &str {
        if self.config.name.is_empty() {
            &self.config.device_id
        } else {
            &self.config.name
        }
    }

    /// A device sharing no folder with this node.
    pub fn is_unused(&self) -> bool {
        self.folders.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFolder {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingDevice {
    pub device_id: String,
    pub name: String,
    pub address: String,
    pub time: Option<DateTime<Utc>>,
}

/// Cumulative byte counters at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSample {
    pub in_bytes_total: i64,
    pub out_bytes_total: i64,
    pub at: DateTime<Utc>,
}

impl ConnectionSample {
    /// `None` when the daemon did not stamp the counters.
    pub fn from_connection(connection: &Connection) -> Option<Self> {
        connection.at.map(|at| Self {
            in_bytes_total: connection.in_bytes_total,
            out_bytes_total: connection.out_bytes_total,
            at,
        })
    }

    pub fn from_total(total: &ConnectionTotal) -> Option<Self> {
        total.at.map(|at| Self {
            in_bytes_total: total.in_bytes_total,
            out_bytes_total: total.out_bytes_total,
            at,
        })
    }
}

/// What the dashboard knows about the local daemon itself.
#[derive(Debug, Clone, Default)]
pub struct ThisDevice {
    pub my_id: String,
    pub status: Option<SystemStatus>,
    pub version: Option<SystemVersion>,
    pub total: Option<ConnectionSample>,
    pub previous_total: Option<ConnectionSample>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_progress_percent_and_eta() {
        let scan = ScanProgress {
            current: 250,
            total: 1000,
            rate: 50.0,
        };
        assert_eq!(scan.percent(), 25.0);
        assert_eq!(scan.remaining_seconds(), Some(15));

        let stalled = ScanProgress { rate: 0.0, ..scan };
        assert_eq!(stalled.remaining_seconds(), None);

        let empty = ScanProgress {
            current: 0,
            total: 0,
            rate: 0.0,
        };
        assert_eq!(empty.percent(), 0.0);
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let device = DeviceProjection::new(DeviceConfig {
            device_id: "AAAA-BBBB".to_string(),
            ..DeviceConfig::default()
        });
        assert_eq!(device.display_name(), "AAAA-BBBB");
        assert!(device.is_unused());
    }

    #[test]
    fn unstamped_connection_has_no_sample() {
        let connection = Connection {
            in_bytes_total: 10,
            ..Connection::default()
        };
        assert_eq!(ConnectionSample::from_connection(&connection), None);
    }
}
