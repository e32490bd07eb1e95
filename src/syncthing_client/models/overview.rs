use serde::Serialize;

use crate::syncthing_client::core::rate::{throughput, Throughput};
use crate::syncthing_client::helpers::{arch_name, humanize_duration, os_name, short_identification};

use super::projection::{FolderProjection, ThisDevice};

/// Aggregated status of the local daemon.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct SyncthingOverview {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    pub uptime_seconds: i64,
    pub uptime: String,
    pub local_files: u64,
    pub local_directories: u64,
    pub local_bytes: i64,
    pub rates: Throughput,
    pub in_bytes_total: i64,
    pub out_bytes_total: i64,
    pub max_send_kbps: i64,
    pub max_recv_kbps: i64,
}

/// Rate limits configured for the local daemon.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimits {
    pub max_send_kbps: i64,
    pub max_recv_kbps: i64,
}

impl SyncthingOverview {
    pub fn from_parts<'a>(
        this_device: &ThisDevice,
        name: Option<&str>,
        limits: RateLimits,
        folders: impl IntoIterator<Item = &'a FolderProjection>,
    ) -> Self {
        let status = this_device.status.as_ref();
        let version = this_device.version.as_ref();
        let uptime_seconds = status.map_or(0, |s| s.uptime);

        let mut overview = Self {
            available: status.is_some(),
            my_id: Some(this_device.my_id.clone()).filter(|id| !id.is_empty()),
            short_id: Some(this_device.my_id.as_str())
                .filter(|id| !id.is_empty())
                .map(short_identification),
            name: name.map(str::to_string),
            version: version.map(|v| v.version.clone()),
            os: version.map(|v| os_name(&v.os).to_string()),
            arch: version.map(|v| arch_name(&v.arch).to_string()),
            started_at: status
                .and_then(|s| s.start_time)
                .map(|at| at.to_rfc3339()),
            uptime_seconds,
            uptime: humanize_duration(uptime_seconds),
            rates: throughput(this_device.previous_total, this_device.total),
            in_bytes_total: this_device.total.map_or(0, |t| t.in_bytes_total),
            out_bytes_total: this_device.total.map_or(0, |t| t.out_bytes_total),
            max_send_kbps: limits.max_send_kbps,
            max_recv_kbps: limits.max_recv_kbps,
            ..Self::default()
        };

        for status in folders.into_iter().filter_map(|f| f.status.as_ref()) {
            overview.local_files += status.local_files;
            overview.local_directories += status.local_directories;
            overview.local_bytes += status.local_bytes;
        }
        overview
    }
}
