use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::syncthing_client::core::status::{folder_status, FolderStatusCode};
use crate::syncthing_client::helpers::{format_relative_time, scan_duration};

use super::projection::FolderProjection;

/// Complete folder information for UI display.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FolderPayload {
    pub id: String,
    pub label: String,
    pub path: String,
    pub folder_type: String,
    pub status: FolderStatusCode,
    pub state: String,
    pub state_raw: Option<String>,
    pub paused: bool,
    pub global_bytes: i64,
    pub local_bytes: i64,
    pub need_bytes: i64,
    pub need_items: u64,
    pub completion: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<FolderScan>,
    pub shared_with: Vec<String>,
    pub rescan_interval_s: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versioning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_change: Option<FolderChange>,
}

/// The most recent file change in a folder.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct FolderChange {
    pub name: String,
    pub action: String,
    pub when: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FolderScan {
    pub percent: f64,
    pub rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
}

impl FolderPayload {
    /// `shared_with` holds the display names of the other devices sharing the folder.
    pub fn from_projection(
        folder: &FolderProjection,
        shared_with: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let code = folder_status(folder);
        let status = folder.status.as_ref();
        let global_bytes = status.map_or(0, |s| s.global_bytes);
        let need_bytes = status.map_or(0, |s| s.need_bytes);

        let error = status
            .map(|s| if s.error.is_empty() { &s.invalid } else { &s.error })
            .filter(|message| !message.is_empty())
            .cloned();

        let scan = match (code, folder.scan) {
            (FolderStatusCode::Scanning, Some(progress)) => Some(FolderScan {
                percent: progress.percent(),
                rate: progress.rate,
                eta: progress.remaining_seconds().map(scan_duration),
            }),
            _ => None,
        };

        let stats = folder.stats.as_ref();
        let last_scan = stats
            .and_then(|s| s.last_scan)
            .map(|at| format_relative_time(at, now));
        let last_change = stats
            .filter(|s| !s.last_file.filename.is_empty())
            .and_then(|s| {
                s.last_file.at.map(|at| FolderChange {
                    name: s.last_file.filename.clone(),
                    action: (if s.last_file.deleted { "deleted" } else { "updated" }).to_string(),
                    when: format_relative_time(at, now),
                })
            });

        let versioning = Some(folder.config.versioning.kind.clone()).filter(|kind| !kind.is_empty());

        Self {
            id: folder.config.id.clone(),
            label: folder.config.display_label().to_string(),
            path: folder.config.path.clone(),
            folder_type: folder.config.folder_type.clone(),
            status: code,
            state: code.label().to_string(),
            state_raw: status.map(|s| s.state.clone()).filter(|s| !s.is_empty()),
            paused: folder.config.paused,
            global_bytes,
            local_bytes: status.map_or(0, |s| s.local_bytes),
            need_bytes,
            need_items: status.map_or(0, |s| s.need_total_items),
            completion: compute_completion(global_bytes, need_bytes),
            error,
            scan,
            shared_with,
            rescan_interval_s: folder.config.rescan_interval_s,
            versioning,
            last_scan,
            last_change,
        }
    }
}

/// Calculates folder completion percentage based on global and needed bytes.
fn compute_completion(global_bytes: i64, need_bytes: i64) -> f64 {
    if global_bytes <= 0 {
        return 100.0;
    }
    let complete = (global_bytes - need_bytes.max(0)).max(0);
    ((complete as f64 / global_bytes as f64) * 100.0).clamp(0.0, 100.0)
}
