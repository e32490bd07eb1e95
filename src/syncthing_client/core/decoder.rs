use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::types::MonitorError;

use super::super::api::{
    FolderCompletionData, FolderScanProgressData, FolderSummaryData, PendingDevicesChangedData,
    RawEvent, StateChangedData, SyncthingConfig,
};

/// A decoded entry of the daemon's event log.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: u64,
    pub global_id: u64,
    pub time: DateTime<Utc>,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    FolderSummary(FolderSummaryData),
    ConfigSaved(Box<SyncthingConfig>),
    FolderScanProgress(FolderScanProgressData),
    StateChanged(StateChangedData),
    FolderCompletion(FolderCompletionData),
    PendingDevicesChanged(PendingDevicesChangedData),
    /// Any event type the dashboard does not project.
    Other { event_type: String, data: Value },
}

pub fn decode(raw: RawEvent) -> Result<Event, MonitorError> {
    let RawEvent {
        id,
        global_id,
        time,
        event_type,
        data,
    } = raw;

    let kind = match event_type.as_str() {
        "FolderSummary" => EventKind::FolderSummary(payload(data)?),
        "ConfigSaved" => EventKind::ConfigSaved(Box::new(payload(data)?)),
        "FolderScanProgress" => EventKind::FolderScanProgress(payload(data)?),
        "StateChanged" => EventKind::StateChanged(payload(data)?),
        "FolderCompletion" => EventKind::FolderCompletion(payload(data)?),
        "PendingDevicesChanged" => EventKind::PendingDevicesChanged(payload(data)?),
        _ => EventKind::Other { event_type, data },
    };

    Ok(Event {
        id,
        global_id,
        time,
        kind,
    })
}

/// Decode a batch, dropping events whose payload does not match their type.
pub fn decode_batch(batch: Vec<RawEvent>) -> Vec<Event> {
    batch
        .into_iter()
        .filter_map(|raw| {
            let id = raw.id;
            let event_type = raw.event_type.clone();
            match decode(raw) {
                Ok(event) => Some(event),
                Err(err) => {
                    warn!(id, event_type = %event_type, error = %err, "Skipping undecodable event");
                    None
                }
            }
        })
        .collect()
}

fn payload<T: DeserializeOwned>(data: Value) -> Result<T, MonitorError> {
    serde_json::from_value(data).map_err(MonitorError::Json)
}
