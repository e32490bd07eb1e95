use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::syncthing_client::helpers::{format_relative_time, short_identification};

use super::projection::PendingDevice;

/// A device asking to connect that is not configured yet.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PendingPayload {
    pub id: String,
    pub short_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

impl PendingPayload {
    pub fn from_projection(pending: &PendingDevice, now: DateTime<Utc>) -> Self {
        Self {
            id: pending.device_id.clone(),
            short_id: short_identification(&pending.device_id),
            name: pending.name.clone(),
            address: Some(pending.address.clone()).filter(|address| !address.is_empty()),
            since: pending.time.map(|at| format_relative_time(at, now)),
        }
    }
}
