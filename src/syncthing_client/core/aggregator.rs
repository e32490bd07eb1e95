use super::super::models::{
    DashboardSnapshot, FolderPayload, PeerPayload, PendingPayload, RateLimits, SyncthingOverview,
};
use super::store::ProjectionStore;

/// Composes the UI-ready snapshot from the current projection.
pub fn compose_snapshot(store: &ProjectionStore, last_error: Option<&str>) -> DashboardSnapshot {
    let now = store.now();
    let my_id = store.this_device().my_id.as_str();

    let limits = store
        .config()
        .map(|config| RateLimits {
            max_send_kbps: config.options.max_send_kbps,
            max_recv_kbps: config.options.max_recv_kbps,
        })
        .unwrap_or_default();
    let name = Some(my_id)
        .filter(|id| !id.is_empty())
        .map(|id| store.device_name(id));
    let overview = SyncthingOverview::from_parts(store.this_device(), name, limits, store.folders());

    let folders = store
        .folders()
        .map(|folder| {
            let shared_with = folder
                .config
                .devices
                .iter()
                .filter(|device| device.device_id != my_id)
                .map(|device| store.device_name(&device.device_id).to_string())
                .collect();
            FolderPayload::from_projection(folder, shared_with, now)
        })
        .collect();

    let mut peers: Vec<PeerPayload> = store
        .devices()
        .map(|device| PeerPayload::from_projection(device, now))
        .collect();
    peers.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    let mut pending: Vec<PendingPayload> = store
        .pending()
        .map(|pending| PendingPayload::from_projection(pending, now))
        .collect();
    pending.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    DashboardSnapshot {
        overview,
        folders,
        peers,
        pending,
        last_error: last_error.map(str::to_string),
    }
}
