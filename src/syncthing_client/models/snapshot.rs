use serde::Serialize;

use super::folder::FolderPayload;
use super::overview::SyncthingOverview;
use super::peer::PeerPayload;
use super::pending::PendingPayload;

/// Everything a view needs, recomputed from the projection after each update.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    pub overview: SyncthingOverview,
    pub folders: Vec<FolderPayload>,
    pub peers: Vec<PeerPayload>,
    pub pending: Vec<PendingPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl DashboardSnapshot {
    /// One line for the log, e.g. `3 folders (1 busy), 2/4 peers connected, 1 pending`.
    pub fn summary(&self) -> String {
        let busy = self
            .folders
            .iter()
            .filter(|folder| folder.state_raw.as_deref().is_some_and(|state| state != "idle"))
            .count();
        let connected = self.peers.iter().filter(|peer| peer.connected).count();
        format!(
            "{} folders ({} busy), {}/{} peers connected, {} pending",
            self.folders.len(),
            busy,
            connected,
            self.peers.len(),
            self.pending.len()
        )
    }
}
