mod folder;
mod overview;
mod peer;
mod pending;
mod projection;
mod snapshot;

pub use folder::{FolderChange, FolderPayload, FolderScan};
pub use overview::{RateLimits, SyncthingOverview};
pub use peer::{PeerFolderState, PeerPayload};
pub use pending::PendingPayload;
pub use projection::{
    ConnectionSample, DeviceProjection, FolderProjection, PendingDevice, ScanProgress,
    SharedFolder, ThisDevice,
};
pub use snapshot::DashboardSnapshot;
