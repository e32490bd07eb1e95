mod queries;
mod responses;
mod types;

pub use queries::{
    CompletionQuery, DeviceQuery, EventStreamQuery, FolderPausePatch, FolderQuery,
};
pub use responses::CompletionLookup;
pub use types::{
    Completion, Connection, ConnectionTotal, ConnectionsResponse, Defaults, DeviceConfig,
    DeviceStats, FolderCompletionData, FolderConfig, FolderDevice, FolderScanProgressData,
    FolderStats, FolderStatus, FolderSummaryData, FolderType, LastFile, Options,
    PendingDeviceAdded, PendingDeviceInfo, PendingDeviceRemoved, PendingDevicesChangedData,
    RawEvent, RemoteIgnoredDevice, StateChangedData, SyncthingConfig, SystemStatus,
    SystemVersion, Versioning,
};
