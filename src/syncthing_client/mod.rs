pub mod api;
mod client;
mod core;
mod helpers;
mod models;
mod remote;

pub use self::core::cursor::{BatchOutcome, EventCursor};
pub use self::core::decoder::{decode, decode_batch, Event, EventKind};
pub use self::core::rate::{rate, throughput, ByteSample, Throughput};
pub use self::core::runtime::{
    spawn, Command, Dashboard, DashboardHandle, Message, Mutation, RuntimeSettings, UserAction,
};
pub use self::core::scheduler::{RetryPolicy, Schedule};
pub use self::core::status::{
    device_status, folder_status, DeviceStatusCode, FolderStatusCode, GroupedCompletion,
};
pub use self::core::store::ProjectionStore;
pub use client::SyncthingClient;
pub use helpers::{format_relative_time, humanize_duration, scan_duration};
pub use models::{
    ConnectionSample, DashboardSnapshot, DeviceProjection, FolderChange, FolderPayload,
    FolderProjection, FolderScan, PeerFolderState, PeerPayload, PendingDevice, PendingPayload,
    RateLimits, ScanProgress, SharedFolder, SyncthingOverview, ThisDevice,
};
pub use remote::RemoteState;
