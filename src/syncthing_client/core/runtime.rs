use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::types::MonitorError;

use super::super::api::{
    CompletionLookup, ConnectionsResponse, DeviceConfig, DeviceStats, FolderStats, FolderStatus,
    PendingDeviceInfo, RawEvent, RemoteIgnoredDevice, SyncthingConfig, SystemStatus,
    SystemVersion,
};
use super::super::models::DashboardSnapshot;
use super::super::remote::RemoteState;
use super::aggregator::compose_snapshot;
use super::cursor::{BatchOutcome, EventCursor};
use super::decoder::{decode_batch, Event, EventKind};
use super::scheduler::{execute, spawn_producers, RetryPolicy, Schedule};
use super::store::ProjectionStore;

const MESSAGE_BUFFER: usize = 256;

/// Input to the update loop: fetch results, timer ticks and user actions.
#[derive(Debug)]
pub enum Message {
    SystemStatus(Result<SystemStatus, MonitorError>),
    Version(Result<SystemVersion, MonitorError>),
    Connections(Result<ConnectionsResponse, MonitorError>),
    Config(Result<SyncthingConfig, MonitorError>),
    FolderStatus {
        folder: String,
        result: Result<FolderStatus, MonitorError>,
    },
    Completion {
        device: String,
        folder: String,
        result: Result<CompletionLookup, MonitorError>,
    },
    FolderStats(Result<HashMap<String, FolderStats>, MonitorError>),
    DeviceStats(Result<HashMap<String, DeviceStats>, MonitorError>),
    PendingDevices(Result<HashMap<String, PendingDeviceInfo>, MonitorError>),
    Events {
        requested: u64,
        result: Result<Vec<RawEvent>, MonitorError>,
    },
    Tick(DateTime<Utc>),
    Action(UserAction),
    ActionFinished {
        action: UserAction,
        result: Result<(), MonitorError>,
    },
}

/// Asynchronous work requested by the update loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// System status, then the configuration.
    Bootstrap,
    FetchVersion,
    FetchFolderStatus {
        folder: String,
    },
    FetchCompletion {
        device: String,
        folder: String,
    },
    FetchFolderStats,
    FetchDeviceStats,
    FetchPendingDevices,
    PollEvents {
        since: u64,
        limit: Option<u32>,
        delay: Option<Duration>,
    },
    Mutate {
        action: UserAction,
        mutation: Mutation,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SetFolderPaused { folders: Vec<String>, paused: bool },
    Scan { folders: Vec<String> },
    Revert { folder: String },
    PutConfig(Box<SyncthingConfig>),
    AddDevice(Box<DeviceConfig>),
    DismissPending { device: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    SetFolderPaused { folder: String, paused: bool },
    PauseAll,
    ResumeAll,
    RescanFolder { folder: String },
    RescanAll,
    RevertFolder { folder: String },
    DismissPendingDevice { device: String },
    IgnorePendingDevice { device: String },
    AddPendingDevice { device: String },
}

impl UserAction {
    fn is_pause(&self) -> bool {
        matches!(
            self,
            UserAction::SetFolderPaused { .. } | UserAction::PauseAll | UserAction::ResumeAll
        )
    }

    /// The pending device this action settles, if any.
    fn settles_pending(&self) -> Option<&str> {
        match self {
            UserAction::DismissPendingDevice { device }
            | UserAction::IgnorePendingDevice { device }
            | UserAction::AddPendingDevice { device } => Some(device),
            _ => None,
        }
    }
}

/// The dashboard state machine: owns the projection and turns each message
/// into store mutations plus follow-up commands.
pub struct Dashboard {
    store: ProjectionStore,
    cursor: EventCursor,
    retry: RetryPolicy,
    event_failures: u32,
    pause_in_flight: bool,
    last_error: Option<String>,
}

impl Dashboard {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            store: ProjectionStore::default(),
            cursor: EventCursor::new(),
            retry,
            event_failures: 0,
            pause_in_flight: false,
            last_error: None,
        }
    }

    pub fn store(&self) -> &ProjectionStore {
        &self.store
    }

    pub fn cursor(&self) -> &EventCursor {
        &self.cursor
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        compose_snapshot(&self.store, self.last_error.as_deref())
    }

    pub fn init(&self) -> Vec<Command> {
        vec![
            Command::Bootstrap,
            Command::FetchVersion,
            self.next_poll(None),
            Command::FetchDeviceStats,
            Command::FetchFolderStats,
            Command::FetchPendingDevices,
        ]
    }

    pub fn update(&mut self, message: Message) -> Vec<Command> {
        match message {
            Message::SystemStatus(Ok(status)) => {
                if self.store.apply_system_status(status) {
                    return self.config_follow_ups();
                }
            }
            Message::Version(Ok(version)) => self.store.apply_version(version),
            Message::Connections(Ok(connections)) => self.store.apply_connections(connections),
            Message::Config(Ok(config)) => {
                self.store.merge_config(config);
                return self.config_follow_ups();
            }
            Message::FolderStatus { folder, result } => match result {
                Ok(status) => self.store.set_folder_status(&folder, status),
                Err(err) => {
                    warn!(folder = %folder, error = %err, "Folder status unavailable");
                    self.store.clear_folder_status(&folder);
                }
            },
            Message::Completion {
                device,
                folder,
                result,
            } => match result {
                Ok(lookup) => self.store.apply_completion(&device, &folder, lookup),
                Err(err) => self.record_error("Fetching completion", err),
            },
            Message::FolderStats(Ok(stats)) => self.store.apply_folder_stats(stats),
            Message::DeviceStats(Ok(stats)) => self.store.apply_device_stats(stats),
            Message::PendingDevices(Ok(pending)) => self.store.replace_pending(pending),
            Message::Events { requested, result } => return self.handle_events(requested, result),
            Message::Tick(now) => self.store.set_now(now),
            Message::Action(action) => return self.handle_action(action),
            Message::ActionFinished { action, result } => self.finish_action(action, result),

            Message::SystemStatus(Err(err)) => self.record_error("Fetching system status", err),
            Message::Version(Err(err)) => self.record_error("Fetching version", err),
            Message::Connections(Err(err)) => self.record_error("Fetching connections", err),
            Message::Config(Err(err)) => self.record_error("Fetching configuration", err),
            Message::FolderStats(Err(err)) => self.record_error("Fetching folder stats", err),
            Message::DeviceStats(Err(err)) => self.record_error("Fetching device stats", err),
            Message::PendingDevices(Err(err)) => {
                self.record_error("Fetching pending devices", err)
            }
        }
        Vec::new()
    }

    fn handle_events(&mut self, requested: u64, result: Result<Vec<RawEvent>, MonitorError>) -> Vec<Command> {
        let batch = match result {
            Ok(batch) => batch,
            Err(err) => {
                self.event_failures = self.event_failures.saturating_add(1);
                let delay = self.retry.delay(self.event_failures);
                warn!(
                    since = self.cursor.since(),
                    failures = self.event_failures,
                    retry_in = ?delay,
                    error = %err,
                    "Event poll failed"
                );
                self.last_error = Some(format!("Polling events: {err}"));
                return vec![self.next_poll(Some(delay))];
            }
        };
        self.event_failures = 0;

        let mut commands = Vec::new();
        match self.cursor.receive(requested, batch) {
            BatchOutcome::Primed => {
                info!(since = self.cursor.since(), "Event stream primed");
            }
            BatchOutcome::Empty => {}
            BatchOutcome::Apply { events, last_id } => {
                for event in decode_batch(events) {
                    for command in self.apply_event(event) {
                        if !commands.contains(&command) {
                            commands.push(command);
                        }
                    }
                }
                self.cursor.advance_to(last_id);
            }
        }
        commands.push(self.next_poll(None));
        commands
    }

    fn apply_event(&mut self, event: Event) -> Vec<Command> {
        trace!(id = event.id, kind = ?event.kind, "Applying event");
        match event.kind {
            EventKind::FolderSummary(data) => self.store.set_folder_status(&data.folder, data.summary),
            EventKind::ConfigSaved(config) => {
                self.store.merge_config(*config);
                return self.config_follow_ups();
            }
            EventKind::FolderScanProgress(progress) => self.store.apply_scan_progress(progress),
            EventKind::StateChanged(change) => {
                self.store.apply_state_changed(&change);
                if change.from == "scanning" && change.to == "idle" {
                    return vec![Command::FetchFolderStats];
                }
            }
            EventKind::FolderCompletion(data) => self.store.apply_completion(
                &data.device,
                &data.folder,
                CompletionLookup::Found(data.completion),
            ),
            EventKind::PendingDevicesChanged(changes) => {
                self.store.apply_pending_changes(changes, event.time)
            }
            EventKind::Other { .. } => {}
        }
        Vec::new()
    }

    fn handle_action(&mut self, action: UserAction) -> Vec<Command> {
        if action.is_pause() && self.pause_in_flight {
            debug!(?action, "Pause already in flight, ignoring");
            return Vec::new();
        }

        let mutation = match &action {
            UserAction::SetFolderPaused { folder, paused } => Some(Mutation::SetFolderPaused {
                folders: vec![folder.clone()],
                paused: *paused,
            }),
            UserAction::PauseAll => self.folders_where(|paused| !paused).map(|folders| {
                Mutation::SetFolderPaused {
                    folders,
                    paused: true,
                }
            }),
            UserAction::ResumeAll => self.folders_where(|paused| paused).map(|folders| {
                Mutation::SetFolderPaused {
                    folders,
                    paused: false,
                }
            }),
            UserAction::RescanFolder { folder } => Some(Mutation::Scan {
                folders: vec![folder.clone()],
            }),
            UserAction::RescanAll => self
                .folders_where(|paused| !paused)
                .map(|folders| Mutation::Scan { folders }),
            UserAction::RevertFolder { folder } => Some(Mutation::Revert {
                folder: folder.clone(),
            }),
            UserAction::DismissPendingDevice { device } => Some(Mutation::DismissPending {
                device: device.clone(),
            }),
            UserAction::IgnorePendingDevice { device } => self.ignore_mutation(device),
            UserAction::AddPendingDevice { device } => self.add_mutation(device),
        };

        let Some(mutation) = mutation else {
            debug!(?action, "Nothing to do");
            return Vec::new();
        };
        if action.is_pause() {
            self.pause_in_flight = true;
        }
        info!(?action, "Performing action");
        vec![Command::Mutate { action, mutation }]
    }

    fn finish_action(&mut self, action: UserAction, result: Result<(), MonitorError>) {
        if action.is_pause() {
            self.pause_in_flight = false;
        }
        match result {
            Ok(()) => {
                debug!(?action, "Action done");
                self.last_error = None;
                if let Some(device) = action.settles_pending() {
                    self.store.remove_pending(device);
                }
            }
            Err(err) => self.record_error("Action failed", err),
        }
    }

    fn folders_where(&self, paused: impl Fn(bool) -> bool) -> Option<Vec<String>> {
        let folders: Vec<String> = self
            .store
            .folders()
            .filter(|folder| paused(folder.config.paused))
            .map(|folder| folder.id().to_string())
            .collect();
        Some(folders).filter(|folders| !folders.is_empty())
    }

    /// Whole-config replace appending the device to the ignore list.
    fn ignore_mutation(&self, device: &str) -> Option<Mutation> {
        let (Some(config), Some(pending)) = (self.store.config(), self.store.pending_device(device)) else {
            warn!(device, "Cannot ignore an unknown pending device");
            return None;
        };

        let mut config = config.clone();
        config.remote_ignored_devices.push(RemoteIgnoredDevice {
            device_id: pending.device_id.clone(),
            name: pending.name.clone(),
            address: pending.address.clone(),
            time: self.store.now(),
        });
        Some(Mutation::PutConfig(Box::new(config)))
    }

    /// New device config from the daemon's device defaults.
    fn add_mutation(&self, device: &str) -> Option<Mutation> {
        let (Some(config), Some(pending)) = (self.store.config(), self.store.pending_device(device)) else {
            warn!(device, "Cannot add an unknown pending device");
            return None;
        };

        let mut new_device = config.defaults.device.clone();
        new_device.device_id = pending.device_id.clone();
        new_device.name = pending.name.clone();
        Some(Mutation::AddDevice(Box::new(new_device)))
    }

    fn config_follow_ups(&self) -> Vec<Command> {
        let statuses = self.store.folders().map(|folder| Command::FetchFolderStatus {
            folder: folder.id().to_string(),
        });
        let completions = self
            .store
            .completion_pairs()
            .into_iter()
            .map(|(device, folder)| Command::FetchCompletion { device, folder });
        statuses.chain(completions).collect()
    }

    fn next_poll(&self, delay: Option<Duration>) -> Command {
        Command::PollEvents {
            since: self.cursor.since(),
            limit: self.cursor.limit(),
            delay,
        }
    }

    fn record_error(&mut self, context: &str, err: MonitorError) {
        warn!(error = %err, "{context}");
        self.last_error = Some(format!("{context}: {err}"));
    }
}

/// Timing knobs of a running dashboard.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeSettings {
    pub schedule: Schedule,
    pub retry: RetryPolicy,
}

impl From<&Config> for RuntimeSettings {
    fn from(config: &Config) -> Self {
        Self {
            schedule: Schedule {
                refresh: config.refresh_interval(),
                clock_tick: config.clock_tick(),
            },
            retry: config.event_retry_policy(),
        }
    }
}

/// Handle to a running dashboard.
pub struct DashboardHandle {
    sender: mpsc::Sender<Message>,
    snapshots: watch::Receiver<DashboardSnapshot>,
    tasks: Vec<JoinHandle<()>>,
}

impl DashboardHandle {
    pub async fn perform(&self, action: UserAction) -> Result<(), MonitorError> {
        self.sender
            .send(Message::Action(action))
            .await
            .map_err(|_| MonitorError::Stopped)
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }

    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}

/// Start the update loop and its producers on the current runtime.
pub fn spawn(remote: Arc<dyn RemoteState>, settings: RuntimeSettings) -> DashboardHandle {
    let (tx, rx) = mpsc::channel(MESSAGE_BUFFER);
    let dashboard = Dashboard::new(settings.retry);
    let (snapshot_tx, snapshot_rx) = watch::channel(dashboard.snapshot());

    let mut tasks = spawn_producers(remote.clone(), tx.clone(), settings.schedule);
    tasks.push(tokio::spawn(update_loop(
        dashboard,
        remote,
        tx.clone(),
        rx,
        snapshot_tx,
    )));

    DashboardHandle {
        sender: tx,
        snapshots: snapshot_rx,
        tasks,
    }
}

async fn update_loop(
    mut dashboard: Dashboard,
    remote: Arc<dyn RemoteState>,
    tx: mpsc::Sender<Message>,
    mut rx: mpsc::Receiver<Message>,
    snapshots: watch::Sender<DashboardSnapshot>,
) {
    for command in dashboard.init() {
        tokio::spawn(execute(command, remote.clone(), tx.clone()));
    }

    while let Some(message) = rx.recv().await {
        for command in dashboard.update(message) {
            tokio::spawn(execute(command, remote.clone(), tx.clone()));
        }
        snapshots.send_replace(dashboard.snapshot());
    }
}
