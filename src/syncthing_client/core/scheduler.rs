use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::types::MonitorError;

use super::super::remote::RemoteState;
use super::runtime::{Command, Message, Mutation};

/// Delay before re-issuing a failed event poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    Fixed(Duration),
    /// Doubles per consecutive failure, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Fixed(Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// `failures` counts consecutive failures, the current one included.
    pub fn delay(&self, failures: u32) -> Duration {
        match *self {
            RetryPolicy::Fixed(delay) => delay,
            RetryPolicy::Exponential { base, max } => {
                let exponent = failures.saturating_sub(1).min(31);
                base.checked_mul(1u32 << exponent)
                    .map_or(max, |delay| delay.min(max))
            }
        }
    }
}

/// Run one command to completion and feed its result back to the update loop.
pub async fn execute(command: Command, remote: Arc<dyn RemoteState>, tx: mpsc::Sender<Message>) {
    match command {
        Command::Bootstrap => {
            // config merging needs this device's ID first
            let status = remote.system_status().await;
            if !deliver(&tx, Message::SystemStatus(status)).await {
                return;
            }
            deliver(&tx, Message::Config(remote.config().await)).await;
        }
        Command::FetchVersion => {
            deliver(&tx, Message::Version(remote.system_version().await)).await;
        }
        Command::FetchFolderStatus { folder } => {
            let result = remote.folder_status(&folder).await;
            deliver(&tx, Message::FolderStatus { folder, result }).await;
        }
        Command::FetchCompletion { device, folder } => {
            let result = remote.completion(&device, &folder).await;
            deliver(&tx, Message::Completion { device, folder, result }).await;
        }
        Command::FetchFolderStats => {
            deliver(&tx, Message::FolderStats(remote.folder_stats().await)).await;
        }
        Command::FetchDeviceStats => {
            deliver(&tx, Message::DeviceStats(remote.device_stats().await)).await;
        }
        Command::FetchPendingDevices => {
            deliver(&tx, Message::PendingDevices(remote.pending_devices().await)).await;
        }
        Command::PollEvents { since, limit, delay } => {
            if let Some(delay) = delay {
                time::sleep(delay).await;
            }
            let result = remote.events(since, limit).await;
            deliver(
                &tx,
                Message::Events {
                    requested: since,
                    result,
                },
            )
            .await;
        }
        Command::Mutate { action, mutation } => {
            let result = run_mutation(remote.as_ref(), mutation).await;
            deliver(&tx, Message::ActionFinished { action, result }).await;
        }
    }
}

async fn run_mutation(remote: &dyn RemoteState, mutation: Mutation) -> Result<(), MonitorError> {
    match mutation {
        Mutation::SetFolderPaused { folders, paused } => {
            for folder in &folders {
                remote.set_folder_paused(folder, paused).await?;
            }
            Ok(())
        }
        Mutation::Scan { folders } => {
            for folder in &folders {
                remote.scan_folder(folder).await?;
            }
            Ok(())
        }
        Mutation::Revert { folder } => remote.revert_folder(&folder).await,
        Mutation::PutConfig(config) => remote.put_config(&config).await,
        Mutation::AddDevice(device) => remote.add_device(&device).await,
        Mutation::DismissPending { device } => remote.dismiss_pending_device(&device).await,
    }
}

/// Returns `false` once the update loop is gone.
async fn deliver(tx: &mpsc::Sender<Message>, message: Message) -> bool {
    if tx.send(message).await.is_err() {
        debug!("Dashboard stopped, dropping result");
        return false;
    }
    true
}

/// Intervals driving the periodic producers.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub refresh: Duration,
    pub clock_tick: Duration,
}

/// Spawn the periodic producers: system status (first run after one period,
/// bootstrap covers startup), connections (immediately, then every period)
/// and the clock tick.
pub fn spawn_producers(
    remote: Arc<dyn RemoteState>,
    tx: mpsc::Sender<Message>,
    schedule: Schedule,
) -> Vec<JoinHandle<()>> {
    let status = {
        let remote = remote.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + schedule.refresh, schedule.refresh);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if !deliver(&tx, Message::SystemStatus(remote.system_status().await)).await {
                    break;
                }
            }
        })
    };

    let connections = {
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut ticker = time::interval(schedule.refresh);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if !deliver(&tx, Message::Connections(remote.connections().await)).await {
                    break;
                }
            }
        })
    };

    let clock = tokio::spawn(async move {
        let mut ticker = time::interval(schedule.clock_tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if !deliver(&tx, Message::Tick(Utc::now())).await {
                break;
            }
        }
    });

    vec![status, connections, clock]
}
