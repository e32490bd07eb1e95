//! Live mirror of a Syncthing daemon's state.
//!
//! [`syncthing_client::spawn`] starts the update loop: periodic REST
//! snapshots and the daemon's event log are folded into a
//! [`syncthing_client::ProjectionStore`], and a fresh
//! [`syncthing_client::DashboardSnapshot`] is published after every change.

pub mod config;
pub mod syncthing_client;
pub mod types;
