use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::info;

use crate::config::Config;
use crate::types::MonitorError;

use super::api::{
    CompletionLookup, CompletionQuery, ConnectionsResponse, DeviceConfig, DeviceQuery,
    DeviceStats, EventStreamQuery, FolderPausePatch, FolderQuery, FolderStats, FolderStatus,
    PendingDeviceInfo, RawEvent, SyncthingConfig, SystemStatus, SystemVersion,
};
use super::core::http::HttpClient;
use super::helpers::load_api_key;
use super::remote::RemoteState;

const CONFIG: &str = "/rest/config";
const CONFIG_DEVICES: &str = "/rest/config/devices";
const CONFIG_FOLDERS: &str = "/rest/config/folders";
const DB_STATUS: &str = "/rest/db/status";
const DB_COMPLETION: &str = "/rest/db/completion";
const DB_SCAN: &str = "/rest/db/scan";
const DB_REVERT: &str = "/rest/db/revert";
const STATS_FOLDER: &str = "/rest/stats/folder";
const STATS_DEVICE: &str = "/rest/stats/device";
const CLUSTER_PENDING_DEVICES: &str = "/rest/cluster/pending/devices";
const SYSTEM_STATUS: &str = "/rest/system/status";
const SYSTEM_VERSION: &str = "/rest/system/version";
const SYSTEM_CONNECTIONS: &str = "/rest/system/connections";
const EVENTS: &str = "/rest/events";

/// Extra time granted to the HTTP layer on top of the daemon-side long-poll timeout.
const LONG_POLL_GRACE: Duration = Duration::from_secs(15);

/// HTTP implementation of [`RemoteState`] against a Syncthing daemon.
pub struct SyncthingClient {
    http: HttpClient,
    event_timeout_secs: u64,
}

impl SyncthingClient {
    /// Resolve the API key and prepare an HTTP client for the configured daemon.
    ///
    /// A missing key is fatal: nothing can be fetched without it.
    pub async fn discover(config: &Config) -> Result<Self, MonitorError> {
        let api_key = load_api_key(config).await?;

        let mut base_urls = Vec::new();
        let configured = config.api_url.trim();
        if !configured.is_empty() {
            push_unique_url(&mut base_urls, configured.to_string());
        }
        push_unique_url(&mut base_urls, "https://127.0.0.1:8384".to_string());
        push_unique_url(&mut base_urls, "http://127.0.0.1:8384".to_string());

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(MonitorError::Http)?;

        info!(url = %base_urls[0], "Prepared Syncthing client");
        Ok(Self {
            http: HttpClient::new(api_key, http, base_urls),
            event_timeout_secs: config.event_timeout_secs.clamp(1, 3600),
        })
    }
}

#[async_trait]
impl RemoteState for SyncthingClient {
    async fn system_status(&self) -> Result<SystemStatus, MonitorError> {
        self.http.get_json(SYSTEM_STATUS).await
    }

    async fn system_version(&self) -> Result<SystemVersion, MonitorError> {
        self.http.get_json(SYSTEM_VERSION).await
    }

    async fn connections(&self) -> Result<ConnectionsResponse, MonitorError> {
        self.http.get_json(SYSTEM_CONNECTIONS).await
    }

    async fn config(&self) -> Result<SyncthingConfig, MonitorError> {
        self.http.get_json(CONFIG).await
    }

    async fn folder_status(&self, folder: &str) -> Result<FolderStatus, MonitorError> {
        self.http
            .get_json_with_query(DB_STATUS, &FolderQuery { folder })
            .await
    }

    async fn completion(&self, device: &str, folder: &str) -> Result<CompletionLookup, MonitorError> {
        let query = CompletionQuery { folder, device };
        self.http
            .get_optional_json_with_query(DB_COMPLETION, &query)
            .await
            .map(CompletionLookup::from)
    }

    async fn folder_stats(&self) -> Result<HashMap<String, FolderStats>, MonitorError> {
        self.http.get_json(STATS_FOLDER).await
    }

    async fn device_stats(&self) -> Result<HashMap<String, DeviceStats>, MonitorError> {
        self.http.get_json(STATS_DEVICE).await
    }

    async fn pending_devices(&self) -> Result<HashMap<String, PendingDeviceInfo>, MonitorError> {
        self.http.get_json(CLUSTER_PENDING_DEVICES).await
    }

    async fn events(&self, since: u64, limit: Option<u32>) -> Result<Vec<RawEvent>, MonitorError> {
        let query = EventStreamQuery {
            since,
            limit,
            timeout: Some(self.event_timeout_secs),
        };
        let timeout = Duration::from_secs(self.event_timeout_secs) + LONG_POLL_GRACE;
        self.http
            .get_json_with_timeout(EVENTS, &query, timeout)
            .await
    }

    async fn set_folder_paused(&self, folder: &str, paused: bool) -> Result<(), MonitorError> {
        let path = format!("{CONFIG_FOLDERS}/{folder}");
        self.http
            .send_json(Method::PATCH, &path, &FolderPausePatch { paused })
            .await
    }

    async fn scan_folder(&self, folder: &str) -> Result<(), MonitorError> {
        self.http
            .send_empty(Method::POST, DB_SCAN, &FolderQuery { folder })
            .await
    }

    async fn revert_folder(&self, folder: &str) -> Result<(), MonitorError> {
        self.http
            .send_empty(Method::POST, DB_REVERT, &FolderQuery { folder })
            .await
    }

    async fn put_config(&self, config: &SyncthingConfig) -> Result<(), MonitorError> {
        self.http.send_json(Method::PUT, CONFIG, config).await
    }

    async fn add_device(&self, device: &DeviceConfig) -> Result<(), MonitorError> {
        self.http.send_json(Method::POST, CONFIG_DEVICES, device).await
    }

    async fn dismiss_pending_device(&self, device: &str) -> Result<(), MonitorError> {
        self.http
            .send_empty(Method::DELETE, CLUSTER_PENDING_DEVICES, &DeviceQuery { device })
            .await
    }
}

fn push_unique_url(list: &mut Vec<String>, candidate: String) {
    if !list.iter().any(|existing| existing == &candidate) {
        list.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn discover_without_key_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            api_key: None,
            syncthing_config_dir: dir.path().display().to_string(),
            ..Config::default()
        };

        if std::env::var("SYNCTHING_API_KEY").is_err() {
            let result = SyncthingClient::discover(&config).await;
            assert!(matches!(result, Err(MonitorError::MissingApiKey)));
        }
    }

    #[tokio::test]
    async fn configured_url_is_tried_first() {
        let config = Config {
            api_key: Some("key".to_string()),
            api_url: "https://nas.local:8384/".to_string(),
            ..Config::default()
        };
        let client = SyncthingClient::discover(&config).await.unwrap();
        assert_eq!(client.http.base_url(), "https://nas.local:8384/");
    }

    #[test]
    fn unique_urls() {
        let mut list = vec!["http://a".to_string()];
        push_unique_url(&mut list, "http://a".to_string());
        push_unique_url(&mut list, "http://b".to_string());
        assert_eq!(list, vec!["http://a", "http://b"]);
    }
}
