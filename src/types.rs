use thiserror::Error;

/// Errors surfaced by the dashboard engine and its Syncthing client.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing Syncthing API key (set SYNCTHING_API_KEY or api_key in config.json)")]
    MissingApiKey,

    #[error("Syncthing error: {0}")]
    Syncthing(String),

    #[error("Dashboard is no longer running")]
    Stopped,
}

impl MonitorError {
    /// True when the request never reached the daemon.
    pub fn is_connect(&self) -> bool {
        matches!(self, MonitorError::Http(err) if err.is_connect())
    }
}
