use std::env;
use std::path::Path;

use tokio::fs;
use tracing::{info, warn};

use crate::types::MonitorError;

use super::{paths, Config};

impl Config {
    /// Load configuration from config.json and apply environment overrides.
    /// Falls back to defaults if the file doesn't exist or can't be parsed
    pub async fn load() -> Self {
        let mut config = match paths::get_config_path() {
            Ok(path) => match Self::load_from(&path).await {
                Ok(config) => config,
                Err(err) => {
                    warn!(error = ?err, path = %path.display(), "Failed to load config.json, using defaults");
                    Self::default()
                }
            },
            Err(err) => {
                warn!(error = ?err, "Could not locate config.json, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        info!(
            url = %config.api_url,
            refresh_secs = config.refresh_interval_secs,
            "Loaded configuration"
        );
        config
    }

    /// Read a config file; a missing file yields the defaults.
    pub async fn load_from(path: &Path) -> Result<Self, MonitorError> {
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).await?;

        serde_json::from_str(&contents)
            .map_err(|err| MonitorError::Config(format!("Failed to parse config.json: {err}")))
    }

    fn apply_env_overrides(&mut self) {
        for name in ["SYNCTHING_URL", "SYNCTHING_API_URL"] {
            if let Ok(value) = env::var(name) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    self.api_url = trimmed.to_string();
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json"))
            .await
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn reads_values_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"api_url": "http://10.0.0.2:8384", "api_key": "abc", "refresh_interval_secs": 5}}"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).await.unwrap();
        assert_eq!(config.api_url, "http://10.0.0.2:8384");
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.refresh_interval_secs, 5);
    }

    #[tokio::test]
    async fn unreadable_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = Config::load_from(dir.path()).await.unwrap_err();
        assert!(matches!(err, MonitorError::Io(_)));
    }

    #[tokio::test]
    async fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let err = Config::load_from(file.path()).await.unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }
}
