use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::syncthing_client::RetryPolicy;

/// Configuration for the Syncthing dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_config_dir")]
    pub syncthing_config_dir: String,

    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_clock_tick_millis")]
    pub clock_tick_millis: u64,

    #[serde(default = "default_event_retry_secs")]
    pub event_retry_secs: u64,

    /// Enables exponential backoff for the event loop, capped at this value.
    #[serde(default)]
    pub event_retry_max_secs: Option<u64>,

    #[serde(default = "default_event_timeout_secs")]
    pub event_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,

    #[serde(default)]
    pub print_snapshots: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            syncthing_config_dir: default_config_dir(),
            refresh_interval_secs: default_refresh_interval_secs(),
            clock_tick_millis: default_clock_tick_millis(),
            event_retry_secs: default_event_retry_secs(),
            event_retry_max_secs: None,
            event_timeout_secs: default_event_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            accept_invalid_certs: default_accept_invalid_certs(),
            print_snapshots: false,
        }
    }
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn clock_tick(&self) -> Duration {
        Duration::from_millis(self.clock_tick_millis.max(100))
    }

    pub fn event_retry_policy(&self) -> RetryPolicy {
        let base = Duration::from_secs(self.event_retry_secs.max(1));
        match self.event_retry_max_secs {
            Some(max) if max > self.event_retry_secs => RetryPolicy::Exponential {
                base,
                max: Duration::from_secs(max),
            },
            _ => RetryPolicy::Fixed(base),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8384".to_string()
}

fn default_config_dir() -> String {
    "~/.local/state/syncthing".to_string()
}

fn default_refresh_interval_secs() -> u64 {
    10
}

fn default_clock_tick_millis() -> u64 {
    1000
}

fn default_event_retry_secs() -> u64 {
    1
}

fn default_event_timeout_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    8
}

fn default_accept_invalid_certs() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"api_url": "https://nas:8384"}"#).unwrap();
        assert_eq!(config.api_url, "https://nas:8384");
        assert_eq!(config.refresh_interval(), Duration::from_secs(10));
        assert_eq!(config.clock_tick(), Duration::from_secs(1));
        assert!(config.accept_invalid_certs);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn retry_policy_is_fixed_unless_a_larger_cap_is_set() {
        let mut config = Config::default();
        assert_eq!(
            config.event_retry_policy(),
            RetryPolicy::Fixed(Duration::from_secs(1))
        );

        config.event_retry_max_secs = Some(30);
        assert_eq!(
            config.event_retry_policy(),
            RetryPolicy::Exponential {
                base: Duration::from_secs(1),
                max: Duration::from_secs(30),
            }
        );
    }
}
