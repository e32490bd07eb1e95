use std::env;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::types::MonitorError;

use super::Config;

impl Config {
    /// Get the full path to the Syncthing config XML file
    pub fn syncthing_config_xml_path(&self) -> PathBuf {
        expand_home(self.syncthing_config_dir.trim_end_matches('/')).join("config.xml")
    }
}

/// Get the path to the config.json file.
/// `SYNCTHING_DASHBOARD_CONFIG` wins, then the executable's directory, then the working directory.
pub(super) fn get_config_path() -> Result<PathBuf, MonitorError> {
    if let Ok(custom) = env::var("SYNCTHING_DASHBOARD_CONFIG") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    if let Ok(exe_path) = env::current_exe() {
        debug!(path = %exe_path.display(), "Executable path detected");

        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.json");
            if config_path.exists() {
                debug!(path = %config_path.display(), "Using config next to executable");
                return Ok(config_path);
            }
        }
    }

    warn!("Using fallback: looking for config.json in current directory");
    let cwd = env::current_dir()
        .map_err(|err| MonitorError::Config(format!("Failed to determine working directory: {err}")))?;
    Ok(cwd.join("config.json"))
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_xml_lives_inside_the_config_dir() {
        let config = Config {
            syncthing_config_dir: "/var/lib/syncthing/".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.syncthing_config_xml_path(),
            PathBuf::from("/var/lib/syncthing/config.xml")
        );
    }
}
