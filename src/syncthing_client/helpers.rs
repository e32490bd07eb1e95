use std::env;

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::debug;

use crate::config::Config;
use crate::types::MonitorError;

/// Resolve the API key: config.json first, then `SYNCTHING_API_KEY`, then Syncthing's config.xml.
pub async fn load_api_key(config: &Config) -> Result<String, MonitorError> {
    if let Some(key) = config.api_key.as_deref().map(str::trim) {
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }

    if let Ok(value) = env::var("SYNCTHING_API_KEY") {
        if !value.trim().is_empty() {
            return Ok(value.trim().to_string());
        }
    }

    let config_xml_path = config.syncthing_config_xml_path();
    let contents = match fs::read_to_string(&config_xml_path).await {
        Ok(contents) => contents,
        Err(err) => {
            debug!(path = %config_xml_path.display(), error = %err, "No readable config.xml");
            return Err(MonitorError::MissingApiKey);
        }
    };
    extract_api_key(&contents)
        .filter(|key| !key.is_empty())
        .ok_or(MonitorError::MissingApiKey)
}

fn extract_api_key(contents: &str) -> Option<String> {
    let start_tag = "<apikey>";
    let end_tag = "</apikey>";
    let start = contents.find(start_tag)? + start_tag.len();
    let rest = &contents[start..];
    let end = rest.find(end_tag)?;
    Some(rest[..end].trim().to_string())
}

pub fn format_relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(at);
    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        format!("{} min ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{} h ago", duration.num_hours())
    } else {
        format!("{} d ago", duration.num_days())
    }
}

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;
// 30.44 and 365.25 days
const SECONDS_PER_MONTH: i64 = 2_629_800;
const SECONDS_PER_YEAR: i64 = 31_557_600;

/// Uptime style duration, e.g. `01d 02h 03m`; anything under a minute is `0s`.
pub fn humanize_duration(seconds: i64) -> String {
    let mut rest = seconds.max(0);
    let mut parts = Vec::new();
    for (unit, suffix) in [
        (SECONDS_PER_YEAR, "y"),
        (SECONDS_PER_MONTH, "mo"),
        (SECONDS_PER_DAY, "d"),
        (SECONDS_PER_HOUR, "h"),
        (SECONDS_PER_MINUTE, "m"),
    ] {
        let count = rest / unit;
        rest %= unit;
        if count > 0 {
            parts.push(format!("{count:02}{suffix}"));
        }
    }

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

/// Remaining-time estimate for a folder scan, e.g. `~01m 05s`.
pub fn scan_duration(seconds: i64) -> String {
    if seconds > SECONDS_PER_MONTH {
        return "> 1 month".to_string();
    }

    let mut rest = seconds.max(0);
    let mut parts = Vec::new();
    for (unit, suffix) in [
        (SECONDS_PER_DAY, "d"),
        (SECONDS_PER_HOUR, "h"),
        (SECONDS_PER_MINUTE, "m"),
    ] {
        let count = rest / unit;
        rest %= unit;
        if count > 0 {
            parts.push(format!("{count:02}{suffix}"));
        }
    }
    parts.push(format!("{rest:02}s"));

    format!("~{}", parts.join(" "))
}

/// First group of a device ID, upper-cased.
pub fn short_identification(device_id: &str) -> String {
    device_id
        .split('-')
        .next()
        .unwrap_or(device_id)
        .to_uppercase()
}

pub fn os_name(os: &str) -> &'static str {
    match os {
        "darwin" => "macOS",
        "dragonfly" => "DragonFly BSD",
        "freebsd" => "FreeBSD",
        "openbsd" => "OpenBSD",
        "netbsd" => "NetBSD",
        "linux" => "Linux",
        "windows" => "Windows",
        "solaris" => "Solaris",
        _ => "unknown os",
    }
}

pub fn arch_name(arch: &str) -> &'static str {
    match arch {
        "386" => "32-bit Intel/AMD",
        "amd64" => "64-bit Intel/AMD",
        "arm" => "32-bit ARM",
        "arm64" => "64-bit ARM",
        "ppc64" => "64-bit PowerPC",
        "ppc64le" => "64-bit PowerPC (LE)",
        "mips" => "32-bit MIPS",
        "mipsle" => "32-bit MIPS (LE)",
        "mips64" => "64-bit MIPS",
        "mips64le" => "64-bit MIPS (LE)",
        "riscv64" => "64-bit RISC-V",
        "s390x" => "64-bit z/Architecture",
        _ => "unknown arch",
    }
}
