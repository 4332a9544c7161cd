use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::application::MonitorSettings;
use crate::domain::ProbeParams;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Upper bound for per-packet timeout and packet interval
const MAX_PROBE_WAIT_MS: u64 = 60_000;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub hosts_file: PathBuf,
    pub max_hosts: usize,
    pub poll_interval_ms: u64,
    pub history_size: usize,
    pub status_window: usize,
    pub packet_count: u32,
    pub probe_timeout_ms: u64,
    pub packet_interval_ms: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            hosts_file: PathBuf::from("hosts.json"),
            max_hosts: 60,
            poll_interval_ms: 2000,
            history_size: 50,
            status_window: 3,
            packet_count: 5,
            probe_timeout_ms: 1000,
            packet_interval_ms: 200,
            log_level: "info".to_string(),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

impl Config {
    /// Read `PINGMON_CONFIG` as a TOML file if set, otherwise the environment
    pub fn load() -> Result<Self, ConfigError> {
        let config = match env::var("PINGMON_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_or("PINGMON_PORT", defaults.port),
            hosts_file: env::var("PINGMON_HOSTS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.hosts_file),
            max_hosts: env_or("PINGMON_MAX_HOSTS", defaults.max_hosts),
            poll_interval_ms: env_or("PINGMON_POLL_INTERVAL_MS", defaults.poll_interval_ms),
            history_size: env_or("PINGMON_HISTORY_SIZE", defaults.history_size),
            status_window: env_or("PINGMON_STATUS_WINDOW", defaults.status_window),
            packet_count: env_or("PINGMON_PACKET_COUNT", defaults.packet_count),
            probe_timeout_ms: env_or("PINGMON_PROBE_TIMEOUT_MS", defaults.probe_timeout_ms),
            packet_interval_ms: env_or("PINGMON_PACKET_INTERVAL_MS", defaults.packet_interval_ms),
            log_level: env::var("PINGMON_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_size == 0 {
            return Err(ConfigError::Invalid("history_size must be at least 1".to_string()));
        }
        if self.status_window == 0 {
            return Err(ConfigError::Invalid("status_window must be at least 1".to_string()));
        }
        if self.packet_count == 0 {
            return Err(ConfigError::Invalid("packet_count must be at least 1".to_string()));
        }
        if self.probe_timeout_ms > MAX_PROBE_WAIT_MS {
            return Err(ConfigError::Invalid(format!(
                "probe_timeout_ms must be at most {}",
                MAX_PROBE_WAIT_MS
            )));
        }
        if self.packet_interval_ms > MAX_PROBE_WAIT_MS {
            return Err(ConfigError::Invalid(format!(
                "packet_interval_ms must be at most {}",
                MAX_PROBE_WAIT_MS
            )));
        }
        Ok(())
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            history_capacity: self.history_size,
            status_window: self.status_window,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            probe: ProbeParams::new(self.packet_count, Duration::from_millis(self.probe_timeout_ms))
                .with_packet_interval(Duration::from_millis(self.packet_interval_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_defaults() {
        assert_eq!(Config::default().monitor_settings(), MonitorSettings::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml("port = 8080\nhistory_size = 120\nhosts_file = \"/var/lib/pingmon/hosts.json\"\n").unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.history_size, 120);
        assert_eq!(config.hosts_file, PathBuf::from("/var/lib/pingmon/hosts.json"));
        assert_eq!(config.status_window, 3);
        assert_eq!(config.max_hosts, 60);
    }

    #[test]
    fn test_rejects_zero_window() {
        let config = Config {
            status_window: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_oversized_probe_waits() {
        let config = Config {
            probe_timeout_ms: u64::MAX,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            packet_interval_ms: MAX_PROBE_WAIT_MS + 1,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            probe_timeout_ms: MAX_PROBE_WAIT_MS,
            packet_interval_ms: MAX_PROBE_WAIT_MS,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(matches!(Config::from_toml("port = \"high\""), Err(ConfigError::Toml(_))));
    }
}
