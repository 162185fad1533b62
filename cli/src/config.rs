//! Device address and link timing.
//!
//! Handles reading and writing the gbs-control configuration file and
//! applying environment overrides on top of it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};

use crate::constants::{
    DATA_LIVENESS_TIMEOUT, DEFAULT_HOST, DEFAULT_HTTP_PORT, DEFAULT_WS_PORT,
    OPEN_LIVENESS_TIMEOUT, REPEAT_INTERVAL, TERMINAL_FLUSH_INTERVAL, WATCHDOG_INTERVAL,
};

/// Configuration for the gbs-control client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Host name or IP address of the device.
    pub host: String,
    /// Port of the device's command web server.
    pub http_port: u16,
    /// Port of the device's WebSocket server.
    pub ws_port: u16,
    /// Liveness timeout armed when the link opens, in milliseconds.
    pub open_timeout_ms: u64,
    /// Liveness timeout re-armed on every inbound chunk, in milliseconds.
    pub data_timeout_ms: u64,
    /// Watchdog tick period, in milliseconds.
    pub watchdog_interval_ms: u64,
    /// Terminal flush period, in milliseconds.
    pub terminal_flush_ms: u64,
    /// Repeat period of held buttons, in milliseconds.
    pub repeat_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            ws_port: DEFAULT_WS_PORT,
            open_timeout_ms: millis(OPEN_LIVENESS_TIMEOUT),
            data_timeout_ms: millis(DATA_LIVENESS_TIMEOUT),
            watchdog_interval_ms: millis(WATCHDOG_INTERVAL),
            terminal_flush_ms: millis(TERMINAL_FLUSH_INTERVAL),
            repeat_interval_ms: millis(REPEAT_INTERVAL),
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Config {
    /// Directory holding `config.json` and the slot-name store. Created on demand.
    ///
    /// Resolved in order:
    /// 1. `#[cfg(test)]` (unit tests): `tmp/gbs-control-test`
    /// 2. `GBS_CONTROL_CONFIG_DIR` env var: explicit override
    /// 3. Default: platform config dir (Linux: ~/.config/gbs-control)
    pub fn config_dir() -> Result<PathBuf> {
        let dir = {
            #[cfg(test)]
            {
                // Unit tests: use repo's tmp/ directory
                PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                    .parent()
                    .context("cli/ has no parent directory")?
                    .join("tmp/gbs-control-test")
            }

            #[cfg(not(test))]
            {
                if let Ok(dir) = std::env::var("GBS_CONTROL_CONFIG_DIR") {
                    PathBuf::from(dir)
                } else {
                    dirs::config_dir()
                        .context("Could not determine config directory")?
                        .join("gbs-control")
                }
            }
        };
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Read `config.json` (defaults when absent), then apply `GBS_CONTROL_*` overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file().unwrap_or_else(|e| {
            log::debug!("Using default config: {e:#}");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_from_file() -> Result<Self> {
        let config_path = Self::config_dir()?.join("config.json");
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            anyhow::bail!("Config file not found")
        }
    }

    /// Parse a config file body. Missing fields take their defaults.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("invalid config file")
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("GBS_CONTROL_HOST") {
            self.host = host;
        }

        if let Ok(port) = std::env::var("GBS_CONTROL_HTTP_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.http_port = port;
            }
        }

        if let Ok(port) = std::env::var("GBS_CONTROL_WS_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.ws_port = port;
            }
        }
    }

    /// Write this configuration back to `config.json`.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_dir()?.join("config.json");
        fs::write(&config_path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        Ok(())
    }

    /// Liveness timeout armed when the link opens.
    #[must_use]
    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    /// Liveness timeout re-armed on inbound data.
    #[must_use]
    pub fn data_timeout(&self) -> Duration {
        Duration::from_millis(self.data_timeout_ms)
    }

    /// Watchdog tick period.
    #[must_use]
    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms)
    }

    /// Terminal flush period.
    #[must_use]
    pub fn terminal_flush_interval(&self) -> Duration {
        Duration::from_millis(self.terminal_flush_ms)
    }

    /// Repeat period of held buttons.
    #[must_use]
    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms)
    }

    /// WebSocket URL of the device link.
    #[must_use]
    pub fn ws_url(&self) -> String {
        crate::ws::device_ws_url(&self.host, self.ws_port)
    }

    /// Base URL of the device's command server.
    #[must_use]
    pub fn http_base_url(&self) -> String {
        if self.http_port == DEFAULT_HTTP_PORT {
            format!("http://{}", self.host)
        } else {
            format!("http://{}:{}", self.host, self.http_port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timings() {
        let config = Config::default();
        assert_eq!(config.open_timeout(), Duration::from_millis(6000));
        assert_eq!(config.data_timeout(), Duration::from_millis(2700));
        assert_eq!(config.watchdog_interval(), Duration::from_millis(500));
        assert_eq!(config.terminal_flush_interval(), Duration::from_millis(50));
        assert!(config.data_timeout() < config.open_timeout());
    }

    #[test]
    fn test_urls() {
        let config = Config {
            host: "192.168.4.1".to_string(),
            ..Config::default()
        };
        assert_eq!(config.ws_url(), "ws://192.168.4.1:81/");
        assert_eq!(config.http_base_url(), "http://192.168.4.1");

        let config = Config {
            http_port: 8080,
            ..config
        };
        assert_eq!(config.http_base_url(), "http://192.168.4.1:8080");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(r#"{"host": "10.0.0.5"}"#).unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.ws_port, 81);
        assert_eq!(config.data_timeout_ms, 2700);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(Config::from_json("{").is_err());
    }

    #[test]
    fn test_config_dir_is_created() {
        let dir = Config::config_dir().unwrap();
        assert!(dir.exists());
        assert!(dir.ends_with("tmp/gbs-control-test"));
    }
}
