//! Outbound device commands.
//!
//! The device takes commands as plain HTTP GETs with the command code as
//! the raw query string. Commands are fire-and-forget: the device is
//! stateless about them and every command can be resent by the operator,
//! so responses and failures are never reported back to the caller.
//!
//! ```text
//! GET /sc?<code>&nocache=<epoch ms>    document command (presets, geometry)
//! GET /uc?<code>&nocache=<epoch ms>    user command (toggles, slots, restart)
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::constants::RESTART_CODES;

/// Per-request timeout for command requests.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Command channel, selecting the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandChannel {
    /// Preset and geometry commands (`/sc`).
    Document,
    /// Settings, slot and system commands (`/uc`).
    User,
}

impl CommandChannel {
    /// Request path on the device.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Document => "/sc",
            Self::User => "/uc",
        }
    }

    /// Whether `code` on this channel makes the device restart.
    #[must_use]
    pub fn is_restart(self, code: &str) -> bool {
        self == Self::User && RESTART_CODES.contains(&code)
    }
}

impl fmt::Display for CommandChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => f.write_str("document"),
            Self::User => f.write_str("user"),
        }
    }
}

impl FromStr for CommandChannel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sc" | "doc" | "document" => Ok(Self::Document),
            "uc" | "user" => Ok(Self::User),
            other => bail!("unknown command channel '{other}'"),
        }
    }
}

/// Build a cache-busted command URL.
#[must_use]
pub fn command_url(base_url: &str, channel: CommandChannel, code: &str, nocache_ms: i64) -> String {
    format!(
        "{}{}?{}&nocache={}",
        base_url.trim_end_matches('/'),
        channel.path(),
        code,
        nocache_ms
    )
}

/// Sends commands to the device.
#[derive(Debug, Clone)]
pub struct CommandSender {
    client: reqwest::Client,
    base_url: String,
}

impl CommandSender {
    /// Create a sender for the device at `base_url` (e.g. `http://192.168.4.1`).
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(COMMAND_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// URL for `code` on `channel`, stamped with the current time.
    #[must_use]
    pub fn url_for(&self, channel: CommandChannel, code: &str) -> String {
        command_url(
            &self.base_url,
            channel,
            code,
            chrono::Utc::now().timestamp_millis(),
        )
    }

    /// Fire a command without waiting for it.
    ///
    /// Must be called inside a tokio runtime. Failures are logged at debug
    /// level and dropped.
    pub fn send(&self, channel: CommandChannel, code: &str) {
        let url = self.url_for(channel, code);
        let client = self.client.clone();
        log::debug!("[Command] {} {}", channel, code);

        tokio::spawn(async move {
            match client.get(&url).send().await {
                Ok(resp) if !resp.status().is_success() => {
                    log::debug!("[Command] {} returned {}", url, resp.status());
                }
                Ok(_) => {}
                Err(e) => log::debug!("[Command] {} failed: {}", url, e),
            }
        });
    }

    /// Send a command and wait for the device to answer.
    ///
    /// Used by one-shot CLI invocations that exit right after sending.
    pub async fn send_and_wait(&self, channel: CommandChannel, code: &str) -> Result<()> {
        let url = self.url_for(channel, code);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("command request to {url} failed"))?;

        if !resp.status().is_success() {
            bail!("device answered {} for {}", resp.status(), url);
        }
        Ok(())
    }
}
