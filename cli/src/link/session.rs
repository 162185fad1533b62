//! Link session: the single owner of the device connection.
//!
//! The session is a pure state machine. Every handler takes the current
//! time explicitly and returns the [`Effect`]s the event loop must carry
//! out (transport commands and UI updates), so the whole link can be
//! exercised without sockets or a clock.
//!
//! # Invariants
//!
//! - At most one [`Connection`] exists; a new one is only created once the
//!   previous one is closed or discarded.
//! - Events from any connection other than the current one are dropped.
//! - Liveness expiry fires at most once per armed deadline.

use std::time::Duration;

use tokio::time::Instant;

use crate::command::CommandChannel;
use crate::constants::RESTART_NOTICE;
use crate::protocol::{decode, ControlRegistry, Decoded, ToggleRegistry};
use crate::ui::UiUpdate;

use super::connection::{Connection, Readiness};
use super::events::{ConnectionId, LinkEvent};
use super::terminal::TerminalBuffer;

/// Liveness timeouts of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTiming {
    /// Deadline armed when the link opens.
    pub open_timeout: Duration,
    /// Deadline re-armed on every inbound chunk.
    pub data_timeout: Duration,
}

impl Default for LinkTiming {
    fn default() -> Self {
        Self {
            open_timeout: crate::constants::OPEN_LIVENESS_TIMEOUT,
            data_timeout: crate::constants::DATA_LIVENESS_TIMEOUT,
        }
    }
}

impl From<&crate::config::Config> for LinkTiming {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            open_timeout: config.open_timeout(),
            data_timeout: config.data_timeout(),
        }
    }
}

/// Work the event loop must perform after a session handler ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start a new connection attempt.
    Open {
        /// Id of the new connection.
        id: ConnectionId,
        /// URL to connect to.
        url: String,
    },
    /// Ask the transport to close a connection.
    Close {
        /// Connection to close.
        id: ConnectionId,
    },
    /// Drop a connection that never confirmed its close.
    Discard {
        /// Connection to drop.
        id: ConnectionId,
    },
    /// Reflect a change in the UI.
    Ui(UiUpdate),
}

/// The link session aggregate.
#[derive(Debug)]
pub struct Session {
    url: String,
    timing: LinkTiming,
    connection: Option<Connection>,
    next_id: u64,
    active: bool,
    connects: u64,
    terminal: TerminalBuffer,
    controls: ControlRegistry,
    toggles: ToggleRegistry,
}

impl Session {
    /// Session for the device at `url` using the standard registries.
    #[must_use]
    pub fn new(url: impl Into<String>, timing: LinkTiming) -> Self {
        Self::with_registries(
            url,
            timing,
            ControlRegistry::standard(),
            ToggleRegistry::standard(),
        )
    }

    /// Session with explicit registries.
    #[must_use]
    pub fn with_registries(
        url: impl Into<String>,
        timing: LinkTiming,
        controls: ControlRegistry,
        toggles: ToggleRegistry,
    ) -> Self {
        Self {
            url: url.into(),
            timing,
            connection: None,
            next_id: 0,
            active: false,
            connects: 0,
            terminal: TerminalBuffer::default(),
            controls,
            toggles,
        }
    }

    /// Replace the terminal buffer (tests use a small threshold).
    #[must_use]
    pub fn with_terminal(mut self, terminal: TerminalBuffer) -> Self {
        self.terminal = terminal;
        self
    }

    /// Device link URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the link is considered healthy.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Readiness of the current connection; `None` when idle.
    #[must_use]
    pub fn readiness(&self) -> Option<Readiness> {
        self.connection.as_ref().map(Connection::readiness)
    }

    /// Read-only view of the current connection.
    #[must_use]
    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// Armed liveness deadline, if any.
    #[must_use]
    pub fn liveness_deadline(&self) -> Option<Instant> {
        self.connection.as_ref().and_then(Connection::liveness_deadline)
    }

    /// Number of successful opens so far.
    #[must_use]
    pub fn connect_count(&self) -> u64 {
        self.connects
    }

    /// Create a connection unless one that has not failed already exists.
    pub fn create_connection(&mut self) -> Vec<Effect> {
        if let Some(conn) = &self.connection {
            if conn.readiness() != Readiness::Closed {
                return Vec::new();
            }
        }

        self.next_id += 1;
        let id = ConnectionId(self.next_id);
        self.connection = Some(Connection::new(id));
        log::info!("[Link] Connecting {} to {}", id, self.url);

        vec![Effect::Open {
            id,
            url: self.url.clone(),
        }]
    }

    /// Handle a transport event.
    pub fn handle_event(&mut self, event: LinkEvent, now: Instant) -> Vec<Effect> {
        let Some(conn) = self.connection.as_mut().filter(|c| c.id() == event.id()) else {
            log::trace!("[Link] Dropping stale event for {}", event.id());
            return Vec::new();
        };

        match event {
            LinkEvent::Opened { id } => {
                if !conn.opened(now, self.timing.open_timeout) {
                    log::debug!("[Link] {} opened while {:?}", id, conn.readiness());
                    return Vec::new();
                }
                log::info!("[Link] {} open", id);
                self.active = true;
                self.connects += 1;
                vec![Effect::Ui(UiUpdate::DisconnectedWarning(false))]
            }
            LinkEvent::Data { chunk, .. } => {
                if !conn.data(now, self.timing.data_timeout) {
                    return Vec::new();
                }
                self.active = true;
                self.decode(&chunk)
            }
            LinkEvent::Closed { id, reason } => {
                log::info!("[Link] {} closed: {}", id, reason);
                conn.closed();
                self.active = false;
                Vec::new()
            }
        }
    }

    fn decode(&mut self, chunk: &[u8]) -> Vec<Effect> {
        match decode(chunk) {
            Decoded::Text(text) => {
                if self.terminal.push(text) {
                    vec![Effect::Ui(UiUpdate::ClearTerminal)]
                } else {
                    Vec::new()
                }
            }
            Decoded::Status(frame) => frame
                .updates(&self.controls, &self.toggles)
                .into_iter()
                .map(Effect::Ui)
                .collect(),
            Decoded::Ignored => {
                log::trace!("[Link] Ignoring short status frame");
                Vec::new()
            }
        }
    }

    /// Declare the link dead if its liveness deadline has passed.
    pub fn poll_liveness(&mut self, now: Instant) -> Vec<Effect> {
        let Some(conn) = self.connection.as_mut() else {
            return Vec::new();
        };
        if !conn.take_expired_deadline(now) {
            return Vec::new();
        }

        log::warn!("[Link] {} liveness timeout", conn.id());
        let mut effects = Vec::new();
        if conn.request_close() {
            effects.push(Effect::Close { id: conn.id() });
        }
        self.active = false;
        effects.push(Effect::Ui(UiUpdate::DisconnectedWarning(true)));
        effects
    }

    /// Bookkeeping after a command was sent.
    ///
    /// A restart command makes the device drop the link, so the session
    /// stops trusting it right away.
    pub fn note_command(&mut self, channel: CommandChannel, code: &str) -> Vec<Effect> {
        if !channel.is_restart(code) {
            return Vec::new();
        }
        log::info!("[Link] Restart command sent, marking link inactive");
        self.active = false;
        vec![Effect::Ui(UiUpdate::AppendTerminal(RESTART_NOTICE.to_string()))]
    }

    /// Take queued terminal text for the UI.
    pub fn drain_terminal(&mut self) -> Option<String> {
        self.terminal.drain()
    }

    /// Tear the link down for good.
    pub fn shutdown(&mut self) -> Vec<Effect> {
        self.active = false;
        let Some(conn) = self.connection.as_mut() else {
            return Vec::new();
        };
        if conn.request_close() {
            vec![Effect::Close { id: conn.id() }]
        } else {
            conn.closed();
            Vec::new()
        }
    }

    pub(crate) fn connection_mut(&mut self) -> Option<&mut Connection> {
        self.connection.as_mut()
    }

    /// Request close of the current connection, if closeable.
    pub(crate) fn request_close(&mut self) -> Vec<Effect> {
        match self.connection.as_mut() {
            Some(conn) => {
                if conn.request_close() {
                    vec![Effect::Close { id: conn.id() }]
                } else {
                    Vec::new()
                }
            }
            None => Vec::new(),
        }
    }

    /// Forget the current connection.
    pub(crate) fn discard_connection(&mut self) -> Option<ConnectionId> {
        self.connection.take().map(|c| c.id())
    }
}
