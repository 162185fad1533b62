//! Connection lifecycle.
//!
//! ```text
//!            open()          opened()
//!   (none) ─────────► Connecting ──────► Open ──┐ data()
//!                        │                 │ ◄──┘
//!           request_close()│   request_close()│
//!                        ▼                 ▼
//!                      Closing ─────────────────► Closed
//!                                  closed()
//! ```
//!
//! `closed()` is accepted from any state; a failed handshake goes straight
//! from `Connecting` to `Closed`. "Idle" is the absence of a connection and
//! is tracked by the owning session.

use std::time::Duration;

use tokio::time::Instant;

use super::events::ConnectionId;

/// Readiness of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Handshake in progress.
    Connecting,
    /// Handshake complete, data may flow.
    Open,
    /// Close requested, waiting for the transport to confirm.
    Closing,
    /// Closed; terminal state.
    Closed,
}

impl Readiness {
    /// Whether a close request is meaningful in this state.
    #[must_use]
    pub fn is_closeable(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}

/// One connection attempt and its health bookkeeping.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    readiness: Readiness,
    liveness_deadline: Option<Instant>,
    stuck_connecting: u32,
    stuck_closing: u32,
}

impl Connection {
    /// A new connection in `Connecting`.
    #[must_use]
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            readiness: Readiness::Connecting,
            liveness_deadline: None,
            stuck_connecting: 0,
            stuck_closing: 0,
        }
    }

    /// Connection id.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Current readiness.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// Armed liveness deadline, if any.
    #[must_use]
    pub fn liveness_deadline(&self) -> Option<Instant> {
        self.liveness_deadline
    }

    /// Watchdog ticks spent connecting since the last reset.
    #[must_use]
    pub fn stuck_connecting(&self) -> u32 {
        self.stuck_connecting
    }

    /// Watchdog ticks spent closing since the last reset.
    #[must_use]
    pub fn stuck_closing(&self) -> u32 {
        self.stuck_closing
    }

    /// `Connecting → Open`. Returns `false` if not connecting.
    pub(crate) fn opened(&mut self, now: Instant, timeout: Duration) -> bool {
        if self.readiness != Readiness::Connecting {
            return false;
        }
        self.readiness = Readiness::Open;
        self.stuck_connecting = 0;
        self.stuck_closing = 0;
        self.liveness_deadline = Some(now + timeout);
        true
    }

    /// Inbound data on an open connection. Returns `false` if not open.
    pub(crate) fn data(&mut self, now: Instant, timeout: Duration) -> bool {
        if self.readiness != Readiness::Open {
            return false;
        }
        self.liveness_deadline = Some(now + timeout);
        true
    }

    /// `Connecting/Open → Closing`. Returns `true` if the transport must be
    /// told to close.
    pub(crate) fn request_close(&mut self) -> bool {
        if !self.readiness.is_closeable() {
            return false;
        }
        self.readiness = Readiness::Closing;
        self.liveness_deadline = None;
        true
    }

    /// Any state `→ Closed`.
    pub(crate) fn closed(&mut self) {
        self.readiness = Readiness::Closed;
        self.liveness_deadline = None;
    }

    /// Take the liveness deadline if it has passed.
    pub(crate) fn take_expired_deadline(&mut self, now: Instant) -> bool {
        match self.liveness_deadline {
            Some(deadline) if deadline <= now => {
                self.liveness_deadline = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn bump_stuck_connecting(&mut self) -> u32 {
        self.stuck_connecting += 1;
        self.stuck_connecting
    }

    pub(crate) fn reset_stuck_connecting(&mut self) {
        self.stuck_connecting = 0;
    }

    pub(crate) fn bump_stuck_closing(&mut self) -> u32 {
        self.stuck_closing += 1;
        self.stuck_closing
    }
}
