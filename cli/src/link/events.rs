//! Events delivered to the link event loop.
//!
//! Transport tasks report connection lifecycle and inbound data as
//! [`LinkEvent`]s over one unbounded channel; the operator console sends
//! [`PanelRequest`]s over another. The loop processes each in arrival order.

use std::fmt;

use bytes::Bytes;

use crate::command::CommandChannel;
use crate::pad::{Direction, PadMode};

/// Identity of one connection attempt.
///
/// Ids increase monotonically; events carrying an id other than the current
/// connection's are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ws_{}", self.0)
    }
}

/// Transport event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Handshake completed.
    Opened {
        /// Connection that opened.
        id: ConnectionId,
    },
    /// A text or binary frame arrived.
    Data {
        /// Connection that received it.
        id: ConnectionId,
        /// Frame payload.
        chunk: Bytes,
    },
    /// The connection closed or could not be established.
    Closed {
        /// Connection that closed.
        id: ConnectionId,
        /// Short description for the log.
        reason: String,
    },
}

impl LinkEvent {
    /// Connection this event belongs to.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        match self {
            Self::Opened { id } | Self::Data { id, .. } | Self::Closed { id, .. } => *id,
        }
    }
}

/// Operator request handled by the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelRequest {
    /// Send a raw command code.
    Send {
        /// Target channel.
        channel: CommandChannel,
        /// Command code.
        code: String,
    },
    /// Select the pad mode.
    PadMode(PadMode),
    /// Tap a pad arrow once.
    Pad(Direction),
    /// Hold a pad arrow for a while, repeating its command.
    Hold {
        /// Arrow to hold.
        direction: Direction,
        /// How long to hold it.
        duration_ms: u64,
    },
    /// Release a held arrow.
    Release,
    /// Name the active slot and store it on the device.
    NameSlot(String),
    /// Clear the terminal view.
    ClearTerminal,
    /// Show the panel summary.
    Status,
    /// Stop the event loop.
    Quit,
}
