//! Application-wide constants for gbs-control.
//!
//! This module centralizes the timing and protocol constants of the device
//! link. Timeouts that an operator may want to tune are mirrored as defaults
//! in [`crate::config::Config`]; the rest are fixed by the device firmware.
//!
//! # Categories
//!
//! - **Link timing**: liveness timeouts and watchdog cadence
//! - **Retry budgets**: stuck-connecting / stuck-closing thresholds
//! - **Protocol**: subprotocol, paths, frame marker, reserved codes
//! - **Terminal**: buffer bound and flush cadence

use std::time::Duration;

// ============================================================================
// Link timing
// ============================================================================

/// Liveness timeout armed right after the socket opens.
///
/// The device is slow to start talking after a handshake, so the first
/// deadline is generous.
pub const OPEN_LIVENESS_TIMEOUT: Duration = Duration::from_millis(6000);

/// Liveness timeout re-armed on every inbound chunk.
///
/// In steady state the device pushes status frames well inside this window.
pub const DATA_LIVENESS_TIMEOUT: Duration = Duration::from_millis(2700);

/// Watchdog tick period.
pub const WATCHDOG_INTERVAL: Duration = Duration::from_millis(500);

/// Terminal flush period (roughly one repaint at 20fps).
pub const TERMINAL_FLUSH_INTERVAL: Duration = Duration::from_millis(50);

/// Interval between repeats of a held button.
pub const REPEAT_INTERVAL: Duration = Duration::from_millis(300);

// ============================================================================
// Retry budgets
// ============================================================================

/// Watchdog ticks spent in `Closing` before the connection is discarded.
pub const STUCK_CLOSING_LIMIT: u32 = 7;

/// Watchdog ticks spent in `Connecting` before the attempt is force-closed.
pub const STUCK_CONNECTING_LIMIT: u32 = 14;

// ============================================================================
// Protocol
// ============================================================================

/// WebSocket subprotocol the device firmware expects.
pub const WS_SUBPROTOCOL: &str = "arduino";

/// Default WebSocket port of the device.
pub const DEFAULT_WS_PORT: u16 = 81;

/// Default HTTP port of the device.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Default device host name (mDNS name announced by the firmware).
pub const DEFAULT_HOST: &str = "gbscontrol.local";

/// First byte of a status frame.
pub const STATUS_MARKER: u8 = b'#';

/// Prefix joined with the slot byte to form a slot code.
pub const SLOT_CODE_PREFIX: char = '1';

/// User command codes after which the device restarts and drops the link.
pub const RESTART_CODES: &[&str] = &["a", "1"];

/// User command code that stores the current settings into the active slot.
pub const SAVE_SLOT_CODE: &str = "4";

/// Notice appended to the terminal when a restart command is sent.
pub const RESTART_NOTICE: &str = "\nRestart\n";

// ============================================================================
// Terminal
// ============================================================================

/// Cumulative queued terminal bytes at which the display is cleared.
pub const TERMINAL_CLEAR_THRESHOLD: usize = 70_000;

/// Local storage key holding the slot-name blob.
pub const SLOT_NAMES_KEY: &str = "GBSControlSlotNames";
