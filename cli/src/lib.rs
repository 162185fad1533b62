//! gbs-control - device-link client for the GBS line doubler / scaler.
//!
//! This crate keeps a control panel in sync with the board: it holds a
//! self-healing WebSocket link to the device, decodes the status frames and
//! log text the device pushes, and fires command requests at it.
//!
//! # Architecture
//!
//! The crate follows an explicit-owner event loop pattern:
//!
//! - **Session** - owns the single connection, liveness deadlines and the
//!   terminal buffer; a pure `(event, now) -> effects` state machine
//! - **Watchdog** - periodic reconnect policy over the session
//! - **Decoder** - turns inbound chunks into terminal text or UI updates
//! - **Reflector** - applies UI updates (panel model, console, tests)
//! - **Command Sender** - fire-and-forget HTTP GETs to the device
//!
//! # Modules
//!
//! - [`link`] - session, watchdog, transport and event loop
//! - [`protocol`] - code registries and the status frame decoder
//! - [`ui`] - reflector boundary, panel model and console
//! - [`command`] - outbound command channels
//! - [`config`] - configuration loading/saving

// Library modules
pub mod command;
pub mod config;
pub mod constants;
pub mod link;
pub mod pad;
pub mod protocol;
pub mod repeat;
pub mod slot_names;
pub mod ui;
pub mod ws;

pub use command::{CommandChannel, CommandSender};
pub use config::Config;
pub use link::{LinkRunner, LinkTiming, RunnerSettings, Session, WsTransport};
pub use slot_names::SlotNames;
