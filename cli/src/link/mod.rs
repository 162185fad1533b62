//! Device link.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────── LinkRunner (one tokio task) ───────────────┐
//!  WsTransport ──►│ LinkEvent ─► Session ─► Effect ─┬─► Transport (open/close) │
//!                 │               ▲                 └─► UiUpdate ─► Reflector  │
//!                 │   watchdog ───┘  liveness deadline, terminal flush         │
//!                 └────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`session`] - connection ownership, liveness, decoding into UI updates
//! - [`watchdog`] - reconnect policy with stuck-connecting/closing budgets
//! - [`transport`] - WebSocket tasks reporting [`LinkEvent`]s
//! - [`runner`] - the event loop tying the pieces together

pub mod connection;
pub mod events;
pub mod runner;
pub mod session;
pub mod terminal;
pub mod transport;
pub mod watchdog;

pub use connection::{Connection, Readiness};
pub use events::{ConnectionId, LinkEvent, PanelRequest};
pub use runner::{LinkRunner, RunnerSettings};
pub use session::{Effect, LinkTiming, Session};
pub use terminal::TerminalBuffer;
pub use transport::{Transport, WsTransport};
