//! Link transport.
//!
//! The session decides *what* happens to a connection; a [`Transport`]
//! carries it out. [`WsTransport`] runs one tokio task per connection and
//! reports back through the shared [`LinkEvent`] channel, so the event loop
//! never awaits socket I/O itself.
//!
//! # Architecture
//!
//! ```text
//! LinkRunner ──open/close/discard──► WsTransport
//!      ▲                                 │ spawn
//!      │                                 ▼
//!      └──────── LinkEvent ──────── connection task (ws::connect, recv loop)
//! ```

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::ws::{self, Inbound};

use super::events::{ConnectionId, LinkEvent};

/// Carries out connection effects.
pub trait Transport {
    /// Start connecting `id` to `url`.
    fn open(&mut self, id: ConnectionId, url: &str);

    /// Ask `id` to close. Completion is reported as [`LinkEvent::Closed`].
    fn close(&mut self, id: ConnectionId);

    /// Drop `id` without waiting for anything.
    fn discard(&mut self, id: ConnectionId);
}

struct ConnectionTask {
    close_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

/// WebSocket transport backed by one task per connection.
pub struct WsTransport {
    events_tx: mpsc::UnboundedSender<LinkEvent>,
    subprotocol: String,
    tasks: HashMap<ConnectionId, ConnectionTask>,
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("subprotocol", &self.subprotocol)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl WsTransport {
    /// Create a transport and the receiver its events arrive on.
    #[must_use]
    pub fn new(subprotocol: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                events_tx,
                subprotocol: subprotocol.into(),
                tasks: HashMap::new(),
            },
            events_rx,
        )
    }

    /// Number of connection tasks still tracked.
    #[must_use]
    pub fn live_tasks(&self) -> usize {
        self.tasks
            .values()
            .filter(|task| !task.handle.is_finished())
            .count()
    }
}

impl Transport for WsTransport {
    fn open(&mut self, id: ConnectionId, url: &str) {
        self.tasks.retain(|_, task| !task.handle.is_finished());

        let (close_tx, close_rx) = oneshot::channel();
        let handle = tokio::spawn(run_connection(
            id,
            url.to_string(),
            self.subprotocol.clone(),
            self.events_tx.clone(),
            close_rx,
        ));
        self.tasks.insert(
            id,
            ConnectionTask {
                close_tx: Some(close_tx),
                handle,
            },
        );
    }

    fn close(&mut self, id: ConnectionId) {
        match self.tasks.get_mut(&id).and_then(|task| task.close_tx.take()) {
            Some(close_tx) => {
                let _ = close_tx.send(());
            }
            None => log::debug!("[Link] Close for unknown or closing {}", id),
        }
    }

    fn discard(&mut self, id: ConnectionId) {
        if let Some(task) = self.tasks.remove(&id) {
            task.handle.abort();
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.handle.abort();
        }
    }
}

/// Drive one connection until it closes.
async fn run_connection(
    id: ConnectionId,
    url: String,
    subprotocol: String,
    events: mpsc::UnboundedSender<LinkEvent>,
    mut close_rx: oneshot::Receiver<()>,
) {
    let connected = tokio::select! {
        result = ws::connect(&url, &subprotocol) => result,
        _ = &mut close_rx => {
            let _ = events.send(LinkEvent::Closed {
                id,
                reason: "closed while connecting".to_string(),
            });
            return;
        }
    };

    let (mut writer, mut reader) = match connected {
        Ok(halves) => halves,
        Err(e) => {
            log::debug!("[Link] {} connect failed: {:#}", id, e);
            let _ = events.send(LinkEvent::Closed {
                id,
                reason: format!("{e:#}"),
            });
            return;
        }
    };

    if events.send(LinkEvent::Opened { id }).is_err() {
        return;
    }

    let mut closing = false;
    let reason = loop {
        tokio::select! {
            inbound = reader.next_chunk() => match inbound {
                Some(Ok(Inbound::Chunk(chunk))) => {
                    let _ = events.send(LinkEvent::Data { id, chunk });
                }
                Some(Ok(Inbound::Closed { code, reason })) => {
                    break format!("close frame {code} {reason}");
                }
                Some(Err(e)) => break format!("{e:#}"),
                None => break "stream ended".to_string(),
            },
            _ = &mut close_rx, if !closing => {
                closing = true;
                if let Err(e) = writer.send_close().await {
                    break format!("{e:#}");
                }
            }
        }
    };

    let _ = writer.finish().await;
    let _ = events.send(LinkEvent::Closed { id, reason });
}
