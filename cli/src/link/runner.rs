//! Link event loop.
//!
//! [`LinkRunner`] is the single logical thread of the panel. It owns the
//! [`Session`], the transport, the panel model and the operator's
//! reflector, and multiplexes everything that can happen onto one
//! `tokio::select!` loop:
//!
//! - transport events (in arrival order, handled before anything else)
//! - the liveness deadline of the current connection
//! - the watchdog tick
//! - the terminal flush tick
//! - operator requests
//!
//! Session handlers return effects; the runner is the only place effects
//! are carried out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::command::{CommandChannel, CommandSender};
use crate::config::Config;
use crate::constants::{SAVE_SLOT_CODE, STUCK_CLOSING_LIMIT};
use crate::pad::{ControlPad, Direction};
use crate::repeat::Repeater;
use crate::slot_names::SlotNames;
use crate::ui::{Panel, Reflector, UiUpdate};

use super::events::{ConnectionId, LinkEvent, PanelRequest};
use super::session::{Effect, Session};
use super::transport::Transport;
use super::watchdog;

/// Loop cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerSettings {
    /// Watchdog period.
    pub watchdog_interval: Duration,
    /// Terminal flush period.
    pub flush_interval: Duration,
    /// Repeat period of held pad arrows.
    pub repeat_interval: Duration,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            watchdog_interval: crate::constants::WATCHDOG_INTERVAL,
            flush_interval: crate::constants::TERMINAL_FLUSH_INTERVAL,
            repeat_interval: crate::constants::REPEAT_INTERVAL,
        }
    }
}

impl From<&Config> for RunnerSettings {
    fn from(config: &Config) -> Self {
        Self {
            watchdog_interval: config.watchdog_interval(),
            flush_interval: config.terminal_flush_interval(),
            repeat_interval: config.repeat_interval(),
        }
    }
}

/// The panel's event loop.
pub struct LinkRunner<T: Transport, R: Reflector> {
    session: Session,
    transport: T,
    events: mpsc::UnboundedReceiver<LinkEvent>,
    requests_tx: mpsc::UnboundedSender<PanelRequest>,
    requests: mpsc::UnboundedReceiver<PanelRequest>,
    panel: Panel,
    reflector: R,
    sender: CommandSender,
    pad: ControlPad,
    repeater: Repeater,
    slot_names: Option<SlotNames>,
    settings: RunnerSettings,
    quit: bool,
}

impl<T: Transport, R: Reflector> std::fmt::Debug for LinkRunner<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkRunner")
            .field("session", &self.session)
            .field("pad", &self.pad)
            .field("settings", &self.settings)
            .field("quit", &self.quit)
            .finish_non_exhaustive()
    }
}

impl<T: Transport, R: Reflector> LinkRunner<T, R> {
    /// Wire a runner together.
    pub fn new(
        session: Session,
        transport: T,
        events: mpsc::UnboundedReceiver<LinkEvent>,
        reflector: R,
        sender: CommandSender,
        settings: RunnerSettings,
    ) -> Self {
        let (requests_tx, requests) = mpsc::unbounded_channel();
        Self {
            session,
            transport,
            events,
            requests_tx,
            requests,
            panel: Panel::default(),
            reflector,
            sender,
            pad: ControlPad::default(),
            repeater: Repeater::new(settings.repeat_interval),
            slot_names: None,
            settings,
            quit: false,
        }
    }

    /// Attach a slot-name store.
    #[must_use]
    pub fn with_slot_names(mut self, names: SlotNames) -> Self {
        self.slot_names = Some(names);
        self
    }

    /// Handle for submitting operator requests.
    #[must_use]
    pub fn request_sender(&self) -> mpsc::UnboundedSender<PanelRequest> {
        self.requests_tx.clone()
    }

    /// The panel model.
    #[must_use]
    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// The link session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The operator's reflector.
    #[must_use]
    pub fn reflector(&self) -> &R {
        &self.reflector
    }

    /// The transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run until a quit request or `shutdown_flag` is set.
    ///
    /// The connection is closed on the way out.
    pub async fn run(&mut self, shutdown_flag: &AtomicBool) -> Result<()> {
        log::info!("[Link] Event loop starting for {}", self.session.url());

        let mut watchdog_tick = tokio::time::interval(self.settings.watchdog_interval);
        watchdog_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut flush_tick = tokio::time::interval(self.settings.flush_interval);
        flush_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !self.quit && !shutdown_flag.load(Ordering::SeqCst) {
            let deadline = self.session.liveness_deadline();

            tokio::select! {
                biased;

                Some(event) = self.events.recv() => {
                    let effects = self.session.handle_event(event, Instant::now());
                    self.apply(effects);
                }
                () = sleep_until_deadline(deadline) => {
                    let effects = self.session.poll_liveness(Instant::now());
                    self.apply(effects);
                }
                _ = watchdog_tick.tick() => {
                    let effects = watchdog::tick(&mut self.session);
                    self.apply(effects);
                }
                _ = flush_tick.tick() => {
                    self.flush_terminal();
                }
                Some(request) = self.requests.recv() => {
                    self.handle_request(request);
                }
            }
        }

        self.repeater.release();
        let effects = self.session.shutdown();
        let closing = effects.iter().find_map(|effect| match effect {
            Effect::Close { id } => Some(*id),
            _ => None,
        });
        self.apply(effects);
        if let Some(id) = closing {
            self.await_closed(id).await;
        }
        self.flush_terminal();

        log::info!("[Link] Event loop exiting");
        Ok(())
    }

    /// Keep handling transport events until `id` reports closed, so the
    /// close handshake completes before the transport is dropped. Bounded
    /// by the watchdog's closing budget.
    async fn await_closed(&mut self, id: ConnectionId) {
        let budget = self.settings.watchdog_interval * STUCK_CLOSING_LIMIT;
        let deadline = Instant::now() + budget;

        loop {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Some(event)) => {
                    let done = matches!(&event, LinkEvent::Closed { id: closed, .. } if *closed == id);
                    let effects = self.session.handle_event(event, Instant::now());
                    self.apply(effects);
                    if done {
                        return;
                    }
                }
                Ok(None) => return,
                Err(_) => {
                    log::warn!("[Link] {} did not close within {:?}", id, budget);
                    return;
                }
            }
        }
    }

    /// Carry out session effects.
    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Open { id, url } => self.transport.open(id, &url),
                Effect::Close { id } => self.transport.close(id),
                Effect::Discard { id } => self.transport.discard(id),
                Effect::Ui(update) => self.reflect(&update),
            }
        }
    }

    fn reflect(&mut self, update: &UiUpdate) {
        update.apply(&mut self.panel);
        update.apply(&mut self.reflector);
    }

    fn flush_terminal(&mut self) {
        if let Some(text) = self.session.drain_terminal() {
            self.reflect(&UiUpdate::AppendTerminal(text));
        }
    }

    fn send_command(&mut self, channel: CommandChannel, code: &str) {
        self.sender.send(channel, code);
        let effects = self.session.note_command(channel, code);
        self.apply(effects);
    }

    fn handle_request(&mut self, request: PanelRequest) {
        log::debug!("[Link] Request {:?}", request);

        match request {
            PanelRequest::Send { channel, code } => self.send_command(channel, &code),
            PanelRequest::PadMode(mode) => self.pad.set_mode(mode),
            PanelRequest::Pad(direction) => {
                let (channel, code) = self.pad.target(direction);
                self.send_command(channel, code);
            }
            PanelRequest::Hold {
                direction,
                duration_ms,
            } => self.hold(direction, Duration::from_millis(duration_ms)),
            PanelRequest::Release => self.repeater.release(),
            PanelRequest::NameSlot(name) => self.name_active_slot(&name),
            PanelRequest::ClearTerminal => self.reflect(&UiUpdate::ClearTerminal),
            PanelRequest::Status => {
                let summary = self.panel.summary(self.slot_names.as_ref());
                self.reflector.show_status(&summary);
            }
            PanelRequest::Quit => self.quit = true,
        }
    }

    /// Repeat a pad arrow for `duration` or until released.
    fn hold(&mut self, direction: Direction, duration: Duration) {
        let (channel, code) = self.pad.target(direction);
        let sender = self.sender.clone();
        self.repeater.hold_for(duration, move || sender.send(channel, code));
    }

    /// Store a name for the active slot, then save the device settings into it.
    fn name_active_slot(&mut self, name: &str) {
        let Some(slot) = self.panel.active_slot() else {
            log::warn!("[Link] No active slot to name");
            self.reflector.show_status("no active slot");
            return;
        };

        match self.slot_names.as_mut() {
            Some(names) => {
                if let Err(e) = names.write(&slot.id(), name) {
                    log::warn!("[Link] Failed to store name for {}: {:#}", slot, e);
                }
            }
            None => log::debug!("[Link] No slot-name store attached"),
        }
        self.send_command(CommandChannel::User, SAVE_SLOT_CODE);
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
