//! Operator console.
//!
//! [`ConsoleReflector`] writes device terminal text straight through and
//! prints one status line per state change. [`parse_request`] turns a line
//! typed by the operator into a [`PanelRequest`].

use std::collections::HashMap;
use std::io::Write;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::command::CommandChannel;
use crate::link::PanelRequest;
use crate::protocol::{Preset, Slot, Toggle};
use crate::ui::Reflector;

/// Default hold duration when none is given.
const DEFAULT_HOLD_MS: u64 = 1000;

/// Reflector printing to a writer (stdout by default).
pub struct ConsoleReflector<W: Write = std::io::Stdout> {
    out: W,
    preset: Option<Preset>,
    slot: Option<Slot>,
    toggles: HashMap<Toggle, bool>,
    disconnected: Option<bool>,
}

impl<W: Write> std::fmt::Debug for ConsoleReflector<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleReflector")
            .field("preset", &self.preset)
            .field("slot", &self.slot)
            .field("disconnected", &self.disconnected)
            .finish_non_exhaustive()
    }
}

impl ConsoleReflector {
    /// Reflector printing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleReflector<W> {
    /// Reflector printing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            preset: None,
            slot: None,
            toggles: HashMap::new(),
            disconnected: None,
        }
    }

    /// The underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn line(&mut self, text: &str) {
        // stdout going away is not worth tearing the link down for
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

impl<W: Write> Reflector for ConsoleReflector<W> {
    fn set_active_preset(&mut self, preset: Preset) {
        if self.preset.replace(preset) != Some(preset) {
            self.line(&format!("[preset] {preset}"));
        }
    }

    fn set_active_slot(&mut self, slot: Slot) {
        if self.slot.replace(slot) != Some(slot) {
            self.line(&format!("[slot] {slot}"));
        }
    }

    fn set_toggle_state(&mut self, toggle: Toggle, on: bool) {
        if self.toggles.insert(toggle, on) != Some(on) {
            let state = if on { "on" } else { "off" };
            self.line(&format!("[toggle] {} {state}", toggle.key()));
        }
    }

    fn append_terminal_text(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    fn clear_terminal(&mut self) {
        self.line("[terminal cleared]");
    }

    fn set_disconnected_warning(&mut self, shown: bool) {
        if self.disconnected.replace(shown) != Some(shown) {
            self.line(if shown { "[link] disconnected" } else { "[link] connected" });
        }
    }

    fn show_status(&mut self, summary: &str) {
        let _ = self.out.write_all(summary.as_bytes());
        let _ = self.out.flush();
    }
}

/// Parse one console line. Blank lines yield `None`.
pub fn parse_request(line: &str) -> Result<Option<PanelRequest>> {
    let line = line.trim();
    let Some((word, rest)) = line
        .split_once(char::is_whitespace)
        .map(|(w, r)| (w, r.trim()))
        .or_else(|| (!line.is_empty()).then_some((line, "")))
    else {
        return Ok(None);
    };

    let request = match word {
        "sc" | "uc" => {
            if rest.is_empty() {
                bail!("usage: {word} <code>");
            }
            PanelRequest::Send {
                channel: word.parse::<CommandChannel>()?,
                code: rest.to_string(),
            }
        }
        "mode" => PanelRequest::PadMode(rest.parse()?),
        "pad" => PanelRequest::Pad(rest.parse()?),
        "hold" => {
            let mut parts = rest.split_whitespace();
            let direction = parts.next().unwrap_or_default().parse()?;
            let duration_ms = match parts.next() {
                Some(ms) => ms
                    .parse()
                    .with_context(|| format!("invalid hold duration '{ms}'"))?,
                None => DEFAULT_HOLD_MS,
            };
            PanelRequest::Hold {
                direction,
                duration_ms,
            }
        }
        "release" => PanelRequest::Release,
        "name" => {
            if rest.is_empty() {
                bail!("usage: name <text>");
            }
            PanelRequest::NameSlot(rest.to_string())
        }
        "clear" => PanelRequest::ClearTerminal,
        "status" => PanelRequest::Status,
        "quit" | "exit" => PanelRequest::Quit,
        other => bail!("unknown command '{other}'"),
    };
    Ok(Some(request))
}

/// Forward stdin lines as requests until stdin closes or the loop goes away.
///
/// End of input is treated as a quit request.
pub async fn forward_stdin(requests: mpsc::UnboundedSender<PanelRequest>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_request(&line) {
                Ok(Some(request)) => {
                    if requests.send(request).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => eprintln!("{e:#}"),
            },
            Ok(None) => break,
            Err(e) => {
                log::warn!("[Console] stdin read failed: {}", e);
                break;
            }
        }
    }

    let _ = requests.send(PanelRequest::Quit);
}
