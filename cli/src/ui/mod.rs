//! UI boundary of the device link.
//!
//! The link core never touches presentation directly. It produces
//! [`UiUpdate`] values which are applied to a [`Reflector`]: the
//! in-memory [`Panel`] model, the [`ConsoleReflector`] that prints to the
//! operator's terminal, or a test double.

pub mod console;
pub mod panel;

pub use console::ConsoleReflector;
pub use panel::Panel;

use crate::protocol::{Preset, Slot, Toggle};

/// Capability the link core calls into to reflect device state.
pub trait Reflector {
    /// Mark `preset` as the only active preset.
    fn set_active_preset(&mut self, preset: Preset);

    /// Mark `slot` as the only active slot.
    fn set_active_slot(&mut self, slot: Slot);

    /// Set the on/off state of a toggle. Unknown toggles are ignored.
    fn set_toggle_state(&mut self, toggle: Toggle, on: bool);

    /// Append text to the terminal view.
    fn append_terminal_text(&mut self, text: &str);

    /// Clear the terminal view.
    fn clear_terminal(&mut self);

    /// Show or hide the persistent "disconnected" indicator.
    fn set_disconnected_warning(&mut self, shown: bool);

    /// Present an operator-requested status summary.
    fn show_status(&mut self, _summary: &str) {}
}

/// A single state change destined for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
    /// Exclusive preset selection.
    ActivePreset(Preset),
    /// Exclusive slot selection.
    ActiveSlot(Slot),
    /// Toggle state.
    Toggle {
        /// Which toggle.
        toggle: Toggle,
        /// New state.
        on: bool,
    },
    /// Text for the terminal view.
    AppendTerminal(String),
    /// Clear the terminal view.
    ClearTerminal,
    /// Disconnected indicator visibility.
    DisconnectedWarning(bool),
}

impl UiUpdate {
    /// Apply this update to a reflector.
    pub fn apply(&self, reflector: &mut dyn Reflector) {
        match self {
            Self::ActivePreset(preset) => reflector.set_active_preset(*preset),
            Self::ActiveSlot(slot) => reflector.set_active_slot(*slot),
            Self::Toggle { toggle, on } => reflector.set_toggle_state(*toggle, *on),
            Self::AppendTerminal(text) => reflector.append_terminal_text(text),
            Self::ClearTerminal => reflector.clear_terminal(),
            Self::DisconnectedWarning(shown) => reflector.set_disconnected_warning(*shown),
        }
    }
}
