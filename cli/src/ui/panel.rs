//! In-memory model of the control panel.
//!
//! Holds what the operator sees: the active preset and slot (each an
//! exclusive selection), toggle states, the terminal text and the
//! disconnected indicator.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::protocol::{Preset, Slot, Toggle, ToggleRegistry, ToggleStyle};
use crate::slot_names::SlotNames;
use crate::ui::Reflector;

/// Label glyph of a switch-style toggle that is on.
pub const SWITCH_ON_GLYPH: &str = "toggle_on";

/// Label glyph of a switch-style toggle that is off.
pub const SWITCH_OFF_GLYPH: &str = "toggle_off";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ToggleView {
    style: ToggleStyle,
    on: bool,
}

/// Panel state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    active_preset: Option<Preset>,
    active_slot: Option<Slot>,
    toggles: BTreeMap<Toggle, ToggleView>,
    terminal: String,
    disconnected: bool,
}

impl Default for Panel {
    fn default() -> Self {
        Self::new(&ToggleRegistry::standard())
    }
}

impl Panel {
    /// Create a panel showing every toggle in `registry`, all off.
    #[must_use]
    pub fn new(registry: &ToggleRegistry) -> Self {
        let toggles = registry
            .bindings()
            .iter()
            .map(|b| (b.toggle, ToggleView { style: b.style, on: false }))
            .collect();

        Self {
            active_preset: None,
            active_slot: None,
            toggles,
            terminal: String::new(),
            disconnected: false,
        }
    }

    /// Create a panel showing only the given toggles.
    #[must_use]
    pub fn with_toggles(registry: &ToggleRegistry, shown: &[Toggle]) -> Self {
        let mut panel = Self::new(registry);
        panel.toggles.retain(|toggle, _| shown.contains(toggle));
        panel
    }

    /// Currently active preset.
    #[must_use]
    pub fn active_preset(&self) -> Option<Preset> {
        self.active_preset
    }

    /// Currently active slot.
    #[must_use]
    pub fn active_slot(&self) -> Option<Slot> {
        self.active_slot
    }

    /// Whether `preset` is highlighted.
    #[must_use]
    pub fn is_preset_active(&self, preset: Preset) -> bool {
        self.active_preset == Some(preset)
    }

    /// State of a toggle shown on the panel.
    #[must_use]
    pub fn toggle(&self, toggle: Toggle) -> Option<bool> {
        self.toggles.get(&toggle).map(|v| v.on)
    }

    /// Label glyph of a switch-style toggle. `None` for buttons and
    /// toggles not on the panel.
    #[must_use]
    pub fn toggle_label(&self, toggle: Toggle) -> Option<&'static str> {
        let view = self.toggles.get(&toggle)?;
        match view.style {
            ToggleStyle::Switch if view.on => Some(SWITCH_ON_GLYPH),
            ToggleStyle::Switch => Some(SWITCH_OFF_GLYPH),
            ToggleStyle::Button => None,
        }
    }

    /// Terminal text currently displayed.
    #[must_use]
    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    /// Whether the disconnected indicator is visible.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// Plain-text summary of the panel, slot labels taken from `names`.
    #[must_use]
    pub fn summary(&self, names: Option<&SlotNames>) -> String {
        let mut out = String::new();

        let link = if self.disconnected { "disconnected" } else { "connected" };
        let _ = writeln!(out, "link:   {link}");

        let preset = self.active_preset.map_or("-", Preset::label);
        let _ = writeln!(out, "preset: {preset}");

        let slot = match (self.active_slot, names) {
            (Some(slot), Some(names)) => format!("{slot} ({})", names.display_name(slot)),
            (Some(slot), None) => slot.to_string(),
            (None, _) => "-".to_string(),
        };
        let _ = writeln!(out, "slot:   {slot}");

        for (toggle, view) in &self.toggles {
            let state = if view.on { "on" } else { "off" };
            let _ = writeln!(out, "  {:<22} {state}", toggle.key());
        }

        out
    }
}

impl Reflector for Panel {
    fn set_active_preset(&mut self, preset: Preset) {
        self.active_preset = Some(preset);
    }

    fn set_active_slot(&mut self, slot: Slot) {
        self.active_slot = Some(slot);
    }

    fn set_toggle_state(&mut self, toggle: Toggle, on: bool) {
        if let Some(view) = self.toggles.get_mut(&toggle) {
            view.on = on;
        }
    }

    fn append_terminal_text(&mut self, text: &str) {
        self.terminal.push_str(text);
    }

    fn clear_terminal(&mut self) {
        self.terminal.clear();
    }

    fn set_disconnected_warning(&mut self, shown: bool) {
        self.disconnected = shown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_selection_is_exclusive() {
        let mut panel = Panel::default();
        panel.set_active_preset(Preset::Res1280x960);
        panel.set_active_preset(Preset::Res720x480);

        assert!(panel.is_preset_active(Preset::Res720x480));
        let active = Preset::ALL
            .iter()
            .filter(|p| panel.is_preset_active(**p))
            .count();
        assert_eq!(active, 1);
    }

    #[test]
    fn test_switch_label_follows_state() {
        let mut panel = Panel::default();
        assert_eq!(panel.toggle_label(Toggle::Matched), Some(SWITCH_OFF_GLYPH));

        panel.set_toggle_state(Toggle::Matched, true);
        assert_eq!(panel.toggle_label(Toggle::Matched), Some(SWITCH_ON_GLYPH));
        assert_eq!(panel.toggle(Toggle::Matched), Some(true));
    }

    #[test]
    fn test_button_toggle_has_no_label() {
        let mut panel = Panel::default();
        panel.set_toggle_state(Toggle::Scanlines, true);
        assert_eq!(panel.toggle_label(Toggle::Scanlines), None);
        assert_eq!(panel.toggle(Toggle::Scanlines), Some(true));
    }

    #[test]
    fn test_toggle_not_on_panel_is_ignored() {
        let registry = ToggleRegistry::standard();
        let mut panel = Panel::with_toggles(&registry, &[Toggle::Scanlines]);

        panel.set_toggle_state(Toggle::Peaking, true);
        assert_eq!(panel.toggle(Toggle::Peaking), None);
        assert_eq!(panel.toggle(Toggle::Scanlines), Some(false));
    }

    #[test]
    fn test_terminal_append_and_clear() {
        let mut panel = Panel::default();
        panel.append_terminal_text("abc");
        panel.append_terminal_text("def");
        assert_eq!(panel.terminal(), "abcdef");

        panel.clear_terminal();
        assert_eq!(panel.terminal(), "");
    }

    #[test]
    fn test_summary_lists_selection() {
        let mut panel = Panel::default();
        panel.set_active_preset(Preset::Res1920x1080);
        panel.set_active_slot(Slot::new(2).unwrap());
        panel.set_disconnected_warning(true);

        let summary = panel.summary(None);
        assert!(summary.contains("link:   disconnected"));
        assert!(summary.contains("preset: 1920x1080"));
        assert!(summary.contains("slot:   slot2"));
        assert!(summary.contains("scanlines"));
    }
}
