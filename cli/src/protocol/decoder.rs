//! Inbound chunk decoder.
//!
//! Every chunk pushed by the device is either terminal text or a status
//! frame. A status frame looks like:
//!
//! ```text
//! byte 0   '#' marker
//! byte 1   preset code        (ControlRegistry, single character)
//! byte 2   slot code          (ControlRegistry, prefixed with '1')
//! byte 3-5 option bytes       (ToggleRegistry, optional as a group)
//! ```
//!
//! Decoding is best-effort: malformed frames are dropped without error so
//! a bad chunk never stalls the ones behind it.

use crate::constants::STATUS_MARKER;
use crate::protocol::registry::{ControlRegistry, ToggleRegistry};
use crate::ui::UiUpdate;

/// Fields of one status frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFrame {
    /// Raw preset code.
    pub preset_code: u8,
    /// Raw slot code, absent on a two-byte frame.
    pub slot_code: Option<u8>,
    /// Option bytes, present only on a long-form frame.
    pub options: Option<[u8; 3]>,
}

impl StatusFrame {
    /// Resolve this frame into UI updates.
    ///
    /// Unknown preset or slot codes produce no update for that group. A
    /// short-form frame produces no toggle updates.
    #[must_use]
    pub fn updates(&self, controls: &ControlRegistry, toggles: &ToggleRegistry) -> Vec<UiUpdate> {
        let mut updates = Vec::new();

        match controls.resolve_preset(self.preset_code) {
            Some(preset) => updates.push(UiUpdate::ActivePreset(preset)),
            None => log::trace!("[Decoder] Unknown preset code {:#04x}", self.preset_code),
        }

        if let Some(code) = self.slot_code {
            match controls.resolve_slot(code) {
                Some(slot) => updates.push(UiUpdate::ActiveSlot(slot)),
                None => log::trace!("[Decoder] Unknown slot code {:#04x}", code),
            }
        }

        if let Some(options) = self.options {
            updates.extend(toggles.bindings().iter().map(|binding| UiUpdate::Toggle {
                toggle: binding.toggle,
                on: binding.is_on(options),
            }));
        }

        updates
    }
}

/// Result of decoding one inbound chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<'a> {
    /// Plain text for the terminal buffer.
    Text(&'a [u8]),
    /// A status frame.
    Status(StatusFrame),
    /// A marker-prefixed chunk too short to carry a preset code.
    Ignored,
}

/// Decode one inbound chunk.
#[must_use]
pub fn decode(chunk: &[u8]) -> Decoded<'_> {
    match chunk {
        [STATUS_MARKER, rest @ ..] => match rest {
            [] => Decoded::Ignored,
            [preset] => Decoded::Status(StatusFrame {
                preset_code: *preset,
                slot_code: None,
                options: None,
            }),
            [preset, slot, o0, o1, o2, ..] => Decoded::Status(StatusFrame {
                preset_code: *preset,
                slot_code: Some(*slot),
                options: Some([*o0, *o1, *o2]),
            }),
            [preset, slot, ..] => Decoded::Status(StatusFrame {
                preset_code: *preset,
                slot_code: Some(*slot),
                options: None,
            }),
        },
        text => Decoded::Text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Preset, Slot, Toggle};

    fn updates_for(chunk: &[u8]) -> Vec<UiUpdate> {
        match decode(chunk) {
            Decoded::Status(frame) => {
                frame.updates(&ControlRegistry::standard(), &ToggleRegistry::standard())
            }
            _ => Vec::new(),
        }
    }

    fn toggle_state(updates: &[UiUpdate], toggle: Toggle) -> Option<bool> {
        updates.iter().find_map(|u| match u {
            UiUpdate::Toggle { toggle: t, on } if *t == toggle => Some(*on),
            _ => None,
        })
    }

    #[test]
    fn test_text_chunk_passes_through() {
        assert_eq!(decode(b"hello\n"), Decoded::Text(b"hello\n"));
    }

    #[test]
    fn test_marker_not_first_is_text() {
        assert_eq!(decode(b"a#15"), Decoded::Text(b"a#15"));
    }

    #[test]
    fn test_empty_chunk_is_empty_text() {
        assert_eq!(decode(b""), Decoded::Text(b""));
    }

    #[test]
    fn test_bare_marker_is_ignored() {
        assert_eq!(decode(b"#"), Decoded::Ignored);
        assert!(updates_for(b"#").is_empty());
    }

    #[test]
    fn test_short_form_frame() {
        let Decoded::Status(frame) = decode(b"#13") else {
            panic!("expected status frame");
        };
        assert_eq!(frame.preset_code, b'1');
        assert_eq!(frame.slot_code, Some(b'3'));
        assert_eq!(frame.options, None);

        let updates = updates_for(b"#13");
        assert_eq!(
            updates,
            vec![
                UiUpdate::ActivePreset(Preset::Res1280x960),
                UiUpdate::ActiveSlot(Slot::new(3).unwrap()),
            ]
        );
    }

    #[test]
    fn test_frame_with_four_bytes_is_short_form() {
        let Decoded::Status(frame) = decode(b"#13\x01\x02") else {
            panic!("expected status frame");
        };
        assert_eq!(frame.options, None);
    }

    #[test]
    fn test_two_byte_frame_has_no_slot() {
        let updates = updates_for(b"#5");
        assert_eq!(updates, vec![UiUpdate::ActivePreset(Preset::Res1920x1080)]);
    }

    #[test]
    fn test_long_form_frame_sets_every_toggle() {
        let updates = updates_for(b"#21\x01\x00\x00");
        let toggle_count = updates
            .iter()
            .filter(|u| matches!(u, UiUpdate::Toggle { .. }))
            .count();
        assert_eq!(toggle_count, ToggleRegistry::standard().bindings().len());
    }

    #[test]
    fn test_first_option_bit_turns_on_only_its_toggle() {
        let updates = updates_for(b"#21\x01\x00\x00");
        assert_eq!(toggle_state(&updates, Toggle::AdcAutoGain), Some(true));
        for toggle in [
            Toggle::Scanlines,
            Toggle::VdsLineFilter,
            Toggle::Peaking,
            Toggle::PalForce60,
            Toggle::WantOutputComponent,
        ] {
            assert_eq!(toggle_state(&updates, toggle), Some(false), "{toggle}");
        }
    }

    #[test]
    fn test_inverted_bob_bit() {
        let updates = updates_for(b"#21\x00\x04\x00");
        assert_eq!(toggle_state(&updates, Toggle::MotionAdaptive), Some(true));
        assert_eq!(toggle_state(&updates, Toggle::Bob), Some(false));

        let updates = updates_for(b"#21\x00\x00\x00");
        assert_eq!(toggle_state(&updates, Toggle::MotionAdaptive), Some(false));
        assert_eq!(toggle_state(&updates, Toggle::Bob), Some(true));
    }

    #[test]
    fn test_unknown_codes_skip_selection() {
        let updates = updates_for(b"#70");
        assert!(updates.is_empty());

        let updates = updates_for(b"#7\x00\x00\x20\x00");
        assert_eq!(toggle_state(&updates, Toggle::FullHeight), Some(true));
        assert!(!updates
            .iter()
            .any(|u| matches!(u, UiUpdate::ActivePreset(_) | UiUpdate::ActiveSlot(_))));
    }

    #[test]
    fn test_extra_trailing_bytes_are_ignored() {
        assert_eq!(
            updates_for(b"#11\x02\x00\x00\xFF\xFF"),
            updates_for(b"#11\x02\x00\x00")
        );
    }
}
