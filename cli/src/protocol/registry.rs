//! Static control and toggle registries.
//!
//! The device reports its state with single-character codes. These tables
//! map those codes onto typed panel controls once at startup, so decoding
//! never performs string lookups against live UI state.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};

use crate::constants::SLOT_CODE_PREFIX;

/// Output resolution preset buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Preset {
    /// 1280x960 output.
    Res1280x960,
    /// 1280x1024 output.
    Res1280x1024,
    /// 1280x720 output.
    Res1280x720,
    /// 720x480 output.
    Res720x480,
    /// 1920x1080 output.
    Res1920x1080,
    /// 15kHz scale-down.
    ScaleDown15kHz,
    /// Source pass-through.
    SourcePassThrough,
    /// Custom preset loaded from a slot.
    CustomPreset,
}

impl Preset {
    /// Every preset, in panel order.
    pub const ALL: [Self; 8] = [
        Self::Res1280x960,
        Self::Res1280x1024,
        Self::Res1280x720,
        Self::Res720x480,
        Self::Res1920x1080,
        Self::ScaleDown15kHz,
        Self::SourcePassThrough,
        Self::CustomPreset,
    ];

    /// Stable control identifier.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Res1280x960 => "button1280x960",
            Self::Res1280x1024 => "button1280x1024",
            Self::Res1280x720 => "button1280x720",
            Self::Res720x480 => "button720x480",
            Self::Res1920x1080 => "button1920x1080",
            Self::ScaleDown15kHz => "button15kHzScaleDown",
            Self::SourcePassThrough => "buttonSourcePassThrough",
            Self::CustomPreset => "buttonLoadCustomPreset",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Res1280x960 => "1280x960",
            Self::Res1280x1024 => "1280x1024",
            Self::Res1280x720 => "1280x720",
            Self::Res720x480 => "720x480",
            Self::Res1920x1080 => "1920x1080",
            Self::ScaleDown15kHz => "15kHz scale-down",
            Self::SourcePassThrough => "pass-through",
            Self::CustomPreset => "custom",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A memory slot (1-9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(u8);

impl Slot {
    /// Number of slots exposed by the panel.
    pub const COUNT: u8 = 9;

    /// Create a slot from its 1-based number.
    #[must_use]
    pub fn new(number: u8) -> Option<Self> {
        (1..=Self::COUNT).contains(&number).then_some(Self(number))
    }

    /// Iterate over all slots.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=Self::COUNT).map(Self)
    }

    /// 1-based slot number.
    #[must_use]
    pub fn number(self) -> u8 {
        self.0
    }

    /// Stable control identifier (`slot1`..`slot9`), also the slot-name key.
    #[must_use]
    pub fn id(self) -> String {
        format!("slot{}", self.0)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot{}", self.0)
    }
}

impl FromStr for Slot {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("slot").unwrap_or(s);
        match digits.parse::<u8>().ok().and_then(Self::new) {
            Some(slot) => Ok(slot),
            None => bail!("unknown slot '{s}' (expected 1-{})", Self::COUNT),
        }
    }
}

/// A selectable control addressed by a protocol code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Resolution preset.
    Preset(Preset),
    /// Memory slot.
    Slot(Slot),
}

/// Maps protocol codes to preset and slot controls.
#[derive(Debug, Clone)]
pub struct ControlRegistry {
    entries: Vec<(String, Control)>,
}

impl Default for ControlRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ControlRegistry {
    /// The code table the firmware uses.
    #[must_use]
    pub fn standard() -> Self {
        let presets = [
            ("1", Preset::Res1280x960),
            ("2", Preset::Res1280x1024),
            ("3", Preset::Res1280x720),
            ("4", Preset::Res720x480),
            ("5", Preset::Res1920x1080),
            ("6", Preset::ScaleDown15kHz),
            ("8", Preset::SourcePassThrough),
            ("9", Preset::CustomPreset),
        ];

        let mut entries: Vec<(String, Control)> = presets
            .iter()
            .map(|(code, preset)| ((*code).to_string(), Control::Preset(*preset)))
            .collect();
        entries.extend(
            Slot::all().map(|slot| (format!("{SLOT_CODE_PREFIX}{}", slot.number()), Control::Slot(slot))),
        );

        Self { entries }
    }

    /// Look up a control by its code.
    #[must_use]
    pub fn lookup(&self, code: &str) -> Option<Control> {
        self.entries
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, control)| *control)
    }

    /// Resolve the preset byte of a status frame.
    #[must_use]
    pub fn resolve_preset(&self, byte: u8) -> Option<Preset> {
        match self.lookup(&char::from(byte).to_string()) {
            Some(Control::Preset(preset)) => Some(preset),
            _ => None,
        }
    }

    /// Resolve the slot byte of a status frame (looked up under the slot prefix).
    #[must_use]
    pub fn resolve_slot(&self, byte: u8) -> Option<Slot> {
        let code = format!("{SLOT_CODE_PREFIX}{}", char::from(byte));
        match self.lookup(&code) {
            Some(Control::Slot(slot)) => Some(slot),
            _ => None,
        }
    }
}

/// Boolean feature flags reported in the option bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Toggle {
    /// ADC auto gain.
    AdcAutoGain,
    /// Scanlines.
    Scanlines,
    /// Line filter.
    VdsLineFilter,
    /// Peaking.
    Peaking,
    /// Force PAL 50Hz to 60Hz.
    PalForce60,
    /// Component (YPbPr) output.
    WantOutputComponent,
    /// Matched presets.
    Matched,
    /// Frame time lock.
    FrameTimeLock,
    /// Motion adaptive deinterlacing.
    MotionAdaptive,
    /// Bob deinterlacing (the inverse of motion adaptive).
    Bob,
    /// Step response.
    Step,
    /// Full height.
    FullHeight,
    /// ADC calibration.
    EnableCalibrationAdc,
    /// Prefer scaling in RGBHV mode.
    PreferScalingRgbhv,
}

impl Toggle {
    /// Every toggle, in registry order.
    pub const ALL: [Self; 14] = [
        Self::AdcAutoGain,
        Self::Scanlines,
        Self::VdsLineFilter,
        Self::Peaking,
        Self::PalForce60,
        Self::WantOutputComponent,
        Self::Matched,
        Self::FrameTimeLock,
        Self::MotionAdaptive,
        Self::Bob,
        Self::Step,
        Self::FullHeight,
        Self::EnableCalibrationAdc,
        Self::PreferScalingRgbhv,
    ];

    /// Control key used by the panel markup and the operator console.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::AdcAutoGain => "adcAutoGain",
            Self::Scanlines => "scanlines",
            Self::VdsLineFilter => "vdsLineFilter",
            Self::Peaking => "peaking",
            Self::PalForce60 => "palForce60",
            Self::WantOutputComponent => "wantOutputComponent",
            Self::Matched => "matched",
            Self::FrameTimeLock => "frameTimeLock",
            Self::MotionAdaptive => "motionAdaptive",
            Self::Bob => "bob",
            Self::Step => "step",
            Self::FullHeight => "fullHeight",
            Self::EnableCalibrationAdc => "enableCalibrationADC",
            Self::PreferScalingRgbhv => "preferScalingRgbhv",
        }
    }
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Toggle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("unknown toggle '{s}'"))
    }
}

/// Whether a set bit means the toggle is on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Bit set → on.
    SetMeansOn,
    /// Bit set → off.
    SetMeansOff,
}

/// How a toggle is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleStyle {
    /// Button with an active state.
    Button,
    /// Switch row whose label glyph flips between on and off.
    Switch,
}

/// Location of a toggle within the option bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleBinding {
    /// The toggle.
    pub toggle: Toggle,
    /// Option byte index (0-2).
    pub byte: usize,
    /// Bit mask within that byte.
    pub mask: u8,
    /// Meaning of a set bit.
    pub polarity: Polarity,
    /// Rendering style.
    pub style: ToggleStyle,
}

impl ToggleBinding {
    const fn new(toggle: Toggle, byte: usize, mask: u8, polarity: Polarity, style: ToggleStyle) -> Self {
        Self {
            toggle,
            byte,
            mask,
            polarity,
            style,
        }
    }

    /// Toggle state encoded by `options`.
    #[must_use]
    pub fn is_on(&self, options: [u8; 3]) -> bool {
        let set = (options[self.byte] & self.mask) == self.mask;
        match self.polarity {
            Polarity::SetMeansOn => set,
            Polarity::SetMeansOff => !set,
        }
    }
}

/// The set of known toggles and their bit positions.
#[derive(Debug, Clone)]
pub struct ToggleRegistry {
    bindings: Vec<ToggleBinding>,
}

impl Default for ToggleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ToggleRegistry {
    /// The bit layout the firmware reports.
    ///
    /// `MotionAdaptive` and `Bob` share bit 0x04 of byte 1 with opposite
    /// polarity.
    #[must_use]
    pub fn standard() -> Self {
        use Polarity::{SetMeansOff, SetMeansOn};
        use ToggleStyle::{Button, Switch};

        let bindings = vec![
            ToggleBinding::new(Toggle::AdcAutoGain, 0, 0x01, SetMeansOn, Button),
            ToggleBinding::new(Toggle::Scanlines, 0, 0x02, SetMeansOn, Button),
            ToggleBinding::new(Toggle::VdsLineFilter, 0, 0x04, SetMeansOn, Button),
            ToggleBinding::new(Toggle::Peaking, 0, 0x08, SetMeansOn, Button),
            ToggleBinding::new(Toggle::PalForce60, 0, 0x10, SetMeansOn, Switch),
            ToggleBinding::new(Toggle::WantOutputComponent, 0, 0x20, SetMeansOn, Switch),
            ToggleBinding::new(Toggle::Matched, 1, 0x01, SetMeansOn, Switch),
            ToggleBinding::new(Toggle::FrameTimeLock, 1, 0x02, SetMeansOn, Switch),
            ToggleBinding::new(Toggle::MotionAdaptive, 1, 0x04, SetMeansOn, Button),
            ToggleBinding::new(Toggle::Bob, 1, 0x04, SetMeansOff, Button),
            ToggleBinding::new(Toggle::Step, 1, 0x10, SetMeansOn, Button),
            ToggleBinding::new(Toggle::FullHeight, 1, 0x20, SetMeansOn, Button),
            ToggleBinding::new(Toggle::EnableCalibrationAdc, 2, 0x01, SetMeansOn, Switch),
            ToggleBinding::new(Toggle::PreferScalingRgbhv, 2, 0x02, SetMeansOn, Switch),
        ];

        Self { bindings }
    }

    /// All bindings in registry order.
    #[must_use]
    pub fn bindings(&self) -> &[ToggleBinding] {
        &self.bindings
    }

    /// Binding for a toggle, if registered.
    #[must_use]
    pub fn binding(&self, toggle: Toggle) -> Option<&ToggleBinding> {
        self.bindings.iter().find(|b| b.toggle == toggle)
    }
}
