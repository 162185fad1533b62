//! Device status protocol.
//!
//! - [`registry`] - static code → control and bit → toggle tables
//! - [`decoder`] - inbound chunk classification and status frame parsing

pub mod decoder;
pub mod registry;

pub use decoder::{decode, Decoded, StatusFrame};
pub use registry::{
    Control, ControlRegistry, Polarity, Preset, Slot, Toggle, ToggleBinding, ToggleRegistry,
    ToggleStyle,
};
