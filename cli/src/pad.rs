//! Directional control pad.
//!
//! The pad's four arrows are reused for three adjustments. The selected
//! mode decides which channel and code a direction sends.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};

use crate::command::CommandChannel;

/// Adjustment the pad currently drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PadMode {
    /// Move the picture.
    #[default]
    Move,
    /// Scale the picture.
    Scale,
    /// Adjust the borders.
    Borders,
}

/// Pad arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Left arrow.
    Left,
    /// Up arrow.
    Up,
    /// Right arrow.
    Right,
    /// Down arrow.
    Down,
}

impl PadMode {
    /// Channel the mode's commands go to.
    #[must_use]
    pub fn channel(self) -> CommandChannel {
        match self {
            Self::Move | Self::Scale => CommandChannel::Document,
            Self::Borders => CommandChannel::User,
        }
    }

    /// Command code for `direction` in this mode.
    #[must_use]
    pub fn code(self, direction: Direction) -> &'static str {
        match (self, direction) {
            (Self::Move, Direction::Left) => "7",
            (Self::Move, Direction::Up) => "*",
            (Self::Move, Direction::Right) => "6",
            (Self::Move, Direction::Down) => "/",
            (Self::Scale, Direction::Left) => "h",
            (Self::Scale, Direction::Up) => "4",
            (Self::Scale, Direction::Right) => "z",
            (Self::Scale, Direction::Down) => "5",
            (Self::Borders, Direction::Left) => "B",
            (Self::Borders, Direction::Up) => "C",
            (Self::Borders, Direction::Right) => "A",
            (Self::Borders, Direction::Down) => "D",
        }
    }
}

impl fmt::Display for PadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move => f.write_str("move"),
            Self::Scale => f.write_str("scale"),
            Self::Borders => f.write_str("borders"),
        }
    }
}

impl FromStr for PadMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "move" => Ok(Self::Move),
            "scale" => Ok(Self::Scale),
            "borders" => Ok(Self::Borders),
            other => bail!("unknown pad mode '{other}' (move, scale, borders)"),
        }
    }
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" | "l" => Ok(Self::Left),
            "up" | "u" => Ok(Self::Up),
            "right" | "r" => Ok(Self::Right),
            "down" | "d" => Ok(Self::Down),
            other => bail!("unknown direction '{other}' (left, up, right, down)"),
        }
    }
}

/// Pad with a selected mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlPad {
    mode: PadMode,
}

impl ControlPad {
    /// Currently selected mode.
    #[must_use]
    pub fn mode(&self) -> PadMode {
        self.mode
    }

    /// Select a mode.
    pub fn set_mode(&mut self, mode: PadMode) {
        self.mode = mode;
    }

    /// Channel and code pressing `direction` sends.
    #[must_use]
    pub fn target(&self, direction: Direction) -> (CommandChannel, &'static str) {
        (self.mode.channel(), self.mode.code(direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_move() {
        let pad = ControlPad::default();
        assert_eq!(pad.mode(), PadMode::Move);
        assert_eq!(pad.target(Direction::Up), (CommandChannel::Document, "*"));
    }

    #[test]
    fn test_borders_use_user_channel() {
        let mut pad = ControlPad::default();
        pad.set_mode(PadMode::Borders);
        assert_eq!(pad.target(Direction::Left), (CommandChannel::User, "B"));
        assert_eq!(pad.target(Direction::Down), (CommandChannel::User, "D"));
    }

    #[test]
    fn test_scale_codes() {
        let mut pad = ControlPad::default();
        pad.set_mode(PadMode::Scale);
        assert_eq!(pad.target(Direction::Left), (CommandChannel::Document, "h"));
        assert_eq!(pad.target(Direction::Right), (CommandChannel::Document, "z"));
    }

    #[test]
    fn test_parse() {
        assert_eq!("scale".parse::<PadMode>().unwrap(), PadMode::Scale);
        assert_eq!("r".parse::<Direction>().unwrap(), Direction::Right);
        assert!("diagonal".parse::<Direction>().is_err());
    }
}
