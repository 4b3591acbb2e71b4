//! Input events

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::id::{ActorId, ParseIdError};

/// Buttons of the emulated pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    A,
    B,
    Start,
    Select,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    /// All buttons in pad order
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Start,
        Button::Select,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
    ];

    /// Upper-case name of the button
    pub fn as_str(&self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::Start => "START",
            Button::Select => "SELECT",
            Button::Up => "UP",
            Button::Down => "DOWN",
            Button::Left => "LEFT",
            Button::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Button {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Button::ALL
            .into_iter()
            .find(|button| button.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseIdError::new(s, "unknown button"))
    }
}

/// A single input submitted by an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserInput {
    /// Who pressed the button
    pub actor: ActorId,
    /// Which button
    pub button: Button,
    /// When the input arrived
    pub at: Instant,
}

impl UserInput {
    /// Create an input arriving at `at`
    pub fn new(actor: ActorId, button: Button, at: Instant) -> Self {
        Self { actor, button, at }
    }

    /// Create an input arriving now
    pub fn now(actor: ActorId, button: Button) -> Self {
        Self::new(actor, button, Instant::now())
    }
}
