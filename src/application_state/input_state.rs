//! # Input State
//!
//! This module defines the input state types used by the input manager.
//! Inputs are abstract intents rather than physical keys, so a scripted driver and a windowed
//! front end can feed the engine the same way.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Something the user wants the agent to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Intent {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    Jump,
    PlaceBlock,
    RemoveBlock,
    /// Return the agent to its spawn point.
    Reset,
    /// Rebuild the world with the next seed.
    Regenerate,
}

impl Intent {
    pub const ALL: [Intent; 9] = [
        Intent::MoveForward,
        Intent::MoveBackward,
        Intent::StrafeLeft,
        Intent::StrafeRight,
        Intent::Jump,
        Intent::PlaceBlock,
        Intent::RemoveBlock,
        Intent::Reset,
        Intent::Regenerate,
    ];
}

/// Represents the state of an intent across two frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawInputState {
    /// Not active
    #[default]
    NotPressed,
    /// Became active this frame
    Pressed,
    /// Active for multiple frames
    Held,
    /// Stopped being active this frame
    Released,
}

impl RawInputState {
    /// Determines if the input is actively down (either pressed or held)
    pub fn is_active(&self) -> bool {
        matches!(self, RawInputState::Pressed | RawInputState::Held)
    }

    /// Determines if the input was just pressed this frame
    pub fn is_just_pressed(&self) -> bool {
        matches!(self, RawInputState::Pressed)
    }

    pub fn is_just_released(&self) -> bool {
        matches!(self, RawInputState::Released)
    }

    /// Derives the transition from the previous and current raw states
    pub fn from_raw_states(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, true) => RawInputState::Pressed,
            (true, true) => RawInputState::Held,
            (true, false) => RawInputState::Released,
            (false, false) => RawInputState::NotPressed,
        }
    }
}

/// A snapshot of intent transitions for one frame.
#[derive(Debug, Default, Clone)]
pub struct ProcessedInputState {
    pub intent_states: HashMap<Intent, RawInputState>,
    /// Look movement since the last frame in radians (yaw, pitch)
    pub look_delta: Option<(f32, f32)>,
}

impl ProcessedInputState {
    pub fn get_intent_state(&self, intent: Intent) -> RawInputState {
        self.intent_states.get(&intent).copied().unwrap_or_default()
    }

    pub fn get_look_delta(&self) -> Option<(f32, f32)> {
        self.look_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        assert_eq!(RawInputState::from_raw_states(false, true), RawInputState::Pressed);
        assert_eq!(RawInputState::from_raw_states(true, true), RawInputState::Held);
        assert!(RawInputState::from_raw_states(true, false).is_just_released());
        assert!(!RawInputState::from_raw_states(false, false).is_active());
    }

    #[test]
    fn intents_parse_from_camel_case() {
        let intents: Vec<Intent> = serde_json::from_str(r#"["moveForward", "removeBlock"]"#).unwrap();
        assert_eq!(intents, vec![Intent::MoveForward, Intent::RemoveBlock]);
    }
}
