//! # Input Manager
//!
//! Tracks intent states between frames and turns them into [`ProcessedInputState`] snapshots.
//! The headless driver feeds it from an [`InputScript`].

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::input_state::{Intent, ProcessedInputState, RawInputState};
use crate::engine_state::config::ConfigResult;

/// Manages the raw on/off state of every intent.
#[derive(Debug)]
pub struct InputManager {
    intents_old: HashMap<Intent, bool>,
    intents_new: HashMap<Intent, bool>,
    look_delta: Option<(f32, f32)>,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        let mut intents_old = HashMap::new();
        let mut intents_new = HashMap::new();
        for intent in Intent::ALL {
            intents_old.insert(intent, false);
            intents_new.insert(intent, false);
        }
        Self {
            intents_old,
            intents_new,
            look_delta: None,
        }
    }

    /// Records whether an intent is currently active.
    pub fn set_intent(&mut self, intent: Intent, active: bool) {
        if let Some(state) = self.intents_new.get_mut(&intent) {
            *state = active;
        }
    }

    /// Accumulates look movement until the next snapshot.
    pub fn intake_look(&mut self, delta: (f32, f32)) {
        let (yaw, pitch) = self.look_delta.unwrap_or((0.0, 0.0));
        self.look_delta = Some((yaw + delta.0, pitch + delta.1));
    }

    pub fn create_processed_input_state(&self) -> ProcessedInputState {
        let intent_states = self
            .intents_new
            .iter()
            .map(|(intent, &new_state)| {
                let old_state = self.intents_old.get(intent).copied().unwrap_or(false);
                (*intent, RawInputState::from_raw_states(old_state, new_state))
            })
            .collect();
        ProcessedInputState {
            intent_states,
            look_delta: self.look_delta,
        }
    }

    /// Returns this frame's snapshot and prepares for the next frame.
    pub fn get_and_reset_processed_input(&mut self) -> ProcessedInputState {
        let processed = self.create_processed_input_state();
        self.reset_inputs();
        processed
    }

    /// Carries current states over as the previous states and clears look movement.
    pub fn reset_inputs(&mut self) {
        for (intent, new_state) in self.intents_new.iter() {
            if let Some(old_state) = self.intents_old.get_mut(intent) {
                *old_state = *new_state;
            }
        }
        self.look_delta = None;
    }
}

/// A span of frames during which some intents are held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptStep {
    /// First frame of the span.
    pub start: u64,
    /// Frame after the last frame of the span.
    pub end: u64,
    #[serde(default)]
    pub intents: Vec<Intent>,
    /// Look movement applied on every frame of the span (yaw, pitch).
    #[serde(default)]
    pub look: Option<[f32; 2]>,
}

/// Scripted input for the headless driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputScript {
    pub steps: Vec<ScriptStep>,
}

impl InputScript {
    /// Walks forward, looks down, digs out a block, puts it back and jumps.
    pub fn demo() -> Self {
        let step = |start, end, intents: &[Intent], look| ScriptStep {
            start,
            end,
            intents: intents.to_vec(),
            look,
        };
        InputScript {
            steps: vec![
                step(60, 180, &[Intent::MoveForward], None),
                step(120, 124, &[Intent::Jump], None),
                step(180, 200, &[], Some([0.0, -0.07])),
                step(220, 221, &[Intent::RemoveBlock], None),
                step(260, 261, &[Intent::PlaceBlock], None),
                step(300, 360, &[Intent::StrafeRight, Intent::Jump], None),
            ],
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Sets every intent's state for `frame`.
    pub fn feed(&self, frame: u64, input_manager: &mut InputManager) {
        for intent in Intent::ALL {
            let active = self
                .steps
                .iter()
                .any(|step| (step.start..step.end).contains(&frame) && step.intents.contains(&intent));
            input_manager.set_intent(intent, active);
        }
        for step in &self.steps {
            if let (true, Some([yaw, pitch])) = ((step.start..step.end).contains(&frame), step.look) {
                input_manager.intake_look((yaw, pitch));
            }
        }
    }
}
