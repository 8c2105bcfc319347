//! # Application State Management
//!
//! This module drives the engine without a window:
//! - Configuration loading from the command line or environment
//! - Scripted input fed through the input manager
//! - Frame timing and the frame loop

pub mod input_manager;
pub mod input_state;

use std::path::PathBuf;
use std::time::Duration;

use log::{info, warn};

use input_manager::{InputManager, InputScript};

use crate::engine_state::config::{ConfigResult, EngineConfig};
use crate::engine_state::EngineState;

/// Environment variable naming a JSON engine config.
pub const CONFIG_ENV: &str = "VOXEL_WORLD_CONFIG";
/// Environment variable naming a JSON input script.
pub const SCRIPT_ENV: &str = "VOXEL_WORLD_SCRIPT";
/// Environment variable overriding the number of frames to run.
pub const FRAMES_ENV: &str = "VOXEL_WORLD_FRAMES";

const DEFAULT_FRAMES: u64 = 600;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// The running application: engine, input and frame timing.
pub struct ApplicationState {
    /// The core engine state and logic
    pub engine_state: EngineState,
    /// Manages input state between frames
    pub input_manager: InputManager,
    /// Where this run's input comes from
    pub script: InputScript,
    /// Timestamp of the last frame for delta time calculations
    pub last_wait_time: web_time::Instant,
    frame: u64,
}

impl ApplicationState {
    pub fn new(config: EngineConfig, script: InputScript) -> ConfigResult<Self> {
        Ok(Self {
            engine_state: EngineState::new(config)?,
            input_manager: InputManager::new(),
            script,
            last_wait_time: web_time::Instant::now(),
            frame: 0,
        })
    }

    /// Runs one frame with the real time elapsed since the previous one.
    pub fn about_to_wait(&mut self) {
        let now = web_time::Instant::now();
        let wait_dt = now - self.last_wait_time;
        self.step(wait_dt);
        self.last_wait_time = now;
    }

    /// Runs one frame with an explicit delta.
    pub fn step(&mut self, wait_dt: Duration) {
        self.script.feed(self.frame, &mut self.input_manager);
        let processed_input = self.input_manager.get_and_reset_processed_input();
        self.engine_state.set_input_commands(processed_input);
        self.engine_state.update(wait_dt);
        self.frame += 1;
    }

    /// Runs `frames` frames in real time.
    pub fn run(&mut self, frames: u64) {
        self.last_wait_time = web_time::Instant::now();
        for _ in 0..frames {
            std::thread::sleep(FRAME_INTERVAL);
            self.about_to_wait();
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Logs a summary of the session.
    pub fn report(&self) {
        let stats = self.engine_state.world.stats();
        let agent = &self.engine_state.agent;
        info!(
            "{} frames, {} physics sub-steps, agent at {:?} (on ground: {})",
            self.frame,
            self.engine_state.physics.total_substeps(),
            agent.position,
            agent.on_ground
        );
        info!(
            "{} chunks loaded, {} pending, {} generated, {} unloaded, {} stale results",
            stats.loaded_chunks,
            stats.pending_chunks,
            stats.chunks_generated,
            stats.chunks_unloaded,
            stats.stale_results
        );
        info!(
            "{} visible instances, {} mirrored in {} chunk buffers, {} edits",
            stats.instances,
            self.engine_state.render_bridge.instance_count(),
            self.engine_state.render_bridge.live_chunks(),
            stats.edits
        );
    }
}

/// Loads the engine config from `path`, or `VOXEL_WORLD_CONFIG`, or falls back to defaults.
pub fn load_config(path: Option<PathBuf>) -> ConfigResult<EngineConfig> {
    match path.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from)) {
        Some(path) => {
            let config = EngineConfig::from_path(&path)?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        }
        None => {
            info!("No config given, using defaults");
            Ok(EngineConfig::default())
        }
    }
}

/// Loads the input script from `VOXEL_WORLD_SCRIPT`, or the built-in demo.
pub fn load_script() -> ConfigResult<InputScript> {
    match std::env::var_os(SCRIPT_ENV) {
        Some(path) => InputScript::from_path(path),
        None => Ok(InputScript::demo()),
    }
}

/// Frame count from `VOXEL_WORLD_FRAMES`.
pub fn frame_count() -> u64 {
    match std::env::var(FRAMES_ENV) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}", FRAMES_ENV, value);
            DEFAULT_FRAMES
        }),
        Err(_) => DEFAULT_FRAMES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::ChunkSize;

    #[test]
    fn demo_script_runs_headless() {
        let mut config = EngineConfig::default();
        config.world.chunk_size = ChunkSize {
            width: 16,
            height: 24,
        };
        config.world.terrain.offset = 8.0;
        config.agent.spawn = [8.0, 20.0, 8.0];
        let mut app = ApplicationState::new(config, InputScript::demo()).unwrap();
        for _ in 0..400 {
            app.step(Duration::from_millis(16));
        }
        assert_eq!(app.frame(), 400);
        assert!(app.engine_state.world.stats().loaded_chunks > 0);
        assert!(app.engine_state.physics.total_substeps() > 0);
        app.report();
    }
}
