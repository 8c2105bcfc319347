//! # Voxel World
//!
//! A chunked voxel world with deterministic seeded generation, persistent player edits and a
//! fixed-timestep physics agent.
//!
//! ## Key Modules
//!
//! * `application_state` - Headless frame loop, scripted input and config loading
//! * `engine_state` - World streaming, chunk generation, physics and the rendering adapter
//!
//! ## Architecture
//!
//! The world is split into vertical chunk columns streamed around the agent. Chunks are
//! generated from a seed on the task manager's workers (or cooperatively on the main thread),
//! and edits are kept apart from chunks so they survive unloading and regeneration. Each chunk
//! keeps per-block-type lists of its visible voxels, which the rendering adapter mirrors into
//! upload-ready instance batches.
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     voxel_world::run();
//! }
//! ```

use log::{error, info};

pub mod application_state;
pub mod engine_state;

use application_state::ApplicationState;

pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config_path = std::env::args_os().nth(1).map(std::path::PathBuf::from);
    let config = match application_state::load_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };
    let script = match application_state::load_script() {
        Ok(script) => script,
        Err(err) => {
            error!("Invalid input script: {}", err);
            std::process::exit(1);
        }
    };

    let mut state = match ApplicationState::new(config, script) {
        Ok(state) => state,
        Err(err) => {
            error!("Cannot start engine: {}", err);
            std::process::exit(1);
        }
    };

    state.run(application_state::frame_count());
    state.report();
}
