//! # Engine State Module
//!
//! The core engine module that owns the simulation and advances it one frame at a time.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container for the engine
//! * `config` - Configuration surface loaded from JSON
//! * `physics` - The agent, collision system and fixed-timestep stepper
//! * `rendering` - Adapter turning instance lists into upload-ready batches
//! * `task_management` - Manages queued tasks and worker threads
//! * `voxels` - Handles voxel data, chunks, and world generation
//!
//! ## Frame Order
//!
//! Each [`EngineState::update`] applies the frame's player actions, steps physics, streams
//! chunks around the agent when it crosses a chunk boundary, publishes finished chunk
//! generation and finally forwards world events to the render bridge.

use cgmath::{Point3, Vector2};
use log::{debug, info, warn};

use crate::application_state::input_state::{Intent, ProcessedInputState};

use config::{ConfigResult, EngineConfig};
use physics::{
    agent::Agent,
    raycast::{raycast, RaycastHit, MAX_REACH},
    PhysicsStepper,
};
use rendering::RenderBridge;
use voxels::{block::block_type::BlockType, chunk::ChunkCoord, world::World};

pub mod config;
pub mod physics;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Pitch is kept just short of straight up or down.
const MAX_PITCH: f32 = 1.55;

/// The main state container for the voxel engine
///
/// Owns the world (and with it the edit store and generation queue), the physics stepper,
/// the agent and the render bridge.
pub struct EngineState {
    pub world: World,
    pub physics: PhysicsStepper,
    pub agent: Agent,
    pub render_bridge: RenderBridge,
    /// Current player actions derived from input
    pub player_actions: PlayerAction,
    /// Chunk the agent was in when streaming last ran
    current_player_chunk_position: Option<ChunkCoord>,
    /// Block type placed by the place intent
    pub active_block: BlockType,
    frames: u64,
}

impl EngineState {
    /// Creates the engine from a validated configuration.
    ///
    /// Nothing is streamed until the first [`EngineState::update`].
    pub fn new(config: EngineConfig) -> ConfigResult<Self> {
        config.validate()?;
        let world = World::new(config.world, &config.generation)?;
        let physics = PhysicsStepper::new(&config.physics)?;
        let agent = Agent::new(&config.agent)?;
        info!(
            "Engine ready: agent spawns at {:?}, physics at {} Hz",
            agent.position, config.physics.simulation_rate
        );

        Ok(Self {
            world,
            physics,
            agent,
            render_bridge: RenderBridge::new(),
            player_actions: PlayerAction::default(),
            current_player_chunk_position: None,
            active_block: BlockType::Dirt,
            frames: 0,
        })
    }

    /// Advances the engine by one frame.
    pub fn update(&mut self, wait_duration: web_time::Duration) {
        self.apply_player_actions();

        self.physics
            .update(wait_duration.as_secs_f64(), &mut self.agent, &self.world);

        let chunk = self.world.chunk_coord_at(self.agent.position);
        if self.current_player_chunk_position != Some(chunk) {
            let changes = self.world.update(self.agent.position);
            debug!(
                "Agent entered chunk {:?}: {} chunks requested, {} unloaded",
                chunk,
                changes.requested.len(),
                changes.unloaded.len()
            );
            self.current_player_chunk_position = Some(chunk);
        }

        self.world.process_generation();

        let events = self.world.drain_events();
        self.render_bridge.apply_events(&self.world, events);
        self.frames += 1;
    }

    /// Blocks until every requested chunk is generated and mirrored by the render bridge.
    pub fn flush_generation(&mut self) {
        self.world.flush_generation();
        let events = self.world.drain_events();
        self.render_bridge.apply_events(&self.world, events);
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Sets the input commands for the engine state.
    pub fn set_input_commands(&mut self, input: ProcessedInputState) {
        self.player_actions = translate_processed_input(&input);
    }

    /// The block the agent is looking at, within reach.
    pub fn targeted_block(&self) -> Option<RaycastHit> {
        raycast(
            &self.world,
            self.agent.position,
            self.agent.look_direction(),
            MAX_REACH,
        )
    }

    fn apply_player_actions(&mut self) {
        let actions = std::mem::take(&mut self.player_actions);

        if let Some((yaw, pitch)) = actions.rotate_view {
            self.agent.yaw += yaw;
            self.agent.pitch = (self.agent.pitch + pitch).clamp(-MAX_PITCH, MAX_PITCH);
        }

        let strafe = axis(actions.move_right, actions.move_left);
        let forward = axis(actions.move_forward, actions.move_backward);
        self.agent.set_input(Vector2::new(strafe, forward));

        if actions.jump {
            self.agent.jump();
        }
        if actions.reset {
            self.agent.reset();
            info!("Agent reset to {:?}", self.agent.position);
        }
        if actions.remove_block {
            self.remove_targeted_block();
        }
        if actions.place_block {
            self.place_at_targeted_block();
        }
        if actions.regenerate {
            self.regenerate_world();
        }
        // Keep the intent until the next input snapshot replaces it.
        self.player_actions = PlayerAction {
            jump: false,
            reset: false,
            remove_block: false,
            place_block: false,
            regenerate: false,
            rotate_view: None,
            ..actions
        };
    }

    fn remove_targeted_block(&mut self) {
        let Some(hit) = self.targeted_block() else {
            return;
        };
        let block = hit.block;
        if !self.world.remove_block(block.x, block.y, block.z) {
            debug!("Block {:?} cannot be removed", block);
        }
    }

    fn place_at_targeted_block(&mut self) {
        let Some(hit) = self.targeted_block() else {
            return;
        };
        let target = hit.adjacent();
        if self.overlaps_agent(target) {
            debug!("Refusing to place a block inside the agent at {:?}", target);
            return;
        }
        if !self.world.add_block(target.x, target.y, target.z, self.active_block) {
            debug!("Block {:?} cannot be placed", target);
        }
    }

    fn regenerate_world(&mut self) {
        let mut config = self.world.config().clone();
        config.seed = config.seed.wrapping_add(1);
        self.agent.reset();
        match self.world.regenerate(config, self.agent.position) {
            Ok(_) => {
                self.current_player_chunk_position =
                    Some(self.world.chunk_coord_at(self.agent.position));
            }
            Err(err) => warn!("Regeneration failed: {}", err),
        }
    }

    /// Whether the unit block at `block` intersects the agent's cylinder.
    fn overlaps_agent(&self, block: Point3<i32>) -> bool {
        let center = self.agent.center();
        let closest = Point3::new(
            center.x.clamp(block.x as f32 - 0.5, block.x as f32 + 0.5),
            center.y.clamp(block.y as f32 - 0.5, block.y as f32 + 0.5),
            center.z.clamp(block.z as f32 - 0.5, block.z as f32 + 0.5),
        );
        self.agent.contains_point(closest)
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

/// Translates the processed input state into player actions.
fn translate_processed_input(input: &ProcessedInputState) -> PlayerAction {
    PlayerAction {
        // Movement - active while pressed or held
        move_forward: input.get_intent_state(Intent::MoveForward).is_active(),
        move_backward: input.get_intent_state(Intent::MoveBackward).is_active(),
        move_left: input.get_intent_state(Intent::StrafeLeft).is_active(),
        move_right: input.get_intent_state(Intent::StrafeRight).is_active(),
        jump: input.get_intent_state(Intent::Jump).is_active(),
        rotate_view: input.get_look_delta(),
        // One-shot actions - only on press
        place_block: input.get_intent_state(Intent::PlaceBlock).is_just_pressed(),
        remove_block: input.get_intent_state(Intent::RemoveBlock).is_just_pressed(),
        reset: input.get_intent_state(Intent::Reset).is_just_pressed(),
        regenerate: input.get_intent_state(Intent::Regenerate).is_just_pressed(),
    }
}

/// Represents player actions derived from input
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PlayerAction {
    move_forward: bool,
    move_backward: bool,
    move_left: bool,
    move_right: bool,
    jump: bool,

    /// View rotation (yaw, pitch) in radians
    rotate_view: Option<(f32, f32)>,

    place_block: bool,
    remove_block: bool,
    reset: bool,
    regenerate: bool,
}
