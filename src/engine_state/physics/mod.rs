//! # Physics
//!
//! A fixed-timestep integrator for the [`Agent`]. Each frame's delta feeds an accumulator that
//! is drained in whole sub-steps of `1 / simulation_rate` seconds, so the simulation advances
//! identically regardless of frame rate. Every sub-step integrates gravity, applies movement
//! input, integrates vertical position and runs one [`CollisionSystem`] pass against the world.

pub mod agent;
pub mod collision;
pub mod raycast;

use log::{error, warn};

use crate::engine_state::config::{ConfigResult, PhysicsConfig};

use self::agent::Agent;
use self::collision::{CollisionSystem, VoxelQuery};

#[derive(Debug)]
pub struct PhysicsStepper {
    gravity: f32,
    timestep: f64,
    accumulator: f64,
    max_frame_delta: f64,
    collision: CollisionSystem,
    total_substeps: u64,
}

impl PhysicsStepper {
    pub fn new(config: &PhysicsConfig) -> ConfigResult<Self> {
        if let Err(err) = config.validate() {
            error!("Cannot create physics stepper: {}", err);
            return Err(err);
        }
        Ok(PhysicsStepper {
            gravity: config.gravity,
            timestep: 1.0 / config.simulation_rate as f64,
            accumulator: 0.0,
            max_frame_delta: config.max_frame_delta as f64,
            collision: CollisionSystem::new(),
            total_substeps: 0,
        })
    }

    /// Advances the simulation by `dt` seconds of real time.
    ///
    /// Deltas above the configured cap are clamped first. Returns the number of sub-steps run.
    pub fn update<W: VoxelQuery + ?Sized>(&mut self, dt: f64, agent: &mut Agent, world: &W) -> u32 {
        let dt = if dt > self.max_frame_delta {
            warn!(
                "Frame delta {:.3}s exceeds the {:.3}s cap, simulation will fall behind",
                dt, self.max_frame_delta
            );
            self.max_frame_delta
        } else {
            dt.max(0.0)
        };

        self.accumulator += dt;
        let step = self.timestep as f32;
        let mut substeps = 0;
        while self.accumulator >= self.timestep {
            agent.velocity.y -= self.gravity * step;
            agent.apply_inputs(step);
            agent.position.y += agent.velocity.y * step;
            self.collision.detect_and_resolve(agent, world);

            self.accumulator -= self.timestep;
            substeps += 1;
        }
        self.total_substeps += substeps as u64;
        substeps
    }

    /// Seconds carried over to the next frame.
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    /// Sub-steps simulated since creation.
    pub fn total_substeps(&self) -> u64 {
        self.total_substeps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::config::AgentConfig;
    use cgmath::Point3;
    use std::collections::HashSet;

    #[derive(Default)]
    struct Blocks(HashSet<(i32, i32, i32)>);

    impl VoxelQuery for Blocks {
        fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
            self.0.contains(&(x, y, z))
        }
    }

    struct Floor;

    impl VoxelQuery for Floor {
        fn is_solid(&self, _x: i32, y: i32, _z: i32) -> bool {
            y <= 0
        }
    }

    fn agent_at(x: f32, y: f32, z: f32) -> Agent {
        let mut agent = Agent::new(&AgentConfig::default()).unwrap();
        agent.position = Point3::new(x, y, z);
        agent
    }

    #[test]
    fn time_is_conserved() {
        let mut stepper = PhysicsStepper::new(&PhysicsConfig::default()).unwrap();
        let mut agent = agent_at(0.0, 100.0, 0.0);
        let world = Blocks::default();

        let deltas = [0.016, 0.5, 0.003, 0.1, 0.0071];
        let mut fed = 0.0;
        let mut substeps = 0u64;
        for dt in deltas {
            fed += f64::min(dt, 0.25);
            substeps += stepper.update(dt, &mut agent, &world) as u64;
        }
        let simulated = substeps as f64 * stepper.timestep() + stepper.accumulator();
        assert!((simulated - fed).abs() < 1e-9);
        assert!(stepper.accumulator() < stepper.timestep());
        assert_eq!(stepper.total_substeps(), substeps);
    }

    #[test]
    fn slow_frames_are_capped() {
        let mut stepper = PhysicsStepper::new(&PhysicsConfig::default()).unwrap();
        let mut agent = agent_at(0.0, 100.0, 0.0);
        let ran = stepper.update(10.0, &mut agent, &Blocks::default());
        assert!(ran <= 40);
    }

    #[test]
    fn removing_the_support_starts_a_fall() {
        let mut stepper = PhysicsStepper::new(&PhysicsConfig::default()).unwrap();
        let mut world = Blocks::default();
        world.0.insert((0, 0, 0));
        let mut agent = agent_at(0.0, 0.5 + 1.75, 0.0);

        stepper.update(stepper.timestep(), &mut agent, &world);
        assert!(agent.on_ground);
        assert!(agent.velocity.y.abs() < 1e-6);

        world.0.clear();
        stepper.update(stepper.timestep(), &mut agent, &world);
        assert!(!agent.on_ground);
        assert!(agent.velocity.y < 0.0);
    }

    #[test]
    fn falling_agent_lands_without_penetrating() {
        let mut stepper = PhysicsStepper::new(&PhysicsConfig::default()).unwrap();
        let mut agent = agent_at(0.3, 6.0, -0.2);
        for _ in 0..240 {
            stepper.update(1.0 / 60.0, &mut agent, &Floor);
            assert!(agent.position.y - agent.height >= 0.5 - 1e-3);
        }
        assert!(agent.on_ground);
        assert!((agent.position.y - 2.25).abs() < 0.01);
    }

    #[test]
    fn invalid_rate_is_rejected() {
        let config = PhysicsConfig {
            simulation_rate: 0.0,
            ..PhysicsConfig::default()
        };
        assert!(PhysicsStepper::new(&config).is_err());
    }
}
