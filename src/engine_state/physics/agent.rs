//! # Agent
//!
//! The collision subject driven by the physics stepper: an upright cylinder whose reference
//! point is the center of its top face.

use cgmath::{InnerSpace, Point3, Vector2, Vector3};
use log::error;

use crate::engine_state::config::{AgentConfig, ConfigResult};

/// The controlled body.
///
/// Owned by the engine; the collision system reads and mutates it by reference.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Center of the top face of the cylinder. The eye sits here.
    pub position: Point3<f32>,
    /// World-space velocity.
    pub velocity: Vector3<f32>,
    pub radius: f32,
    pub height: f32,
    /// Set by the collision pass when a vertical contact resolved this sub-step.
    pub on_ground: bool,
    /// Heading in radians; zero looks down negative z.
    pub yaw: f32,
    /// Elevation of the look direction in radians.
    pub pitch: f32,
    jump_speed: f32,
    max_speed: f32,
    spawn: Point3<f32>,
    /// Desired movement in the agent's frame: `x` strafes right, `y` moves forward.
    input: Vector2<f32>,
}

impl Agent {
    /// Creates an agent at its spawn point.
    ///
    /// Degenerate cylinders are rejected here, once, instead of misbehaving every frame.
    pub fn new(config: &AgentConfig) -> ConfigResult<Self> {
        if let Err(err) = config.validate() {
            error!("Cannot create agent: {}", err);
            return Err(err);
        }
        let spawn = Point3::from(config.spawn);
        Ok(Agent {
            position: spawn,
            velocity: Vector3::new(0.0, 0.0, 0.0),
            radius: config.radius,
            height: config.height,
            on_ground: false,
            yaw: 0.0,
            pitch: 0.0,
            jump_speed: config.jump_speed,
            max_speed: config.max_speed,
            spawn,
            input: Vector2::new(0.0, 0.0),
        })
    }

    /// Sets the desired movement. The vector is clamped to unit length and scaled by the
    /// maximum speed.
    pub fn set_input(&mut self, direction: Vector2<f32>) {
        let clamped = if direction.magnitude2() > 1.0 {
            direction.normalize()
        } else {
            direction
        };
        self.input = clamped * self.max_speed;
    }

    pub fn input(&self) -> Vector2<f32> {
        self.input
    }

    /// Starts a jump if standing on something.
    pub fn jump(&mut self) -> bool {
        if !self.on_ground {
            return false;
        }
        self.velocity.y = self.jump_speed;
        self.on_ground = false;
        true
    }

    /// Returns to the spawn point at rest.
    pub fn reset(&mut self) {
        self.position = self.spawn;
        self.velocity = Vector3::new(0.0, 0.0, 0.0);
        self.input = Vector2::new(0.0, 0.0);
        self.on_ground = false;
    }

    /// Unit vector to the right of the heading, in the horizontal plane.
    pub fn right(&self) -> Vector3<f32> {
        Vector3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Unit heading vector in the horizontal plane.
    pub fn forward(&self) -> Vector3<f32> {
        Vector3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Unit look direction including pitch.
    pub fn look_direction(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vector3::new(
            -self.yaw.sin() * cos_pitch,
            sin_pitch,
            -self.yaw.cos() * cos_pitch,
        )
    }

    /// Center of the cylinder.
    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            self.position.x,
            self.position.y - self.height / 2.0,
            self.position.z,
        )
    }

    /// Maps the input onto horizontal velocity and moves horizontally by it.
    pub fn apply_inputs(&mut self, dt: f32) {
        let horizontal = self.right() * self.input.x + self.forward() * self.input.y;
        self.velocity.x = horizontal.x;
        self.velocity.z = horizontal.z;
        self.position.x += self.velocity.x * dt;
        self.position.z += self.velocity.z * dt;
    }

    /// `true` if `point` lies strictly inside the cylinder.
    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        let center = self.center();
        let dx = point.x - center.x;
        let dy = point.y - center.y;
        let dz = point.z - center.z;
        dy.abs() < self.height / 2.0 && dx * dx + dz * dz < self.radius * self.radius
    }
}
