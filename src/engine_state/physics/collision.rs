//! # Collision System
//!
//! Cylinder-versus-voxel collision in three steps:
//!
//! * **Broad phase**: every solid voxel in the integer box around the cylinder.
//! * **Narrow phase**: the closest point of each voxel's unit box to the cylinder axis is
//!   tested against the cylinder; hits become contacts along the axis of least overlap.
//! * **Resolution**: contacts are applied shallowest first, each re-validated against the
//!   agent's current position, pushing the agent out and cancelling velocity into the surface.
//!
//! Voxel `(x, y, z)` is the unit box centered on that integer coordinate.

use std::cmp::Ordering;

use cgmath::{InnerSpace, Point3, Vector3};
use log::trace;

use super::agent::Agent;

/// Read access to voxel solidity, in world voxel coordinates.
///
/// Unknown voxels (unloaded chunks, out of range) must report `false`.
pub trait VoxelQuery {
    fn is_solid(&self, x: i32, y: i32, z: i32) -> bool;
}

/// One penetration between the agent and a voxel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Voxel coordinate of the block.
    pub block: Point3<i32>,
    /// Closest point of the block to the agent's axis.
    pub point: Point3<f32>,
    /// Unit direction the agent is pushed along.
    pub normal: Vector3<f32>,
    /// Penetration depth along `normal`.
    pub overlap: f32,
}

/// Stateless collision detection and response.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollisionSystem;

impl CollisionSystem {
    pub fn new() -> Self {
        CollisionSystem
    }

    /// Solid voxels inside the integer bounding box of the cylinder.
    pub fn broad_phase<W: VoxelQuery + ?Sized>(&self, agent: &Agent, world: &W) -> Vec<Point3<i32>> {
        let p = agent.position;
        let min_x = (p.x - agent.radius).floor() as i32;
        let max_x = (p.x + agent.radius).ceil() as i32;
        let min_y = (p.y - agent.height).floor() as i32;
        let max_y = p.y.ceil() as i32;
        let min_z = (p.z - agent.radius).floor() as i32;
        let max_z = (p.z + agent.radius).ceil() as i32;

        let mut candidates = Vec::new();
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                for z in min_z..=max_z {
                    if world.is_solid(x, y, z) {
                        candidates.push(Point3::new(x, y, z));
                    }
                }
            }
        }
        candidates
    }

    /// Turns candidates into contacts. Sets `agent.on_ground` for every vertical contact.
    pub fn narrow_phase(&self, candidates: &[Point3<i32>], agent: &mut Agent) -> Vec<Contact> {
        let mut contacts = Vec::new();
        let center = agent.center();
        let half_height = agent.height / 2.0;

        for &block in candidates {
            let (bx, by, bz) = (block.x as f32, block.y as f32, block.z as f32);
            let point = Point3::new(
                center.x.clamp(bx - 0.5, bx + 0.5),
                center.y.clamp(by - 0.5, by + 0.5),
                center.z.clamp(bz - 0.5, bz + 0.5),
            );
            if !agent.contains_point(point) {
                continue;
            }

            let dx = point.x - center.x;
            let dy = point.y - center.y;
            let dz = point.z - center.z;
            let overlap_y = half_height - dy.abs();
            let overlap_xz = agent.radius - (dx * dx + dz * dz).sqrt();

            let contact = if overlap_y < overlap_xz {
                agent.on_ground = true;
                let up = if dy > 0.0 { -1.0 } else { 1.0 };
                Contact {
                    block,
                    point,
                    normal: Vector3::new(0.0, up, 0.0),
                    overlap: overlap_y,
                }
            } else {
                Contact {
                    block,
                    point,
                    normal: horizontal_normal(dx, dz, center, block),
                    overlap: overlap_xz,
                }
            };
            contacts.push(contact);
        }
        contacts
    }

    /// Applies contacts shallowest first. Contacts no longer inside the cylinder are skipped.
    ///
    /// Returns the number of contacts applied.
    pub fn resolve(&self, contacts: &mut [Contact], agent: &mut Agent) -> usize {
        contacts.sort_by(|a, b| a.overlap.partial_cmp(&b.overlap).unwrap_or(Ordering::Equal));

        let mut applied = 0;
        for contact in contacts.iter() {
            if !agent.contains_point(contact.point) {
                continue;
            }
            agent.position += contact.normal * contact.overlap;
            let into_surface = agent.velocity.dot(contact.normal);
            agent.velocity -= contact.normal * into_surface;
            applied += 1;
        }
        applied
    }

    /// One full pass: clears `on_ground`, gathers contacts and resolves them.
    pub fn detect_and_resolve<W: VoxelQuery + ?Sized>(&self, agent: &mut Agent, world: &W) -> usize {
        agent.on_ground = false;
        let candidates = self.broad_phase(agent, world);
        let mut contacts = self.narrow_phase(&candidates, agent);
        if contacts.is_empty() {
            return 0;
        }
        let applied = self.resolve(&mut contacts, agent);
        trace!(
            "{} candidates, {} contacts, {} resolved",
            candidates.len(),
            contacts.len(),
            applied
        );
        applied
    }
}

/// Radial push direction for a horizontal contact.
///
/// Falls back to the direction from the block center to the axis, then to +x, when the
/// closest point sits on the axis.
fn horizontal_normal(dx: f32, dz: f32, center: Point3<f32>, block: Point3<i32>) -> Vector3<f32> {
    let radial = Vector3::new(-dx, 0.0, -dz);
    if radial.magnitude2() > f32::EPSILON {
        return radial.normalize();
    }
    let away = Vector3::new(center.x - block.x as f32, 0.0, center.z - block.z as f32);
    if away.magnitude2() > f32::EPSILON {
        return away.normalize();
    }
    Vector3::new(1.0, 0.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::config::AgentConfig;
    use std::collections::HashSet;

    struct Blocks(HashSet<(i32, i32, i32)>);

    impl VoxelQuery for Blocks {
        fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
            self.0.contains(&(x, y, z))
        }
    }

    fn agent_at(x: f32, y: f32, z: f32) -> Agent {
        let mut agent = Agent::new(&AgentConfig::default()).unwrap();
        agent.position = Point3::new(x, y, z);
        agent
    }

    #[test]
    fn broad_phase_is_conservative() {
        let world = Blocks([(0, 0, 0), (5, 5, 5), (1, -1, 0)].into_iter().collect());
        let agent = agent_at(0.2, 1.5, 0.0);
        let candidates = CollisionSystem::new().broad_phase(&agent, &world);
        assert!(candidates.contains(&Point3::new(0, 0, 0)));
        assert!(candidates.contains(&Point3::new(1, -1, 0)));
        assert!(!candidates.contains(&Point3::new(5, 5, 5)));
    }

    #[test]
    fn floor_contact_pushes_up_and_grounds() {
        let world = Blocks([(0, 0, 0)].into_iter().collect());
        // Bottom of the cylinder 0.1 into the block top.
        let mut agent = agent_at(0.0, 0.4 + 1.75, 0.0);
        agent.velocity = Vector3::new(0.0, -3.0, 0.0);

        let applied = CollisionSystem::new().detect_and_resolve(&mut agent, &world);
        assert_eq!(applied, 1);
        assert!(agent.on_ground);
        assert!((agent.position.y - (0.5 + 1.75)).abs() < 1e-5);
        assert!(agent.velocity.y.abs() < 1e-6);
    }

    #[test]
    fn wall_contact_pushes_sideways() {
        let world = Blocks([(1, 5, 0)].into_iter().collect());
        // Axis 0.9 from the block center: 0.1 of the radius inside the wall.
        let mut agent = agent_at(0.1, 6.0, 0.0);
        agent.velocity = Vector3::new(4.0, 0.0, 0.0);

        CollisionSystem::new().detect_and_resolve(&mut agent, &world);
        assert!(!agent.on_ground);
        assert!((agent.position.x - 0.0).abs() < 1e-5);
        assert!(agent.velocity.x.abs() < 1e-6);
    }

    #[test]
    fn stale_contacts_are_skipped() {
        // Bottom of the cylinder at 0.25.
        let mut agent = agent_at(0.0, 2.0, 0.0);
        let mut contacts = vec![
            Contact {
                block: Point3::new(0, -1, 0),
                point: Point3::new(0.0, 0.28, 0.0),
                normal: Vector3::new(0.0, 1.0, 0.0),
                overlap: 0.1,
            },
            Contact {
                block: Point3::new(0, 0, 0),
                point: Point3::new(0.0, 0.3, 0.0),
                normal: Vector3::new(0.0, 1.0, 0.0),
                overlap: 0.05,
            },
        ];
        // The shallow contact lifts the bottom to 0.3, leaving the deeper one outside.
        assert_eq!(CollisionSystem::new().resolve(&mut contacts, &mut agent), 1);
        assert!((agent.position.y - 2.05).abs() < 1e-5);
    }

    #[test]
    fn contacts_resolve_shallowest_first() {
        let mut agent = agent_at(0.0, 0.0, 0.0);
        let mut contacts = vec![
            Contact {
                block: Point3::new(0, 0, 0),
                point: Point3::new(0.0, 10.0, 0.0),
                normal: Vector3::new(0.0, 1.0, 0.0),
                overlap: 0.3,
            },
            Contact {
                block: Point3::new(0, 0, 0),
                point: Point3::new(0.0, 10.0, 0.0),
                normal: Vector3::new(0.0, 1.0, 0.0),
                overlap: 0.1,
            },
        ];
        // Neither contact point is inside the cylinder, so nothing moves, but the order sticks.
        assert_eq!(CollisionSystem::new().resolve(&mut contacts, &mut agent), 0);
        assert_eq!(contacts[0].overlap, 0.1);
    }
}
