//! Voxel ray traversal used to pick the block under the crosshair.

use cgmath::{InnerSpace, Point3, Vector3};

use super::collision::VoxelQuery;

/// How far the agent can reach, in blocks.
pub const MAX_REACH: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The solid voxel that was hit.
    pub block: Point3<i32>,
    /// Outward normal of the face the ray entered through. Zero if the ray started inside.
    pub normal: Vector3<i32>,
    /// Distance along the ray to the entry face.
    pub distance: f32,
}

impl RaycastHit {
    /// Voxel adjacent to the hit face, where a placed block goes.
    pub fn adjacent(&self) -> Point3<i32> {
        self.block + self.normal
    }
}

/// Walks the voxel grid from `origin` along `direction` and returns the first solid voxel
/// within `max_distance`.
///
/// Voxels are unit boxes centered on integer coordinates.
pub fn raycast<W: VoxelQuery + ?Sized>(
    world: &W,
    origin: Point3<f32>,
    direction: Vector3<f32>,
    max_distance: f32,
) -> Option<RaycastHit> {
    if direction.magnitude2() <= f32::EPSILON {
        return None;
    }
    let direction = direction.normalize();
    // Shift into a grid where voxel boundaries fall on integers.
    let start = origin + Vector3::new(0.5, 0.5, 0.5);

    let mut block = Point3::new(
        start.x.floor() as i32,
        start.y.floor() as i32,
        start.z.floor() as i32,
    );
    let step = Vector3::new(
        if direction.x >= 0.0 { 1 } else { -1 },
        if direction.y >= 0.0 { 1 } else { -1 },
        if direction.z >= 0.0 { 1 } else { -1 },
    );
    let t_delta = Vector3::new(
        axis_delta(direction.x),
        axis_delta(direction.y),
        axis_delta(direction.z),
    );
    let mut t_max = Vector3::new(
        first_boundary(start.x, block.x, direction.x),
        first_boundary(start.y, block.y, direction.y),
        first_boundary(start.z, block.z, direction.z),
    );

    let mut normal = Vector3::new(0, 0, 0);
    let mut distance = 0.0_f32;

    while distance <= max_distance {
        if world.is_solid(block.x, block.y, block.z) {
            return Some(RaycastHit {
                block,
                normal,
                distance,
            });
        }

        if t_max.x < t_max.y && t_max.x < t_max.z {
            distance = t_max.x;
            t_max.x += t_delta.x;
            block.x += step.x;
            normal = Vector3::new(-step.x, 0, 0);
        } else if t_max.y < t_max.z {
            distance = t_max.y;
            t_max.y += t_delta.y;
            block.y += step.y;
            normal = Vector3::new(0, -step.y, 0);
        } else {
            distance = t_max.z;
            t_max.z += t_delta.z;
            block.z += step.z;
            normal = Vector3::new(0, 0, -step.z);
        }
    }

    None
}

fn axis_delta(direction: f32) -> f32 {
    if direction.abs() < 1e-10 {
        f32::MAX
    } else {
        (1.0 / direction).abs()
    }
}

fn first_boundary(start: f32, block: i32, direction: f32) -> f32 {
    if direction.abs() < 1e-10 {
        f32::MAX
    } else if direction > 0.0 {
        ((block + 1) as f32 - start) / direction
    } else {
        (block as f32 - start) / direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Floor;

    impl VoxelQuery for Floor {
        fn is_solid(&self, _x: i32, y: i32, _z: i32) -> bool {
            y <= 0
        }
    }

    #[test]
    fn looking_down_hits_the_top_face() {
        let hit = raycast(
            &Floor,
            Point3::new(0.0, 2.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            MAX_REACH,
        )
        .unwrap();
        assert_eq!(hit.block, Point3::new(0, 0, 0));
        assert_eq!(hit.normal, Vector3::new(0, 1, 0));
        assert!((hit.distance - 1.5).abs() < 1e-5);
        assert_eq!(hit.adjacent(), Point3::new(0, 1, 0));
    }

    #[test]
    fn out_of_reach_misses() {
        let hit = raycast(
            &Floor,
            Point3::new(0.0, 10.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            MAX_REACH,
        );
        assert!(hit.is_none());
        assert!(raycast(&Floor, Point3::new(0.0, 2.0, 0.0), Vector3::new(0.0, 1.0, 0.0), 100.0).is_none());
    }

    #[test]
    fn diagonal_ray_reports_the_entered_face() {
        struct Wall;
        impl VoxelQuery for Wall {
            fn is_solid(&self, x: i32, _y: i32, _z: i32) -> bool {
                x >= 3
            }
        }
        let hit = raycast(
            &Wall,
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.3),
            MAX_REACH,
        )
        .unwrap();
        assert_eq!(hit.block.x, 3);
        assert_eq!(hit.normal, Vector3::new(-1, 0, 0));
    }

    #[test]
    fn zero_direction_is_rejected() {
        assert!(raycast(&Floor, Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0), 4.0).is_none());
    }
}
