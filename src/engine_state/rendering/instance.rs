//! Per-instance data uploaded for each visible voxel.

use cgmath::Point3;

use crate::engine_state::voxels::block::BlockTypeSize;

/// One visible voxel as the GPU sees it.
///
/// # Memory Layout
/// - Position: 3x f32 world-space block center (12 bytes)
/// - Block type: u32 (4 bytes)
///
/// Total size: 16 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    position: [f32; 3],
    block_type: u32,
}

impl InstanceRaw {
    pub fn new(position: Point3<i32>, block_type: BlockTypeSize) -> Self {
        InstanceRaw {
            position: [position.x as f32, position.y as f32, position.z as f32],
            block_type: block_type as u32,
        }
    }

    pub fn position(&self) -> Point3<f32> {
        Point3::from(self.position)
    }

    pub fn block_type(&self) -> BlockTypeSize {
        self.block_type as BlockTypeSize
    }

    /// Builds a batch from a chunk's local instance list.
    pub fn batch(origin: Point3<i32>, block_type: BlockTypeSize, locals: &[Point3<i32>]) -> Vec<Self> {
        locals
            .iter()
            .map(|local| {
                let world = Point3::new(origin.x + local.x, origin.y + local.y, origin.z + local.z);
                InstanceRaw::new(world, block_type)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 16);
        let batch = InstanceRaw::batch(Point3::new(8, 0, -8), 3, &[Point3::new(1, 2, 3)]);
        assert_eq!(bytemuck::cast_slice::<InstanceRaw, u8>(&batch).len(), 16);
        assert_eq!(batch[0].position(), Point3::new(9.0, 2.0, -5.0));
        assert_eq!(batch[0].block_type(), 3);
    }
}
