//! # Block Module
//!
//! This module provides the block catalog and the per-voxel record stored in chunks.
//! It includes block type definitions and the neighbor-side helpers used by face culling.

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
/// This is used for efficient storage of voxel data.
pub type BlockTypeSize = u8;

/// Represents a single voxel cell in a chunk.
///
/// This is a lightweight structure that stores only the essential voxel data.
/// The block properties are looked up from the block type.
///
/// `instance` is `Some` iff the voxel is solid and not obscured by six solid neighbors.
/// When set, it is the voxel's slot in the dense instance list of its block type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Voxel {
    /// The type of this voxel, encoded as a `BlockTypeSize` for compact storage.
    pub block_type: BlockTypeSize,
    /// Slot in the chunk's instance list for this block type, if instanced.
    pub instance: Option<u32>,
}

impl Voxel {
    /// Returns `true` if the voxel holds anything but air.
    #[inline]
    pub fn is_solid(&self) -> bool {
        block_type::is_solid_id(self.block_type)
    }
}
