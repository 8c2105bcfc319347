//! # Chunk Iteration Module
//!
//! An iterator over the solid voxels of a chunk, in flat storage order.
//! Air voxels are skipped, and each item carries the voxel's local position.

use cgmath::Point3;

use crate::engine_state::voxels::block::Voxel;

use super::Chunk;

/// Iterator over all non-air voxels in a chunk.
pub struct ChunkVoxelIterator<'a> {
    /// Reference to the chunk being iterated over
    chunk_ref: &'a Chunk,
    /// Next flat index to inspect
    current_offset: usize,
}

impl<'a> ChunkVoxelIterator<'a> {
    /// Creates a new iterator positioned before the first voxel of `chunk_ref`.
    pub fn new(chunk_ref: &'a Chunk) -> Self {
        ChunkVoxelIterator {
            chunk_ref,
            current_offset: 0,
        }
    }
}

impl Iterator for ChunkVoxelIterator<'_> {
    type Item = (Point3<i32>, Voxel);

    fn next(&mut self) -> Option<Self::Item> {
        let voxels = self.chunk_ref.voxels();
        while self.current_offset < voxels.len() {
            let offset = self.current_offset;
            self.current_offset += 1;

            let voxel = voxels[offset];
            if voxel.is_solid() {
                return Some((self.chunk_ref.size().position_of(offset), voxel));
            }
        }
        None
    }
}
