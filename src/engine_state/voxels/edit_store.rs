//! # Edit Store
//!
//! Sparse overlay of player edits, keyed per chunk so a single chunk's overrides can be
//! replayed after generation without scanning the whole store.

use std::collections::HashMap;

use cgmath::Point3;

use super::block::BlockTypeSize;
use super::chunk::ChunkCoord;

/// Edits of one chunk, keyed by local voxel coordinate.
pub type ChunkEdits = HashMap<Point3<i32>, BlockTypeSize>;

/// Session-long record of block overrides. Entries are never evicted.
#[derive(Debug, Default, Clone)]
pub struct EditStore {
    chunks: HashMap<ChunkCoord, ChunkEdits>,
    len: usize,
}

impl EditStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `block_type` as the override for a local coordinate of `chunk`.
    pub fn set(&mut self, chunk: ChunkCoord, local: Point3<i32>, block_type: BlockTypeSize) {
        if self
            .chunks
            .entry(chunk)
            .or_default()
            .insert(local, block_type)
            .is_none()
        {
            self.len += 1;
        }
    }

    /// The override for a local coordinate, if any.
    pub fn get(&self, chunk: ChunkCoord, local: Point3<i32>) -> Option<BlockTypeSize> {
        self.chunks.get(&chunk)?.get(&local).copied()
    }

    pub fn contains(&self, chunk: ChunkCoord, local: Point3<i32>) -> bool {
        self.get(chunk, local).is_some()
    }

    /// All overrides recorded for `chunk`.
    pub fn chunk_edits(&self, chunk: ChunkCoord) -> Option<&ChunkEdits> {
        self.chunks.get(&chunk)
    }

    /// Drops every edit. Used on full world regeneration.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
    }

    /// Total number of overridden voxels.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
