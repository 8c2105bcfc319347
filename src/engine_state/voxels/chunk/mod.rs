//! # Chunk Module
//!
//! This module provides the `Chunk` struct and related functionality for managing one
//! column of voxel data. A chunk spans `width x height x width` voxels and always covers the
//! full world height, so chunks are addressed by a 2D coordinate.
//!
//! ## Memory Layout
//!
//! Voxels live in one flat vector indexed by `x + width * (y + height * z)`. Every access
//! goes through bounds-checked accessors; out-of-range coordinates read as absent and never
//! mutate anything.
//!
//! ## Visible Instances
//!
//! Beside the voxel grid, each chunk keeps an [`InstanceIndex`]: one dense list of positions
//! per block type, containing exactly the solid voxels that are not enclosed by six solid
//! neighbors. A voxel's `instance` field is its slot in that list. The renderer reads these
//! lists directly, so the instance count grows with surface area rather than volume.

use cgmath::{Point2, Point3};
use serde::{Deserialize, Serialize};

use super::block::block_side::BlockSide;
use super::block::block_type::{is_solid_id, BlockType};
use super::block::{BlockTypeSize, Voxel};
use super::edit_store::EditStore;

pub mod chunk_generation;
pub mod chunk_iteration;
pub mod instance_index;

use chunk_iteration::ChunkVoxelIterator;
use instance_index::InstanceIndex;

/// Chunk coordinate in chunk units. `x` maps to world x, `y` maps to world z.
pub type ChunkCoord = Point2<i32>;

/// Extent of every chunk in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkSize {
    /// Extent along x and z.
    pub width: usize,
    /// Extent along y.
    pub height: usize,
}

impl ChunkSize {
    /// Number of voxels in one chunk.
    pub fn volume(&self) -> usize {
        self.width * self.height * self.width
    }

    /// Returns `true` if the local coordinate lies inside the chunk.
    #[inline]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && (z as usize) < self.width
    }

    /// Flat index of a local coordinate, or `None` when out of bounds.
    #[inline]
    pub fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        if !self.contains(x, y, z) {
            return None;
        }
        Some(x as usize + self.width * (y as usize + self.height * z as usize))
    }

    /// Inverse of [`ChunkSize::index`].
    pub fn position_of(&self, index: usize) -> Point3<i32> {
        let x = index % self.width;
        let y = (index / self.width) % self.height;
        let z = index / (self.width * self.height);
        Point3::new(x as i32, y as i32, z as i32)
    }
}

/// Represents one column of voxels in the world.
///
/// Chunks are owned by the world. They are created empty, filled by one generation pass,
/// then marked loaded; only loaded chunks answer block queries.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: ChunkCoord,
    size: ChunkSize,
    voxels: Vec<Voxel>,
    instances: InstanceIndex,
    loaded: bool,
}

impl Chunk {
    /// Creates a new, completely empty chunk that is not yet loaded.
    pub fn new(position: ChunkCoord, size: ChunkSize) -> Self {
        Chunk {
            position,
            size,
            voxels: vec![Voxel::default(); size.volume()],
            instances: InstanceIndex::new(),
            loaded: false,
        }
    }

    /// Creates an unloaded chunk from a flat grid of block ids in chunk index order.
    ///
    /// The grid must hold exactly `size.volume()` entries. No instances are built.
    pub(crate) fn from_block_types(
        position: ChunkCoord,
        size: ChunkSize,
        block_types: Vec<BlockTypeSize>,
    ) -> Self {
        debug_assert_eq!(block_types.len(), size.volume());
        Chunk {
            position,
            size,
            voxels: block_types
                .into_iter()
                .map(|block_type| Voxel {
                    block_type,
                    instance: None,
                })
                .collect(),
            instances: InstanceIndex::new(),
            loaded: false,
        }
    }

    pub fn size(&self) -> ChunkSize {
        self.size
    }

    /// World-space coordinate of local voxel (0, 0, 0).
    pub fn origin(&self) -> Point3<i32> {
        let width = self.size.width as i32;
        Point3::new(self.position.x * width, 0, self.position.y * width)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Publishes the chunk: block queries on it are answered from now on.
    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// The voxel at a local coordinate, or `None` if out of bounds.
    pub fn get_voxel(&self, x: i32, y: i32, z: i32) -> Option<&Voxel> {
        self.voxels.get(self.size.index(x, y, z)?)
    }

    /// The block id at a local coordinate, or `None` if out of bounds.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Option<BlockTypeSize> {
        self.get_voxel(x, y, z).map(|voxel| voxel.block_type)
    }

    /// `true` only for in-bounds solid voxels.
    pub fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        self.get_voxel(x, y, z).is_some_and(Voxel::is_solid)
    }

    /// Overwrites a voxel's block id without touching the edit store.
    ///
    /// Any instance the voxel held is released first; the caller decides whether the new
    /// block should be instanced.
    pub fn set_block_type(&mut self, x: i32, y: i32, z: i32, block_type: BlockTypeSize) -> bool {
        let Some(index) = self.size.index(x, y, z) else {
            return false;
        };
        if self.voxels[index].instance.is_some() {
            self.remove_instance(x, y, z);
        }
        self.voxels[index].block_type = block_type;
        true
    }

    /// Places a block in an empty voxel and records the edit.
    ///
    /// No-op (returns `false`) when out of bounds, when the voxel is occupied, or when
    /// `block_type` is empty or not in the catalog.
    pub fn add_block(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        block_type: BlockTypeSize,
        edits: &mut EditStore,
    ) -> bool {
        if !is_solid_id(block_type) || BlockType::from_id(block_type).is_none() {
            return false;
        }
        match self.get_voxel(x, y, z) {
            Some(voxel) if !voxel.is_solid() => {}
            _ => return false,
        }
        self.set_block_type(x, y, z, block_type);
        self.add_instance(x, y, z);
        edits.set(self.position, Point3::new(x, y, z), block_type);
        true
    }

    /// Clears a solid voxel and records the edit.
    pub fn remove_block(&mut self, x: i32, y: i32, z: i32, edits: &mut EditStore) -> bool {
        if !self.is_solid(x, y, z) {
            return false;
        }
        self.remove_instance(x, y, z);
        self.set_block_type(x, y, z, 0);
        edits.set(self.position, Point3::new(x, y, z), 0);
        true
    }

    /// Gives a solid, non-instanced voxel a slot in its block type's list.
    ///
    /// Returns the new slot, or `None` if nothing was added.
    pub fn add_instance(&mut self, x: i32, y: i32, z: i32) -> Option<u32> {
        let index = self.size.index(x, y, z)?;
        let voxel = self.voxels[index];
        if !voxel.is_solid() || voxel.instance.is_some() {
            return None;
        }
        let slot = self
            .instances
            .push(voxel.block_type, Point3::new(x, y, z))?;
        self.voxels[index].instance = Some(slot);
        Some(slot)
    }

    /// Releases a voxel's instance slot using swap-remove.
    ///
    /// The voxel that previously held the last slot is re-pointed at the vacated one.
    pub fn remove_instance(&mut self, x: i32, y: i32, z: i32) -> bool {
        let Some(index) = self.size.index(x, y, z) else {
            return false;
        };
        let voxel = self.voxels[index];
        let Some(slot) = voxel.instance else {
            return false;
        };
        self.voxels[index].instance = None;

        let Some(removal) = self.instances.swap_remove(voxel.block_type, slot) else {
            return false;
        };
        if let Some(moved) = removal.moved {
            if let Some(moved_index) = self.size.index(moved.x, moved.y, moved.z) {
                self.voxels[moved_index].instance = Some(slot);
            }
        }
        true
    }

    /// A voxel is obscured iff all six axis neighbors are solid.
    ///
    /// Neighbors outside the chunk's x/z range are resolved through `outside`, which receives
    /// the local (out-of-range) coordinate; `None` from it counts as empty. Neighbors above or
    /// below the chunk are empty.
    pub fn is_obscured<F>(&self, x: i32, y: i32, z: i32, outside: F) -> bool
    where
        F: Fn(Point3<i32>) -> Option<BlockTypeSize>,
    {
        let width = self.size.width as i32;
        let height = self.size.height as i32;
        BlockSide::all().into_iter().all(|side| {
            let neighbor = Point3::new(x, y, z) + side.offset();
            if neighbor.y < 0 || neighbor.y >= height {
                return false;
            }
            if neighbor.x < 0 || neighbor.x >= width || neighbor.z < 0 || neighbor.z >= width {
                return outside(neighbor).is_some_and(is_solid_id);
            }
            self.is_solid(neighbor.x, neighbor.y, neighbor.z)
        })
    }

    /// Brings one voxel's instance in line with the culling rule.
    ///
    /// Returns `true` if an instance was added or removed.
    pub fn refresh_instance<F>(&mut self, x: i32, y: i32, z: i32, outside: F) -> bool
    where
        F: Fn(Point3<i32>) -> Option<BlockTypeSize>,
    {
        let Some(voxel) = self.get_voxel(x, y, z).copied() else {
            return false;
        };
        if !voxel.is_solid() {
            return false;
        }
        let obscured = self.is_obscured(x, y, z, outside);
        match (obscured, voxel.instance) {
            (true, Some(_)) => self.remove_instance(x, y, z),
            (false, None) => self.add_instance(x, y, z).is_some(),
            _ => false,
        }
    }

    /// Rebuilds every instance list from the voxel grid.
    ///
    /// Voxels are visited x outermost, then y, then z, so slot order is stable for a given grid.
    pub fn build_instances<F>(&mut self, outside: F)
    where
        F: Fn(Point3<i32>) -> Option<BlockTypeSize>,
    {
        self.instances.clear();
        for voxel in self.voxels.iter_mut() {
            voxel.instance = None;
        }

        let size = self.size;
        for x in 0..size.width as i32 {
            for y in 0..size.height as i32 {
                for z in 0..size.width as i32 {
                    if self.is_solid(x, y, z) && !self.is_obscured(x, y, z, &outside) {
                        self.add_instance(x, y, z);
                    }
                }
            }
        }
    }

    /// Local coordinates of the voxels on the face of this chunk that touches `side`.
    ///
    /// Only horizontal sides have a border layer; vertical sides yield nothing.
    pub fn border_layer(&self, side: BlockSide) -> Vec<Point3<i32>> {
        let width = self.size.width as i32;
        let height = self.size.height as i32;
        let fixed = match side {
            BlockSide::LEFT | BlockSide::BACK => 0,
            BlockSide::RIGHT | BlockSide::FRONT => width - 1,
            BlockSide::TOP | BlockSide::BOTTOM => return Vec::new(),
        };
        let mut layer = Vec::with_capacity((width * height) as usize);
        for along in 0..width {
            for y in 0..height {
                let position = match side {
                    BlockSide::LEFT | BlockSide::RIGHT => Point3::new(fixed, y, along),
                    _ => Point3::new(along, y, fixed),
                };
                layer.push(position);
            }
        }
        layer
    }

    /// The visible-instance lists of this chunk.
    pub fn instances(&self) -> &InstanceIndex {
        &self.instances
    }

    /// Block types whose instance lists changed since the last call.
    pub fn take_dirty_instances(&mut self) -> Vec<BlockTypeSize> {
        self.instances.take_dirty()
    }

    /// Iterates all solid voxels with their local positions.
    pub fn solid_voxels(&self) -> ChunkVoxelIterator<'_> {
        ChunkVoxelIterator::new(self)
    }

    pub(crate) fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

}
