//! Rendering adapter for the voxel world.
//!
//! The world keeps per-chunk, per-block-type instance lists in chunk-local coordinates. This
//! module turns them into contiguous world-space [`InstanceRaw`] batches a renderer can upload
//! as-is, and tracks which chunks currently own a buffer slot. It is driven purely by the
//! [`WorldEvent`]s the world records, drained once per frame.

use std::collections::{HashMap, VecDeque};

use log::debug;

use super::voxels::{
    block::{block_type::BlockType, BlockTypeSize},
    chunk::{Chunk, ChunkCoord},
    world::{World, WorldEvent},
};

mod instance;

pub use instance::InstanceRaw;

/// Buffers owned by one live chunk.
#[derive(Debug)]
pub struct ChunkBuffers {
    /// Index of the chunk's slot in the chunk buffer pool.
    pub slot: u32,
    /// Instance batches indexed by block type id.
    batches: Vec<Vec<InstanceRaw>>,
}

impl ChunkBuffers {
    fn new(slot: u32) -> Self {
        ChunkBuffers {
            slot,
            batches: vec![Vec::new(); BlockType::COUNT],
        }
    }

    fn rebuild(&mut self, chunk: &Chunk, block_type: BlockTypeSize) {
        let Some(batch) = self.batches.get_mut(block_type as usize) else {
            return;
        };
        *batch = InstanceRaw::batch(
            chunk.origin(),
            block_type,
            chunk.instances().positions(block_type),
        );
    }

    pub fn batch(&self, block_type: BlockTypeSize) -> &[InstanceRaw] {
        self.batches
            .get(block_type as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn instance_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }
}

/// Mirrors the world's instance lists into upload-ready batches.
#[derive(Debug, Default)]
pub struct RenderBridge {
    buffers: HashMap<ChunkCoord, ChunkBuffers>,
    available_slots: VecDeque<u32>,
    next_slot: u32,
    /// Batches rebuilt since creation.
    uploads: u64,
}

impl RenderBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies drained world events. Returns the number of batches rebuilt.
    pub fn apply_events(&mut self, world: &World, events: Vec<WorldEvent>) -> usize {
        let mut rebuilt = 0;
        for event in events {
            match event {
                WorldEvent::ChunkLoaded(coord) => {
                    let Some(chunk) = world.chunk(coord) else {
                        continue;
                    };
                    self.release(coord);
                    let slot = self.allocate_slot();
                    let mut buffers = ChunkBuffers::new(slot);
                    for block_type in 0..BlockType::COUNT as BlockTypeSize {
                        buffers.rebuild(chunk, block_type);
                        rebuilt += 1;
                    }
                    debug!("Chunk {:?} bound to buffer slot {}", coord, slot);
                    self.buffers.insert(coord, buffers);
                }
                WorldEvent::ChunkUnloaded(coord) => {
                    self.release(coord);
                }
                WorldEvent::InstancesChanged { chunk, block_types } => {
                    let (Some(buffers), Some(source)) =
                        (self.buffers.get_mut(&chunk), world.chunk(chunk))
                    else {
                        continue;
                    };
                    for block_type in block_types {
                        buffers.rebuild(source, block_type);
                        rebuilt += 1;
                    }
                }
            }
        }
        self.uploads += rebuilt as u64;
        rebuilt
    }

    fn allocate_slot(&mut self) -> u32 {
        self.available_slots.pop_front().unwrap_or_else(|| {
            let slot = self.next_slot;
            self.next_slot += 1;
            slot
        })
    }

    fn release(&mut self, coord: ChunkCoord) {
        if let Some(buffers) = self.buffers.remove(&coord) {
            self.available_slots.push_back(buffers.slot);
            debug!("Released buffer slot {} of chunk {:?}", buffers.slot, coord);
        }
    }

    pub fn is_live(&self, coord: ChunkCoord) -> bool {
        self.buffers.contains_key(&coord)
    }

    pub fn chunk_buffers(&self, coord: ChunkCoord) -> Option<&ChunkBuffers> {
        self.buffers.get(&coord)
    }

    /// Raw bytes of one batch, ready for a buffer write.
    pub fn batch_bytes(&self, coord: ChunkCoord, block_type: BlockTypeSize) -> &[u8] {
        self.buffers
            .get(&coord)
            .map(|buffers| bytemuck::cast_slice(buffers.batch(block_type)))
            .unwrap_or(&[])
    }

    pub fn live_chunks(&self) -> usize {
        self.buffers.len()
    }

    pub fn instance_count(&self) -> usize {
        self.buffers.values().map(ChunkBuffers::instance_count).sum()
    }

    pub fn uploads(&self) -> u64 {
        self.uploads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::config::{GenerationConfig, WorldConfig};
    use crate::engine_state::voxels::chunk::ChunkSize;
    use cgmath::{Point2, Point3};

    fn flat_world(draw_distance: u32) -> World {
        let mut config = WorldConfig::default();
        config.chunk_size = ChunkSize {
            width: 8,
            height: 12,
        };
        config.draw_distance = draw_distance;
        config.terrain.magnitude = 0.0;
        config.resources.clear();
        config.trees.frequency = 0.0;
        config.clouds.density = 0.0;
        World::new(config, &GenerationConfig::default()).unwrap()
    }

    fn sync(bridge: &mut RenderBridge, world: &mut World) {
        let events = world.drain_events();
        bridge.apply_events(world, events);
    }

    #[test]
    fn mirrors_loaded_chunks() {
        let mut world = flat_world(1);
        let mut bridge = RenderBridge::new();
        world.update(Point3::new(4.0, 8.0, 4.0));
        world.flush_generation();
        sync(&mut bridge, &mut world);

        assert_eq!(bridge.live_chunks(), 9);
        assert_eq!(bridge.instance_count(), world.stats().instances);
        let origin = Point2::new(0, 0);
        let bytes = bridge.batch_bytes(origin, BlockType::Grass.id());
        assert_eq!(bytes.len(), 64 * std::mem::size_of::<InstanceRaw>());
    }

    #[test]
    fn follows_edits_and_unloads() {
        let mut world = flat_world(1);
        let mut bridge = RenderBridge::new();
        world.update(Point3::new(4.0, 8.0, 4.0));
        world.flush_generation();
        sync(&mut bridge, &mut world);

        let top = world.config().terrain.offset as i32;
        assert!(world.remove_block(3, top, 3));
        sync(&mut bridge, &mut world);
        assert_eq!(bridge.instance_count(), world.stats().instances);

        world.update(Point3::new(100.0, 8.0, 4.0));
        sync(&mut bridge, &mut world);
        assert!(!bridge.is_live(Point2::new(0, 0)));
        assert_eq!(bridge.live_chunks(), world.stats().loaded_chunks);

        // Released slots are reused.
        world.flush_generation();
        sync(&mut bridge, &mut world);
        let max_slot = world
            .chunks()
            .filter_map(|chunk| bridge.chunk_buffers(chunk.position))
            .map(|buffers| buffers.slot)
            .max();
        assert_eq!(max_slot, Some(8));
    }
}
