//! # World Module
//!
//! This module provides the `World` struct which manages the live chunks of the voxel world.
//! It serves as the central coordinator for chunk streaming, chunk generation and block edits.
//!
//! ## Architecture
//!
//! The world keeps only the chunks inside the visible square around the observer. Chunks that
//! enter the square are generated through the task manager; chunks that leave it are dropped.
//! Player edits live in the [`EditStore`], which outlives the chunks and is replayed on top of
//! every (re)generated chunk.
//!
//! ## Unknown vs. Empty
//!
//! A coordinate whose chunk is missing or still generating reads as `None` from
//! [`World::get_block`]. Callers treat that as unknown: not solid for collision, not
//! renderable, not editable.
//!
//! ## Events
//!
//! Every change a renderer cares about is recorded as a [`WorldEvent`] and handed out once
//! per frame through [`World::drain_events`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cgmath::{Point2, Point3};
use log::{debug, info};

use crate::engine_state::config::{ConfigResult, GenerationConfig, WorldConfig};
use crate::engine_state::physics::collision::VoxelQuery;
use crate::engine_state::task_management::task::TaskResult;
use crate::engine_state::task_management::TaskManager;

use super::block::block_side::BlockSide;
use super::block::block_type::{is_solid_id, BlockType};
use super::block::BlockTypeSize;
use super::chunk::chunk_generation::{ChunkGenerator, GeneratedChunk};
use super::chunk::{Chunk, ChunkCoord, ChunkSize};
use super::edit_store::EditStore;
use super::tasks::chunk_generation_task::ChunkGenerationTask;

/// Changes to the world that the rendering collaborator consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldEvent {
    /// A chunk finished generating; its instance lists are ready.
    ChunkLoaded(ChunkCoord),
    /// A chunk was dropped; its buffers can be released.
    ChunkUnloaded(ChunkCoord),
    /// Instance lists of a loaded chunk changed.
    InstancesChanged {
        /// The chunk whose lists changed.
        chunk: ChunkCoord,
        /// Block types whose lists changed.
        block_types: Vec<BlockTypeSize>,
    },
}

/// Chunk set changes made by one [`World::update`] call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamingChanges {
    /// Chunks newly queued for generation.
    pub requested: Vec<ChunkCoord>,
    /// Chunks dropped because they left the visible square.
    pub unloaded: Vec<ChunkCoord>,
}

/// Counters describing the world's current state and its session history.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorldStats {
    pub loaded_chunks: usize,
    pub pending_chunks: usize,
    /// Visible instances across all loaded chunks.
    pub instances: usize,
    pub edits: usize,
    pub chunks_generated: u64,
    pub chunks_unloaded: u64,
    /// Generation results discarded because their chunk was no longer wanted.
    pub stale_results: u64,
}

/// Represents a voxel world composed of streamed chunks.
pub struct World {
    config: WorldConfig,
    generator: Arc<ChunkGenerator>,
    /// Loaded chunks. At most one per coordinate.
    chunks: HashMap<ChunkCoord, Chunk>,
    /// Chunks requested but not yet loaded.
    pending: HashSet<ChunkCoord>,
    edits: EditStore,
    events: Vec<WorldEvent>,
    /// Bumped on regeneration so results from the previous world are discarded.
    epoch: u64,
    task_manager: TaskManager,
    chunks_generated: u64,
    chunks_unloaded: u64,
    stale_results: u64,
}

/// Block id at a chunk-local coordinate that may lie outside `coord`'s bounds.
///
/// Only loaded chunks answer; anything else is `None`.
fn lookup_block(
    chunks: &HashMap<ChunkCoord, Chunk>,
    size: ChunkSize,
    coord: ChunkCoord,
    local: Point3<i32>,
) -> Option<BlockTypeSize> {
    let width = size.width as i32;
    let world = Point3::new(coord.x * width + local.x, local.y, coord.y * width + local.z);
    let (owner, owner_local) = world_to_chunk_coords(size, world.x, world.y, world.z);
    let chunk = chunks.get(&owner).filter(|chunk| chunk.is_loaded())?;
    chunk.get_block(owner_local.x, owner_local.y, owner_local.z)
}

/// Splits a world voxel coordinate into its chunk and the local coordinate inside it.
///
/// Uses floor division, so negative coordinates map to negative chunks. `y` passes through.
pub fn world_to_chunk_coords(size: ChunkSize, x: i32, y: i32, z: i32) -> (ChunkCoord, Point3<i32>) {
    let width = size.width as i32;
    (
        Point2::new(x.div_euclid(width), z.div_euclid(width)),
        Point3::new(x.rem_euclid(width), y, z.rem_euclid(width)),
    )
}

impl World {
    /// Creates an empty world. No chunks are requested until [`World::update`] runs.
    pub fn new(config: WorldConfig, generation: &GenerationConfig) -> ConfigResult<Self> {
        let generator = ChunkGenerator::new(&config)?;
        info!(
            "World created: seed {}, chunk size {}x{}, draw distance {}",
            config.seed, config.chunk_size.width, config.chunk_size.height, config.draw_distance
        );
        Ok(World {
            config,
            generator: Arc::new(generator),
            chunks: HashMap::new(),
            pending: HashSet::new(),
            edits: EditStore::new(),
            events: Vec::new(),
            epoch: 0,
            task_manager: TaskManager::new(generation.workers, generation.chunks_per_frame),
            chunks_generated: 0,
            chunks_unloaded: 0,
            stale_results: 0,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn chunk_size(&self) -> ChunkSize {
        self.config.chunk_size
    }

    pub fn edits(&self) -> &EditStore {
        &self.edits
    }

    /// Splits a world voxel coordinate into chunk and local coordinates.
    pub fn world_to_chunk_coords(&self, x: i32, y: i32, z: i32) -> (ChunkCoord, Point3<i32>) {
        world_to_chunk_coords(self.config.chunk_size, x, y, z)
    }

    /// The chunk containing a continuous world position.
    pub fn chunk_coord_at(&self, position: Point3<f32>) -> ChunkCoord {
        let width = self.config.chunk_size.width as f32;
        Point2::new(
            (position.x / width).floor() as i32,
            (position.z / width).floor() as i32,
        )
    }

    /// Chunk coordinates within the draw distance of `observer`, nearest rings first.
    pub fn get_visible_chunks(&self, observer: Point3<f32>) -> Vec<ChunkCoord> {
        let center = self.chunk_coord_at(observer);
        let distance = self.config.draw_distance as i32;
        let mut visible = Vec::with_capacity(((2 * distance + 1) * (2 * distance + 1)) as usize);
        for x in -distance..=distance {
            for z in -distance..=distance {
                visible.push(Point2::new(center.x + x, center.y + z));
            }
        }
        visible.sort_by_key(|coord| (coord.x - center.x).abs().max((coord.y - center.y).abs()));
        visible
    }

    /// Streams chunks around `observer`: drops chunks outside the draw distance and requests
    /// generation for visible chunks that are neither loaded nor pending.
    pub fn update(&mut self, observer: Point3<f32>) -> StreamingChanges {
        let visible = self.get_visible_chunks(observer);
        let target: HashSet<ChunkCoord> = visible.iter().copied().collect();
        let mut changes = StreamingChanges::default();

        let leaving: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .filter(|coord| !target.contains(coord))
            .copied()
            .collect();
        for coord in leaving {
            self.unload_chunk(coord);
            changes.unloaded.push(coord);
        }
        // Results for these arrive later and are discarded.
        self.pending.retain(|coord| target.contains(coord));

        for coord in visible {
            if self.chunks.contains_key(&coord) || self.pending.contains(&coord) {
                continue;
            }
            self.pending.insert(coord);
            self.task_manager.publish_task(Box::new(ChunkGenerationTask::new(
                self.generator.clone(),
                coord,
                self.epoch,
            )));
            debug!("Chunk {:?} queued for generation", coord);
            changes.requested.push(coord);
        }

        changes
    }

    /// Drops a chunk and re-culls the border layers that faced it, since an unloaded
    /// neighbor no longer obscures them.
    fn unload_chunk(&mut self, coord: ChunkCoord) {
        if self.release_chunk(coord) {
            self.refresh_neighbor_borders(coord);
        }
    }

    fn release_chunk(&mut self, coord: ChunkCoord) -> bool {
        if self.chunks.remove(&coord).is_none() {
            return false;
        }
        self.chunks_unloaded += 1;
        self.events.push(WorldEvent::ChunkUnloaded(coord));
        debug!("Chunk {:?} unloaded", coord);
        true
    }

    /// Runs one frame's worth of generation work and publishes finished chunks.
    ///
    /// Returns the number of chunks loaded.
    pub fn process_generation(&mut self) -> usize {
        self.task_manager.process_queued_tasks();
        let results = self.task_manager.process_completed_tasks();
        self.apply_results(results)
    }

    /// Blocks until every pending chunk is loaded. Returns the number of chunks loaded.
    pub fn flush_generation(&mut self) -> usize {
        let mut loaded = 0;
        while !self.pending.is_empty() && !self.task_manager.is_idle() {
            let results = self.task_manager.wait_for_completed_tasks();
            loaded += self.apply_results(results);
        }
        loaded
    }

    fn apply_results(&mut self, results: Vec<Box<dyn TaskResult + Send>>) -> usize {
        let before = self.chunks_generated;
        for result in results {
            for task in result.handle_result(self) {
                self.task_manager.publish_task(task);
            }
        }
        (self.chunks_generated - before) as usize
    }

    /// Publishes a generated chunk if it is still wanted.
    ///
    /// Edits recorded so far are replayed over the grid, instances are culled against loaded
    /// neighbors, and the facing border layers of those neighbors are re-culled.
    pub fn finish_chunk(&mut self, epoch: u64, generated: GeneratedChunk) -> bool {
        let coord = generated.position;
        if epoch != self.epoch || !self.pending.remove(&coord) {
            self.stale_results += 1;
            debug!("Discarded stale generation result for chunk {:?}", coord);
            return false;
        }

        let size = self.config.chunk_size;
        let mut chunk = generated.into_chunk(self.edits.chunk_edits(coord));
        let chunks = &self.chunks;
        chunk.build_instances(|local| lookup_block(chunks, size, coord, local));
        chunk.mark_loaded();
        chunk.take_dirty_instances();
        let instances = chunk.instances().len();
        self.chunks.insert(coord, chunk);
        self.chunks_generated += 1;
        self.events.push(WorldEvent::ChunkLoaded(coord));
        debug!("Chunk {:?} loaded with {} instances", coord, instances);

        self.refresh_neighbor_borders(coord);
        true
    }

    /// Re-culls the border layer of every loaded neighbor that faces `coord`.
    fn refresh_neighbor_borders(&mut self, coord: ChunkCoord) {
        let size = self.config.chunk_size;
        for side in [BlockSide::LEFT, BlockSide::RIGHT, BlockSide::BACK, BlockSide::FRONT] {
            let offset = side.offset();
            let neighbor_coord = Point2::new(coord.x + offset.x, coord.y + offset.z);
            let Some(mut neighbor) = self.chunks.remove(&neighbor_coord) else {
                continue;
            };
            let chunks = &self.chunks;
            for local in neighbor.border_layer(side.opposite()) {
                neighbor.refresh_instance(local.x, local.y, local.z, |outside| {
                    lookup_block(chunks, size, neighbor_coord, outside)
                });
            }
            self.push_instance_changes(&mut neighbor);
            self.chunks.insert(neighbor_coord, neighbor);
        }
    }

    fn push_instance_changes(&mut self, chunk: &mut Chunk) {
        let block_types = chunk.take_dirty_instances();
        if !block_types.is_empty() {
            self.events.push(WorldEvent::InstancesChanged {
                chunk: chunk.position,
                block_types,
            });
        }
    }

    /// Block id at a world coordinate. `None` means unknown: out of range, or the owning chunk
    /// is missing or still generating.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Option<BlockTypeSize> {
        let (coord, local) = self.world_to_chunk_coords(x, y, z);
        let chunk = self.chunks.get(&coord).filter(|chunk| chunk.is_loaded())?;
        chunk.get_block(local.x, local.y, local.z)
    }

    /// Like [`World::get_block`], resolved through the catalog.
    pub fn get_block_type(&self, x: i32, y: i32, z: i32) -> Option<BlockType> {
        self.get_block(x, y, z).and_then(BlockType::from_id)
    }

    /// Places a block at a world coordinate.
    ///
    /// Returns `false` without changing anything when the coordinate is on the floor layer,
    /// outside the world height, in an unloaded chunk, or already occupied.
    pub fn add_block(&mut self, x: i32, y: i32, z: i32, block_type: BlockType) -> bool {
        let (coord, local) = self.world_to_chunk_coords(x, y, z);
        if local.y == 0 {
            return false;
        }
        let Some(chunk) = self.chunks.get_mut(&coord).filter(|chunk| chunk.is_loaded()) else {
            return false;
        };
        if !chunk.add_block(local.x, local.y, local.z, block_type.id(), &mut self.edits) {
            return false;
        }
        debug!("Added {} at ({}, {}, {})", block_type.name(), x, y, z);
        self.refresh_around(Point3::new(x, y, z));
        true
    }

    /// Clears the block at a world coordinate. Same no-op rules as [`World::add_block`].
    pub fn remove_block(&mut self, x: i32, y: i32, z: i32) -> bool {
        let (coord, local) = self.world_to_chunk_coords(x, y, z);
        if local.y == 0 {
            return false;
        }
        let Some(chunk) = self.chunks.get_mut(&coord).filter(|chunk| chunk.is_loaded()) else {
            return false;
        };
        if !chunk.remove_block(local.x, local.y, local.z, &mut self.edits) {
            return false;
        }
        debug!("Removed block at ({}, {}, {})", x, y, z);
        self.refresh_around(Point3::new(x, y, z));
        true
    }

    /// Re-culls an edited voxel and its six neighbors, which may live in other chunks.
    fn refresh_around(&mut self, position: Point3<i32>) {
        let mut touched = Vec::with_capacity(3);
        let neighbors = BlockSide::all().map(|side| position + side.offset());
        for voxel in std::iter::once(position).chain(neighbors) {
            if let Some(coord) = self.refresh_voxel(voxel) {
                if !touched.contains(&coord) {
                    touched.push(coord);
                }
            }
        }

        for coord in touched {
            if let Some(mut chunk) = self.chunks.remove(&coord) {
                self.push_instance_changes(&mut chunk);
                self.chunks.insert(coord, chunk);
            }
        }
    }

    /// Brings one world voxel's instance in line with the culling rule.
    ///
    /// Returns the owning chunk if it is loaded.
    fn refresh_voxel(&mut self, position: Point3<i32>) -> Option<ChunkCoord> {
        let size = self.config.chunk_size;
        let (coord, local) = self.world_to_chunk_coords(position.x, position.y, position.z);
        let mut chunk = self.chunks.remove(&coord)?;
        if chunk.is_loaded() {
            let chunks = &self.chunks;
            chunk.refresh_instance(local.x, local.y, local.z, |outside| {
                lookup_block(chunks, size, coord, outside)
            });
        }
        self.chunks.insert(coord, chunk);
        Some(coord)
    }

    /// Rebuilds the world from scratch with a new configuration.
    ///
    /// Edits are cleared, every chunk is released, in-flight generation is abandoned, and the
    /// visible set around `observer` is requested again.
    pub fn regenerate(&mut self, config: WorldConfig, observer: Point3<f32>) -> ConfigResult<StreamingChanges> {
        let generator = ChunkGenerator::new(&config)?;
        self.generator = Arc::new(generator);
        self.config = config;
        self.edits.clear();

        let coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        for coord in coords {
            self.release_chunk(coord);
        }
        self.pending.clear();
        self.task_manager.clear_queued();
        self.epoch += 1;

        info!(
            "World regenerated: seed {}, epoch {}",
            self.config.seed, self.epoch
        );
        Ok(self.update(observer))
    }

    /// Takes the events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// The loaded chunk at `coord`.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Iterates all loaded chunks.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            loaded_chunks: self.chunks.len(),
            pending_chunks: self.pending.len(),
            instances: self.chunks.values().map(|c| c.instances().len()).sum(),
            edits: self.edits.len(),
            chunks_generated: self.chunks_generated,
            chunks_unloaded: self.chunks_unloaded,
            stale_results: self.stale_results,
        }
    }
}

impl VoxelQuery for World {
    fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        self.get_block(x, y, z).is_some_and(is_solid_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_world(draw_distance: u32) -> World {
        let mut config = WorldConfig::default();
        config.chunk_size = ChunkSize {
            width: 8,
            height: 12,
        };
        config.draw_distance = draw_distance;
        config.terrain.magnitude = 0.0;
        config.terrain.offset = 4.0;
        config.resources.clear();
        config.trees.frequency = 0.0;
        config.clouds.density = 0.0;
        World::new(config, &GenerationConfig::default()).unwrap()
    }

    #[test]
    fn world_coordinates_floor_divide() {
        let size = ChunkSize {
            width: 8,
            height: 12,
        };
        assert_eq!(
            world_to_chunk_coords(size, 9, 3, -1),
            (Point2::new(1, -1), Point3::new(1, 3, 7))
        );
        assert_eq!(
            world_to_chunk_coords(size, -8, 0, 7),
            (Point2::new(-1, 0), Point3::new(0, 0, 7))
        );
    }

    #[test]
    fn visible_square_is_chebyshev() {
        let world = flat_world(2);
        let visible = world.get_visible_chunks(Point3::new(-0.5, 40.0, 17.0));
        assert_eq!(visible.len(), 25);
        assert_eq!(visible[0], Point2::new(-1, 2));
        assert!(visible.contains(&Point2::new(-3, 0)));
        assert!(visible.contains(&Point2::new(1, 4)));
        assert!(!visible.contains(&Point2::new(2, 2)));
    }

    #[test]
    fn unknown_until_generated() {
        let mut world = flat_world(0);
        let observer = Point3::new(1.0, 6.0, 1.0);
        let changes = world.update(observer);
        assert_eq!(changes.requested, vec![Point2::new(0, 0)]);
        assert_eq!(world.get_block(1, 4, 1), None);
        assert!(!world.add_block(1, 5, 1, BlockType::Dirt));

        // Requesting again while pending does not queue twice.
        assert!(world.update(observer).requested.is_empty());

        assert_eq!(world.flush_generation(), 1);
        assert_eq!(world.get_block_type(1, 4, 1), Some(BlockType::Grass));
        assert_eq!(world.get_block(1, 12, 1), None);
        assert_eq!(world.get_block(9, 4, 1), None);
        assert_eq!(
            world.drain_events(),
            vec![WorldEvent::ChunkLoaded(Point2::new(0, 0))]
        );
    }

    #[test]
    fn floor_layer_is_not_editable() {
        let mut world = flat_world(0);
        world.update(Point3::new(1.0, 6.0, 1.0));
        world.flush_generation();
        assert!(!world.remove_block(2, 0, 2));
        assert!(!world.add_block(2, 0, 2, BlockType::Stone));
        assert!(world.edits().is_empty());
    }

    #[test]
    fn stale_results_are_discarded() {
        let mut world = flat_world(0);
        world.update(Point3::new(1.0, 6.0, 1.0));
        // Move away before the chunk generates.
        world.update(Point3::new(100.0, 6.0, 1.0));
        world.flush_generation();
        assert!(world.chunk(Point2::new(0, 0)).is_none());
        assert_eq!(world.stats().stale_results, 1);
    }
}
