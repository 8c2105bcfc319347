//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which runs the procedural passes for one
//! chunk away from the frame loop. The task owns a handle to the shared generator and the
//! chunk coordinate; the world is only touched when the result is handled on the main thread.

use std::sync::Arc;

use crate::engine_state::{
    task_management::task::{Task, TaskResult},
    voxels::{
        chunk::{
            chunk_generation::{ChunkGenerator, GeneratedChunk},
            ChunkCoord,
        },
        world::World,
    },
};

/// A task that generates chunk data asynchronously.
///
/// This task is responsible for:
/// 1. Running the terrain, resource, tree and cloud passes for its chunk
/// 2. Handing the generated grid back to the world, tagged with the world epoch it was
///    requested in
pub struct ChunkGenerationTask {
    /// Generator of the world that requested the chunk
    generator: Arc<ChunkGenerator>,
    /// The position of the chunk to generate (in chunk coordinates)
    position: ChunkCoord,
    /// World epoch at request time
    epoch: u64,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    pub fn new(generator: Arc<ChunkGenerator>, position: ChunkCoord, epoch: u64) -> Self {
        ChunkGenerationTask {
            generator,
            position,
            epoch,
        }
    }
}

impl Task for ChunkGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkGenerationTaskResult {
            chunk: self.generator.generate_layers(self.position),
            epoch: self.epoch,
        })
    }
}

/// The result of a chunk generation task.
pub struct ChunkGenerationTaskResult {
    /// The generated grid, before edits
    chunk: GeneratedChunk,
    epoch: u64,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// Publishes the chunk into the world. Results from an older epoch, or for chunks that
    /// left the visible set meanwhile, are dropped by the world.
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task + Send>> {
        world.finish_chunk(self.epoch, self.chunk);
        Vec::new()
    }
}
