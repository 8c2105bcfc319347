//! # Chunk Generation
//!
//! Procedural content for one chunk, produced by layered passes over a flat block-id grid:
//!
//! 1. terrain - a 2D height field of sand, grass and dirt
//! 2. resources - 3D noise veins, each overwriting any voxel whose sample beats its scarcity
//! 3. trees - trunks and leaf canopies scattered by a per-chunk sequential generator
//! 4. clouds - a 2D noise layer in the top row of the chunk
//!
//! Later passes overwrite earlier ones. The result depends only on the seed, the chunk
//! coordinate and the world parameters, so regenerating a chunk always yields the same grid.
//! Player edits are applied afterwards by [`GeneratedChunk::into_chunk`].

use cgmath::Point3;

use crate::engine_state::config::{
    CloudConfig, ConfigResult, TerrainConfig, TreeConfig, WorldConfig,
};
use crate::engine_state::voxels::block::block_type::{BlockType, ResourceParams};
use crate::engine_state::voxels::block::BlockTypeSize;
use crate::engine_state::voxels::edit_store::{ChunkEdits, EditStore};
use crate::engine_state::voxels::seeded_noise::{SeededNoise, SeededRng};

use super::{Chunk, ChunkCoord, ChunkSize};

/// Generates chunk content for one world configuration.
///
/// The generator is immutable once built and can be shared between worker threads.
#[derive(Debug)]
pub struct ChunkGenerator {
    seed: u32,
    size: ChunkSize,
    terrain: TerrainConfig,
    resources: Vec<(BlockType, ResourceParams)>,
    trees: TreeConfig,
    clouds: CloudConfig,
    resource_noise: SeededNoise,
    terrain_noise: SeededNoise,
    cloud_noise: SeededNoise,
}

/// The block-id grid of a chunk after the procedural passes, before edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedChunk {
    pub position: ChunkCoord,
    pub size: ChunkSize,
    /// Block ids in chunk index order.
    pub block_types: Vec<BlockTypeSize>,
}

impl GeneratedChunk {
    fn empty(position: ChunkCoord, size: ChunkSize) -> Self {
        GeneratedChunk {
            position,
            size,
            block_types: vec![BlockType::Empty.id(); size.volume()],
        }
    }

    /// Block id at a local coordinate, `None` when out of bounds.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<BlockTypeSize> {
        self.size
            .index(x, y, z)
            .map(|index| self.block_types[index])
    }

    /// Sets a block id; out-of-bounds writes are dropped.
    fn set(&mut self, x: i32, y: i32, z: i32, block_type: BlockType) {
        if let Some(index) = self.size.index(x, y, z) {
            self.block_types[index] = block_type.id();
        }
    }

    /// Applies this chunk's edits on top of the generated grid.
    pub fn apply_edits(&mut self, edits: Option<&ChunkEdits>) {
        let Some(edits) = edits else {
            return;
        };
        for (local, block_type) in edits {
            if let Some(index) = self.size.index(local.x, local.y, local.z) {
                self.block_types[index] = *block_type;
            }
        }
    }

    /// Builds an unloaded chunk from the grid with `edits` replayed over it.
    ///
    /// Instances are not built: culling at the chunk border needs the neighbors.
    pub fn into_chunk(mut self, edits: Option<&ChunkEdits>) -> Chunk {
        self.apply_edits(edits);
        Chunk::from_block_types(self.position, self.size, self.block_types)
    }
}

impl ChunkGenerator {
    /// Validates the world parameters and derives one noise field per pass from the seed.
    pub fn new(config: &WorldConfig) -> ConfigResult<Self> {
        config.validate()?;
        let resources = config
            .resources
            .iter()
            .map(|resource| resource.resolve())
            .collect::<ConfigResult<Vec<_>>>()?;

        let mut rng = SeededRng::new(config.seed);
        let resource_noise = SeededNoise::new(rng.next_seed());
        let terrain_noise = SeededNoise::new(rng.next_seed());
        let cloud_noise = SeededNoise::new(rng.next_seed());

        Ok(ChunkGenerator {
            seed: config.seed,
            size: config.chunk_size,
            terrain: config.terrain.clone(),
            resources,
            trees: config.trees.clone(),
            clouds: config.clouds.clone(),
            resource_noise,
            terrain_noise,
            cloud_noise,
        })
    }

    pub fn chunk_size(&self) -> ChunkSize {
        self.size
    }

    /// Runs the procedural passes for the chunk at `position`.
    pub fn generate_layers(&self, position: ChunkCoord) -> GeneratedChunk {
        let mut chunk = GeneratedChunk::empty(position, self.size);
        let origin = Point3::new(
            position.x * self.size.width as i32,
            0,
            position.y * self.size.width as i32,
        );

        self.generate_terrain(&mut chunk, origin);
        self.generate_resources(&mut chunk, origin);
        self.generate_trees(&mut chunk);
        self.generate_clouds(&mut chunk, origin);
        chunk
    }

    /// Generates a chunk with edits applied and chunk-local instances built.
    ///
    /// Voxels on the chunk border are culled as if the neighbor chunks were empty.
    pub fn generate(&self, position: ChunkCoord, edits: &EditStore) -> Chunk {
        let mut chunk = self
            .generate_layers(position)
            .into_chunk(edits.chunk_edits(position));
        chunk.build_instances(|_| None);
        chunk
    }

    /// Terrain column height at a local column, after clamping.
    pub fn terrain_height(&self, origin: Point3<i32>, x: i32, z: i32) -> i32 {
        let value = self.terrain_noise.sample_2d(
            (origin.x + x) as f64 / self.terrain.scale,
            (origin.z + z) as f64 / self.terrain.scale,
        );
        let scaled = self.terrain.offset + self.terrain.magnitude * value;
        (scaled.floor() as i32).clamp(0, self.size.height as i32 - 1)
    }

    fn generate_terrain(&self, chunk: &mut GeneratedChunk, origin: Point3<i32>) {
        let width = self.size.width as i32;
        let height = self.size.height as i32;
        let water = self.terrain.water_offset;

        for x in 0..width {
            for z in 0..width {
                let surface = self.terrain_height(origin, x, z);
                for y in 0..height {
                    if y <= water && y <= surface {
                        chunk.set(x, y, z, BlockType::Sand);
                    } else if y == surface {
                        chunk.set(x, y, z, BlockType::Grass);
                    } else if y < surface && chunk.get(x, y, z) == Some(BlockType::Empty.id()) {
                        chunk.set(x, y, z, BlockType::Dirt);
                    } else if y > surface {
                        chunk.set(x, y, z, BlockType::Empty);
                    }
                }
            }
        }
    }

    fn generate_resources(&self, chunk: &mut GeneratedChunk, origin: Point3<i32>) {
        let width = self.size.width as i32;
        let height = self.size.height as i32;

        for (block_type, params) in &self.resources {
            for x in 0..width {
                for y in 0..height {
                    for z in 0..width {
                        let value = self.resource_noise.sample_3d(
                            (origin.x + x) as f64 / params.scale.x,
                            (origin.y + y) as f64 / params.scale.y,
                            (origin.z + z) as f64 / params.scale.z,
                        );
                        if value > params.scarcity {
                            chunk.set(x, y, z, *block_type);
                        }
                    }
                }
            }
        }
    }

    fn generate_trees(&self, chunk: &mut GeneratedChunk) {
        let mut rng = SeededRng::for_chunk(self.seed, chunk.position);
        let width = self.size.width as i32;
        let border = self.trees.canopy.max_radius as i32;

        for x in border..width - border {
            for z in border..width - border {
                if rng.next_random() < self.trees.frequency {
                    self.generate_tree_trunk(chunk, x, z, &mut rng);
                }
            }
        }
    }

    fn generate_tree_trunk(&self, chunk: &mut GeneratedChunk, x: i32, z: i32, rng: &mut SeededRng) {
        let min = self.trees.trunk.min_height as f64;
        let max = self.trees.trunk.max_height as f64;
        let trunk_height = (min + (max - min) * rng.next_random()).round() as i32;

        let Some(ground) = (0..self.size.height as i32)
            .find(|&y| chunk.get(x, y, z) == Some(BlockType::Grass.id()))
        else {
            return;
        };

        for y in ground + 1..=ground + trunk_height {
            chunk.set(x, y, z, BlockType::Tree);
        }
        self.generate_tree_canopy(chunk, Point3::new(x, ground + trunk_height, z), rng);
    }

    fn generate_tree_canopy(&self, chunk: &mut GeneratedChunk, center: Point3<i32>, rng: &mut SeededRng) {
        let canopy = &self.trees.canopy;
        let min = canopy.min_radius as f64;
        let max = canopy.max_radius as f64;
        let radius = (min + (max - min) * rng.next_random()).round() as i32;

        for dx in -radius..=radius {
            for dy in -radius..=radius {
                for dz in -radius..=radius {
                    // Drawn for every cell so the sequence does not depend on the grid contents.
                    let n = rng.next_random();
                    if dx * dx + dy * dy + dz * dz >= radius * radius {
                        continue;
                    }
                    let (x, y, z) = (center.x + dx, center.y + dy, center.z + dz);
                    if chunk.get(x, y, z).is_some_and(|id| id != BlockType::Empty.id()) {
                        continue;
                    }
                    if n < canopy.density {
                        chunk.set(x, y, z, BlockType::Leaves);
                    }
                }
            }
        }
    }

    fn generate_clouds(&self, chunk: &mut GeneratedChunk, origin: Point3<i32>) {
        let width = self.size.width as i32;
        let top = self.size.height as i32 - 1;

        for x in 0..width {
            for z in 0..width {
                let value = (self.cloud_noise.sample_2d(
                    (origin.x + x) as f64 / self.clouds.scale,
                    (origin.z + z) as f64 / self.clouds.scale,
                ) + 1.0)
                    * 0.5;
                if value < self.clouds.density {
                    chunk.set(x, top, z, BlockType::Cloud);
                }
            }
        }
    }
}
