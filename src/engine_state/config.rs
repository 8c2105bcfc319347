//! # Engine Configuration
//!
//! The configuration surface of the world and of the systems that drive it.
//!
//! Every struct derives serde with camelCase field names and `#[serde(default)]`, so a JSON
//! file only needs to mention the values it changes. Values are checked once by
//! [`EngineConfig::validate`]; constructors that consume a config validate the part they own
//! and report [`ConfigError`] instead of failing later per frame.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::voxels::block::block_type::{BlockType, ResourceParams};
use super::voxels::chunk::ChunkSize;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Chunk extent has a zero dimension.
    #[error("invalid chunk size: {width}x{height}")]
    InvalidChunkSize {
        /// Configured width.
        width: usize,
        /// Configured height.
        height: usize,
    },

    /// Draw distance exceeds the supported radius.
    #[error("invalid draw distance: {0}")]
    InvalidDrawDistance(u32),

    /// Degenerate agent cylinder.
    #[error("invalid agent dimensions: radius {radius}, height {height}")]
    InvalidAgentDimensions {
        /// Configured radius.
        radius: f32,
        /// Configured height.
        height: f32,
    },

    /// Simulation rate or frame cap is not positive.
    #[error("invalid timestep: simulation rate {rate}, max frame delta {max_frame_delta}")]
    InvalidTimestep {
        /// Configured rate in Hz.
        rate: f32,
        /// Configured frame delta cap in seconds.
        max_frame_delta: f32,
    },

    /// Tree trunk height range is empty or starts below one.
    #[error("invalid trunk height range: {min}..={max}")]
    InvalidTrunkRange {
        /// Minimum trunk height.
        min: u32,
        /// Maximum trunk height.
        max: u32,
    },

    /// Canopy radius range is empty.
    #[error("invalid canopy radius range: {min}..={max}")]
    InvalidCanopyRange {
        /// Minimum canopy radius.
        min: u32,
        /// Maximum canopy radius.
        max: u32,
    },

    /// A probability-like value falls outside `[0, 1]`.
    #[error("{field} must be within [0, 1], got {value}")]
    InvalidProbability {
        /// Name of the offending field.
        field: String,
        /// Offending value.
        value: f64,
    },

    /// A noise scale divisor is not positive.
    #[error("{field} must be positive, got {value}")]
    InvalidScale {
        /// Name of the offending field.
        field: String,
        /// Offending value.
        value: f64,
    },

    /// A resource names a block that is not in the catalog.
    #[error("unknown block: {0}")]
    UnknownBlock(String),

    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result alias for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Largest accepted draw distance, in chunks.
pub const MAX_DRAW_DISTANCE: u32 = 32;

/// Terrain height field parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TerrainConfig {
    /// Horizontal divisor applied to world coordinates before sampling.
    pub scale: f64,
    /// Amplitude of the height variation.
    pub magnitude: f64,
    /// Base height of the terrain.
    pub offset: f64,
    /// Voxels at or below this height (and under the surface) become sand.
    pub water_offset: i32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig {
            scale: 100.0,
            magnitude: 3.0,
            offset: 4.0,
            water_offset: 2,
        }
    }
}

/// Per-axis noise divisor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Scale3 {
    pub fn uniform(value: f64) -> Self {
        Scale3 {
            x: value,
            y: value,
            z: value,
        }
    }
}

/// One resource scattered through terrain by 3D noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    /// Catalog name of the block placed, e.g. `"stone"`.
    pub block: String,
    pub scale: Scale3,
    /// Noise threshold above which the resource is placed.
    pub scarcity: f64,
}

impl ResourceConfig {
    fn defaults_for(block_type: BlockType) -> Option<Self> {
        let params = block_type.resource_params()?;
        Some(ResourceConfig {
            block: block_type.name().to_string(),
            scale: Scale3 {
                x: params.scale.x,
                y: params.scale.y,
                z: params.scale.z,
            },
            scarcity: params.scarcity,
        })
    }

    /// Resolves the block name through the catalog.
    pub fn resolve(&self) -> ConfigResult<(BlockType, ResourceParams)> {
        let block_type = BlockType::from_name(&self.block)
            .ok_or_else(|| ConfigError::UnknownBlock(self.block.clone()))?;
        Ok((
            block_type,
            ResourceParams {
                scale: cgmath::Vector3::new(self.scale.x, self.scale.y, self.scale.z),
                scarcity: self.scarcity,
            },
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrunkConfig {
    pub min_height: u32,
    pub max_height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanopyConfig {
    pub min_radius: u32,
    pub max_radius: u32,
    /// Chance that a cell inside the canopy sphere becomes leaves.
    pub density: f64,
}

/// Tree scatter parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeConfig {
    /// Chance per eligible column of starting a tree.
    pub frequency: f64,
    pub trunk: TrunkConfig,
    pub canopy: CanopyConfig,
}

impl Default for TrunkConfig {
    fn default() -> Self {
        TrunkConfig {
            min_height: 5,
            max_height: 7,
        }
    }
}

impl Default for CanopyConfig {
    fn default() -> Self {
        CanopyConfig {
            min_radius: 2,
            max_radius: 3,
            density: 0.65,
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            frequency: 0.01,
            trunk: TrunkConfig::default(),
            canopy: CanopyConfig::default(),
        }
    }
}

/// Cloud layer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CloudConfig {
    pub scale: f64,
    /// Normalized noise threshold below which a cloud block is placed.
    pub density: f64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        CloudConfig {
            scale: 30.0,
            density: 0.351,
        }
    }
}

/// Everything that determines generated world content.
///
/// Changing any field and regenerating rebuilds the world deterministically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldConfig {
    pub seed: u32,
    pub chunk_size: ChunkSize,
    /// Chebyshev radius of the visible chunk square.
    pub draw_distance: u32,
    pub terrain: TerrainConfig,
    pub resources: Vec<ResourceConfig>,
    pub trees: TreeConfig,
    pub clouds: CloudConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            seed: 0,
            chunk_size: ChunkSize {
                width: 42,
                height: 32,
            },
            draw_distance: 1,
            terrain: TerrainConfig::default(),
            resources: BlockType::RESOURCES
                .into_iter()
                .filter_map(ResourceConfig::defaults_for)
                .collect(),
            trees: TreeConfig::default(),
            clouds: CloudConfig::default(),
        }
    }
}

fn check_probability(field: &str, value: f64) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability {
            field: field.to_string(),
            value,
        })
    }
}

fn check_scale(field: &str, value: f64) -> ConfigResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidScale {
            field: field.to_string(),
            value,
        })
    }
}

impl WorldConfig {
    /// Checks every world parameter.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.chunk_size.width == 0 || self.chunk_size.height == 0 {
            return Err(ConfigError::InvalidChunkSize {
                width: self.chunk_size.width,
                height: self.chunk_size.height,
            });
        }
        if self.draw_distance > MAX_DRAW_DISTANCE {
            return Err(ConfigError::InvalidDrawDistance(self.draw_distance));
        }

        check_scale("terrain.scale", self.terrain.scale)?;
        check_scale("clouds.scale", self.clouds.scale)?;
        check_probability("clouds.density", self.clouds.density)?;

        for resource in &self.resources {
            resource.resolve()?;
            let field = format!("resources.{}.scale", resource.block);
            check_scale(&field, resource.scale.x)?;
            check_scale(&field, resource.scale.y)?;
            check_scale(&field, resource.scale.z)?;
            check_probability(&format!("resources.{}.scarcity", resource.block), resource.scarcity)?;
        }

        let trunk = &self.trees.trunk;
        if trunk.min_height == 0 || trunk.min_height > trunk.max_height {
            return Err(ConfigError::InvalidTrunkRange {
                min: trunk.min_height,
                max: trunk.max_height,
            });
        }
        let canopy = &self.trees.canopy;
        if canopy.min_radius > canopy.max_radius {
            return Err(ConfigError::InvalidCanopyRange {
                min: canopy.min_radius,
                max: canopy.max_radius,
            });
        }
        check_probability("trees.frequency", self.trees.frequency)?;
        check_probability("trees.canopy.density", canopy.density)?;

        Ok(())
    }
}

/// How chunk generation is scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Worker threads. `0` runs generation cooperatively on the calling thread.
    pub workers: usize,
    /// Queued chunks generated per frame in cooperative mode.
    pub chunks_per_frame: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            workers: 0,
            chunks_per_frame: 1,
        }
    }
}

/// Fixed-timestep stepper parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicsConfig {
    /// Downward acceleration in blocks per second squared.
    pub gravity: f32,
    /// Sub-steps per simulated second.
    pub simulation_rate: f32,
    /// Frame deltas above this are clamped before entering the accumulator.
    pub max_frame_delta: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            gravity: 32.0,
            simulation_rate: 160.0,
            max_frame_delta: 0.25,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.simulation_rate > 0.0 && self.max_frame_delta > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidTimestep {
                rate: self.simulation_rate,
                max_frame_delta: self.max_frame_delta,
            })
        }
    }
}

/// The collision cylinder and movement tuning of the controlled agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentConfig {
    pub radius: f32,
    pub height: f32,
    pub jump_speed: f32,
    pub max_speed: f32,
    /// Spawn position of the top reference point.
    pub spawn: [f32; 3],
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            radius: 0.5,
            height: 1.75,
            jump_speed: 10.0,
            max_speed: 10.0,
            spawn: [32.0, 16.0, 32.0],
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.radius > 0.0 && self.height > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidAgentDimensions {
                radius: self.radius,
                height: self.height,
            })
        }
    }
}

/// Full configuration of a running engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub world: WorldConfig,
    pub generation: GenerationConfig,
    pub physics: PhysicsConfig,
    pub agent: AgentConfig,
}

impl EngineConfig {
    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.world.validate()?;
        self.physics.validate()?;
        self.agent.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.world.resources.len(), 3);
        assert_eq!(config.world.resources[1].block, "coalOre");
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "world": { "seed": 9, "chunkSize": { "width": 16, "height": 24 },
                 "terrain": { "magnitude": 0 } } }"#,
        )
        .unwrap();
        assert_eq!(config.world.seed, 9);
        assert_eq!(config.world.chunk_size.width, 16);
        assert_eq!(config.world.terrain.magnitude, 0.0);
        assert_eq!(config.world.terrain.offset, 4.0);
        assert_eq!(config.physics, PhysicsConfig::default());
    }

    #[test]
    fn rejects_degenerate_values() {
        let mut config = EngineConfig::default();
        config.world.chunk_size.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidChunkSize { width: 0, .. })
        ));

        let mut config = EngineConfig::default();
        config.agent.radius = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAgentDimensions { .. })
        ));

        let mut config = EngineConfig::default();
        config.world.trees.trunk.min_height = 9;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTrunkRange { min: 9, max: 7 })
        ));

        let mut config = EngineConfig::default();
        config.world.trees.frequency = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability { .. })
        ));

        let mut config = EngineConfig::default();
        config.physics.simulation_rate = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimestep { .. })
        ));
    }

    #[test]
    fn rejects_unknown_resource_blocks() {
        let result = EngineConfig::from_json_str(
            r#"{ "world": { "resources": [
                 { "block": "mithril", "scale": { "x": 1, "y": 1, "z": 1 }, "scarcity": 0.5 } ] } }"#,
        );
        assert!(matches!(result, Err(ConfigError::UnknownBlock(name)) if name == "mithril"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            EngineConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
