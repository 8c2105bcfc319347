//! # Block Type Module
//!
//! This module defines the static block catalog of the voxel world.
//! Every voxel stores a compact [`BlockTypeSize`] id; this enum is the rich view of that id,
//! carrying only semantic data (name, solidity, resource parameters). Materials and textures
//! are owned by the rendering collaborator and keyed by the same id.

use cgmath::Vector3;
use num_derive::FromPrimitive;
use phf::phf_map;

use super::BlockTypeSize;

/// Enumerates all block types known to the world.
///
/// The discriminant is the block id stored in voxels. `Empty` (id 0) is the only
/// non-solid block type.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// No block. Air.
    Empty = 0,
    /// Surface block placed at the top of every terrain column above the water line.
    Grass = 1,
    /// Subsurface filler below grass.
    Dirt = 2,
    /// Resource block, large veins.
    Stone = 3,
    /// Resource block, medium veins.
    CoalOre = 4,
    /// Resource block, rare veins.
    IronOre = 5,
    /// Tree trunk.
    Tree = 6,
    /// Tree canopy.
    Leaves = 7,
    /// Terrain at or below the water line.
    Sand = 8,
    /// Cloud layer at the top of each chunk.
    Cloud = 9,
    /// Placeable only.
    Snow = 10,
    /// Placeable only.
    JungleTree = 11,
    /// Placeable only.
    JungleLeaves = 12,
}

/// Parameters of a block type that the resource pass scatters through terrain.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResourceParams {
    /// Per-axis divisor applied to world coordinates before sampling 3D noise.
    pub scale: Vector3<f64>,
    /// Noise threshold above which the resource replaces the voxel.
    pub scarcity: f64,
}

/// Lookup from catalog name to block type, used when parsing configuration.
pub static BLOCK_NAMES: phf::Map<&'static str, BlockType> = phf_map! {
    "empty" => BlockType::Empty,
    "grass" => BlockType::Grass,
    "dirt" => BlockType::Dirt,
    "stone" => BlockType::Stone,
    "coalOre" => BlockType::CoalOre,
    "ironOre" => BlockType::IronOre,
    "tree" => BlockType::Tree,
    "leaves" => BlockType::Leaves,
    "sand" => BlockType::Sand,
    "cloud" => BlockType::Cloud,
    "snow" => BlockType::Snow,
    "jungleTree" => BlockType::JungleTree,
    "jungleLeaves" => BlockType::JungleLeaves,
};

impl BlockType {
    /// Number of entries in the catalog, including `Empty`.
    pub const COUNT: usize = 13;

    /// Every block type in id order.
    pub const ALL: [BlockType; Self::COUNT] = [
        BlockType::Empty,
        BlockType::Grass,
        BlockType::Dirt,
        BlockType::Stone,
        BlockType::CoalOre,
        BlockType::IronOre,
        BlockType::Tree,
        BlockType::Leaves,
        BlockType::Sand,
        BlockType::Cloud,
        BlockType::Snow,
        BlockType::JungleTree,
        BlockType::JungleLeaves,
    ];

    /// The resource block types in the order the resource pass evaluates them.
    pub const RESOURCES: [BlockType; 3] = [BlockType::Stone, BlockType::CoalOre, BlockType::IronOre];

    /// Converts a stored id back into a block type.
    ///
    /// Returns `None` for ids that are not in the catalog.
    pub fn from_id(id: BlockTypeSize) -> Option<Self> {
        num::FromPrimitive::from_u8(id)
    }

    /// Looks a block type up by its catalog name.
    pub fn from_name(name: &str) -> Option<Self> {
        BLOCK_NAMES.get(name).copied()
    }

    /// The compact id stored in voxels.
    pub fn id(self) -> BlockTypeSize {
        self as BlockTypeSize
    }

    /// The catalog name, matching the keys of [`BLOCK_NAMES`].
    pub fn name(self) -> &'static str {
        match self {
            BlockType::Empty => "empty",
            BlockType::Grass => "grass",
            BlockType::Dirt => "dirt",
            BlockType::Stone => "stone",
            BlockType::CoalOre => "coalOre",
            BlockType::IronOre => "ironOre",
            BlockType::Tree => "tree",
            BlockType::Leaves => "leaves",
            BlockType::Sand => "sand",
            BlockType::Cloud => "cloud",
            BlockType::Snow => "snow",
            BlockType::JungleTree => "jungleTree",
            BlockType::JungleLeaves => "jungleLeaves",
        }
    }

    /// Solidity is derived from the id: everything except `Empty` is solid.
    pub fn is_solid(self) -> bool {
        self != BlockType::Empty
    }

    /// Default resource parameters for the resource blocks of the catalog.
    pub fn resource_params(self) -> Option<ResourceParams> {
        let (scale, scarcity) = match self {
            BlockType::Stone => (30.0, 0.5),
            BlockType::CoalOre => (20.0, 0.8),
            BlockType::IronOre => (60.0, 0.9),
            _ => return None,
        };
        Some(ResourceParams {
            scale: Vector3::new(scale, scale, scale),
            scarcity,
        })
    }
}

/// Returns `true` if the stored id refers to a solid block.
#[inline]
pub fn is_solid_id(id: BlockTypeSize) -> bool {
    id != BlockType::Empty as BlockTypeSize
}
