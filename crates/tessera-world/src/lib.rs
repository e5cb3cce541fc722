//! World coordinates, worldgen parameters, and procedural terrain.
#![forbid(unsafe_code)]

pub mod voxel;
pub mod worldgen;

pub use voxel::generation::{
    FloraPlacement, GeneratedChunk, StructureKind, TerrainGenerator, VoxelMod,
};
pub use voxel::{ChunkCoord, HORIZONTAL_DIRS, LocalPos, VoxelPos, WorldDims};
pub use worldgen::WorldGenConfig;
