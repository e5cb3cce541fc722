mod biome;
mod flora;
mod noise;
mod terrain;

pub use biome::{BiomeDefinition, FloraRule, Lode};
pub use flora::{FloraPlacement, StructureKind, VoxelMod};
pub use noise::PerlinField;
pub use terrain::{ColumnSample, GeneratedChunk, TerrainGenerator};
