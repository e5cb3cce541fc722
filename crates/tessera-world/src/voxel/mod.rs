mod chunk_coord;
mod dims;
pub mod generation;

pub use chunk_coord::{ChunkCoord, HORIZONTAL_DIRS, LocalPos, VoxelPos};
pub use dims::WorldDims;
