//! Chunk storage: voxel arrays, edit and light queues, neighbor snapshots,
//! and the coordinate-keyed world store.
#![forbid(unsafe_code)]

mod chunk;
mod neighborhood;
pub mod persist;
mod store;

pub use chunk::{ChunkData, CrossChunkLight, EditSource, LightSeed, PendingEdit};
pub use neighborhood::Neighborhood;
pub use persist::{ChunkPersistence, ChunkSnapshot, MemoryPersistence, PersistError};
pub use store::{ChunkHandle, StoreStats, WorldStore};
