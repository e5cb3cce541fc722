use hashbrown::HashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tessera_blocks::{BlockRegistry, Voxel};
use tessera_world::{ChunkCoord, WorldDims};

use crate::chunk::ChunkData;

/// Persisted chunk shape: coordinate plus packed words in x-major order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSnapshot {
    pub coord: ChunkCoord,
    pub voxels: Vec<u32>,
}

impl ChunkSnapshot {
    pub fn from_chunk(c: &ChunkData) -> Self {
        Self {
            coord: c.coord,
            voxels: c.voxels().iter().map(|v| v.raw()).collect(),
        }
    }

    /// Checks length and ids before handing back a populated chunk.
    pub fn into_chunk(self, dims: WorldDims, reg: &BlockRegistry) -> Result<ChunkData, PersistError> {
        if self.voxels.len() != dims.voxel_count() {
            return Err(PersistError::Invalid(format!(
                "chunk {} has {} voxels, expected {}",
                self.coord,
                self.voxels.len(),
                dims.voxel_count()
            )));
        }
        let voxels: Vec<Voxel> = self.voxels.iter().map(|&w| Voxel::from_raw(w)).collect();
        if let Some(bad) = voxels.iter().find(|v| !reg.contains(v.id())) {
            return Err(PersistError::Invalid(format!(
                "chunk {} references unknown block id {}",
                self.coord,
                bad.id()
            )));
        }
        Ok(ChunkData::from_voxels(self.coord, dims, voxels, reg))
    }
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(String),
    #[error("invalid snapshot: {0}")]
    Invalid(String),
}

/// Save/load collaborator. `load` returns `Ok(None)` when nothing is stored.
pub trait ChunkPersistence: Send + Sync {
    fn load(&self, coord: ChunkCoord) -> Result<Option<ChunkSnapshot>, PersistError>;
    fn save(&self, snapshot: &ChunkSnapshot) -> Result<(), PersistError>;
}

/// In-process persistence, mostly for tests and short sessions.
#[derive(Default)]
pub struct MemoryPersistence {
    inner: Mutex<HashMap<ChunkCoord, ChunkSnapshot>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn insert(&self, snapshot: ChunkSnapshot) {
        self.inner.lock().insert(snapshot.coord, snapshot);
    }
}

impl ChunkPersistence for MemoryPersistence {
    fn load(&self, coord: ChunkCoord) -> Result<Option<ChunkSnapshot>, PersistError> {
        Ok(self.inner.lock().get(&coord).cloned())
    }

    fn save(&self, snapshot: &ChunkSnapshot) -> Result<(), PersistError> {
        self.insert(snapshot.clone());
        Ok(())
    }
}
