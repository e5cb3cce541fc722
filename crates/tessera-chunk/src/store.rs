use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use parking_lot::{Mutex, RwLock};

use tessera_blocks::{BlockId, BlockRegistry, Orientation, Voxel};
use tessera_edit::RevisionTracker;
use tessera_world::{ChunkCoord, HORIZONTAL_DIRS, VoxelPos, WorldDims};

use crate::chunk::{ChunkData, CrossChunkLight, EditSource, PendingEdit};
use crate::neighborhood::Neighborhood;
use crate::persist::{ChunkPersistence, ChunkSnapshot, PersistError};

pub type ChunkHandle = Arc<RwLock<ChunkData>>;

#[derive(Default, Debug, Clone, Copy)]
pub struct StoreStats {
    pub loaded: usize,
    pub populated: usize,
    pub modified: usize,
    pub building: usize,
    pub created: u64,
    pub restored: u64,
}

struct StoreState {
    chunks: HashMap<ChunkCoord, ChunkHandle>,
    modified: HashSet<ChunkCoord>,
    building: HashSet<ChunkCoord>,
    revisions: RevisionTracker,
    rebuild: VecDeque<ChunkCoord>,
    rebuild_set: HashSet<ChunkCoord>,
    created: u64,
    restored: u64,
}

impl StoreState {
    fn push_rebuild(&mut self, c: ChunkCoord) {
        if self.rebuild_set.insert(c) {
            self.rebuild.push_back(c);
        }
    }
}

/// Coordinate-keyed chunk map. One mutex guards the map together with the
/// building set, so creation and result publication are serialized.
///
/// Lock order: the store mutex first, then a chunk's `RwLock`. Never take
/// the store mutex while holding a chunk lock.
pub struct WorldStore {
    dims: WorldDims,
    reg: Arc<BlockRegistry>,
    persistence: Option<Arc<dyn ChunkPersistence>>,
    state: Mutex<StoreState>,
}

impl WorldStore {
    pub fn new(
        dims: WorldDims,
        reg: Arc<BlockRegistry>,
        persistence: Option<Arc<dyn ChunkPersistence>>,
    ) -> Self {
        Self {
            dims,
            reg,
            persistence,
            state: Mutex::new(StoreState {
                chunks: HashMap::new(),
                modified: HashSet::new(),
                building: HashSet::new(),
                revisions: RevisionTracker::new(dims),
                rebuild: VecDeque::new(),
                rebuild_set: HashSet::new(),
                created: 0,
                restored: 0,
            }),
        }
    }

    #[inline]
    pub fn dims(&self) -> WorldDims {
        self.dims
    }

    #[inline]
    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.reg
    }

    fn create_locked(&self, st: &mut StoreState, coord: ChunkCoord) -> ChunkHandle {
        let chunk = match self.restore(coord) {
            Some(c) => {
                st.restored += 1;
                c
            }
            None => ChunkData::new(coord, self.dims),
        };
        st.created += 1;
        let handle = Arc::new(RwLock::new(chunk));
        st.chunks.insert(coord, Arc::clone(&handle));
        handle
    }

    // Persistence failures fall back to generation.
    fn restore(&self, coord: ChunkCoord) -> Option<ChunkData> {
        let p = self.persistence.as_ref()?;
        match p.load(coord) {
            Ok(Some(snap)) => match snap.into_chunk(self.dims, &self.reg) {
                Ok(c) => {
                    log::debug!("restored chunk {coord} from persistence");
                    Some(c)
                }
                Err(e) => {
                    log::warn!("discarding stored chunk {coord}: {e}; regenerating");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::warn!("failed to load chunk {coord}: {e}; regenerating");
                None
            }
        }
    }

    /// Returns the chunk at `coord`. With `create`, a missing in-world chunk
    /// is restored from persistence or created unpopulated for generation.
    pub fn request(&self, coord: ChunkCoord, create: bool) -> Option<ChunkHandle> {
        let mut st = self.state.lock();
        if let Some(h) = st.chunks.get(&coord) {
            return Some(Arc::clone(h));
        }
        if !create || !self.dims.chunk_in_world(coord) {
            return None;
        }
        Some(self.create_locked(&mut st, coord))
    }

    #[inline]
    pub fn get(&self, coord: ChunkCoord) -> Option<ChunkHandle> {
        self.request(coord, false)
    }

    pub fn get_voxel(&self, pos: VoxelPos) -> Option<Voxel> {
        if !self.dims.contains(pos) {
            return None;
        }
        let handle = self.get(self.dims.chunk_of(pos))?;
        let chunk = handle.read();
        if !chunk.is_populated() {
            return None;
        }
        Some(chunk.local_get(self.dims.local_of(pos)))
    }

    pub fn get_light(&self, pos: VoxelPos) -> Option<u8> {
        self.get_voxel(pos).map(|v| v.light())
    }

    pub fn is_voxel_solid(&self, pos: VoxelPos) -> bool {
        self.get_voxel(pos)
            .is_some_and(|v| self.reg.is_solid(v.id()))
    }

    /// Gameplay edit entry point. Applies at once when the chunk is idle,
    /// otherwise queues for its next light stage. Returns whether the edit
    /// was accepted.
    pub fn modify_voxel(&self, pos: VoxelPos, id: BlockId, orientation: Orientation) -> bool {
        if !self.dims.contains(pos) || !self.reg.contains(id) {
            return false;
        }
        let coord = self.dims.chunk_of(pos);
        let local = self.dims.local_of(pos);
        let mut st = self.state.lock();
        let Some(handle) = st.chunks.get(&coord).cloned() else {
            return false;
        };
        let building = st.building.contains(&coord);
        let accepted = {
            let mut chunk = handle.write();
            if building || !chunk.is_populated() {
                chunk.push_pending_edit(PendingEdit {
                    pos: local,
                    id,
                    orientation,
                    source: EditSource::Player,
                });
                true
            } else {
                chunk.modify(local, id, orientation, &self.reg)
            }
        };
        if !accepted {
            return false;
        }
        st.modified.insert(coord);
        st.revisions.bump_region_around(pos);
        for c in st.revisions.affected_chunks(pos) {
            if st.chunks.contains_key(&c) {
                st.push_rebuild(c);
            }
        }
        log::debug!("edit at {pos:?} -> block {id} (queued: {building})");
        true
    }

    /// Queues a structure voxel for the chunk that owns `pos`, creating the
    /// chunk if needed. Structure edits never overwrite solid blocks.
    pub fn queue_structure_edit(&self, pos: VoxelPos, id: BlockId) -> bool {
        if !self.dims.contains(pos) || !self.reg.contains(id) {
            return false;
        }
        let coord = self.dims.chunk_of(pos);
        let mut st = self.state.lock();
        let existing = st.chunks.get(&coord).cloned();
        let handle = match existing {
            Some(h) => h,
            None => self.create_locked(&mut st, coord),
        };
        let ready = {
            let mut chunk = handle.write();
            chunk.push_pending_edit(PendingEdit {
                pos: self.dims.local_of(pos),
                id,
                orientation: Orientation::North,
                source: EditSource::Structure,
            });
            chunk.is_populated() && chunk.is_lit()
        };
        if ready {
            st.push_rebuild(coord);
        }
        true
    }

    /// Hands cross-chunk light records to their target chunks. Records for
    /// chunks that are missing or not yet populated are dropped; those chunks
    /// pull border light when they are first lit.
    pub fn deliver_light(&self, mods: Vec<CrossChunkLight>) -> Vec<ChunkCoord> {
        let mut st = self.state.lock();
        let mut touched: Vec<ChunkCoord> = Vec::new();
        for m in mods {
            let target = self.dims.chunk_of(m.pos);
            let Some(handle) = st.chunks.get(&target) else {
                continue;
            };
            let mut chunk = handle.write();
            if !chunk.is_populated() || !chunk.is_lit() {
                continue;
            }
            chunk.push_inbound_light(m);
            if !touched.contains(&target) {
                touched.push(target);
            }
        }
        for &c in &touched {
            st.push_rebuild(c);
        }
        touched
    }

    pub fn request_rebuild(&self, coord: ChunkCoord) {
        let mut st = self.state.lock();
        if st.chunks.contains_key(&coord) {
            st.push_rebuild(coord);
        }
    }

    pub fn has_rebuild_requests(&self) -> bool {
        !self.state.lock().rebuild.is_empty()
    }

    pub fn take_rebuild_requests(&self) -> Vec<ChunkCoord> {
        let mut st = self.state.lock();
        st.rebuild_set.clear();
        st.rebuild.drain(..).collect()
    }

    /// Marks a chunk as in flight. Returns the revision the build starts
    /// from, or `None` if it is already building or not loaded.
    pub fn begin_build(&self, coord: ChunkCoord) -> Option<u64> {
        let mut st = self.state.lock();
        if !st.chunks.contains_key(&coord) || !st.building.insert(coord) {
            return None;
        }
        Some(st.revisions.get_rev(coord))
    }

    pub fn finish_build(&self, coord: ChunkCoord, rev: u64) {
        let mut st = self.state.lock();
        st.building.remove(&coord);
        st.revisions.mark_built(coord, rev);
    }

    pub fn needs_rebuild(&self, coord: ChunkCoord) -> bool {
        self.state.lock().revisions.needs_rebuild(coord)
    }

    /// Snapshots of the populated horizontal neighbors of `coord`.
    pub fn neighborhood(&self, coord: ChunkCoord) -> Neighborhood {
        let st = self.state.lock();
        let mut n = Neighborhood::empty(coord, self.dims);
        for (i, (dx, dz)) in HORIZONTAL_DIRS.iter().enumerate() {
            if let Some(h) = st.chunks.get(&coord.offset(*dx, *dz)) {
                let c = h.read();
                if c.is_populated() {
                    n.sides[i] = Some(c.snapshot());
                }
            }
        }
        n
    }

    /// Publishes a generated array. `None` if the chunk was unloaded meanwhile.
    pub fn install_generated(&self, coord: ChunkCoord, voxels: Vec<Voxel>) -> Option<ChunkHandle> {
        let st = self.state.lock();
        let handle = Arc::clone(st.chunks.get(&coord)?);
        handle.write().populate(voxels, &self.reg);
        Some(handle)
    }

    /// Publishes a lit array. Returns false if the chunk was unloaded meanwhile.
    pub fn install_lit(&self, coord: ChunkCoord, voxels: Arc<Vec<Voxel>>) -> bool {
        let st = self.state.lock();
        match st.chunks.get(&coord) {
            Some(h) => {
                h.write().install_lit(voxels);
                true
            }
            None => false,
        }
    }

    fn save_locked(&self, handle: &ChunkHandle) -> Result<(), PersistError> {
        let Some(p) = &self.persistence else {
            return Ok(());
        };
        let mut chunk = handle.write();
        p.save(&ChunkSnapshot::from_chunk(&chunk))?;
        chunk.mark_saved();
        Ok(())
    }

    /// Drops a chunk, saving it first when it has unsaved edits.
    pub fn unload(&self, coord: ChunkCoord) -> Result<bool, PersistError> {
        let mut st = self.state.lock();
        let Some(handle) = st.chunks.remove(&coord) else {
            return Ok(false);
        };
        st.building.remove(&coord);
        st.rebuild_set.remove(&coord);
        st.rebuild.retain(|c| *c != coord);
        st.revisions.forget(coord);
        if st.modified.remove(&coord) {
            self.save_locked(&handle)?;
            log::debug!("saved chunk {coord} on unload");
        }
        Ok(true)
    }

    /// Writes every chunk with unsaved edits. Returns how many were written.
    pub fn save_modified(&self) -> Result<usize, PersistError> {
        let mut st = self.state.lock();
        let coords: Vec<ChunkCoord> = st.modified.iter().copied().collect();
        let mut saved = 0;
        for coord in coords {
            if let Some(h) = st.chunks.get(&coord).cloned() {
                self.save_locked(&h)?;
                saved += 1;
            }
            st.modified.remove(&coord);
        }
        if saved > 0 {
            log::info!("saved {saved} modified chunks");
        }
        Ok(saved)
    }

    pub fn is_modified(&self, coord: ChunkCoord) -> bool {
        self.state.lock().modified.contains(&coord)
    }

    pub fn stats(&self) -> StoreStats {
        let st = self.state.lock();
        StoreStats {
            loaded: st.chunks.len(),
            populated: st.chunks.values().filter(|h| h.read().is_populated()).count(),
            modified: st.modified.len(),
            building: st.building.len(),
            created: st.created,
            restored: st.restored,
        }
    }
}
