use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::HashSet;
use tessera_blocks::{BlockId, BlockRegistry, LightChannel, Orientation, Voxel};
use tessera_world::{ChunkCoord, LocalPos, VoxelPos, WorldDims};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EditSource {
    /// Gameplay edit: always applied, marks the chunk unsaved.
    Player,
    /// Generated structure: never replaces a solid block.
    Structure,
}

/// A voxel edit deferred until the chunk's next light stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PendingEdit {
    pub pos: LocalPos,
    pub id: BlockId,
    pub orientation: Orientation,
    pub source: EditSource,
}

/// Light state of a cell before it was edited.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LightSeed {
    pub pos: LocalPos,
    pub sunlight: u8,
    pub blocklight: u8,
    pub opacity: u8,
}

impl LightSeed {
    #[inline]
    pub fn previous(&self, ch: LightChannel) -> u8 {
        match ch {
            LightChannel::Sun => self.sunlight,
            LightChannel::Block => self.blocklight,
        }
    }
}

/// A light change that one chunk's pass wants applied inside another chunk.
///
/// `level > previous` raises the target cell; `level == 0` darkens it (the
/// target treats `previous` as the removed brightness).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CrossChunkLight {
    pub pos: VoxelPos,
    pub channel: LightChannel,
    pub level: u8,
    pub previous: u8,
}

/// One chunk column. Owned by `WorldStore`; the voxel array is shared
/// copy-on-write with in-flight pipeline stages.
#[derive(Clone, Debug)]
pub struct ChunkData {
    pub coord: ChunkCoord,
    dims: WorldDims,
    voxels: Arc<Vec<Voxel>>,
    populated: bool,
    lit: bool,
    modified: bool,
    pending_edits: VecDeque<PendingEdit>,
    light_seeds: VecDeque<LightSeed>,
    inbound_light: Vec<CrossChunkLight>,
    active: HashSet<LocalPos>,
}

impl ChunkData {
    /// Unpopulated placeholder waiting for terrain.
    pub fn new(coord: ChunkCoord, dims: WorldDims) -> Self {
        Self {
            coord,
            dims,
            voxels: Arc::new(vec![Voxel::AIR; dims.voxel_count()]),
            populated: false,
            lit: false,
            modified: false,
            pending_edits: VecDeque::new(),
            light_seeds: VecDeque::new(),
            inbound_light: Vec::new(),
            active: HashSet::new(),
        }
    }

    pub fn from_voxels(coord: ChunkCoord, dims: WorldDims, voxels: Vec<Voxel>, reg: &BlockRegistry) -> Self {
        let mut c = Self::new(coord, dims);
        c.populate(voxels, reg);
        c
    }

    /// Installs a freshly generated or loaded array. Queued edits survive.
    pub fn populate(&mut self, voxels: Vec<Voxel>, reg: &BlockRegistry) {
        assert_eq!(
            voxels.len(),
            self.dims.voxel_count(),
            "chunk {} array has the wrong length",
            self.coord
        );
        self.active = voxels
            .iter()
            .enumerate()
            .filter(|(_, v)| reg.ty(v.id()).active)
            .map(|(i, _)| self.dims.local_at(i))
            .collect();
        self.voxels = Arc::new(voxels);
        self.populated = true;
        self.lit = false;
    }

    #[inline]
    pub fn dims(&self) -> WorldDims {
        self.dims
    }

    #[inline]
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    #[inline]
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    #[inline]
    fn checked_index(&self, l: LocalPos) -> usize {
        assert!(
            self.dims.local_in_bounds(l),
            "local position {l:?} outside chunk {}",
            self.coord
        );
        self.dims.index(l)
    }

    /// Panics if `l` lies outside the chunk.
    #[inline]
    pub fn local_get(&self, l: LocalPos) -> Voxel {
        self.voxels[self.checked_index(l)]
    }

    /// Raw write of a whole voxel word. Panics if `l` lies outside the chunk.
    #[inline]
    pub fn local_set(&mut self, l: LocalPos, v: Voxel) {
        let i = self.checked_index(l);
        Arc::make_mut(&mut self.voxels)[i] = v;
    }

    /// Read-only view of the array shared with whoever holds it.
    pub fn snapshot(&self) -> Arc<Vec<Voxel>> {
        Arc::clone(&self.voxels)
    }

    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Replaces the array with the output of a light pass.
    pub fn install_lit(&mut self, voxels: Arc<Vec<Voxel>>) {
        assert_eq!(voxels.len(), self.dims.voxel_count());
        self.voxels = voxels;
        self.lit = true;
    }

    /// The sanctioned way to change a block id. Returns false when `id` is
    /// already there.
    pub fn modify(&mut self, l: LocalPos, id: BlockId, orientation: Orientation, reg: &BlockRegistry) -> bool {
        let i = self.checked_index(l);
        let old = self.voxels[i];
        if old.id() == id {
            return false;
        }
        let new_ty = reg.ty(id);
        let old_ty = reg.ty(old.id());
        Arc::make_mut(&mut self.voxels)[i] = Voxel::pack(id, 0, new_ty.emission, orientation);
        self.light_seeds.push_back(LightSeed {
            pos: l,
            sunlight: old.sunlight(),
            blocklight: old.blocklight(),
            opacity: old_ty.opacity,
        });
        if old_ty.active != new_ty.active {
            if new_ty.active {
                self.active.insert(l);
            } else {
                self.active.remove(&l);
            }
        }
        self.modified = true;
        true
    }

    pub fn push_pending_edit(&mut self, e: PendingEdit) {
        self.pending_edits.push_back(e);
    }

    pub fn has_pending_edits(&self) -> bool {
        !self.pending_edits.is_empty()
    }

    /// Drains queued edits in FIFO order. Structure edits skip solid cells
    /// and leave the unsaved flag alone. Returns how many edits changed a voxel.
    pub fn apply_pending_edits(&mut self, reg: &BlockRegistry) -> usize {
        let mut applied = 0;
        while let Some(e) = self.pending_edits.pop_front() {
            match e.source {
                EditSource::Player => {
                    if self.modify(e.pos, e.id, e.orientation, reg) {
                        applied += 1;
                    }
                }
                EditSource::Structure => {
                    if reg.is_solid(self.local_get(e.pos).id()) {
                        continue;
                    }
                    let was_modified = self.modified;
                    if self.modify(e.pos, e.id, e.orientation, reg) {
                        applied += 1;
                    }
                    self.modified = was_modified;
                }
            }
        }
        applied
    }

    pub fn take_light_seeds(&mut self) -> Vec<LightSeed> {
        self.light_seeds.drain(..).collect()
    }

    pub fn has_light_work(&self) -> bool {
        !self.light_seeds.is_empty() || !self.inbound_light.is_empty()
    }

    pub fn push_inbound_light(&mut self, m: CrossChunkLight) {
        self.inbound_light.push(m);
    }

    pub fn take_inbound_light(&mut self) -> Vec<CrossChunkLight> {
        std::mem::take(&mut self.inbound_light)
    }

    /// Positions holding blocks with interactive behavior.
    pub fn active_voxels(&self) -> &HashSet<LocalPos> {
        &self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg() -> BlockRegistry {
        BlockRegistry::from_toml_str(
            r#"
            [[blocks]]
            name = "air"
            solid = false
            [[blocks]]
            name = "stone"
            [[blocks]]
            name = "grass"
            active = true
            [[blocks]]
            name = "glowstone"
            emission = 15
            [[blocks]]
            name = "leaves"
            transparent = true
            opacity = 1
            material = "render_both_sides"
            "#,
        )
        .unwrap()
    }

    fn chunk(reg: &BlockRegistry) -> ChunkData {
        let dims = WorldDims::new(4, 8, 2);
        let mut voxels = vec![Voxel::pack(0, 15, 0, Orientation::North); dims.voxel_count()];
        voxels[dims.index(LocalPos::new(1, 1, 1))] = Voxel::pack(2, 0, 0, Orientation::North);
        ChunkData::from_voxels(ChunkCoord::new(0, 0), dims, voxels, reg)
    }

    #[test]
    fn populate_collects_active_voxels() {
        let reg = reg();
        let c = chunk(&reg);
        assert!(c.is_populated());
        assert!(!c.is_modified());
        assert_eq!(c.active_voxels().len(), 1);
        assert!(c.active_voxels().contains(&LocalPos::new(1, 1, 1)));
    }

    #[test]
    fn modify_same_id_is_noop() {
        let reg = reg();
        let mut c = chunk(&reg);
        assert!(!c.modify(LocalPos::new(0, 0, 0), 0, Orientation::East, &reg));
        assert!(!c.is_modified());
        assert!(c.take_light_seeds().is_empty());
    }

    #[test]
    fn modify_seeds_previous_light_and_opacity() {
        let reg = reg();
        let mut c = chunk(&reg);
        let l = LocalPos::new(2, 5, 3);
        assert!(c.modify(l, 3, Orientation::South, &reg));
        let v = c.local_get(l);
        assert_eq!(v.id(), 3);
        assert_eq!(v.blocklight(), 15);
        assert_eq!(v.sunlight(), 0);
        assert_eq!(v.orientation(), Orientation::South);
        assert!(c.is_modified());
        let seeds = c.take_light_seeds();
        assert_eq!(
            seeds,
            vec![LightSeed {
                pos: l,
                sunlight: 15,
                blocklight: 0,
                opacity: 0,
            }]
        );
    }

    #[test]
    fn modify_tracks_active_set() {
        let reg = reg();
        let mut c = chunk(&reg);
        c.modify(LocalPos::new(1, 1, 1), 1, Orientation::North, &reg);
        assert!(c.active_voxels().is_empty());
        c.modify(LocalPos::new(3, 7, 3), 2, Orientation::North, &reg);
        assert!(c.active_voxels().contains(&LocalPos::new(3, 7, 3)));
    }

    #[test]
    fn snapshots_are_copy_on_write() {
        let reg = reg();
        let mut c = chunk(&reg);
        let snap = c.snapshot();
        c.modify(LocalPos::new(0, 0, 0), 1, Orientation::North, &reg);
        assert_eq!(snap[0].id(), 0);
        assert_eq!(c.local_get(LocalPos::new(0, 0, 0)).id(), 1);
    }

    #[test]
    fn pending_edits_apply_fifo_and_structures_skip_solids() {
        let reg = reg();
        let mut c = chunk(&reg);
        let a = LocalPos::new(0, 3, 0);
        let b = LocalPos::new(0, 4, 0);
        let edit = |pos, id, source| PendingEdit {
            pos,
            id,
            orientation: Orientation::North,
            source,
        };
        c.push_pending_edit(edit(a, 1, EditSource::Structure));
        c.push_pending_edit(edit(a, 4, EditSource::Structure));
        c.push_pending_edit(edit(b, 4, EditSource::Structure));
        assert_eq!(c.apply_pending_edits(&reg), 2);
        assert_eq!(c.local_get(a).id(), 1, "second structure edit hit a solid");
        assert_eq!(c.local_get(b).id(), 4);
        assert!(!c.is_modified());

        c.push_pending_edit(edit(a, 0, EditSource::Player));
        c.push_pending_edit(edit(a, 3, EditSource::Player));
        assert_eq!(c.apply_pending_edits(&reg), 2);
        assert_eq!(c.local_get(a).id(), 3);
        assert!(c.is_modified());
        assert!(!c.has_pending_edits());
    }

    #[test]
    #[should_panic]
    fn out_of_range_local_access_panics() {
        let reg = reg();
        let c = chunk(&reg);
        c.local_get(LocalPos::new(4, 0, 0));
    }
}
