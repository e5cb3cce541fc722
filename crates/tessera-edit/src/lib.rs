//! Per-chunk edit revisions and rebuild bookkeeping.
#![forbid(unsafe_code)]

use std::collections::HashMap;

use tessera_world::{ChunkCoord, VoxelPos, WorldDims};

#[derive(Default, Debug, Clone, Copy)]
pub struct RevisionStats {
    pub rev_entries: usize,
    pub built_entries: usize,
    pub pending: usize,
}

/// Tracks the latest edit stamp touching each chunk and the stamp each
/// chunk was last built at.
pub struct RevisionTracker {
    dims: WorldDims,
    rev: HashMap<ChunkCoord, u64>,
    built: HashMap<ChunkCoord, u64>,
    counter: u64,
}

impl RevisionTracker {
    pub fn new(dims: WorldDims) -> Self {
        Self {
            dims,
            rev: HashMap::new(),
            built: HashMap::new(),
            counter: 0,
        }
    }

    pub fn stats(&self) -> RevisionStats {
        let pending = self
            .rev
            .keys()
            .filter(|c| self.needs_rebuild(**c))
            .count();
        RevisionStats {
            rev_entries: self.rev.len(),
            built_entries: self.built.len(),
            pending,
        }
    }

    // Edge-neighbor offsets per axis for a voxel on a chunk border.
    fn border_offsets(&self, p: VoxelPos) -> (Vec<i32>, Vec<i32>) {
        let l = self.dims.local_of(p);
        let w = self.dims.chunk_width;
        let mut xs = vec![0];
        let mut zs = vec![0];
        if l.x == 0 {
            xs.push(-1);
        }
        if l.x == w - 1 {
            xs.push(1);
        }
        if l.z == 0 {
            zs.push(-1);
        }
        if l.z == w - 1 {
            zs.push(1);
        }
        (xs, zs)
    }

    /// Stamps the edited chunk and, when the edit sits on a chunk border,
    /// the neighbors across that border. Returns the new stamp.
    pub fn bump_region_around(&mut self, p: VoxelPos) -> u64 {
        self.counter = self.counter.wrapping_add(1).max(1);
        let stamp = self.counter;
        for c in self.affected_chunks(p) {
            self.rev.insert(c, stamp);
        }
        stamp
    }

    /// The edited chunk first, then any border neighbors.
    pub fn affected_chunks(&self, p: VoxelPos) -> Vec<ChunkCoord> {
        let c = self.dims.chunk_of(p);
        let (xs, zs) = self.border_offsets(p);
        let mut affected = vec![c];
        let edges = xs
            .iter()
            .map(|dx| (*dx, 0))
            .chain(zs.iter().map(|dz| (0, *dz)))
            .filter(|&(dx, dz)| dx != 0 || dz != 0);
        for (dx, dz) in edges {
            let n = c.offset(dx, dz);
            if self.dims.chunk_in_world(n) && !affected.contains(&n) {
                affected.push(n);
            }
        }
        affected
    }

    pub fn get_rev(&self, c: ChunkCoord) -> u64 {
        self.rev.get(&c).copied().unwrap_or(0)
    }

    pub fn get_built_rev(&self, c: ChunkCoord) -> u64 {
        self.built.get(&c).copied().unwrap_or(0)
    }

    pub fn mark_built(&mut self, c: ChunkCoord, rev: u64) {
        let e = self.built.entry(c).or_insert(0);
        if rev > *e {
            *e = rev;
        }
    }

    pub fn needs_rebuild(&self, c: ChunkCoord) -> bool {
        self.get_rev(c) > self.get_built_rev(c)
    }

    pub fn forget(&mut self, c: ChunkCoord) {
        self.rev.remove(&c);
        self.built.remove(&c);
    }
}
