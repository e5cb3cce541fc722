use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};
use tessera_blocks::{BlockRegistry, LightChannel, MAX_LIGHT, Voxel};
use tessera_chunk::{CrossChunkLight, LightSeed, Neighborhood};
use tessera_world::{LocalPos, WorldDims};

pub(crate) const DIRS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

const DOWN: (i32, i32, i32) = (0, -1, 0);

/// Light arriving in a neighbor cell. Direct sky light (full sunlight in a
/// clear cell) keeps full strength straight down; everything else loses
/// `max(1, target opacity)` per step.
#[inline]
pub(crate) fn cast(ch: LightChannel, light: u8, src_opacity: u8, dst_opacity: u8, down: bool) -> u8 {
    if ch == LightChannel::Sun && down && light == MAX_LIGHT && src_opacity == 0 {
        return MAX_LIGHT;
    }
    light.saturating_sub(dst_opacity.max(1))
}

/// What a cell can read about one of its six neighbors.
#[derive(Clone, Copy)]
pub(crate) enum Cell {
    Inside(LocalPos, usize),
    Outside(LocalPos, Voxel),
    Absent,
}

/// One flood-fill pass over a single light channel of one chunk.
pub(crate) struct ChannelPass<'a> {
    reg: &'a BlockRegistry,
    dims: WorldDims,
    nb: &'a Neighborhood,
    ch: LightChannel,
    voxels: &'a mut [Voxel],
    placement: VecDeque<LocalPos>,
    queued: Vec<bool>,
    removal: VecDeque<(LocalPos, u8)>,
    refill: Vec<LocalPos>,
    overlay: HashMap<LocalPos, u8>,
    outbound: Vec<CrossChunkLight>,
    open_raise: HashMap<LocalPos, usize>,
}

impl<'a> ChannelPass<'a> {
    pub(crate) fn new(
        reg: &'a BlockRegistry,
        nb: &'a Neighborhood,
        ch: LightChannel,
        voxels: &'a mut [Voxel],
    ) -> Self {
        let dims = nb.dims;
        Self {
            reg,
            dims,
            nb,
            ch,
            queued: vec![false; voxels.len()],
            voxels,
            placement: VecDeque::new(),
            removal: VecDeque::new(),
            refill: Vec::new(),
            overlay: HashMap::new(),
            outbound: Vec::new(),
            open_raise: HashMap::new(),
        }
    }

    pub(crate) fn into_outbound(self) -> Vec<CrossChunkLight> {
        self.outbound
    }

    #[inline]
    fn light_at(&self, i: usize) -> u8 {
        self.voxels[i].light_in(self.ch)
    }

    #[inline]
    fn set_light(&mut self, i: usize, v: u8) {
        self.voxels[i] = self.voxels[i].with_light_in(self.ch, v);
    }

    #[inline]
    fn opacity_of(&self, v: Voxel) -> u8 {
        self.reg.opacity(v.id())
    }

    /// Value a cell holds on its own, before any neighbor contributes.
    #[inline]
    fn own_source(&self, v: Voxel) -> u8 {
        match self.ch {
            LightChannel::Block => self.reg.emission(v.id()),
            LightChannel::Sun => 0,
        }
    }

    /// Whether a cell passes its light on to neighbors.
    #[inline]
    fn spreads(&self, v: Voxel) -> bool {
        self.opacity_of(v) < MAX_LIGHT || self.own_source(v) > 0
    }

    #[inline]
    fn cell(&self, l: LocalPos) -> Cell {
        if self.dims.local_in_bounds(l) {
            return Cell::Inside(l, self.dims.index(l));
        }
        match self.nb.get_outside(l) {
            Some(v) => Cell::Outside(l, v),
            None => Cell::Absent,
        }
    }

    #[inline]
    fn outside_light(&self, l: LocalPos, v: Voxel) -> u8 {
        self.overlay
            .get(&l)
            .copied()
            .unwrap_or_else(|| v.light_in(self.ch))
    }

    #[inline]
    fn enqueue(&mut self, l: LocalPos, i: usize) {
        if !self.queued[i] {
            self.queued[i] = true;
            self.placement.push_back(l);
        }
    }

    /// Queue an in-chunk cell for the placement pass.
    pub(crate) fn push_placement(&mut self, l: LocalPos) {
        let i = self.dims.index(l);
        self.enqueue(l, i);
    }

    fn raise_outside(&mut self, l: LocalPos, previous: u8, level: u8) {
        self.overlay.insert(l, level);
        let pos = self.nb.global(l);
        if let Some(&k) = self.open_raise.get(&l) {
            self.outbound[k].level = level;
            return;
        }
        self.open_raise.insert(l, self.outbound.len());
        self.outbound.push(CrossChunkLight {
            pos,
            channel: self.ch,
            level,
            previous,
        });
    }

    fn darken_outside(&mut self, l: LocalPos, previous: u8) {
        self.overlay.insert(l, 0);
        self.open_raise.remove(&l);
        self.outbound.push(CrossChunkLight {
            pos: self.nb.global(l),
            channel: self.ch,
            level: 0,
            previous,
        });
    }

    /// Recast direct sunlight down one column. Clear cells from the top and
    /// the first blocking cell get full light; cells below get none. Any
    /// nonzero opacity ends the direct cast. Only cells that gain, or lose
    /// direct light they held, are queued.
    pub(crate) fn recompute_column(&mut self, x: i32, z: i32) {
        let mut open = true;
        for y in (0..self.dims.chunk_height).rev() {
            let l = LocalPos::new(x, y, z);
            let i = self.dims.index(l);
            let old = self.light_at(i);
            if open {
                if self.opacity_of(self.voxels[i]) > 0 {
                    open = false;
                }
                if old < MAX_LIGHT {
                    self.set_light(i, MAX_LIGHT);
                    self.enqueue(l, i);
                }
            } else if old == MAX_LIGHT {
                self.set_light(i, 0);
                self.removal.push_back((l, old));
                self.refill.push(l);
            }
        }
    }

    /// Compare each edited cell against the light it had before the edit.
    /// A cell that stopped passing light on withdraws what it used to give
    /// its neighbors, even when its own level did not change.
    pub(crate) fn apply_seeds(&mut self, seeds: &[LightSeed]) {
        let mut seen: HashSet<LocalPos> = HashSet::new();
        for s in seeds {
            if !seen.insert(s.pos) {
                continue;
            }
            let i = self.dims.index(s.pos);
            let cur = self.light_at(i);
            let prev = s.previous(self.ch);
            let stopped_spreading = s.opacity < MAX_LIGHT && !self.spreads(self.voxels[i]);
            if cur > prev {
                self.enqueue(s.pos, i);
            }
            if prev > 0 && (cur < prev || stopped_spreading) {
                self.removal.push_back((s.pos, prev));
            }
            self.refill.push(s.pos);
        }
    }

    /// Apply light changes pushed here by a neighbor's pass.
    pub(crate) fn apply_inbound(&mut self, inbound: &[CrossChunkLight]) {
        let ch = self.ch;
        for m in inbound.iter().filter(|m| m.channel == ch) {
            if !self.dims.contains(m.pos) {
                continue;
            }
            let l = self.dims.local_of(m.pos);
            if self.dims.chunk_of(m.pos) != self.nb.coord {
                continue;
            }
            let i = self.dims.index(l);
            let cur = self.light_at(i);
            if m.level == 0 {
                if cur == 0 {
                    continue;
                }
                let own = self.own_source(self.voxels[i]);
                self.set_light(i, own);
                self.removal.push_back((l, cur));
                if own > 0 {
                    self.enqueue(l, i);
                }
                self.refill.push(l);
            } else if m.level > cur {
                self.set_light(i, m.level);
                self.enqueue(l, i);
            }
        }
    }

    /// Darkness flood: clear everything dimmer than the removed level that
    /// is reachable from the removed cells, queueing brighter cells so they
    /// can relight the gap.
    pub(crate) fn run_removal(&mut self) {
        while let Some((p, removed)) = self.removal.pop_front() {
            for (dx, dy, dz) in DIRS {
                match self.cell(p.offset(dx, dy, dz)) {
                    Cell::Inside(n, ni) => {
                        let nl = self.light_at(ni);
                        if nl == 0 {
                            continue;
                        }
                        if nl < removed {
                            let own = self.own_source(self.voxels[ni]);
                            self.set_light(ni, own);
                            self.removal.push_back((n, nl));
                            self.refill.push(n);
                            if own > 0 {
                                self.enqueue(n, ni);
                            }
                        } else {
                            self.enqueue(n, ni);
                        }
                    }
                    Cell::Outside(n, v) => {
                        let ol = self.outside_light(n, v);
                        if ol > 0 && ol < removed {
                            self.darken_outside(n, ol);
                        }
                    }
                    Cell::Absent => {}
                }
            }
        }
    }

    /// Best light a cell can draw from its own source, the sky, and its
    /// neighbors (including read-only snapshots across the border).
    fn pull(&self, l: LocalPos) -> u8 {
        let i = self.dims.index(l);
        let me = self.voxels[i];
        let my_opacity = self.opacity_of(me);
        let mut best = self.own_source(me);
        if self.ch == LightChannel::Sun && l.y == self.dims.chunk_height - 1 {
            best = MAX_LIGHT;
        }
        for (dx, dy, dz) in DIRS {
            let from_above = dy == 1;
            let (v, light) = match self.cell(l.offset(dx, dy, dz)) {
                Cell::Inside(_, ni) => (self.voxels[ni], self.light_at(ni)),
                Cell::Outside(n, v) => (v, self.outside_light(n, v)),
                Cell::Absent => continue,
            };
            if light == 0 || !self.spreads(v) {
                continue;
            }
            best = best.max(cast(self.ch, light, self.opacity_of(v), my_opacity, from_above));
        }
        best
    }

    fn run_refill(&mut self) {
        let cells = std::mem::take(&mut self.refill);
        for l in cells {
            let i = self.dims.index(l);
            let v = self.pull(l);
            if v > self.light_at(i) {
                self.set_light(i, v);
                self.enqueue(l, i);
            }
        }
    }

    /// Pull light across the chunk border into every edge cell, then refill
    /// everything queued for refill.
    pub(crate) fn pull_borders(&mut self) {
        let w = self.dims.chunk_width;
        for side in 0..4 {
            if !self.nb.has_side(side) {
                continue;
            }
            for a in 0..w {
                for y in 0..self.dims.chunk_height {
                    let l = match side {
                        0 => LocalPos::new(0, y, a),
                        1 => LocalPos::new(w - 1, y, a),
                        2 => LocalPos::new(a, y, 0),
                        _ => LocalPos::new(a, y, w - 1),
                    };
                    self.refill.push(l);
                }
            }
        }
        self.run_refill();
    }

    /// Light flood: raise neighbors to what this cell can cast into them.
    pub(crate) fn run_placement(&mut self) {
        while let Some(p) = self.placement.pop_front() {
            let pi = self.dims.index(p);
            self.queued[pi] = false;
            let src = self.voxels[pi];
            let light = self.light_at(pi);
            if light <= 1 {
                continue;
            }
            if !self.spreads(src) {
                continue;
            }
            let src_opacity = self.opacity_of(src);
            for d in DIRS {
                let down = d == DOWN;
                match self.cell(p.offset(d.0, d.1, d.2)) {
                    Cell::Inside(n, ni) => {
                        let c = cast(self.ch, light, src_opacity, self.opacity_of(self.voxels[ni]), down);
                        if c > self.light_at(ni) {
                            self.set_light(ni, c);
                            self.enqueue(n, ni);
                        }
                    }
                    Cell::Outside(n, v) => {
                        let c = cast(self.ch, light, src_opacity, self.opacity_of(v), down);
                        let ol = self.outside_light(n, v);
                        if c > ol {
                            self.raise_outside(n, ol, c);
                        }
                    }
                    Cell::Absent => {}
                }
            }
        }
    }
}
