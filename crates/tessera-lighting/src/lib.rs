//! Flood-fill sun and block lighting for one chunk at a time.
#![forbid(unsafe_code)]

mod pass;

use hashbrown::HashSet;
use tessera_blocks::{BlockRegistry, LightChannel, MAX_LIGHT, Voxel};
use tessera_chunk::{CrossChunkLight, LightSeed, Neighborhood};
use tessera_world::{LocalPos, WorldDims};

use pass::{ChannelPass, DIRS, cast};

/// Outcome of one lighting pass over a chunk.
#[derive(Clone, Debug, Default)]
pub struct LightReport {
    /// Light changes for cells in neighboring chunks, in emission order.
    pub outbound: Vec<CrossChunkLight>,
    /// Number of cells whose light value changed.
    pub changed: usize,
    /// Per horizontal side (`HORIZONTAL_DIRS` order), whether an edge cell changed.
    pub border_changed: [bool; 4],
}

impl LightReport {
    pub fn is_noop(&self) -> bool {
        self.changed == 0 && self.outbound.is_empty()
    }
}

/// Computes sunlight and blocklight over a chunk's voxel array in place.
///
/// Neighbor chunks are only ever read through the [`Neighborhood`] snapshots;
/// any light that should change over there comes back as
/// [`LightReport::outbound`] records for the caller to deliver.
pub struct LightingEngine<'a> {
    reg: &'a BlockRegistry,
}

impl<'a> LightingEngine<'a> {
    pub fn new(reg: &'a BlockRegistry) -> Self {
        Self { reg }
    }

    /// Full pass for a freshly populated chunk: reset, cast skylight down
    /// every column, light emitters, pull light in from lit neighbors and
    /// flood both channels.
    pub fn light_initial(&self, voxels: &mut [Voxel], nb: &Neighborhood) -> LightReport {
        let dims = nb.dims;
        let before = voxels.to_vec();
        for v in voxels.iter_mut() {
            *v = v.with_sunlight(0).with_blocklight(self.reg.emission(v.id()));
        }
        let mut outbound = Vec::new();
        for ch in LightChannel::BOTH {
            let mut pass = ChannelPass::new(self.reg, nb, ch, voxels);
            match ch {
                LightChannel::Sun => {
                    for x in 0..dims.chunk_width {
                        for z in 0..dims.chunk_width {
                            pass.recompute_column(x, z);
                        }
                    }
                }
                LightChannel::Block => {
                    for i in 0..before.len() {
                        if self.reg.emission(before[i].id()) > 0 {
                            pass.push_placement(dims.local_at(i));
                        }
                    }
                }
            }
            pass.pull_borders();
            pass.run_placement();
            outbound.extend(pass.into_outbound());
        }
        let report = summarize(dims, &before, voxels, outbound);
        log::trace!(
            "initial light {}: {} cells, {} outbound",
            nb.coord,
            report.changed,
            report.outbound.len()
        );
        report
    }

    /// Incremental pass: apply edit seeds and inbound cross-chunk records,
    /// darken what lost its source, then relight from the remaining sources
    /// and the border snapshots.
    pub fn relight(
        &self,
        voxels: &mut [Voxel],
        nb: &Neighborhood,
        seeds: &[LightSeed],
        inbound: &[CrossChunkLight],
    ) -> LightReport {
        let dims = nb.dims;
        let before = voxels.to_vec();
        let mut outbound = Vec::new();
        for ch in LightChannel::BOTH {
            let mut pass = ChannelPass::new(self.reg, nb, ch, voxels);
            if ch == LightChannel::Sun {
                let mut columns: HashSet<(i32, i32)> = HashSet::new();
                for s in seeds {
                    let now = self.reg.opacity(before[dims.index(s.pos)].id());
                    if (s.opacity == 0) != (now == 0) && columns.insert((s.pos.x, s.pos.z)) {
                        pass.recompute_column(s.pos.x, s.pos.z);
                    }
                }
            }
            pass.apply_seeds(seeds);
            pass.apply_inbound(inbound);
            pass.run_removal();
            // Neighbors may have been lit against an older copy of this chunk.
            pass.pull_borders();
            pass.run_placement();
            outbound.extend(pass.into_outbound());
        }
        let report = summarize(dims, &before, voxels, outbound);
        log::trace!(
            "relight {}: {} seeds, {} inbound, {} cells changed, {} outbound",
            nb.coord,
            seeds.len(),
            inbound.len(),
            report.changed,
            report.outbound.len()
        );
        report
    }

    /// First cell whose light differs from what its own source, the sky and
    /// its in-chunk neighbors support. Cells too dark are reported anywhere;
    /// cells too bright only away from the x/z edges, which may be lit from
    /// the next chunk.
    pub fn find_unsettled(&self, voxels: &[Voxel], dims: WorldDims) -> Option<(LocalPos, LightChannel)> {
        let w = dims.chunk_width;
        for (i, &v) in voxels.iter().enumerate() {
            let p = dims.local_at(i);
            let on_edge = p.x == 0 || p.z == 0 || p.x == w - 1 || p.z == w - 1;
            for ch in LightChannel::BOTH {
                let have = v.light_in(ch);
                let want = self.supported(voxels, dims, p, ch);
                if have < want || (have > want && !on_edge) {
                    return Some((p, ch));
                }
            }
        }
        None
    }

    fn spreads(&self, v: Voxel, ch: LightChannel) -> bool {
        self.reg.opacity(v.id()) < MAX_LIGHT || (ch == LightChannel::Block && self.reg.emission(v.id()) > 0)
    }

    fn supported(&self, voxels: &[Voxel], dims: WorldDims, p: LocalPos, ch: LightChannel) -> u8 {
        let me = voxels[dims.index(p)];
        let my_opacity = self.reg.opacity(me.id());
        let mut best = match ch {
            LightChannel::Block => self.reg.emission(me.id()),
            LightChannel::Sun if p.y == dims.chunk_height - 1 => MAX_LIGHT,
            LightChannel::Sun => 0,
        };
        for (dx, dy, dz) in DIRS {
            let n = p.offset(dx, dy, dz);
            if !dims.local_in_bounds(n) {
                continue;
            }
            let nv = voxels[dims.index(n)];
            let light = nv.light_in(ch);
            if light == 0 || !self.spreads(nv, ch) {
                continue;
            }
            best = best.max(cast(ch, light, self.reg.opacity(nv.id()), my_opacity, dy == 1));
        }
        best
    }
}

/// Lighting switched off: everything renders at full brightness.
pub fn fill_full_bright(voxels: &mut [Voxel]) {
    for v in voxels.iter_mut() {
        *v = v.with_sunlight(MAX_LIGHT).with_blocklight(MAX_LIGHT);
    }
}

fn summarize(dims: WorldDims, before: &[Voxel], after: &[Voxel], outbound: Vec<CrossChunkLight>) -> LightReport {
    let w = dims.chunk_width;
    let mut report = LightReport {
        outbound,
        ..LightReport::default()
    };
    for (i, (a, b)) in before.iter().zip(after).enumerate() {
        if a == b {
            continue;
        }
        report.changed += 1;
        let l = dims.local_at(i);
        report.border_changed[0] |= l.x == 0;
        report.border_changed[1] |= l.x == w - 1;
        report.border_changed[2] |= l.z == 0;
        report.border_changed[3] |= l.z == w - 1;
    }
    report
}
