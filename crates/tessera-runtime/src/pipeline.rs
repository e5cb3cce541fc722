use std::collections::VecDeque;
use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::{HashMap, HashSet};
use tessera_blocks::{BlockId, BlockRegistry, Orientation};
use tessera_chunk::{ChunkPersistence, PersistError, StoreStats, WorldStore};
use tessera_mesh_cpu::ChunkMesh;
use tessera_world::{ChunkCoord, HORIZONTAL_DIRS, TerrainGenerator, VoxelPos};

use crate::{BuildJob, JobOut, Lane, Runtime, Stage, StageContext, StageOutput};

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub workers: usize,
    pub lighting_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            lighting_enabled: true,
        }
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct PipelineStats {
    pub store: StoreStats,
    pub meshes: usize,
    pub pending_uploads: usize,
    pub in_flight: usize,
    /// Jobs waiting in the worker queues, edit lane plus background.
    pub queued: usize,
    pub running: usize,
    pub generated: u64,
    pub lit: u64,
    pub meshed: u64,
    pub dropped: u64,
}

struct InFlight {
    job_id: u64,
    rev: u64,
    lane: Lane,
}

/// Latest mesh per chunk plus the set a renderer has not picked up yet.
#[derive(Default)]
struct MeshStore {
    meshes: HashMap<ChunkCoord, ChunkMesh>,
    uploads: HashSet<ChunkCoord>,
}

/// Coordinator for generate → light → mesh. Stages run on the runtime's
/// workers over private copies; every result is applied here, on the
/// caller's thread, through the store.
pub struct Pipeline {
    runtime: Runtime,
    store: Arc<WorldStore>,
    terrain: Arc<TerrainGenerator>,
    meshes: MeshStore,
    in_flight: HashMap<ChunkCoord, InFlight>,
    wanted: VecDeque<ChunkCoord>,
    requested: HashSet<ChunkCoord>,
    rerun: HashSet<ChunkCoord>,
    next_job_id: u64,
    generated: u64,
    lit: u64,
    meshed: u64,
    dropped: u64,
}

impl Pipeline {
    pub fn new(
        reg: Arc<BlockRegistry>,
        terrain: Arc<TerrainGenerator>,
        persistence: Option<Arc<dyn ChunkPersistence>>,
        cfg: PipelineConfig,
    ) -> Result<Self, Box<dyn Error>> {
        let store = Arc::new(WorldStore::new(terrain.dims(), Arc::clone(&reg), persistence));
        let ctx = Arc::new(StageContext {
            reg,
            terrain: Arc::clone(&terrain),
            lighting_enabled: cfg.lighting_enabled,
        });
        let runtime = Runtime::new(ctx, cfg.workers)?;
        Ok(Self {
            runtime,
            store,
            terrain,
            meshes: MeshStore::default(),
            in_flight: HashMap::new(),
            wanted: VecDeque::new(),
            requested: HashSet::new(),
            rerun: HashSet::new(),
            next_job_id: 1,
            generated: 0,
            lit: 0,
            meshed: 0,
            dropped: 0,
        })
    }

    pub fn store(&self) -> &Arc<WorldStore> {
        &self.store
    }

    /// Asks for a chunk to be loaded and built. Returns false outside the world.
    pub fn request_chunk(&mut self, coord: ChunkCoord) -> bool {
        if self.store.request(coord, true).is_none() {
            return false;
        }
        if self.requested.insert(coord) {
            self.wanted.push_back(coord);
        }
        true
    }

    /// Gameplay edit; the affected chunks are rebuilt on the next `pump`.
    pub fn modify_voxel(&self, pos: VoxelPos, id: BlockId, orientation: Orientation) -> bool {
        self.store.modify_voxel(pos, id, orientation)
    }

    /// Starts every requested chunk that is not already in flight.
    pub fn schedule(&mut self) {
        let wanted: Vec<ChunkCoord> = self.wanted.drain(..).collect();
        for coord in wanted {
            if !self.start(coord) && self.in_flight.contains_key(&coord) {
                self.rerun.insert(coord);
            }
        }
    }

    /// Applies finished stages, routes their side effects and schedules
    /// whatever they made stale. Returns how many results were applied.
    pub fn pump(&mut self) -> usize {
        let results = self.runtime.drain_worker_results();
        let n = results.len();
        for out in results {
            self.apply(out);
        }
        self.handle_rebuild_requests();
        self.schedule();
        n
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty() && self.wanted.is_empty() && !self.store.has_rebuild_requests()
    }

    /// Pumps until nothing is left to do or `timeout` passes. Returns
    /// whether the pipeline went idle.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let t0 = Instant::now();
        loop {
            self.pump();
            if self.is_idle() {
                return true;
            }
            if t0.elapsed() >= timeout {
                log::warn!("pipeline not idle after {timeout:?}: {:?}", self.stats());
                return false;
            }
            if let Some(out) = self.runtime.wait_result(Duration::from_millis(5)) {
                self.apply(out);
            }
        }
    }

    /// Drops a chunk and its mesh, saving unsaved edits. Stage results that
    /// arrive for it later are discarded.
    pub fn unload_chunk(&mut self, coord: ChunkCoord) -> Result<bool, PersistError> {
        self.in_flight.remove(&coord);
        self.requested.remove(&coord);
        self.rerun.remove(&coord);
        self.wanted.retain(|c| *c != coord);
        self.meshes.meshes.remove(&coord);
        self.meshes.uploads.remove(&coord);
        self.store.unload(coord)
    }

    pub fn mesh(&self, coord: ChunkCoord) -> Option<&ChunkMesh> {
        self.meshes.meshes.get(&coord)
    }

    pub fn meshes(&self) -> impl Iterator<Item = &ChunkMesh> {
        self.meshes.meshes.values()
    }

    /// Chunks whose mesh changed since the last call, sorted.
    pub fn take_mesh_uploads(&mut self) -> Vec<ChunkCoord> {
        let mut out: Vec<ChunkCoord> = self.meshes.uploads.drain().collect();
        out.sort();
        out
    }

    pub fn stats(&self) -> PipelineStats {
        let (q_edit, r_edit, q_bg, r_bg) = self.runtime.queue_debug_counts();
        PipelineStats {
            store: self.store.stats(),
            meshes: self.meshes.meshes.len(),
            pending_uploads: self.meshes.uploads.len(),
            in_flight: self.in_flight.len(),
            queued: q_edit + q_bg,
            running: r_edit + r_bg,
            generated: self.generated,
            lit: self.lit,
            meshed: self.meshed,
            dropped: self.dropped,
        }
    }

    fn handle_rebuild_requests(&mut self) {
        for coord in self.store.take_rebuild_requests() {
            if self.in_flight.contains_key(&coord) {
                self.rerun.insert(coord);
                continue;
            }
            let ready = self
                .store
                .get(coord)
                .is_some_and(|h| {
                    let c = h.read();
                    c.is_populated() && c.is_lit()
                });
            if ready {
                self.start(coord);
            }
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_job_id;
        self.next_job_id += 1;
        id
    }

    /// Begins a run for `coord`: generation if it has no terrain yet,
    /// otherwise straight to lighting.
    fn start(&mut self, coord: ChunkCoord) -> bool {
        if self.in_flight.contains_key(&coord) {
            return false;
        }
        let Some(handle) = self.store.get(coord) else {
            return false;
        };
        let populated = handle.read().is_populated();
        let Some(rev) = self.store.begin_build(coord) else {
            return false;
        };
        if populated {
            self.start_light(coord, rev);
        } else {
            let job_id = self.next_id();
            self.in_flight.insert(coord, InFlight { job_id, rev, lane: Lane::Bg });
            self.runtime.submit(
                BuildJob {
                    coord,
                    rev,
                    job_id,
                    stage: Stage::Generate,
                },
                Lane::Bg,
            );
        }
        true
    }

    fn start_light(&mut self, coord: ChunkCoord, rev: u64) {
        let Some(handle) = self.store.get(coord) else {
            return;
        };
        let (voxels, seeds, inbound, initial, edited) = {
            let mut c = handle.write();
            let edited = c.apply_pending_edits(self.store.registry()) > 0;
            (
                c.voxels().to_vec(),
                c.take_light_seeds(),
                c.take_inbound_light(),
                !c.is_lit(),
                edited,
            )
        };
        let neighbors = self.store.neighborhood(coord);
        let lane = if !initial && (edited || !seeds.is_empty()) {
            Lane::Edit
        } else {
            Lane::Bg
        };
        let job_id = self.next_id();
        self.in_flight.insert(coord, InFlight { job_id, rev, lane });
        self.runtime.submit(
            BuildJob {
                coord,
                rev,
                job_id,
                stage: Stage::Light {
                    voxels,
                    neighbors,
                    seeds,
                    inbound,
                    initial,
                },
            },
            lane,
        );
    }

    fn start_mesh(&mut self, coord: ChunkCoord) {
        let Some(handle) = self.store.get(coord) else {
            return;
        };
        let voxels = handle.read().snapshot();
        let neighbors = self.store.neighborhood(coord);
        let job_id = self.next_id();
        let Some(f) = self.in_flight.get_mut(&coord) else {
            return;
        };
        f.job_id = job_id;
        let (rev, lane) = (f.rev, f.lane);
        self.runtime.submit(
            BuildJob {
                coord,
                rev,
                job_id,
                stage: Stage::Mesh { voxels, neighbors },
            },
            lane,
        );
    }

    fn apply(&mut self, out: JobOut) {
        let JobOut {
            coord,
            job_id,
            kind,
            output,
            t_ms,
            ..
        } = out;
        let current = self.in_flight.get(&coord).is_some_and(|f| f.job_id == job_id);
        if !current || self.store.get(coord).is_none() {
            self.dropped += 1;
            log::debug!("dropping stale {kind:?} result for chunk {coord}");
            return;
        }
        match output {
            StageOutput::Generated(generated) => {
                self.generated += 1;
                log::trace!("generated {coord} in {t_ms} ms");
                let flora = generated.flora;
                if self.store.install_generated(coord, generated.voxels).is_none() {
                    self.abandon(coord);
                    return;
                }
                for p in &flora {
                    for m in self.terrain.generate_structure(p) {
                        self.store.queue_structure_edit(m.pos, m.id);
                    }
                }
                let rev = self.in_flight.get(&coord).map_or(0, |f| f.rev);
                self.start_light(coord, rev);
            }
            StageOutput::Lit { voxels, report } => {
                self.lit += 1;
                log::trace!("lit {coord} in {t_ms} ms ({} cells changed)", report.changed);
                if !self.store.install_lit(coord, Arc::new(voxels)) {
                    self.abandon(coord);
                    return;
                }
                if !report.outbound.is_empty() {
                    self.store.deliver_light(report.outbound);
                }
                for (i, (dx, dz)) in HORIZONTAL_DIRS.iter().enumerate() {
                    if report.border_changed[i] {
                        self.store.request_rebuild(coord.offset(*dx, *dz));
                    }
                }
                self.start_mesh(coord);
            }
            StageOutput::Meshed(mesh) => {
                self.meshed += 1;
                log::trace!("meshed {coord} in {t_ms} ms ({} faces)", mesh.faces);
                self.meshes.meshes.insert(coord, mesh);
                self.meshes.uploads.insert(coord);
                let rev = self.in_flight.remove(&coord).map_or(0, |f| f.rev);
                self.store.finish_build(coord, rev);
                let more_work = self.store.get(coord).is_some_and(|h| {
                    let c = h.read();
                    c.has_pending_edits() || c.has_light_work()
                });
                if self.rerun.remove(&coord) || more_work || self.store.needs_rebuild(coord) {
                    self.start(coord);
                }
            }
        }
    }

    fn abandon(&mut self, coord: ChunkCoord) {
        self.dropped += 1;
        if let Some(f) = self.in_flight.remove(&coord) {
            self.store.finish_build(coord, f.rev);
        }
        log::debug!("chunk {coord} went away mid-build");
    }
}
