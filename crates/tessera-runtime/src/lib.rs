//! Runtime job queues, worker orchestration and the chunk build pipeline.
#![forbid(unsafe_code)]

mod pipeline;

pub use pipeline::{Pipeline, PipelineConfig, PipelineStats};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError, select, unbounded};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tessera_blocks::{BlockRegistry, Voxel};
use tessera_chunk::{CrossChunkLight, LightSeed, Neighborhood};
use tessera_lighting::{LightReport, LightingEngine, fill_full_bright};
use tessera_mesh_cpu::{ChunkMesh, build_chunk_mesh};
use tessera_world::{ChunkCoord, GeneratedChunk, TerrainGenerator};

/// Read-only state every worker needs.
pub struct StageContext {
    pub reg: Arc<BlockRegistry>,
    pub terrain: Arc<TerrainGenerator>,
    pub lighting_enabled: bool,
}

/// Work for one pipeline stage of one chunk. Inputs are private copies or
/// shared read-only snapshots; nothing here aliases the store.
#[derive(Clone, Debug)]
pub enum Stage {
    Generate,
    Light {
        voxels: Vec<Voxel>,
        neighbors: Neighborhood,
        seeds: Vec<LightSeed>,
        inbound: Vec<CrossChunkLight>,
        initial: bool,
    },
    Mesh {
        voxels: Arc<Vec<Voxel>>,
        neighbors: Neighborhood,
    },
}

#[derive(Clone, Debug)]
pub struct BuildJob {
    pub coord: ChunkCoord,
    pub rev: u64,
    pub job_id: u64,
    pub stage: Stage,
}

#[derive(Debug)]
pub enum StageOutput {
    Generated(GeneratedChunk),
    Lit { voxels: Vec<Voxel>, report: LightReport },
    Meshed(ChunkMesh),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Lane {
    /// Chunks carrying gameplay edits; served first.
    Edit,
    /// Streaming and background relighting.
    Bg,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JobKind {
    Generate,
    Light,
    Mesh,
}

pub struct JobOut {
    pub coord: ChunkCoord,
    pub rev: u64,
    pub job_id: u64,
    pub kind: JobKind,
    pub lane: Lane,
    pub output: StageOutput,
    pub t_ms: u32,
}

fn elapsed_ms(t0: Instant) -> u32 {
    t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

fn run_stage(job: BuildJob, lane: Lane, ctx: &StageContext, tx: &Sender<JobOut>) {
    let BuildJob {
        coord,
        rev,
        job_id,
        stage,
    } = job;
    let t0 = Instant::now();
    let (kind, output) = match stage {
        Stage::Generate => (JobKind::Generate, StageOutput::Generated(ctx.terrain.generate_chunk(coord))),
        Stage::Light {
            mut voxels,
            neighbors,
            seeds,
            inbound,
            initial,
        } => {
            let report = if !ctx.lighting_enabled {
                fill_full_bright(&mut voxels);
                LightReport::default()
            } else if initial {
                LightingEngine::new(&ctx.reg).light_initial(&mut voxels, &neighbors)
            } else {
                LightingEngine::new(&ctx.reg).relight(&mut voxels, &neighbors, &seeds, &inbound)
            };
            (JobKind::Light, StageOutput::Lit { voxels, report })
        }
        Stage::Mesh { voxels, neighbors } => (
            JobKind::Mesh,
            StageOutput::Meshed(build_chunk_mesh(&ctx.reg, &voxels, &neighbors)),
        ),
    };
    let _ = tx.send(JobOut {
        coord,
        rev,
        job_id,
        kind,
        lane,
        output,
        t_ms: elapsed_ms(t0),
    });
}

#[derive(Default)]
struct LaneCounters {
    queued: AtomicUsize,
    running: AtomicUsize,
}

impl LaneCounters {
    fn run(&self, job: BuildJob, lane: Lane, ctx: &StageContext, tx: &Sender<JobOut>) {
        self.queued.fetch_sub(1, Ordering::Relaxed);
        self.running.fetch_add(1, Ordering::Relaxed);
        run_stage(job, lane, ctx, tx);
        self.running.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Two-lane worker pool. Edit-lane workers only take edit jobs; background
/// workers prefer edit jobs when both lanes have work.
pub struct Runtime {
    job_tx_edit: Sender<BuildJob>,
    job_tx_bg: Sender<BuildJob>,
    res_rx: Receiver<JobOut>,
    _edit_pool: ThreadPool,
    _bg_pool: ThreadPool,
    edit: Arc<LaneCounters>,
    bg: Arc<LaneCounters>,
    pub w_edit: usize,
    pub w_bg: usize,
}

fn bg_worker(
    edit_rx: Receiver<BuildJob>,
    bg_rx: Receiver<BuildJob>,
    edit: &LaneCounters,
    bg: &LaneCounters,
    ctx: &StageContext,
    tx: &Sender<JobOut>,
) {
    loop {
        match edit_rx.try_recv() {
            Ok(job) => {
                edit.run(job, Lane::Edit, ctx, tx);
                continue;
            }
            Err(TryRecvError::Disconnected) => return,
            Err(TryRecvError::Empty) => {}
        }
        select! {
            recv(edit_rx) -> res => match res {
                Ok(job) => edit.run(job, Lane::Edit, ctx, tx),
                Err(_) => return,
            },
            recv(bg_rx) -> res => match res {
                Ok(job) => bg.run(job, Lane::Bg, ctx, tx),
                Err(_) => return,
            },
        }
    }
}

impl Runtime {
    /// `workers` is the total thread count; one of them serves the edit lane.
    pub fn new(ctx: Arc<StageContext>, workers: usize) -> Result<Self, ThreadPoolBuildError> {
        let (job_tx_edit, job_rx_edit) = unbounded::<BuildJob>();
        let (job_tx_bg, job_rx_bg) = unbounded::<BuildJob>();
        let (res_tx, res_rx) = unbounded::<JobOut>();
        let edit = Arc::new(LaneCounters::default());
        let bg = Arc::new(LaneCounters::default());

        let w_edit = 1usize;
        let w_bg = workers.saturating_sub(w_edit).max(1);

        let edit_pool = ThreadPoolBuilder::new()
            .num_threads(w_edit)
            .thread_name(|i| format!("tessera-edit-{i}"))
            .build()?;
        for _ in 0..w_edit {
            let (rx, tx, ctx, edit) = (job_rx_edit.clone(), res_tx.clone(), Arc::clone(&ctx), Arc::clone(&edit));
            edit_pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    edit.run(job, Lane::Edit, &ctx, &tx);
                }
            });
        }

        let bg_pool = ThreadPoolBuilder::new()
            .num_threads(w_bg)
            .thread_name(|i| format!("tessera-bg-{i}"))
            .build()?;
        for _ in 0..w_bg {
            let (edit_rx, bg_rx, tx) = (job_rx_edit.clone(), job_rx_bg.clone(), res_tx.clone());
            let (ctx, edit, bg) = (Arc::clone(&ctx), Arc::clone(&edit), Arc::clone(&bg));
            bg_pool.spawn(move || bg_worker(edit_rx, bg_rx, &edit, &bg, &ctx, &tx));
        }

        log::debug!("runtime started: {w_edit} edit worker(s), {w_bg} background worker(s)");
        Ok(Self {
            job_tx_edit,
            job_tx_bg,
            res_rx,
            _edit_pool: edit_pool,
            _bg_pool: bg_pool,
            edit,
            bg,
            w_edit,
            w_bg,
        })
    }

    pub fn submit(&self, job: BuildJob, lane: Lane) {
        let coord = job.coord;
        let (tx, c) = match lane {
            Lane::Edit => (&self.job_tx_edit, &self.edit),
            Lane::Bg => (&self.job_tx_bg, &self.bg),
        };
        c.queued.fetch_add(1, Ordering::Relaxed);
        if tx.send(job).is_err() {
            c.queued.fetch_sub(1, Ordering::Relaxed);
            log::warn!("worker pool is gone; dropping job for chunk {coord}");
        }
    }

    pub fn drain_worker_results(&self) -> Vec<JobOut> {
        self.res_rx.try_iter().collect()
    }

    /// Blocks up to `timeout` for the next finished job.
    pub fn wait_result(&self, timeout: Duration) -> Option<JobOut> {
        self.res_rx.recv_timeout(timeout).ok()
    }

    /// (queued edit, running edit, queued bg, running bg)
    pub fn queue_debug_counts(&self) -> (usize, usize, usize, usize) {
        (
            self.edit.queued.load(Ordering::Relaxed),
            self.edit.running.load(Ordering::Relaxed),
            self.bg.queued.load(Ordering::Relaxed),
            self.bg.running.load(Ordering::Relaxed),
        )
    }
}
