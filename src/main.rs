//! Headless driver: streams a square of chunks through generate, light and
//! mesh, then tries one edit and reports what came out.
#![forbid(unsafe_code)]

mod assets;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use serde::Deserialize;
use tessera_blocks::{BlockRegistry, Orientation};
use tessera_chunk::ChunkPersistence;
use tessera_io::DirPersistence;
use tessera_mesh_cpu::Bucket;
use tessera_runtime::{Pipeline, PipelineConfig};
use tessera_world::{ChunkCoord, LocalPos, TerrainGenerator, VoxelPos, WorldGenConfig};

#[derive(Parser, Debug)]
#[command(name = "tessera", version, about = "Voxel chunk build pipeline")]
struct Args {
    /// Directory holding assets/blocks.toml and assets/worldgen.toml.
    #[arg(long)]
    assets: Option<PathBuf>,
    #[arg(long)]
    blocks: Option<PathBuf>,
    #[arg(long)]
    worldgen: Option<PathBuf>,
    /// Session settings file; flags given here win over it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<i32>,
    /// Chunks streamed in each direction around the world center.
    #[arg(long)]
    radius: Option<i32>,
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long)]
    no_lighting: bool,
    /// Persist chunk edits under this directory.
    #[arg(long)]
    save_dir: Option<PathBuf>,
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,
}

#[derive(Debug, Default, Deserialize)]
struct SessionConfig {
    #[serde(default)]
    session: SessionSection,
}

#[derive(Debug, Default, Deserialize)]
struct SessionSection {
    radius: Option<i32>,
    workers: Option<usize>,
    save_dir: Option<PathBuf>,
    lighting: Option<bool>,
}

const BUILTIN_BLOCKS: &str = include_str!("../assets/blocks.toml");
const BUILTIN_WORLDGEN: &str = include_str!("../assets/worldgen.toml");

fn load_registry(path: &Path) -> Result<BlockRegistry, Box<dyn Error>> {
    if path.exists() {
        return BlockRegistry::load_from_path(path);
    }
    log::warn!("{} not found; using the built-in block table", path.display());
    BlockRegistry::from_toml_str(BUILTIN_BLOCKS)
}

fn load_worldgen(path: &Path) -> Result<WorldGenConfig, Box<dyn Error>> {
    if path.exists() {
        return WorldGenConfig::load(path);
    }
    log::warn!("{} not found; using the built-in worldgen", path.display());
    WorldGenConfig::from_toml_str(BUILTIN_WORLDGEN)
}

fn load_session(path: &Path) -> Result<SessionConfig, Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    let cfg: SessionConfig = toml::from_str(&text)?;
    log::info!("loaded session settings from {}", path.display());
    Ok(cfg)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run(Args::parse()) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let session = match &args.config {
        Some(p) => load_session(p)?.session,
        None => SessionSection::default(),
    };
    let root = assets::resolve_assets_root(args.assets.clone());
    let blocks_path = args.blocks.clone().unwrap_or_else(|| assets::blocks_path(&root));
    let worldgen_path = args.worldgen.clone().unwrap_or_else(|| assets::worldgen_path(&root));

    let reg = Arc::new(load_registry(&blocks_path)?);
    let mut cfg = load_worldgen(&worldgen_path)?;
    if let Some(seed) = args.seed {
        cfg.world.seed = seed;
    }
    let terrain = Arc::new(TerrainGenerator::new(&cfg, &reg)?);
    let dims = terrain.dims();

    let save_dir = args.save_dir.clone().or(session.save_dir);
    let persistence: Option<Arc<dyn ChunkPersistence>> = match &save_dir {
        Some(dir) => {
            let saves = DirPersistence::open(dir)?;
            log::info!("{} saved chunk(s) on disk", saves.stored_coords()?.len());
            Some(Arc::new(saves))
        }
        None => None,
    };
    let lighting = cfg.world.enable_lighting && session.lighting.unwrap_or(true) && !args.no_lighting;
    let mut pcfg = PipelineConfig {
        lighting_enabled: lighting,
        ..PipelineConfig::default()
    };
    if let Some(w) = args.workers.or(session.workers) {
        pcfg.workers = w.max(1);
    }
    log::info!(
        "world {}x{} chunks of {}x{}x{}, seed {}, {} workers, lighting {}",
        dims.world_size_in_chunks,
        dims.world_size_in_chunks,
        dims.chunk_width,
        dims.chunk_height,
        dims.chunk_width,
        cfg.world.seed,
        pcfg.workers,
        if lighting { "on" } else { "off" }
    );
    let mut pipeline = Pipeline::new(Arc::clone(&reg), terrain, persistence, pcfg)?;
    let timeout = Duration::from_secs(args.timeout_secs);

    let center = dims.center_chunk();
    let radius = args.radius.or(session.radius).unwrap_or(2).max(0);
    let mut coords: Vec<ChunkCoord> = Vec::new();
    for dz in -radius..=radius {
        for dx in -radius..=radius {
            coords.push(center.offset(dx, dz));
        }
    }
    coords.sort_by_key(|c| c.distance_sq(center));
    let requested = coords.into_iter().filter(|c| pipeline.request_chunk(*c)).count();

    let t0 = Instant::now();
    if !pipeline.run_until_idle(timeout) {
        return Err(format!("region did not settle within {timeout:?}").into());
    }
    report_region(&mut pipeline, requested, t0.elapsed());

    try_edit(&mut pipeline, &reg, center, timeout)?;

    if save_dir.is_some() {
        let saved = pipeline.store().save_modified()?;
        log::info!("wrote {saved} chunk(s)");
    }
    Ok(())
}

fn report_region(pipeline: &mut Pipeline, requested: usize, elapsed: Duration) {
    let uploads = pipeline.take_mesh_uploads();
    let mut tris = [0usize; 3];
    let mut faces = 0usize;
    for m in pipeline.meshes() {
        faces += m.faces;
        for (t, n) in tris.iter_mut().zip(m.bucket_triangles()) {
            *t += n;
        }
    }
    log::info!(
        "built {requested} chunk(s) in {:.2}s, {} mesh upload(s), {faces} faces",
        elapsed.as_secs_f32(),
        uploads.len()
    );
    for (b, n) in Bucket::ALL.iter().zip(tris) {
        log::info!("  {b:?}: {n} triangles");
    }
    log::debug!("{:?}", pipeline.stats());
}

// Topmost solid voxel of a column, if the column is loaded.
fn surface_at(pipeline: &Pipeline, x: i32, z: i32) -> Option<VoxelPos> {
    let top = pipeline.store().dims().chunk_height - 1;
    (0..=top)
        .rev()
        .map(|y| VoxelPos::new(x, y, z))
        .find(|p| pipeline.store().is_voxel_solid(*p))
}

/// Sets a light source on the ground at the world center and reports the
/// light it casts on the next cell over.
fn try_edit(
    pipeline: &mut Pipeline,
    reg: &BlockRegistry,
    center: ChunkCoord,
    timeout: Duration,
) -> Result<(), Box<dyn Error>> {
    let Some(glow) = reg.id_by_name("glowstone") else {
        log::info!("no glowstone block registered; skipping the edit");
        return Ok(());
    };
    let dims = pipeline.store().dims();
    let mid = dims.chunk_width / 2;
    let col = dims.to_global(center, LocalPos::new(mid, 0, mid));
    let Some(ground) = surface_at(pipeline, col.x, col.z) else {
        return Ok(());
    };
    let at = ground.offset(0, 1, 0);
    if !dims.contains(at) {
        return Ok(());
    }
    let t0 = Instant::now();
    if !pipeline.modify_voxel(at, glow, Orientation::North) {
        return Err(format!("edit at {at:?} was rejected").into());
    }
    if !pipeline.run_until_idle(timeout) {
        return Err(format!("edit at {at:?} did not settle within {timeout:?}").into());
    }
    let beside = pipeline.store().get_light(at.offset(1, 0, 0));
    let remeshed = pipeline.take_mesh_uploads().len();
    log::info!(
        "placed glowstone at ({}, {}, {}) in {} ms; light beside it {beside:?}, {remeshed} chunk(s) remeshed",
        at.x,
        at.y,
        at.z,
        t0.elapsed().as_millis()
    );
    Ok(())
}
