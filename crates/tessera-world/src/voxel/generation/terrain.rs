use std::error::Error;

use tessera_blocks::{BlockId, BlockRegistry, Orientation, Voxel};

use super::biome::BiomeDefinition;
use super::flora::{FloraPlacement, StructureIds, VoxelMod, generate_structure};
use super::noise::PerlinField;
use crate::voxel::{ChunkCoord, LocalPos, VoxelPos, WorldDims};
use crate::worldgen::WorldGenConfig;

const FLORA_ZONE_OFFSET: f32 = 0.0;
const FLORA_PLACEMENT_OFFSET: f32 = 2500.0;

/// Terrain height and dominant biome of one (x, z) column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnSample {
    pub height: i32,
    pub biome: usize,
}

/// Output of the generate stage for one chunk.
#[derive(Clone, Debug)]
pub struct GeneratedChunk {
    pub coord: ChunkCoord,
    pub voxels: Vec<Voxel>,
    pub flora: Vec<FloraPlacement>,
}

/// Deterministic block-id field. Shared read-only across workers.
pub struct TerrainGenerator {
    dims: WorldDims,
    noise: PerlinField,
    ground_height: i32,
    sea_level: i32,
    subsurface_depth: i32,
    bedrock: BlockId,
    stone: BlockId,
    water: BlockId,
    air: BlockId,
    biomes: Vec<BiomeDefinition>,
    structures: StructureIds,
}

impl TerrainGenerator {
    pub fn new(cfg: &WorldGenConfig, reg: &BlockRegistry) -> Result<Self, Box<dyn Error>> {
        let dims = cfg.dims();
        let t = &cfg.terrain;
        let biomes = cfg
            .biomes
            .iter()
            .map(|b| BiomeDefinition::resolve(b, reg))
            .collect::<Result<Vec<_>, _>>()?;
        if biomes.is_empty() {
            return Err("terrain generator needs at least one biome".into());
        }
        // Structure blocks are only required when some biome places flora.
        let wants_flora = biomes.iter().any(|b| b.flora.is_some());
        let lookup = |name: &str| -> Result<BlockId, Box<dyn Error>> {
            if wants_flora {
                reg.require(name)
            } else {
                Ok(reg.id_by_name(name).unwrap_or(0))
            }
        };
        let structures = StructureIds {
            trunk: lookup(&cfg.structures.tree_trunk)?,
            leaves: lookup(&cfg.structures.tree_leaves)?,
            cactus: lookup(&cfg.structures.cactus)?,
        };
        Ok(Self {
            dims,
            noise: PerlinField::new(cfg.world.seed, dims.chunk_width),
            ground_height: t.ground_height,
            sea_level: t.sea_level,
            subsurface_depth: t.subsurface_depth,
            bedrock: reg.require(&t.bedrock)?,
            stone: reg.require(&t.stone)?,
            water: reg.require(&t.water)?,
            air: reg.require(&t.air)?,
            biomes,
            structures,
        })
    }

    #[inline]
    pub fn dims(&self) -> WorldDims {
        self.dims
    }

    pub fn biomes(&self) -> &[BiomeDefinition] {
        &self.biomes
    }

    /// Mean of the positive per-biome height contributions on top of the
    /// ground height; the biome with the largest weight dominates.
    pub fn height_at(&self, x: i32, z: i32) -> ColumnSample {
        let mut sum = 0.0f32;
        let mut count = 0u32;
        let mut strongest = 0usize;
        let mut strongest_weight = f32::MIN;
        for (i, b) in self.biomes.iter().enumerate() {
            let weight = self.noise.get_2d(x, z, b.offset, b.scale);
            if weight > strongest_weight {
                strongest_weight = weight;
                strongest = i;
            }
            let h = b.terrain_height * self.noise.get_2d(x, z, 0.0, b.terrain_scale) * weight;
            if h > 0.0 {
                sum += h;
                count += 1;
            }
        }
        let mean = if count > 0 { sum / count as f32 } else { 0.0 };
        let height = ((mean + self.ground_height as f32).floor() as i32).clamp(0, self.dims.chunk_height - 1);
        ColumnSample {
            height,
            biome: strongest,
        }
    }

    pub fn voxel_at(&self, p: VoxelPos) -> BlockId {
        if !self.dims.contains(p) {
            return self.air;
        }
        let col = self.height_at(p.x, p.z);
        self.voxel_in_column(p, col)
    }

    fn voxel_in_column(&self, p: VoxelPos, col: ColumnSample) -> BlockId {
        let y = p.y;
        if y == 0 {
            return self.bedrock;
        }
        let biome = &self.biomes[col.biome];
        let h = col.height;
        if y == h {
            return biome.surface;
        }
        if y < h && y >= h - self.subsurface_depth {
            return biome.subsurface;
        }
        if y > h {
            return if y < self.sea_level { self.water } else { self.air };
        }
        let mut id = self.stone;
        for lode in &biome.lodes {
            if y > lode.min_height
                && y < lode.max_height
                && self.noise.get_3d(p, lode.offset, lode.scale, lode.threshold)
            {
                id = lode.block;
            }
        }
        id
    }

    /// Flora queued at the surface voxel of a column, if both noise tests pass.
    pub fn flora_at(&self, x: i32, z: i32, col: ColumnSample) -> Option<FloraPlacement> {
        let rule = self.biomes[col.biome].flora.as_ref()?;
        if self.noise.get_2d(x, z, FLORA_ZONE_OFFSET, rule.zone_scale) <= rule.zone_threshold {
            return None;
        }
        if self.noise.get_2d(x, z, FLORA_PLACEMENT_OFFSET, rule.placement_scale)
            <= rule.placement_threshold
        {
            return None;
        }
        Some(FloraPlacement {
            origin: VoxelPos::new(x, col.height, z),
            kind: rule.kind,
            min_height: rule.min_height,
            max_height: rule.max_height,
        })
    }

    pub fn generate_structure(&self, p: &FloraPlacement) -> Vec<VoxelMod> {
        generate_structure(&self.noise, &self.structures, p)
    }

    /// Fills a fresh chunk array column by column. Light starts at zero.
    pub fn generate_chunk(&self, coord: ChunkCoord) -> GeneratedChunk {
        let d = self.dims;
        let mut voxels = vec![Voxel::pack(self.air, 0, 0, Orientation::North); d.voxel_count()];
        let mut flora = Vec::new();
        for lx in 0..d.chunk_width {
            for lz in 0..d.chunk_width {
                let g = d.to_global(coord, LocalPos::new(lx, 0, lz));
                let col = self.height_at(g.x, g.z);
                for y in 0..d.chunk_height {
                    let id = self.voxel_in_column(VoxelPos::new(g.x, y, g.z), col);
                    voxels[d.index(LocalPos::new(lx, y, lz))] = Voxel::pack(id, 0, 0, Orientation::North);
                }
                if let Some(p) = self.flora_at(g.x, g.z, col) {
                    flora.push(p);
                }
            }
        }
        log::trace!("generated chunk {coord}: {} flora placements", flora.len());
        GeneratedChunk {
            coord,
            voxels,
            flora,
        }
    }
}
