use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::voxel::WorldDims;

/// Top-level worldgen file. Every section has defaults, so an empty file
/// yields a small single-biome world.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WorldGenConfig {
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub terrain: TerrainSection,
    #[serde(default)]
    pub structures: StructureBlocks,
    #[serde(default = "default_biomes")]
    pub biomes: Vec<BiomeConfig>,
}

impl WorldGenConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: WorldGenConfig = toml::from_str(toml_str)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let cfg = Self::from_toml_str(&text)?;
        log::info!(
            "loaded worldgen from {} ({} biomes, seed {})",
            path.display(),
            cfg.biomes.len(),
            cfg.world.seed
        );
        Ok(cfg)
    }

    pub fn dims(&self) -> WorldDims {
        WorldDims::new(
            self.world.chunk_width,
            self.world.chunk_height,
            self.world.world_size_in_chunks,
        )
    }

    fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.biomes.is_empty() {
            return Err("worldgen needs at least one biome".into());
        }
        let w = &self.world;
        if w.chunk_width < 1 || w.chunk_height < 2 || w.world_size_in_chunks < 1 {
            return Err(format!(
                "invalid world dimensions {}x{}x{} chunks",
                w.chunk_width, w.chunk_height, w.world_size_in_chunks
            )
            .into());
        }
        for b in &self.biomes {
            if let Some(f) = &b.flora {
                if f.min_height > f.max_height {
                    return Err(format!(
                        "biome '{}': flora min_height {} exceeds max_height {}",
                        b.name, f.min_height, f.max_height
                    )
                    .into());
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct WorldSection {
    #[serde(default = "default_seed")]
    pub seed: i32,
    #[serde(default = "default_chunk_width")]
    pub chunk_width: i32,
    #[serde(default = "default_chunk_height")]
    pub chunk_height: i32,
    #[serde(default = "default_world_size")]
    pub world_size_in_chunks: i32,
    #[serde(default = "default_true")]
    pub enable_lighting: bool,
}
fn default_seed() -> i32 {
    1337
}
fn default_chunk_width() -> i32 {
    16
}
fn default_chunk_height() -> i32 {
    128
}
fn default_world_size() -> i32 {
    100
}
fn default_true() -> bool {
    true
}
impl Default for WorldSection {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            chunk_width: default_chunk_width(),
            chunk_height: default_chunk_height(),
            world_size_in_chunks: default_world_size(),
            enable_lighting: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TerrainSection {
    #[serde(default = "default_ground_height")]
    pub ground_height: i32,
    #[serde(default = "default_sea_level")]
    pub sea_level: i32,
    #[serde(default = "default_subsurface_depth")]
    pub subsurface_depth: i32,
    #[serde(default = "default_bedrock")]
    pub bedrock: String,
    #[serde(default = "default_stone")]
    pub stone: String,
    #[serde(default = "default_water")]
    pub water: String,
    #[serde(default = "default_air")]
    pub air: String,
}
fn default_ground_height() -> i32 {
    42
}
fn default_sea_level() -> i32 {
    51
}
fn default_subsurface_depth() -> i32 {
    3
}
fn default_bedrock() -> String {
    "bedrock".into()
}
fn default_stone() -> String {
    "stone".into()
}
fn default_water() -> String {
    "water".into()
}
fn default_air() -> String {
    "air".into()
}
impl Default for TerrainSection {
    fn default() -> Self {
        Self {
            ground_height: default_ground_height(),
            sea_level: default_sea_level(),
            subsurface_depth: default_subsurface_depth(),
            bedrock: default_bedrock(),
            stone: default_stone(),
            water: default_water(),
            air: default_air(),
        }
    }
}

// Block names used when expanding structures.
#[derive(Clone, Debug, Deserialize)]
pub struct StructureBlocks {
    #[serde(default = "default_trunk")]
    pub tree_trunk: String,
    #[serde(default = "default_leaves")]
    pub tree_leaves: String,
    #[serde(default = "default_cactus")]
    pub cactus: String,
}
fn default_trunk() -> String {
    "wood".into()
}
fn default_leaves() -> String {
    "leaves".into()
}
fn default_cactus() -> String {
    "cactus".into()
}
impl Default for StructureBlocks {
    fn default() -> Self {
        Self {
            tree_trunk: default_trunk(),
            tree_leaves: default_leaves(),
            cactus: default_cactus(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BiomeConfig {
    pub name: String,
    /// Noise offset of this biome's weight field.
    #[serde(default)]
    pub offset: f32,
    /// Noise scale of this biome's weight field.
    #[serde(default = "default_biome_scale")]
    pub scale: f32,
    #[serde(default = "default_terrain_height")]
    pub terrain_height: f32,
    #[serde(default = "default_terrain_scale")]
    pub terrain_scale: f32,
    pub surface: String,
    pub subsurface: String,
    // Evaluated in declaration order; the last passing rule wins.
    #[serde(default)]
    pub lodes: Vec<LodeConfig>,
    #[serde(default)]
    pub flora: Option<FloraConfig>,
}
fn default_biome_scale() -> f32 {
    0.05
}
fn default_terrain_height() -> f32 {
    22.0
}
fn default_terrain_scale() -> f32 {
    0.25
}

#[derive(Clone, Debug, Deserialize)]
pub struct LodeConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub block: String,
    pub min_height: i32,
    pub max_height: i32,
    pub scale: f32,
    pub threshold: f32,
    #[serde(default)]
    pub offset: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FloraConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// "tree" or "cactus".
    pub structure: String,
    #[serde(default = "default_zone_scale")]
    pub zone_scale: f32,
    #[serde(default = "default_zone_threshold")]
    pub zone_threshold: f32,
    #[serde(default = "default_placement_scale")]
    pub placement_scale: f32,
    #[serde(default = "default_placement_threshold")]
    pub placement_threshold: f32,
    #[serde(default = "default_min_flora")]
    pub min_height: i32,
    #[serde(default = "default_max_flora")]
    pub max_height: i32,
}
fn default_zone_scale() -> f32 {
    1.3
}
fn default_zone_threshold() -> f32 {
    0.6
}
fn default_placement_scale() -> f32 {
    15.0
}
fn default_placement_threshold() -> f32 {
    0.8
}
fn default_min_flora() -> i32 {
    5
}
fn default_max_flora() -> i32 {
    12
}

fn default_biomes() -> Vec<BiomeConfig> {
    vec![BiomeConfig {
        name: "plains".into(),
        offset: 0.0,
        scale: default_biome_scale(),
        terrain_height: default_terrain_height(),
        terrain_scale: default_terrain_scale(),
        surface: "grass".into(),
        subsurface: "dirt".into(),
        lodes: Vec::new(),
        flora: None,
    }]
}
