use std::error::Error;

use tessera_blocks::{BlockId, BlockRegistry};

use super::flora::StructureKind;
use crate::worldgen::{BiomeConfig, FloraConfig, LodeConfig};

/// Ore placement rule. Applies to interior stone strictly inside
/// `(min_height, max_height)` when the 3D noise test passes.
#[derive(Clone, Debug, PartialEq)]
pub struct Lode {
    pub block: BlockId,
    pub min_height: i32,
    pub max_height: i32,
    pub scale: f32,
    pub threshold: f32,
    pub offset: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FloraRule {
    pub kind: StructureKind,
    pub zone_scale: f32,
    pub zone_threshold: f32,
    pub placement_scale: f32,
    pub placement_threshold: f32,
    pub min_height: i32,
    pub max_height: i32,
}

/// A biome with block names resolved against the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeDefinition {
    pub name: String,
    pub offset: f32,
    pub scale: f32,
    pub terrain_height: f32,
    pub terrain_scale: f32,
    pub surface: BlockId,
    pub subsurface: BlockId,
    pub lodes: Vec<Lode>,
    /// `None` when the biome places no flora.
    pub flora: Option<FloraRule>,
}

impl BiomeDefinition {
    pub fn resolve(cfg: &BiomeConfig, reg: &BlockRegistry) -> Result<Self, Box<dyn Error>> {
        let lodes = cfg
            .lodes
            .iter()
            .map(|l| resolve_lode(l, reg))
            .collect::<Result<Vec<_>, _>>()?;
        let flora = match &cfg.flora {
            Some(f) if f.enabled => Some(resolve_flora(&cfg.name, f)?),
            _ => None,
        };
        Ok(Self {
            name: cfg.name.clone(),
            offset: cfg.offset,
            scale: cfg.scale,
            terrain_height: cfg.terrain_height,
            terrain_scale: cfg.terrain_scale,
            surface: reg.require(&cfg.surface)?,
            subsurface: reg.require(&cfg.subsurface)?,
            lodes,
            flora,
        })
    }
}

fn resolve_lode(l: &LodeConfig, reg: &BlockRegistry) -> Result<Lode, Box<dyn Error>> {
    Ok(Lode {
        block: reg.require(&l.block)?,
        min_height: l.min_height,
        max_height: l.max_height,
        scale: l.scale,
        threshold: l.threshold,
        offset: l.offset,
    })
}

fn resolve_flora(biome: &str, f: &FloraConfig) -> Result<FloraRule, Box<dyn Error>> {
    let kind = StructureKind::from_name(&f.structure)
        .ok_or_else(|| format!("biome '{biome}': unknown flora structure '{}'", f.structure))?;
    Ok(FloraRule {
        kind,
        zone_scale: f.zone_scale,
        zone_threshold: f.zone_threshold,
        placement_scale: f.placement_scale,
        placement_threshold: f.placement_threshold,
        min_height: f.min_height,
        max_height: f.max_height,
    })
}
