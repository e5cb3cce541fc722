use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use super::config::{BlockDef, BlocksConfig, TexturesDef};
use super::material::MaterialClass;
use super::types::{BlockId, MAX_LIGHT};

/// Slot order of `BlockType::textures`: back, front, top, bottom, left, right.
pub const FACE_SLOTS: usize = 6;

#[derive(Clone, Debug)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub solid: bool,
    pub transparent: bool,
    /// Light attenuation when crossing this block, 0..=15.
    pub opacity: u8,
    pub textures: [u16; FACE_SLOTS],
    pub material: MaterialClass,
    pub stack_size: u16,
    pub emission: u8,
    pub active: bool,
}

impl BlockType {
    #[inline]
    pub fn texture(&self, slot: usize) -> u16 {
        self.textures[slot]
    }
}

#[derive(Default, Clone, Debug)]
pub struct BlockRegistry {
    pub blocks: Vec<BlockType>,
    pub by_name: HashMap<String, BlockId>,
    pub atlas_size_in_blocks: u16,
}

impl BlockRegistry {
    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.get(id as usize)
    }

    /// Lookup for ids already known to be registered (every stored voxel).
    #[inline]
    pub fn ty(&self, id: BlockId) -> &BlockType {
        &self.blocks[id as usize]
    }

    #[inline]
    pub fn contains(&self, id: BlockId) -> bool {
        (id as usize) < self.blocks.len()
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    /// Like `id_by_name` but reports a missing block as an error.
    pub fn require(&self, name: &str) -> Result<BlockId, Box<dyn Error>> {
        self.id_by_name(name)
            .ok_or_else(|| format!("unknown block name '{name}'").into())
    }

    #[inline]
    pub fn opacity(&self, id: BlockId) -> u8 {
        self.ty(id).opacity
    }

    #[inline]
    pub fn emission(&self, id: BlockId) -> u8 {
        self.ty(id).emission
    }

    #[inline]
    pub fn is_solid(&self, id: BlockId) -> bool {
        self.ty(id).solid
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let reg = Self::from_toml_str(&text)?;
        log::info!(
            "loaded {} block types from {}",
            reg.blocks.len(),
            path.display()
        );
        Ok(reg)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(toml_str)?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        if cfg.atlas_size_in_blocks == 0 {
            return Err("atlas_size_in_blocks must be at least 1".into());
        }
        let mut slots: Vec<Option<BlockType>> = Vec::new();
        let mut by_name = HashMap::new();
        for (i, def) in cfg.blocks.into_iter().enumerate() {
            let raw_id = def.id.unwrap_or(i as u16);
            if raw_id > BlockId::MAX as u16 {
                return Err(format!("block '{}' has id {raw_id}; ids must be <= 255", def.name).into());
            }
            let id = raw_id as BlockId;
            if by_name.insert(def.name.clone(), id).is_some() {
                return Err(format!("duplicate block name '{}'", def.name).into());
            }
            let idx = id as usize;
            if slots.len() <= idx {
                slots.resize(idx + 1, None);
            }
            if let Some(prev) = &slots[idx] {
                return Err(format!("blocks '{}' and '{}' share id {id}", prev.name, def.name).into());
            }
            slots[idx] = Some(compile_block(id, def)?);
        }
        let mut blocks = Vec::with_capacity(slots.len());
        for (idx, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(ty) => blocks.push(ty),
                None => return Err(format!("no block registered for id {idx}; ids must be contiguous from 0").into()),
            }
        }
        if blocks.is_empty() {
            return Err("block registry is empty".into());
        }
        Ok(BlockRegistry {
            blocks,
            by_name,
            atlas_size_in_blocks: cfg.atlas_size_in_blocks,
        })
    }
}

fn compile_block(id: BlockId, def: BlockDef) -> Result<BlockType, Box<dyn Error>> {
    let solid = def.solid.unwrap_or(true);
    let transparent = def.transparent.unwrap_or(!solid);
    let opacity = def
        .opacity
        .unwrap_or(if solid && !transparent { MAX_LIGHT } else { 0 });
    if opacity > MAX_LIGHT {
        return Err(format!("block '{}' opacity {opacity} exceeds {MAX_LIGHT}", def.name).into());
    }
    let emission = def.emission.unwrap_or(0);
    if emission > MAX_LIGHT {
        return Err(format!("block '{}' emission {emission} exceeds {MAX_LIGHT}", def.name).into());
    }
    Ok(BlockType {
        id,
        textures: resolve_textures(def.textures.unwrap_or_default()),
        name: def.name,
        solid,
        transparent,
        opacity,
        material: def.material.unwrap_or_default(),
        stack_size: def.stack_size.unwrap_or(64),
        emission,
        active: def.active.unwrap_or(false),
    })
}

fn resolve_textures(t: TexturesDef) -> [u16; FACE_SLOTS] {
    let all = t.all.unwrap_or(0);
    let side = t.side.unwrap_or(all);
    [
        t.back.unwrap_or(side),
        t.front.unwrap_or(side),
        t.top.unwrap_or(all),
        t.bottom.unwrap_or(all),
        t.left.unwrap_or(side),
        t.right.unwrap_or(side),
    ]
}
