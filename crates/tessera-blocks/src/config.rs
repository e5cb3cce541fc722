use serde::Deserialize;

use super::material::MaterialClass;

// Top-level blocks config file
#[derive(Deserialize, Debug, Clone)]
pub struct BlocksConfig {
    #[serde(default = "default_atlas_size")]
    pub atlas_size_in_blocks: u16,
    pub blocks: Vec<BlockDef>,
}

fn default_atlas_size() -> u16 {
    16
}

#[derive(Deserialize, Debug, Clone)]
pub struct BlockDef {
    pub name: String,
    // Defaults to the block's position in the list.
    #[serde(default)]
    pub id: Option<u16>,
    #[serde(default)]
    pub solid: Option<bool>,
    #[serde(default)]
    pub transparent: Option<bool>,
    #[serde(default)]
    pub opacity: Option<u8>,
    #[serde(default)]
    pub material: Option<MaterialClass>,
    #[serde(default)]
    pub textures: Option<TexturesDef>,
    #[serde(default)]
    pub stack_size: Option<u16>,
    #[serde(default)]
    pub emission: Option<u8>,
    #[serde(default)]
    pub active: Option<bool>,
}

// Face texture selectors. Specific faces beat side/top/bottom, which beat `all`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TexturesDef {
    #[serde(default)]
    pub all: Option<u16>,
    #[serde(default)]
    pub side: Option<u16>,
    #[serde(default)]
    pub top: Option<u16>,
    #[serde(default)]
    pub bottom: Option<u16>,
    #[serde(default)]
    pub back: Option<u16>,
    #[serde(default)]
    pub front: Option<u16>,
    #[serde(default)]
    pub left: Option<u16>,
    #[serde(default)]
    pub right: Option<u16>,
}
