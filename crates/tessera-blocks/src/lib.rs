//! Packed voxel words, block types, and the block registry.
#![forbid(unsafe_code)]

pub mod config;
pub mod material;
pub mod registry;
pub mod types;

pub use material::MaterialClass;
pub use registry::{BlockRegistry, BlockType};
pub use types::{BlockId, LightChannel, MAX_LIGHT, Orientation, Voxel};
