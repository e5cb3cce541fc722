use crate::voxel::VoxelPos;
use tessera_blocks::BlockId;

use super::noise::PerlinField;

/// A deferred single-voxel edit produced by structure expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelMod {
    pub pos: VoxelPos,
    pub id: BlockId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StructureKind {
    Tree,
    Cactus,
}

impl StructureKind {
    pub fn from_name(s: &str) -> Option<StructureKind> {
        match s {
            "tree" => Some(StructureKind::Tree),
            "cactus" => Some(StructureKind::Cactus),
            _ => None,
        }
    }
}

/// A structure queued by the generate stage, expanded later on the
/// coordinator where neighboring chunks can be reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FloraPlacement {
    pub origin: VoxelPos,
    pub kind: StructureKind,
    pub min_height: i32,
    pub max_height: i32,
}

pub(super) struct StructureIds {
    pub trunk: BlockId,
    pub leaves: BlockId,
    pub cactus: BlockId,
}

const TREE_HEIGHT_OFFSET: f32 = 250.0;
const TREE_HEIGHT_SCALE: f32 = 3.0;
const CACTUS_HEIGHT_OFFSET: f32 = 23456.0;
const CACTUS_HEIGHT_SCALE: f32 = 2.0;

fn noise_height(noise: &PerlinField, origin: VoxelPos, offset: f32, scale: f32, min: i32, max: i32) -> i32 {
    let n = noise.get_2d(origin.x, origin.z, offset, scale);
    ((max as f32 * n) as i32).clamp(min, max)
}

pub(super) fn generate_structure(
    noise: &PerlinField,
    ids: &StructureIds,
    p: &FloraPlacement,
) -> Vec<VoxelMod> {
    match p.kind {
        StructureKind::Tree => make_tree(noise, ids, p.origin, p.min_height, p.max_height),
        StructureKind::Cactus => make_cactus(noise, ids, p.origin, p.min_height, p.max_height),
    }
}

fn make_tree(noise: &PerlinField, ids: &StructureIds, o: VoxelPos, min: i32, max: i32) -> Vec<VoxelMod> {
    let height = noise_height(noise, o, TREE_HEIGHT_OFFSET, TREE_HEIGHT_SCALE, min, max);
    let mut mods = Vec::with_capacity(height as usize + 48);
    for i in 1..height {
        mods.push(VoxelMod {
            pos: o.offset(0, i, 0),
            id: ids.trunk,
        });
    }
    // Two wide layers around the trunk top, then a narrow cap.
    let top = o.y + height;
    for dy in -2..=1 {
        let r: i32 = if dy < 0 { 2 } else { 1 };
        for dx in -r..=r {
            for dz in -r..=r {
                if r == 2 && dx.abs() == 2 && dz.abs() == 2 {
                    continue;
                }
                if dx == 0 && dz == 0 && dy < 0 {
                    continue;
                }
                mods.push(VoxelMod {
                    pos: VoxelPos::new(o.x + dx, top + dy, o.z + dz),
                    id: ids.leaves,
                });
            }
        }
    }
    mods
}

fn make_cactus(noise: &PerlinField, ids: &StructureIds, o: VoxelPos, min: i32, max: i32) -> Vec<VoxelMod> {
    let height = noise_height(noise, o, CACTUS_HEIGHT_OFFSET, CACTUS_HEIGHT_SCALE, min, max);
    (1..=height)
        .map(|i| VoxelMod {
            pos: o.offset(0, i, 0),
            id: ids.cactus,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDS: StructureIds = StructureIds {
        trunk: 6,
        leaves: 7,
        cactus: 8,
    };

    #[test]
    fn tree_trunk_height_within_bounds() {
        let noise = PerlinField::new(3, 16);
        for x in 0..40 {
            let o = VoxelPos::new(x * 11, 60, x * 7);
            let p = FloraPlacement {
                origin: o,
                kind: StructureKind::Tree,
                min_height: 4,
                max_height: 9,
            };
            let mods = generate_structure(&noise, &IDS, &p);
            let trunk: Vec<_> = mods.iter().filter(|m| m.id == IDS.trunk).collect();
            let height = trunk.len() as i32 + 1;
            assert!((4..=9).contains(&height), "height {height}");
            for (i, m) in trunk.iter().enumerate() {
                assert_eq!(m.pos, o.offset(0, i as i32 + 1, 0));
            }
            // Trunk first so the canopy never replaces it.
            assert!(mods[..trunk.len()].iter().all(|m| m.id == IDS.trunk));
            assert!(mods.iter().any(|m| m.id == IDS.leaves && m.pos == o.offset(0, height + 1, 0)));
        }
    }

    #[test]
    fn cactus_is_a_single_column() {
        let noise = PerlinField::new(3, 16);
        let o = VoxelPos::new(100, 55, -20);
        let p = FloraPlacement {
            origin: o,
            kind: StructureKind::Cactus,
            min_height: 2,
            max_height: 5,
        };
        let mods = generate_structure(&noise, &IDS, &p);
        assert!((2..=5).contains(&(mods.len() as i32)));
        for (i, m) in mods.iter().enumerate() {
            assert_eq!(m.id, IDS.cactus);
            assert_eq!(m.pos, o.offset(0, i as i32 + 1, 0));
        }
    }
}
