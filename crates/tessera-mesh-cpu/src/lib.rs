//! CPU meshing: per-voxel face culling and vertex emission by material bucket.
#![forbid(unsafe_code)]

mod chunk;
mod constants;
mod face;
mod mesh_build;

pub use chunk::ChunkMesh;
pub use face::Face;
pub use mesh_build::{Bucket, FaceQuad, MeshBuild, atlas_tile};

use tessera_blocks::{BlockRegistry, BlockType, MAX_LIGHT, MaterialClass, Voxel};
use tessera_chunk::Neighborhood;
use tessera_geom::Vec3;
use tessera_world::LocalPos;

/// Whether a voxel produces any geometry at all.
#[inline]
pub fn is_meshed(ty: &BlockType) -> bool {
    ty.solid || ty.material.is_water()
}

/// Face culling against the neighbor in the face's world direction.
/// `None` means no data there (world edge or missing snapshot).
#[inline]
pub fn face_visible(me: &BlockType, neighbor: Option<&BlockType>) -> bool {
    let Some(n) = neighbor else {
        return true;
    };
    match me.material {
        MaterialClass::Water => !n.material.is_water(),
        MaterialClass::RenderBothSides => !n.solid || n.material.renders_both_sides(),
        MaterialClass::Opaque => n.material.renders_both_sides() || !n.solid,
    }
}

/// Face brightness from the light of the cell it looks into.
#[inline]
pub fn face_shade(neighbor: Option<Voxel>) -> f32 {
    neighbor.map_or(1.0, |v| v.light() as f32 / MAX_LIGHT as f32)
}

#[inline]
fn neighbor_at(voxels: &[Voxel], nb: &Neighborhood, l: LocalPos) -> Option<Voxel> {
    if nb.dims.local_in_bounds(l) {
        Some(voxels[nb.dims.index(l)])
    } else {
        nb.get_outside(l)
    }
}

/// Builds the mesh for one chunk from its (lit) voxels and whatever neighbor
/// snapshots are available.
pub fn build_chunk_mesh(reg: &BlockRegistry, voxels: &[Voxel], nb: &Neighborhood) -> ChunkMesh {
    let dims = nb.dims;
    let mut build = MeshBuild::default();
    let mut faces = 0usize;
    for (i, &v) in voxels.iter().enumerate() {
        let Some(ty) = reg.get(v.id()) else {
            continue;
        };
        if !is_meshed(ty) {
            continue;
        }
        let l = dims.local_at(i);
        let g = nb.global(l);
        let origin = Vec3::new(g.x as f32, g.y as f32, g.z as f32);
        let turns = v.orientation().quarter_turns();
        let bucket = Bucket::for_material(ty.material);
        for face in Face::ALL {
            let (dx, dy, dz) = face.rotated(turns).delta();
            let n = neighbor_at(voxels, nb, l.offset(dx, dy, dz));
            if !face_visible(ty, n.and_then(|n| reg.get(n.id()))) {
                continue;
            }
            build.add_face(
                FaceQuad {
                    origin,
                    face,
                    turns,
                    texture: ty.texture(face.index()),
                    shade: face_shade(n),
                    bucket,
                },
                reg.atlas_size_in_blocks,
            );
            faces += 1;
        }
    }
    log::trace!(
        "meshed {}: {} faces, {} vertices",
        nb.coord,
        faces,
        build.vertex_count()
    );
    ChunkMesh {
        coord: nb.coord,
        build,
        faces,
    }
}
