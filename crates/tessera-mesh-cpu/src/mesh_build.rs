use tessera_blocks::MaterialClass;
use tessera_geom::Vec3;

use crate::constants::{CORNER_UVS, CUBE_VERTS, QUAD_TRIS};
use crate::face::Face;

/// Index bucket a face is drawn in.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Bucket {
    Opaque,
    Transparent,
    Water,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Opaque, Bucket::Transparent, Bucket::Water];

    #[inline]
    pub fn for_material(m: MaterialClass) -> Bucket {
        match m {
            MaterialClass::Opaque => Bucket::Opaque,
            MaterialClass::RenderBothSides => Bucket::Transparent,
            MaterialClass::Water => Bucket::Water,
        }
    }
}

/// Shared vertex streams plus three triangle index lists into them.
#[derive(Default, Clone, Debug)]
pub struct MeshBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    /// One shading scalar in `[0, 1]` per vertex.
    pub shade: Vec<f32>,
    pub opaque: Vec<u32>,
    pub transparent: Vec<u32>,
    pub water: Vec<u32>,
}

/// Everything needed to place one face.
#[derive(Copy, Clone, Debug)]
pub struct FaceQuad {
    /// Voxel's minimum corner in world space.
    pub origin: Vec3,
    /// Logical face, before orientation.
    pub face: Face,
    pub turns: u8,
    pub texture: u16,
    pub shade: f32,
    pub bucket: Bucket,
}

impl MeshBuild {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn indices(&self, bucket: Bucket) -> &[u32] {
        match bucket {
            Bucket::Opaque => &self.opaque,
            Bucket::Transparent => &self.transparent,
            Bucket::Water => &self.water,
        }
    }

    #[inline]
    fn indices_mut(&mut self, bucket: Bucket) -> &mut Vec<u32> {
        match bucket {
            Bucket::Opaque => &mut self.opaque,
            Bucket::Transparent => &mut self.transparent,
            Bucket::Water => &mut self.water,
        }
    }

    #[inline]
    pub fn triangle_count(&self, bucket: Bucket) -> usize {
        self.indices(bucket).len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }

    /// Appends one face: four vertices rotated about the voxel center, the
    /// rotated normal, atlas UVs for the face's texture and two triangles in
    /// the face's bucket.
    pub fn add_face(&mut self, q: FaceQuad, atlas_size_in_blocks: u16) {
        let base = self.vertex_count() as u32;
        let center = q.origin + Vec3::new(0.5, 0.5, 0.5);
        let n = q.face.normal().rotate_quarter_turns(q.turns);
        let (u0, v0, tile) = atlas_tile(q.texture, atlas_size_in_blocks);
        for (k, &ci) in q.face.corners().iter().enumerate() {
            let [cx, cy, cz] = CUBE_VERTS[ci];
            let p = (q.origin + Vec3::new(cx, cy, cz)).rotate_quarter_turns_about(center, q.turns);
            let [cu, cv] = CORNER_UVS[k];
            self.pos.extend_from_slice(&[p.x, p.y, p.z]);
            self.norm.extend_from_slice(&[n.x, n.y, n.z]);
            self.uv.extend_from_slice(&[u0 + cu * tile, v0 + cv * tile]);
            self.shade.push(q.shade);
        }
        self.indices_mut(q.bucket)
            .extend(QUAD_TRIS.iter().map(|&i| base + i));
    }
}

/// Bottom-left UV of a texture's tile and the tile size. Atlas row 0 is the
/// top row of the image, so rows count down from `v = 1`.
#[inline]
pub fn atlas_tile(texture: u16, atlas_size_in_blocks: u16) -> (f32, f32, f32) {
    let atlas = atlas_size_in_blocks.max(1);
    let tile = 1.0 / atlas as f32;
    let row = (texture / atlas) as f32;
    let col = (texture % atlas) as f32;
    (col * tile, 1.0 - (row + 1.0) * tile, tile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_rows_count_from_the_top() {
        assert_eq!(atlas_tile(0, 4), (0.0, 0.75, 0.25));
        assert_eq!(atlas_tile(5, 4), (0.25, 0.5, 0.25));
        assert_eq!(atlas_tile(15, 4), (0.75, 0.0, 0.25));
    }

    #[test]
    fn rotated_face_keeps_its_footprint() {
        let mut mb = MeshBuild::default();
        let q = FaceQuad {
            origin: Vec3::new(3.0, 1.0, 7.0),
            face: Face::Front,
            turns: 1,
            texture: 0,
            shade: 0.5,
            bucket: Bucket::Opaque,
        };
        mb.add_face(q, 16);
        assert_eq!(mb.vertex_count(), 4);
        assert_eq!(&mb.norm[0..3], &[-1.0, 0.0, 0.0]);
        // Front turned once sits on the voxel's -X plane.
        for v in mb.pos.chunks(3) {
            assert_eq!(v[0], 3.0);
            assert!((1.0..=2.0).contains(&v[1]));
            assert!((7.0..=8.0).contains(&v[2]));
        }
        assert_eq!(mb.opaque, vec![0, 1, 2, 2, 1, 3]);
        assert!(mb.shade.iter().all(|&s| s == 0.5));
    }
}
