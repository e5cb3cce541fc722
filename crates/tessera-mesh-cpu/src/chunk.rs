use tessera_world::ChunkCoord;

use crate::mesh_build::{Bucket, MeshBuild};

/// Geometry for one chunk, ready for a renderer to upload.
#[derive(Clone, Debug)]
pub struct ChunkMesh {
    pub coord: ChunkCoord,
    pub build: MeshBuild,
    pub faces: usize,
}

impl ChunkMesh {
    /// Triangle counts per bucket, in `Bucket::ALL` order.
    pub fn bucket_triangles(&self) -> [usize; 3] {
        Bucket::ALL.map(|b| self.build.triangle_count(b))
    }

    pub fn is_empty(&self) -> bool {
        self.faces == 0
    }
}
