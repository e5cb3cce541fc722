use super::chunk_coord::{ChunkCoord, LocalPos, VoxelPos};

/// Chunk and world extents plus every conversion between global, chunk,
/// local, and flat-array coordinates.
///
/// The world spans `[0, world_size_in_chunks * chunk_width)` on X and Z and
/// `[0, chunk_height)` on Y. Flat arrays are x-major: x varies slowest, then
/// y, then z.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldDims {
    pub chunk_width: i32,
    pub chunk_height: i32,
    pub world_size_in_chunks: i32,
}

impl WorldDims {
    pub const fn new(chunk_width: i32, chunk_height: i32, world_size_in_chunks: i32) -> Self {
        Self {
            chunk_width,
            chunk_height,
            world_size_in_chunks,
        }
    }

    #[inline]
    pub fn voxel_count(&self) -> usize {
        (self.chunk_width * self.chunk_height * self.chunk_width) as usize
    }

    #[inline]
    pub fn world_width(&self) -> i32 {
        self.chunk_width * self.world_size_in_chunks
    }

    /// Chunk at the middle of the world, where the driver starts streaming.
    #[inline]
    pub fn center_chunk(&self) -> ChunkCoord {
        ChunkCoord::new(self.world_size_in_chunks / 2, self.world_size_in_chunks / 2)
    }

    #[inline]
    pub fn contains(&self, p: VoxelPos) -> bool {
        let w = self.world_width();
        p.x >= 0 && p.x < w && p.z >= 0 && p.z < w && p.y >= 0 && p.y < self.chunk_height
    }

    #[inline]
    pub fn chunk_in_world(&self, c: ChunkCoord) -> bool {
        c.cx >= 0 && c.cx < self.world_size_in_chunks && c.cz >= 0 && c.cz < self.world_size_in_chunks
    }

    #[inline]
    pub fn chunk_of(&self, p: VoxelPos) -> ChunkCoord {
        ChunkCoord::new(
            p.x.div_euclid(self.chunk_width),
            p.z.div_euclid(self.chunk_width),
        )
    }

    #[inline]
    pub fn local_of(&self, p: VoxelPos) -> LocalPos {
        LocalPos::new(
            p.x.rem_euclid(self.chunk_width),
            p.y,
            p.z.rem_euclid(self.chunk_width),
        )
    }

    #[inline]
    pub fn to_global(&self, c: ChunkCoord, l: LocalPos) -> VoxelPos {
        VoxelPos::new(
            c.cx * self.chunk_width + l.x,
            l.y,
            c.cz * self.chunk_width + l.z,
        )
    }

    #[inline]
    pub fn local_in_bounds(&self, l: LocalPos) -> bool {
        l.x >= 0
            && l.x < self.chunk_width
            && l.y >= 0
            && l.y < self.chunk_height
            && l.z >= 0
            && l.z < self.chunk_width
    }

    /// Flat index of an in-bounds local position.
    #[inline]
    pub fn index(&self, l: LocalPos) -> usize {
        debug_assert!(self.local_in_bounds(l), "local position {l:?} out of range");
        ((l.x * self.chunk_height + l.y) * self.chunk_width + l.z) as usize
    }

    /// Inverse of `index`.
    #[inline]
    pub fn local_at(&self, idx: usize) -> LocalPos {
        let i = idx as i32;
        let z = i % self.chunk_width;
        let y = (i / self.chunk_width) % self.chunk_height;
        let x = i / (self.chunk_width * self.chunk_height);
        LocalPos::new(x, y, z)
    }
}

impl Default for WorldDims {
    fn default() -> Self {
        Self::new(16, 128, 100)
    }
}
