use std::sync::Arc;

use tessera_blocks::Voxel;
use tessera_world::{ChunkCoord, HORIZONTAL_DIRS, LocalPos, VoxelPos, WorldDims};

/// Read-only arrays of the four horizontal neighbors, taken when a stage
/// starts. A missing entry means "no data yet".
#[derive(Clone, Debug)]
pub struct Neighborhood {
    pub coord: ChunkCoord,
    pub dims: WorldDims,
    pub sides: [Option<Arc<Vec<Voxel>>>; 4],
}

impl Neighborhood {
    pub fn empty(coord: ChunkCoord, dims: WorldDims) -> Self {
        Self {
            coord,
            dims,
            sides: [None, None, None, None],
        }
    }

    /// Index into `sides` for a horizontal step, in `HORIZONTAL_DIRS` order.
    #[inline]
    pub fn side_index(dx: i32, dz: i32) -> Option<usize> {
        HORIZONTAL_DIRS.iter().position(|&d| d == (dx, dz))
    }

    pub fn set_side(&mut self, dx: i32, dz: i32, voxels: Arc<Vec<Voxel>>) {
        if let Some(i) = Self::side_index(dx, dz) {
            self.sides[i] = Some(voxels);
        }
    }

    pub fn has_side(&self, i: usize) -> bool {
        self.sides[i].is_some()
    }

    /// Which neighbor owns a position one step outside the chunk, and the
    /// position inside that neighbor. `None` above/below the world or on a
    /// diagonal.
    #[inline]
    pub fn resolve_outside(&self, l: LocalPos) -> Option<(usize, LocalPos)> {
        let w = self.dims.chunk_width;
        if l.y < 0 || l.y >= self.dims.chunk_height {
            return None;
        }
        let x_out = l.x < 0 || l.x >= w;
        let z_out = l.z < 0 || l.z >= w;
        match (x_out, z_out) {
            (true, false) => {
                let (side, x) = if l.x < 0 { (0, l.x + w) } else { (1, l.x - w) };
                Some((side, LocalPos::new(x, l.y, l.z)))
            }
            (false, true) => {
                let (side, z) = if l.z < 0 { (2, l.z + w) } else { (3, l.z - w) };
                Some((side, LocalPos::new(l.x, l.y, z)))
            }
            _ => None,
        }
    }

    /// Voxel just outside the chunk, read from the matching snapshot.
    #[inline]
    pub fn get_outside(&self, l: LocalPos) -> Option<Voxel> {
        let (side, nl) = self.resolve_outside(l)?;
        if !self.dims.local_in_bounds(nl) {
            return None;
        }
        let arr = self.sides[side].as_ref()?;
        Some(arr[self.dims.index(nl)])
    }

    /// Global position of a local coordinate, inside or just outside the chunk.
    #[inline]
    pub fn global(&self, l: LocalPos) -> VoxelPos {
        self.dims.to_global(self.coord, l)
    }
}
