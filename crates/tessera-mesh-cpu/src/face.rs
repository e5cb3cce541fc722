use tessera_geom::Vec3;

use crate::constants::FACE_VERTS;

/// Logical cube face. The discriminant is also the block's texture slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    Back = 0,
    Front = 1,
    Top = 2,
    Bottom = 3,
    Left = 4,
    Right = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Back,
        Face::Front,
        Face::Top,
        Face::Bottom,
        Face::Left,
        Face::Right,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Integer step `(dx, dy, dz)` out of this face.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Face::Back => (0, 0, -1),
            Face::Front => (0, 0, 1),
            Face::Top => (0, 1, 0),
            Face::Bottom => (0, -1, 0),
            Face::Left => (-1, 0, 0),
            Face::Right => (1, 0, 0),
        }
    }

    #[inline]
    pub fn normal(self) -> Vec3 {
        let (x, y, z) = self.delta();
        Vec3::new(x as f32, y as f32, z as f32)
    }

    /// The face that ends up pointing this way after `turns` quarter turns of
    /// yaw. One turn takes front to left, left to back, back to right.
    #[inline]
    pub fn rotated(self, turns: u8) -> Face {
        let mut f = self;
        for _ in 0..(turns % 4) {
            f = match f {
                Face::Front => Face::Left,
                Face::Left => Face::Back,
                Face::Back => Face::Right,
                Face::Right => Face::Front,
                vertical => vertical,
            };
        }
        f
    }

    #[inline]
    pub(crate) fn corners(self) -> [usize; 4] {
        FACE_VERTS[self.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CUBE_VERTS, QUAD_TRIS};

    fn corner(i: usize) -> Vec3 {
        let [x, y, z] = CUBE_VERTS[i];
        Vec3::new(x, y, z)
    }

    fn cross(a: Vec3, b: Vec3) -> Vec3 {
        Vec3::new(a.y * b.z - a.z * b.y, a.z * b.x - a.x * b.z, a.x * b.y - a.y * b.x)
    }

    #[test]
    fn triangles_wind_outward() {
        for f in Face::ALL {
            let c = f.corners();
            for tri in QUAD_TRIS.chunks(3) {
                let [a, b, d] = [0, 1, 2].map(|k| corner(c[tri[k] as usize]));
                let n = cross(b - a, d - a);
                assert!(n.dot(f.normal()) > 0.0, "{f:?} winds inward");
            }
        }
    }

    #[test]
    fn face_corners_lie_on_the_face() {
        for f in Face::ALL {
            let n = f.normal();
            let plane = if n.x + n.y + n.z > 0.0 { 1.0 } else { 0.0 };
            for i in f.corners() {
                let p = corner(i);
                assert_eq!(p.dot(n).abs(), plane, "{f:?} corner {i}");
            }
        }
    }

    #[test]
    fn rotation_agrees_with_vector_rotation() {
        for f in Face::ALL {
            for turns in 0..4u8 {
                let rotated = f.normal().rotate_quarter_turns(turns);
                assert_eq!(f.rotated(turns).normal(), rotated, "{f:?} x{turns}");
            }
            assert_eq!(f.rotated(4), f);
        }
        assert_eq!(Face::Top.rotated(3), Face::Top);
    }
}
