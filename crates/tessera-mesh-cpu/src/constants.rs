//! Unit-cube templates shared by every face. Plain `const` tables.

/// Corners of the unit cube, indexed 0..8.
pub(crate) const CUBE_VERTS: [[f32; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0],
];

/// Cube corners of each face in `Face` order (back, front, top, bottom, left, right).
pub(crate) const FACE_VERTS: [[usize; 4]; 6] = [
    [0, 3, 1, 2],
    [5, 6, 4, 7],
    [3, 7, 2, 6],
    [1, 5, 0, 4],
    [4, 7, 0, 3],
    [1, 2, 5, 6],
];

/// Unit UV for the four vertices of a face.
pub(crate) const CORNER_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];

/// Two triangles over the four face vertices.
pub(crate) const QUAD_TRIS: [u32; 6] = [0, 1, 2, 2, 1, 3];
