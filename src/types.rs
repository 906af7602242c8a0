//! Vertex types and fixed geometry.

use bytemuck::{Pod, Zeroable};

/// A clip-space position, as consumed by the triangle shader.
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 3],
}

/// A quad corner: clip-space position plus texture coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct TexturedVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}

/// The flat-colored demo triangle.
pub const TRIANGLE: [Vertex; 3] = [
    Vertex {
        position: [0.0, 0.5, 0.0],
    },
    Vertex {
        position: [-0.5, -0.5, 0.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
    },
];

// vertex:                          texture:
//   [3]------------[0]              [3]------------[0]
//    |    (0, 0)    |                |              |
//   [2]------------[1]              [2]------------[1]
//
// t = 0 is the first row of the frame, drawn at the top.

/// Full-viewport quad.
pub const QUAD: [TexturedVertex; 4] = [
    TexturedVertex {
        position: [1.0, 1.0, 0.0],
        tex_coord: [1.0, 0.0],
    },
    TexturedVertex {
        position: [1.0, -1.0, 0.0],
        tex_coord: [1.0, 1.0],
    },
    TexturedVertex {
        position: [-1.0, -1.0, 0.0],
        tex_coord: [0.0, 1.0],
    },
    TexturedVertex {
        position: [-1.0, 1.0, 0.0],
        tex_coord: [0.0, 0.0],
    },
];

/// Two triangles covering [`QUAD`].
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];
