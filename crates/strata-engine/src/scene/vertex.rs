use bytemuck::{Pod, Zeroable};

use crate::paint::Color;

/// Number of `f32` scalars in one interleaved vertex.
pub const FLOATS_PER_VERTEX: usize = 7;

/// Offset of the color attribute inside a vertex, in floats.
pub const COLOR_OFFSET_FLOATS: usize = 3;

/// Interleaved vertex: position (xyz) followed by color (rgba).
///
/// `#[repr(C)]` + `Pod` lets a vertex slice be viewed as a flat `&[f32]`
/// without copying.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    /// Byte distance between consecutive vertices.
    pub const STRIDE_BYTES: u64 = std::mem::size_of::<Vertex>() as u64;

    #[inline]
    pub const fn new(position: [f32; 3], color: Color) -> Self {
        Self {
            position,
            color: color.to_array(),
        }
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.position[2]
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.color.iter()).all(|v| v.is_finite())
    }
}
