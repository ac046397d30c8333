use thiserror::Error;

/// Malformed shape geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Interleaved buffer is not exactly 4 vertices of 7 floats.
    #[error("shape buffer must hold {expected} floats, got {actual}")]
    Length { expected: usize, actual: usize },

    /// Vertices do not share one depth.
    #[error("shape is not flat in depth: vertex {vertex} has z = {z}, first vertex has z = {first}")]
    NonPlanar { vertex: usize, z: f32, first: f32 },

    #[error("shape scalar at index {index} is not finite")]
    NonFinite { index: usize },
}
