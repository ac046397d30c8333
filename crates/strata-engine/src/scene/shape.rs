use crate::paint::Color;

use super::depth::DepthKey;
use super::error::GeometryError;
use super::vertex::{FLOATS_PER_VERTEX, Vertex};

/// Vertices per quad.
pub const VERTICES_PER_SHAPE: usize = 4;

/// Length of a shape's interleaved buffer (4 vertices × 7 floats).
pub const FLOATS_PER_SHAPE: usize = VERTICES_PER_SHAPE * FLOATS_PER_VERTEX;

/// Planar, per-vertex-colored quadrilateral.
///
/// Invariants:
/// - exactly four vertices, in convex fan order
/// - every vertex has the same z
///
/// Both are enforced by the constructors; fields are private so a shape cannot
/// be edited after creation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Shape {
    vertices: [Vertex; VERTICES_PER_SHAPE],
}

impl Shape {
    /// Builds a shape from four vertices.
    pub fn new(vertices: [Vertex; VERTICES_PER_SHAPE]) -> Result<Self, GeometryError> {
        let shape = Self { vertices };
        shape.validate()?;
        Ok(shape)
    }

    /// Builds an axis-aligned, uniformly colored quad spanning `min..max` at depth `z`.
    ///
    /// Vertex order is bottom-left, bottom-right, top-right, top-left, which a
    /// triangle fan rasterizes as two triangles sharing the bottom-left corner.
    pub fn rect(min: [f32; 2], max: [f32; 2], z: f32, color: Color) -> Result<Self, GeometryError> {
        let [x0, y0] = min;
        let [x1, y1] = max;
        Self::new([
            Vertex::new([x0, y0, z], color),
            Vertex::new([x1, y0, z], color),
            Vertex::new([x1, y1, z], color),
            Vertex::new([x0, y1, z], color),
        ])
    }

    /// Parses a flat interleaved buffer (position xyz, color rgba per vertex).
    pub fn from_interleaved(data: &[f32]) -> Result<Self, GeometryError> {
        let length = GeometryError::Length {
            expected: FLOATS_PER_SHAPE,
            actual: data.len(),
        };
        if data.len() != FLOATS_PER_SHAPE {
            return Err(length);
        }

        let vertices: &[Vertex] = bytemuck::cast_slice(data);
        let vertices = <[Vertex; VERTICES_PER_SHAPE]>::try_from(vertices).map_err(|_| length)?;
        Self::new(vertices)
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex; VERTICES_PER_SHAPE] {
        &self.vertices
    }

    /// Interleaved view of the vertex data; always `FLOATS_PER_SHAPE` long.
    #[inline]
    pub fn interleaved(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Depth used for painter ordering: the z of the first vertex.
    #[inline]
    pub fn depth_key(&self) -> DepthKey {
        DepthKey(self.vertices[0].z())
    }

    /// Color of the first vertex.
    #[inline]
    pub fn color(&self) -> Color {
        Color::from_array(self.vertices[0].color)
    }

    fn validate(&self) -> Result<(), GeometryError> {
        if let Some(index) = self.interleaved().iter().position(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite { index });
        }

        let first = self.vertices[0].z();
        for (vertex, v) in self.vertices.iter().enumerate().skip(1) {
            if v.z() != first {
                return Err(GeometryError::NonPlanar {
                    vertex,
                    z: v.z(),
                    first,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(z: [f32; 4]) -> Vec<f32> {
        z.iter()
            .flat_map(|&z| [0.0, 0.0, z, 1.0, 0.0, 0.0, 1.0])
            .collect()
    }

    #[test]
    fn rect_has_fan_order_and_shared_depth() {
        let s = Shape::rect([-0.5, -0.5], [0.5, 0.5], 0.25, Color::GREEN).unwrap();
        let p: Vec<[f32; 3]> = s.vertices().iter().map(|v| v.position).collect();
        assert_eq!(
            p,
            vec![
                [-0.5, -0.5, 0.25],
                [0.5, -0.5, 0.25],
                [0.5, 0.5, 0.25],
                [-0.5, 0.5, 0.25],
            ]
        );
        assert_eq!(s.depth_key(), DepthKey(0.25));
        assert_eq!(s.color(), Color::GREEN);
    }

    #[test]
    fn interleaved_buffer_is_28_floats() {
        let s = Shape::rect([0.0, 0.0], [1.0, 1.0], 0.0, Color::RED).unwrap();
        assert_eq!(s.interleaved().len(), FLOATS_PER_SHAPE);
        assert_eq!(FLOATS_PER_SHAPE, 28);
    }

    #[test]
    fn from_interleaved_reads_back_layout() {
        let data = flat([-0.3; 4]);
        let s = Shape::from_interleaved(&data).unwrap();
        assert_eq!(s.interleaved(), data.as_slice());
        assert_eq!(s.depth_key(), DepthKey(-0.3));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let data = flat([0.0; 4]);
        let err = Shape::from_interleaved(&data[..27]).unwrap_err();
        assert_eq!(err, GeometryError::Length { expected: 28, actual: 27 });
    }

    #[test]
    fn long_buffer_is_rejected() {
        let mut data = flat([0.0; 4]);
        data.push(1.0);
        assert!(matches!(
            Shape::from_interleaved(&data),
            Err(GeometryError::Length { actual: 29, .. })
        ));
    }

    #[test]
    fn non_planar_quad_is_rejected() {
        let data = flat([0.0, 0.0, 0.1, 0.0]);
        assert!(matches!(
            Shape::from_interleaved(&data),
            Err(GeometryError::NonPlanar { vertex: 2, .. })
        ));
    }

    #[test]
    fn nan_depth_is_rejected() {
        let err = Shape::rect([0.0, 0.0], [1.0, 1.0], f32::NAN, Color::BLUE).unwrap_err();
        assert_eq!(err, GeometryError::NonFinite { index: 2 });
    }
}
