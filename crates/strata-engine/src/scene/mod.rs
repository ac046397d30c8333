//! Scene geometry and painter ordering.
//!
//! Responsibilities:
//! - own the interleaved vertex layout shared with the vertex shader
//! - validate shapes (4 vertices, flat in depth)
//! - derive back-to-front paint order from depth keys

mod depth;
mod error;
mod list;
mod reference;
mod shape;
mod vertex;

pub use depth::{paint_order, sort_back_to_front, sorted_back_to_front, DepthKey};
pub use error::GeometryError;
pub use list::Scene;
pub use shape::{Shape, FLOATS_PER_SHAPE, VERTICES_PER_SHAPE};
pub use vertex::{Vertex, COLOR_OFFSET_FLOATS, FLOATS_PER_VERTEX};
