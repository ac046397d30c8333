use core::cmp::Ordering;

use super::Shape;

/// Depth ordering key for shapes.
///
/// Lower values are farther from the viewer and are painted first. Ordering
/// uses the IEEE total order, so comparisons are well defined for every `f32`.
#[derive(Debug, Copy, Clone, Default)]
pub struct DepthKey(pub f32);

impl DepthKey {
    #[inline]
    pub const fn new(z: f32) -> Self {
        Self(z)
    }

    #[inline]
    pub const fn get(self) -> f32 {
        self.0
    }
}

impl Ord for DepthKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for DepthKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DepthKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DepthKey {}

/// Sorts shapes back-to-front (ascending depth key) in place.
///
/// The sort is stable: shapes with equal keys keep their relative order.
pub fn sort_back_to_front(shapes: &mut [Shape]) {
    shapes.sort_by_key(Shape::depth_key);
}

/// Returns the shapes in back-to-front order as a new sequence.
pub fn sorted_back_to_front(mut shapes: Vec<Shape>) -> Vec<Shape> {
    sort_back_to_front(&mut shapes);
    shapes
}

/// Returns indices into `shapes` in paint order without moving any shape.
pub fn paint_order(shapes: &[Shape]) -> Vec<usize> {
    let mut indices = Vec::with_capacity(shapes.len());
    fill_paint_order(shapes, &mut indices);
    indices
}

pub(super) fn fill_paint_order(shapes: &[Shape], indices: &mut Vec<usize>) {
    indices.clear();
    indices.extend(0..shapes.len());
    indices.sort_by_key(|&i| shapes[i].depth_key());
}
