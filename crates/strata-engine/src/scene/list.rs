use super::depth::fill_paint_order;
use super::Shape;

/// Unordered collection of shapes for one frame.
///
/// Shapes keep their authored order; paint order is derived from depth keys.
///
/// Performance characteristics:
/// - `push()` is O(1)
/// - paint-order iteration reuses an internal index buffer, rebuilt only after a push
#[derive(Debug, Default, Clone)]
pub struct Scene {
    shapes: Vec<Shape>,

    sorted_indices: Vec<usize>,
    sorted_dirty: bool,
}

impl Scene {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
        self.sorted_dirty = true;
    }

    /// Returns shapes in authored order.
    #[inline]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Returns indices into `shapes()` in paint order (back-to-front).
    pub fn indices_in_paint_order(&mut self) -> &[usize] {
        if self.sorted_dirty {
            self.rebuild_sorted_indices();
        }
        &self.sorted_indices
    }

    /// Iterates shapes back-to-front without copying them.
    pub fn iter_in_paint_order(&mut self) -> impl Iterator<Item = &Shape> {
        if self.sorted_dirty {
            self.rebuild_sorted_indices();
        }

        self.sorted_indices.iter().map(|&i| &self.shapes[i])
    }

    /// Consumes the scene and returns its shapes back-to-front.
    pub fn into_sorted(self) -> Vec<Shape> {
        super::sorted_back_to_front(self.shapes)
    }

    fn rebuild_sorted_indices(&mut self) {
        fill_paint_order(&self.shapes, &mut self.sorted_indices);
        self.sorted_dirty = false;
    }
}

impl FromIterator<Shape> for Scene {
    fn from_iter<I: IntoIterator<Item = Shape>>(iter: I) -> Self {
        let shapes: Vec<Shape> = iter.into_iter().collect();
        Self {
            shapes,
            sorted_indices: Vec::new(),
            sorted_dirty: true,
        }
    }
}
