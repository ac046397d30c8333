use crate::paint::Color;

use super::{GeometryError, Scene, Shape};

impl Scene {
    /// Four nested squares, authored farthest to closest:
    ///
    /// | color | half extent | z    |
    /// |-------|-------------|------|
    /// | red   | 0.8         | -0.6 |
    /// | green | 0.6         | -0.3 |
    /// | blue  | 0.4         | 0.0  |
    /// | pink  | 0.2         | 0.3  |
    pub fn reference() -> Result<Self, GeometryError> {
        [
            (0.8, -0.6, Color::RED),
            (0.6, -0.3, Color::GREEN),
            (0.4, 0.0, Color::BLUE),
            (0.2, 0.3, Color::PINK),
        ]
        .into_iter()
        .map(|(h, z, color)| Shape::rect([-h, -h], [h, h], z, color))
        .collect()
    }
}
