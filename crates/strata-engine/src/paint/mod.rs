//! Color model shared between scene geometry and renderers.

pub mod color;

pub use color::Color;
