//! Strata engine crate.
//!
//! Draws flat-colored quads with the painter's algorithm: shapes are sorted
//! by depth and drawn back-to-front with depth testing off, so nearer shapes
//! overwrite farther ones.

pub mod device;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
pub mod shader;
pub mod window;
