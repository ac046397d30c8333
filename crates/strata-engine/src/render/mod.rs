//! Painter's-algorithm draw submission.
//!
//! The renderer is written against `device::RenderDevice` only. Per frame it
//! clears the target once, then uploads and draws each shape in back-to-front
//! order with depth testing off, so later draws cover earlier ones.

mod bindings;
mod error;
mod renderer;

pub use bindings::{AttributeBindings, COLOR_ATTRIBUTE, POSITION_ATTRIBUTE};
pub use error::RenderError;
pub use renderer::{BufferPolicy, FrameStats, Renderer, RendererConfig};
