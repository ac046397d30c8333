//! Shader stages and program construction.
//!
//! - `ShaderCompiler` drives compile/link against any `RenderDevice`
//! - `wgsl` is the CPU-side WGSL front end used by the wgpu backend
//! - `ShaderSources::PAINTER` is the bundled pass-through pair

mod compiler;
mod stage;
pub mod wgsl;

pub use compiler::{CompiledStage, ShaderCompiler};
pub use stage::{ShaderSources, ShaderStage};
