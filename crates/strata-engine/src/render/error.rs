use thiserror::Error;

use crate::device::DeviceError;
use crate::scene::GeometryError;
use crate::shader::ShaderStage;

/// Errors surfaced by shader construction and frame rendering.
///
/// None of these are retried. A failed compile or link leaves no program
/// behind; a failed draw aborts the frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// No rendering device could be obtained from the surface.
    #[error("rendering device unavailable")]
    DeviceUnavailable,

    #[error("error compiling {stage} shader: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("error linking shader program: {log}")]
    ShaderLink { log: String },

    /// The linked program has no active vertex input with this name.
    #[error("vertex attribute `{0}` is not an input of the linked program")]
    MissingAttribute(&'static str),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}
