//! Rendering device boundary.
//!
//! - `RenderDevice`: the capability set the renderer is written against
//! - `Gpu`: wgpu instance/adapter/device/queue + window surface
//! - `WgpuDevice`: `RenderDevice` implemented on a `Gpu`

mod backend;
mod error;
mod frame;
mod gpu;
mod init;
mod surface;
mod wgpu_device;

#[cfg(test)]
pub(crate) mod recording;

pub use backend::{fan_indices, AttributePointer, RenderDevice};
pub use error::{DeviceError, SurfaceErrorAction};
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
pub use wgpu_device::{WgpuBuffer, WgpuDevice, WgpuProgram, WgpuShader};
