/// Render target for one presented frame.
///
/// Holds the acquired surface texture until [`Gpu::submit`](super::Gpu::submit);
/// no further frame can be acquired while it is alive.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
