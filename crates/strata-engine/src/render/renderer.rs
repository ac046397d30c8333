use crate::device::{DeviceError, RenderDevice};
use crate::paint::Color;
use crate::scene::{Scene, Shape, VERTICES_PER_SHAPE};
use crate::shader::{ShaderCompiler, ShaderSources};

use super::{AttributeBindings, RenderError};

/// Lifetime of per-shape vertex buffers.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum BufferPolicy {
    /// Create, upload, draw and delete a buffer for every shape on every frame.
    #[default]
    Transient,
    /// Keep one buffer per paint slot across frames; re-upload only when the
    /// shape drawn in that slot changed.
    Retained,
}

/// Renderer configuration.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Color the surface is cleared to before any shape is drawn.
    pub clear_color: Color,
    pub buffer_policy: BufferPolicy,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::BLACK,
            buffer_policy: BufferPolicy::Transient,
        }
    }
}

/// Counters for one rendered frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub uploaded_bytes: u64,
    /// Retained buffers drawn without a re-upload.
    pub reused_buffers: u32,
}

struct RetainedBuffer<B> {
    shape: Shape,
    buffer: B,
}

/// Painter's-algorithm renderer.
///
/// Owns the device. Programs and attribute bindings are created through the
/// renderer but owned by the caller and passed back explicitly on every frame.
pub struct Renderer<D: RenderDevice> {
    device: D,
    config: RendererConfig,
    retained: Vec<RetainedBuffer<D::Buffer>>,
}

impl<D: RenderDevice> Renderer<D> {
    /// Takes ownership of the device obtained from the surface.
    ///
    /// `None` means the surface could not provide one; setup must stop there.
    pub fn initialize(device: Option<D>, config: RendererConfig) -> Result<Self, RenderError> {
        let Some(device) = device else {
            log::error!("rendering device unavailable; aborting renderer setup");
            return Err(RenderError::DeviceUnavailable);
        };

        log::info!(
            "renderer initialized (clear {:?}, {:?} buffers)",
            config.clear_color.to_array(),
            config.buffer_policy
        );

        Ok(Self {
            device,
            config,
            retained: Vec::new(),
        })
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Compiles and links `sources` on the owned device.
    pub fn compile_program(&mut self, sources: &ShaderSources<'_>) -> Result<D::Program, RenderError> {
        ShaderCompiler::new(&mut self.device).build_program(sources)
    }

    /// Resolves the `position` / `color` attribute slots of `program`.
    pub fn bind_attributes(&self, program: &D::Program) -> Result<AttributeBindings, RenderError> {
        let bindings = AttributeBindings::resolve(&self.device, program)?;
        log::debug!(
            "attribute bindings: position={}, color={}",
            bindings.position,
            bindings.color
        );
        Ok(bindings)
    }

    pub fn release_program(&mut self, program: D::Program) {
        self.device.delete_program(program);
    }

    /// Deletes every retained vertex buffer.
    pub fn release_buffers(&mut self) {
        for slot in self.retained.drain(..) {
            self.device.delete_buffer(slot.buffer);
        }
    }

    /// Clears `target`, then draws `shapes` in the given order.
    ///
    /// `shapes` must already be back-to-front. The first device failure
    /// aborts the frame; transient buffers are deleted either way.
    pub fn render_frame(
        &mut self,
        target: &mut D::Target,
        program: &D::Program,
        bindings: &AttributeBindings,
        shapes: &[Shape],
    ) -> Result<FrameStats, RenderError> {
        self.render_ordered(target, program, bindings, shapes.iter())
    }

    /// Sorts `scene` back-to-front and renders it.
    pub fn render_scene(
        &mut self,
        target: &mut D::Target,
        program: &D::Program,
        bindings: &AttributeBindings,
        scene: &mut Scene,
    ) -> Result<FrameStats, RenderError> {
        self.render_ordered(target, program, bindings, scene.iter_in_paint_order())
    }

    fn render_ordered<'s>(
        &mut self,
        target: &mut D::Target,
        program: &D::Program,
        bindings: &AttributeBindings,
        shapes: impl Iterator<Item = &'s Shape>,
    ) -> Result<FrameStats, RenderError> {
        self.device.clear(target, self.config.clear_color)?;

        let mut stats = FrameStats::default();
        let mut slots = 0;
        for (slot, shape) in shapes.enumerate() {
            log::trace!("draw {slot}: depth {}", shape.depth_key().get());
            match self.config.buffer_policy {
                BufferPolicy::Transient => {
                    self.draw_transient(target, program, bindings, shape, &mut stats)?
                }
                BufferPolicy::Retained => {
                    self.draw_retained(target, program, bindings, slot, shape, &mut stats)?
                }
            }
            slots = slot + 1;
        }

        if self.config.buffer_policy == BufferPolicy::Retained {
            self.drop_retained_from(slots);
        }

        log::debug!(
            "frame rendered: {} draws, {} bytes uploaded, {} buffers reused",
            stats.draw_calls,
            stats.uploaded_bytes,
            stats.reused_buffers
        );
        Ok(stats)
    }

    fn draw_transient(
        &mut self,
        target: &mut D::Target,
        program: &D::Program,
        bindings: &AttributeBindings,
        shape: &Shape,
        stats: &mut FrameStats,
    ) -> Result<(), RenderError> {
        let mut buffer = self.device.create_buffer()?;

        let drawn = fill_buffer(&mut self.device, &mut buffer, bindings, shape).and_then(|bytes| {
            stats.uploaded_bytes += bytes;
            draw_fan(&mut self.device, target, program, &buffer)
        });

        self.device.delete_buffer(buffer);
        drawn?;
        stats.draw_calls += 1;
        Ok(())
    }

    fn draw_retained(
        &mut self,
        target: &mut D::Target,
        program: &D::Program,
        bindings: &AttributeBindings,
        slot: usize,
        shape: &Shape,
        stats: &mut FrameStats,
    ) -> Result<(), RenderError> {
        if slot == self.retained.len() {
            let mut buffer = self.device.create_buffer()?;
            match fill_buffer(&mut self.device, &mut buffer, bindings, shape) {
                Ok(bytes) => stats.uploaded_bytes += bytes,
                Err(e) => {
                    self.device.delete_buffer(buffer);
                    return Err(e.into());
                }
            }
            self.retained.push(RetainedBuffer { shape: *shape, buffer });
        } else if self.retained[slot].shape != *shape {
            let entry = &mut self.retained[slot];
            match fill_buffer(&mut self.device, &mut entry.buffer, bindings, shape) {
                Ok(bytes) => {
                    stats.uploaded_bytes += bytes;
                    entry.shape = *shape;
                }
                Err(e) => {
                    // Slot contents are unknown now; rebuild from here next frame.
                    self.drop_retained_from(slot);
                    return Err(e.into());
                }
            }
        } else {
            stats.reused_buffers += 1;
        }

        draw_fan(&mut self.device, target, program, &self.retained[slot].buffer)?;
        stats.draw_calls += 1;
        Ok(())
    }

    fn drop_retained_from(&mut self, slot: usize) {
        if slot >= self.retained.len() {
            return;
        }
        for entry in self.retained.drain(slot..) {
            self.device.delete_buffer(entry.buffer);
        }
    }
}

/// Uploads the shape and configures + enables both attributes. Returns bytes uploaded.
fn fill_buffer<D: RenderDevice>(
    device: &mut D,
    buffer: &mut D::Buffer,
    bindings: &AttributeBindings,
    shape: &Shape,
) -> Result<u64, DeviceError> {
    let data = shape.interleaved();
    device.upload_vertices(buffer, data)?;

    for pointer in bindings.pointers() {
        device.vertex_attribute_pointer(buffer, pointer)?;
        device.enable_attribute(buffer, pointer.location)?;
    }

    Ok(std::mem::size_of_val(data) as u64)
}

fn draw_fan<D: RenderDevice>(
    device: &mut D,
    target: &mut D::Target,
    program: &D::Program,
    buffer: &D::Buffer,
) -> Result<(), DeviceError> {
    device.draw_triangle_fan(target, program, buffer, 0, VERTICES_PER_SHAPE as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::recording::{Call, RecordingDevice};

    type TestRenderer = Renderer<RecordingDevice>;

    fn setup(config: RendererConfig) -> (TestRenderer, <RecordingDevice as RenderDevice>::Program, AttributeBindings) {
        let mut r = Renderer::initialize(Some(RecordingDevice::new()), config).unwrap();
        let program = r.compile_program(&ShaderSources::PAINTER).unwrap();
        let bindings = r.bind_attributes(&program).unwrap();
        r.device_mut().calls.clear();
        (r, program, bindings)
    }

    fn drawn_colors(device: &RecordingDevice) -> Vec<[f32; 4]> {
        device
            .draws()
            .into_iter()
            .map(|c| match c {
                Call::DrawFan { color, .. } => *color,
                _ => unreachable!(),
            })
            .collect()
    }

    fn shuffled_reference() -> Scene {
        let s = Scene::reference().unwrap().shapes().to_vec();
        [s[2], s[0], s[3], s[1]].into_iter().collect()
    }

    #[test]
    fn missing_device_is_reported_before_any_work() {
        let err = TestRenderer::initialize(None, RendererConfig::default()).err();
        assert_eq!(err, Some(RenderError::DeviceUnavailable));
    }

    #[test]
    fn bindings_come_from_the_linked_program() {
        let (r, program, bindings) = setup(RendererConfig::default());
        assert_eq!(bindings, AttributeBindings { position: 0, color: 1 });
        assert_eq!(r.device().live_programs, 1);
        assert_eq!(r.device().live_shaders, 0, "stages are released after linking");
        drop(program);
    }

    #[test]
    fn reference_scene_is_one_clear_then_four_ordered_draws() {
        let (mut r, program, bindings) = setup(RendererConfig::default());
        let mut scene = shuffled_reference();

        let stats = r.render_scene(&mut (), &program, &bindings, &mut scene).unwrap();

        let d = r.device();
        assert_eq!(stats.draw_calls, 4);
        assert_eq!(stats.uploaded_bytes, 4 * 28 * 4);
        assert_eq!(d.clears(), 1);
        assert_eq!(d.calls[0], Call::Clear(Color::BLACK));
        assert_eq!(
            drawn_colors(d),
            vec![
                Color::RED.to_array(),
                Color::GREEN.to_array(),
                Color::BLUE.to_array(),
                Color::PINK.to_array(),
            ]
        );
        assert_eq!(d.live_buffers, 0);
    }

    #[test]
    fn per_shape_call_sequence_matches_pipeline_contract() {
        let (mut r, program, bindings) = setup(RendererConfig::default());
        let shape = Shape::rect([0.0, 0.0], [0.5, 0.5], 0.1, Color::BLUE).unwrap();

        r.render_frame(&mut (), &program, &bindings, &[shape]).unwrap();

        let [position, color] = bindings.pointers();
        let calls = &r.device().calls;
        let Call::CreateBuffer(id) = calls[1] else { panic!("{calls:?}") };
        assert_eq!(
            calls[1..],
            [
                Call::CreateBuffer(id),
                Call::Upload { buffer: id, floats: 28 },
                Call::AttributePointer { buffer: id, pointer: position },
                Call::EnableAttribute { buffer: id, location: 0 },
                Call::AttributePointer { buffer: id, pointer: color },
                Call::EnableAttribute { buffer: id, location: 1 },
                Call::DrawFan { buffer: id, first: 0, count: 4, depth: 0.1, color: Color::BLUE.to_array() },
                Call::DeleteBuffer(id),
            ]
        );
    }

    #[test]
    fn clear_color_is_configurable() {
        let config = RendererConfig {
            clear_color: Color::rgb(0.2, 0.2, 0.2),
            ..Default::default()
        };
        let (mut r, program, bindings) = setup(config);
        r.render_frame(&mut (), &program, &bindings, &[]).unwrap();
        assert_eq!(r.device().calls, vec![Call::Clear(Color::rgb(0.2, 0.2, 0.2))]);
    }

    #[test]
    fn draw_failure_aborts_frame_and_releases_buffer() {
        let (mut r, program, bindings) = setup(RendererConfig::default());
        r.device_mut().fail_draw_at = Some(1);
        let shapes = Scene::reference().unwrap().into_sorted();

        let err = r.render_frame(&mut (), &program, &bindings, &shapes).unwrap_err();

        assert!(matches!(err, RenderError::Device(DeviceError { op: "draw_triangle_fan", .. })));
        assert_eq!(r.device().draws().len(), 1, "no draws after the failing one");
        assert_eq!(r.device().live_buffers, 0);
    }

    #[test]
    fn upload_failure_is_propagated() {
        let (mut r, program, bindings) = setup(RendererConfig::default());
        r.device_mut().fail_uploads = true;
        let shapes = Scene::reference().unwrap().into_sorted();

        let err = r.render_frame(&mut (), &program, &bindings, &shapes).unwrap_err();
        assert!(matches!(err, RenderError::Device(DeviceError { op: "upload_vertices", .. })));
        assert!(r.device().draws().is_empty());
        assert_eq!(r.device().live_buffers, 0);
    }

    #[test]
    fn retained_buffers_skip_unchanged_uploads() {
        let config = RendererConfig {
            buffer_policy: BufferPolicy::Retained,
            ..Default::default()
        };
        let (mut r, program, bindings) = setup(config);
        let mut shapes = Scene::reference().unwrap().into_sorted();

        let first = r.render_frame(&mut (), &program, &bindings, &shapes).unwrap();
        assert_eq!(first.reused_buffers, 0);
        assert_eq!(r.device().live_buffers, 4);

        let second = r.render_frame(&mut (), &program, &bindings, &shapes).unwrap();
        assert_eq!(second.draw_calls, 4);
        assert_eq!(second.reused_buffers, 4);
        assert_eq!(second.uploaded_bytes, 0);
        assert_eq!(r.device().uploads(), 4);

        shapes[3] = Shape::rect([-0.1, -0.1], [0.1, 0.1], 0.3, Color::PINK).unwrap();
        let third = r.render_frame(&mut (), &program, &bindings, &shapes).unwrap();
        assert_eq!(third.reused_buffers, 3);
        assert_eq!(third.uploaded_bytes, 28 * 4);

        r.render_frame(&mut (), &program, &bindings, &shapes[..2]).unwrap();
        assert_eq!(r.device().live_buffers, 2);

        r.release_buffers();
        assert_eq!(r.device().live_buffers, 0);
    }

    #[test]
    fn malformed_shader_produces_no_program_and_never_links() {
        let mut r = TestRenderer::initialize(Some(RecordingDevice::new()), RendererConfig::default()).unwrap();
        let sources = ShaderSources {
            vertex: "this is not wgsl",
            fragment: ShaderSources::PAINTER.fragment,
        };

        let err = r.compile_program(&sources).unwrap_err();

        assert!(matches!(err, RenderError::ShaderCompile { stage: crate::shader::ShaderStage::Vertex, .. }));
        let d = r.device();
        assert!(!d.calls.iter().any(|c| matches!(c, Call::CreateProgram | Call::LinkProgram(_))));
        assert_eq!((d.live_shaders, d.live_programs), (0, 0));
    }

    #[test]
    fn program_without_color_input_fails_binding() {
        let mut r = TestRenderer::initialize(Some(RecordingDevice::new()), RendererConfig::default()).unwrap();
        let sources = ShaderSources {
            vertex: "@vertex fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> { \
                         return vec4<f32>(position, 1.0); }",
            fragment: "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }",
        };

        let program = r.compile_program(&sources).unwrap();
        assert_eq!(r.bind_attributes(&program), Err(RenderError::MissingAttribute("color")));
        r.release_program(program);
        assert_eq!(r.device().live_programs, 0);
    }
}
