use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::paint::Color;
use crate::shader::{ShaderStage, wgsl};

use super::backend::fan_indices;
use super::{AttributePointer, DeviceError, Gpu, GpuFrame, RenderDevice};

/// Compiled stage: CPU-side interface plus the GPU module.
#[derive(Clone)]
struct StageModule {
    info: wgsl::WgslStage,
    module: wgpu::ShaderModule,
}

pub struct WgpuShader {
    stage: ShaderStage,
    compiled: Result<StageModule, String>,
}

pub struct WgpuProgram {
    id: u64,
    vertex: Option<StageModule>,
    fragment: Option<StageModule>,
    linked: Result<(), String>,
}

#[derive(Default)]
pub struct WgpuBuffer {
    vbo: Option<wgpu::Buffer>,
    vertex_bytes: u64,
    pointers: Vec<AttributePointer>,
    enabled: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: u64,
    stride: u64,
    attributes: Vec<AttributePointer>,
}

/// [`RenderDevice`] on wgpu.
///
/// Clears and draws each record their own render pass into the frame's
/// encoder, so submission order is exactly call order. Triangle fans are
/// expanded into index lists; pipelines are built on first use for each
/// (program, vertex layout) pair and cached.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,

    next_program: u64,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    fan_ibos: HashMap<(u32, u32), (wgpu::Buffer, u32)>,
}

impl WgpuDevice {
    pub fn new(gpu: &Gpu<'_>) -> Self {
        Self::from_parts(gpu.device().clone(), gpu.queue().clone(), gpu.surface_format())
    }

    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        Self {
            device,
            queue,
            format,
            next_program: 0,
            pipelines: HashMap::new(),
            fan_ibos: HashMap::new(),
        }
    }

    #[inline]
    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    fn ensure_pipeline(&mut self, program: &WgpuProgram, key: &PipelineKey) -> Result<(), DeviceError> {
        if self.pipelines.contains_key(key) {
            return Ok(());
        }
        let (Some(vertex), Some(fragment)) = (&program.vertex, &program.fragment) else {
            return Err(DeviceError::new("draw_triangle_fan", "program has no attached stages"));
        };

        let attributes: Vec<wgpu::VertexAttribute> = key
            .attributes
            .iter()
            .map(|p| wgpu::VertexAttribute {
                format: vertex_format(p.components),
                offset: p.offset,
                shader_location: p.location,
            })
            .collect();

        let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("strata painter pipeline layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("strata painter pipeline"),
            layout: Some(&layout),

            vertex: wgpu::VertexState {
                module: &vertex.module,
                entry_point: Some(vertex.info.entry_point()),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: key.stride,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fragment.module,
                entry_point: Some(fragment.info.entry_point()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    // Opaque painter compositing: later draws overwrite.
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!(
            "built pipeline for program {} (stride {}, {} attributes)",
            key.program,
            key.stride,
            key.attributes.len()
        );
        self.pipelines.insert(key.clone(), pipeline);

        Ok(())
    }

    fn ensure_fan_indices(&mut self, first: u32, count: u32) {
        if self.fan_ibos.contains_key(&(first, count)) {
            return;
        }
        let indices = fan_indices(first, count);
        let ibo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("strata fan ibo"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.fan_ibos.insert((first, count), (ibo, indices.len() as u32));
    }
}

fn vertex_format(components: u8) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

/// Enabled pointers of `buffer`, sorted by location, plus their shared stride.
fn enabled_layout(buffer: &WgpuBuffer) -> Result<(u64, Vec<AttributePointer>), DeviceError> {
    let mut attributes: Vec<AttributePointer> = buffer
        .pointers
        .iter()
        .filter(|p| buffer.enabled.contains(&p.location))
        .copied()
        .collect();
    attributes.sort_by_key(|p| p.location);

    for location in &buffer.enabled {
        if !attributes.iter().any(|p| p.location == *location) {
            return Err(DeviceError::new(
                "draw_triangle_fan",
                format!("attribute {location} is enabled but has no pointer"),
            ));
        }
    }

    let stride = attributes
        .first()
        .map(|p| p.stride)
        .ok_or_else(|| DeviceError::new("draw_triangle_fan", "no enabled vertex attributes"))?;
    Ok((stride, attributes))
}

impl RenderDevice for WgpuDevice {
    type Shader = WgpuShader;
    type Program = WgpuProgram;
    type Buffer = WgpuBuffer;
    type Target = GpuFrame;

    fn create_shader(&mut self, stage: ShaderStage) -> Result<WgpuShader, DeviceError> {
        Ok(WgpuShader {
            stage,
            compiled: Err("shader has not been compiled".to_string()),
        })
    }

    fn compile_shader(&mut self, shader: &mut WgpuShader, source: &str) {
        // Validate on the CPU first: invalid WGSL must never reach wgpu.
        let stage = shader.stage;
        shader.compiled = wgsl::compile(source, stage).map(|info| {
            let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(match stage {
                    ShaderStage::Vertex => "strata vertex shader",
                    ShaderStage::Fragment => "strata fragment shader",
                }),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            StageModule { info, module }
        });
    }

    fn shader_compiled(&self, shader: &WgpuShader) -> bool {
        shader.compiled.is_ok()
    }

    fn shader_info_log(&self, shader: &WgpuShader) -> String {
        shader.compiled.as_ref().err().cloned().unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: WgpuShader) {
        drop(shader);
    }

    fn create_program(&mut self) -> Result<WgpuProgram, DeviceError> {
        self.next_program += 1;
        Ok(WgpuProgram {
            id: self.next_program,
            vertex: None,
            fragment: None,
            linked: Err("program has not been linked".to_string()),
        })
    }

    fn attach_shader(&mut self, program: &mut WgpuProgram, shader: &WgpuShader) {
        let Ok(stage) = &shader.compiled else { return };
        match shader.stage {
            ShaderStage::Vertex => program.vertex = Some(stage.clone()),
            ShaderStage::Fragment => program.fragment = Some(stage.clone()),
        }
    }

    fn link_program(&mut self, program: &mut WgpuProgram) {
        program.linked = match (&program.vertex, &program.fragment) {
            (Some(v), Some(f)) => wgsl::check_interface(&v.info, &f.info),
            (None, _) => Err("no compiled vertex stage attached".to_string()),
            (_, None) => Err("no compiled fragment stage attached".to_string()),
        };
    }

    fn program_linked(&self, program: &WgpuProgram) -> bool {
        program.linked.is_ok()
    }

    fn program_info_log(&self, program: &WgpuProgram) -> String {
        program.linked.as_ref().err().cloned().unwrap_or_default()
    }

    fn delete_program(&mut self, program: WgpuProgram) {
        self.pipelines.retain(|key, _| key.program != program.id);
    }

    fn attribute_location(&self, program: &WgpuProgram, name: &str) -> Option<u32> {
        program.linked.as_ref().ok()?;
        wgsl::attribute_location(&program.vertex.as_ref()?.info, name)
    }

    fn create_buffer(&mut self) -> Result<WgpuBuffer, DeviceError> {
        Ok(WgpuBuffer::default())
    }

    fn upload_vertices(&mut self, buffer: &mut WgpuBuffer, data: &[f32]) -> Result<(), DeviceError> {
        if data.is_empty() {
            return Err(DeviceError::new("upload_vertices", "vertex data is empty"));
        }

        let bytes: &[u8] = bytemuck::cast_slice(data);
        match &buffer.vbo {
            Some(vbo) if vbo.size() == bytes.len() as u64 => {
                self.queue.write_buffer(vbo, 0, bytes);
            }
            _ => {
                buffer.vbo = Some(self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("strata shape vbo"),
                    contents: bytes,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                }));
            }
        }
        buffer.vertex_bytes = bytes.len() as u64;
        Ok(())
    }

    fn vertex_attribute_pointer(
        &mut self,
        buffer: &mut WgpuBuffer,
        pointer: AttributePointer,
    ) -> Result<(), DeviceError> {
        const OP: &str = "vertex_attribute_pointer";

        if !(1..=4).contains(&pointer.components) {
            return Err(DeviceError::new(OP, format!("{} components is not 1..=4", pointer.components)));
        }
        let width = u64::from(pointer.components) * std::mem::size_of::<f32>() as u64;
        if pointer.offset + width > pointer.stride {
            return Err(DeviceError::new(OP, "attribute extends past the vertex stride"));
        }
        if let Some(other) = buffer.pointers.iter().find(|p| p.location != pointer.location) {
            if other.stride != pointer.stride {
                return Err(DeviceError::new(
                    OP,
                    format!("stride {} conflicts with stride {} already set", pointer.stride, other.stride),
                ));
            }
        }

        buffer.pointers.retain(|p| p.location != pointer.location);
        buffer.pointers.push(pointer);
        Ok(())
    }

    fn enable_attribute(&mut self, buffer: &mut WgpuBuffer, location: u32) -> Result<(), DeviceError> {
        if !buffer.enabled.contains(&location) {
            buffer.enabled.push(location);
        }
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: WgpuBuffer) {
        // Not `destroy()`: the frame encoder may still reference the buffer
        // until it is submitted. wgpu frees it once the last use completes.
        drop(buffer);
    }

    fn clear(&mut self, target: &mut GpuFrame, color: Color) -> Result<(), DeviceError> {
        let _rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("strata clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        Ok(())
    }

    fn draw_triangle_fan(
        &mut self,
        target: &mut GpuFrame,
        program: &WgpuProgram,
        buffer: &WgpuBuffer,
        first: u32,
        count: u32,
    ) -> Result<(), DeviceError> {
        const OP: &str = "draw_triangle_fan";

        if let Err(log) = &program.linked {
            return Err(DeviceError::new(OP, format!("program is not linked: {log}")));
        }
        let Some(vbo) = buffer.vbo.as_ref() else {
            return Err(DeviceError::new(OP, "vertex buffer has no data"));
        };
        if count < 3 {
            return Ok(());
        }

        let (stride, attributes) = enabled_layout(buffer)?;
        let available = buffer.vertex_bytes / stride;
        if u64::from(first) + u64::from(count) > available {
            return Err(DeviceError::new(
                OP,
                format!("vertices {first}..{} exceed the {available} in the buffer", first + count),
            ));
        }
        if let Some(vertex) = &program.vertex {
            for input in vertex.info.inputs() {
                if !attributes.iter().any(|p| p.location == input.location) {
                    return Err(DeviceError::new(
                        OP,
                        format!("vertex input @location({}) has no enabled attribute", input.location),
                    ));
                }
            }
        }

        let key = PipelineKey {
            program: program.id,
            stride,
            attributes,
        };
        self.ensure_pipeline(program, &key)?;
        self.ensure_fan_indices(first, count);

        let (Some(pipeline), Some((ibo, index_count))) =
            (self.pipelines.get(&key), self.fan_ibos.get(&(first, count)))
        else {
            return Err(DeviceError::new(OP, "pipeline or fan index buffer missing"));
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("strata shape pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..*index_count, 0, 0..1);
        Ok(())
    }
}
