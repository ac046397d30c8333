//! In-memory `RenderDevice` that records every call.
//!
//! Shader stages go through the real WGSL front end, so compile and link
//! outcomes match the wgpu backend. Frame commands are only logged.

use std::collections::HashMap;

use crate::paint::Color;
use crate::shader::{ShaderStage, wgsl};

use super::{AttributePointer, DeviceError, RenderDevice};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateShader(ShaderStage),
    CompileShader(ShaderStage),
    DeleteShader(u32),
    CreateProgram,
    AttachShader { program: u32, shader: u32 },
    LinkProgram(u32),
    DeleteProgram(u32),
    CreateBuffer(u32),
    Upload { buffer: u32, floats: usize },
    AttributePointer { buffer: u32, pointer: AttributePointer },
    EnableAttribute { buffer: u32, location: u32 },
    DeleteBuffer(u32),
    Clear(Color),
    DrawFan { buffer: u32, first: u32, count: u32, depth: f32, color: [f32; 4] },
}

#[derive(Debug)]
pub(crate) struct FakeShader {
    id: u32,
    stage: ShaderStage,
    compiled: Result<wgsl::WgslStage, String>,
}

#[derive(Debug)]
pub(crate) struct FakeProgram {
    id: u32,
    stages: Vec<wgsl::WgslStage>,
    linked: Result<(), String>,
}

#[derive(Debug)]
pub(crate) struct FakeBuffer {
    id: u32,
    data: Vec<f32>,
    pointers: Vec<AttributePointer>,
    enabled: Vec<u32>,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingDevice {
    pub calls: Vec<Call>,
    next_id: u32,

    pub live_shaders: usize,
    pub live_programs: usize,
    pub live_buffers: usize,

    /// Index (0-based) of the draw call that should fail.
    pub fail_draw_at: Option<usize>,
    pub fail_uploads: bool,
    draws: usize,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn draws(&self) -> Vec<&Call> {
        self.calls.iter().filter(|c| matches!(c, Call::DrawFan { .. })).collect()
    }

    pub fn clears(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Clear(_))).count()
    }

    pub fn uploads(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Upload { .. })).count()
    }

    pub fn compiled_any(&self) -> bool {
        self.calls.iter().any(|c| matches!(c, Call::CompileShader(_)))
    }
}

impl RenderDevice for RecordingDevice {
    type Shader = FakeShader;
    type Program = FakeProgram;
    type Buffer = FakeBuffer;
    type Target = ();

    fn create_shader(&mut self, stage: ShaderStage) -> Result<FakeShader, DeviceError> {
        self.calls.push(Call::CreateShader(stage));
        self.live_shaders += 1;
        Ok(FakeShader {
            id: self.id(),
            stage,
            compiled: Err("not compiled".to_string()),
        })
    }

    fn compile_shader(&mut self, shader: &mut FakeShader, source: &str) {
        self.calls.push(Call::CompileShader(shader.stage));
        shader.compiled = wgsl::compile(source, shader.stage);
    }

    fn shader_compiled(&self, shader: &FakeShader) -> bool {
        shader.compiled.is_ok()
    }

    fn shader_info_log(&self, shader: &FakeShader) -> String {
        shader.compiled.as_ref().err().cloned().unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: FakeShader) {
        self.calls.push(Call::DeleteShader(shader.id));
        self.live_shaders -= 1;
    }

    fn create_program(&mut self) -> Result<FakeProgram, DeviceError> {
        self.calls.push(Call::CreateProgram);
        self.live_programs += 1;
        Ok(FakeProgram {
            id: self.id(),
            stages: Vec::new(),
            linked: Err("not linked".to_string()),
        })
    }

    fn attach_shader(&mut self, program: &mut FakeProgram, shader: &FakeShader) {
        self.calls.push(Call::AttachShader {
            program: program.id,
            shader: shader.id,
        });
        if let Ok(stage) = &shader.compiled {
            program.stages.push(stage.clone());
        }
    }

    fn link_program(&mut self, program: &mut FakeProgram) {
        self.calls.push(Call::LinkProgram(program.id));
        program.linked = match program.stages.as_slice() {
            [vertex, fragment] => wgsl::check_interface(vertex, fragment),
            _ => Err("program needs exactly one vertex and one fragment stage".to_string()),
        };
    }

    fn program_linked(&self, program: &FakeProgram) -> bool {
        program.linked.is_ok()
    }

    fn program_info_log(&self, program: &FakeProgram) -> String {
        program.linked.as_ref().err().cloned().unwrap_or_default()
    }

    fn delete_program(&mut self, program: FakeProgram) {
        self.calls.push(Call::DeleteProgram(program.id));
        self.live_programs -= 1;
    }

    fn attribute_location(&self, program: &FakeProgram, name: &str) -> Option<u32> {
        program.linked.as_ref().ok()?;
        let vertex = program.stages.iter().find(|s| s.stage() == ShaderStage::Vertex)?;
        wgsl::attribute_location(vertex, name)
    }

    fn create_buffer(&mut self) -> Result<FakeBuffer, DeviceError> {
        let id = self.id();
        self.calls.push(Call::CreateBuffer(id));
        self.live_buffers += 1;
        Ok(FakeBuffer {
            id,
            data: Vec::new(),
            pointers: Vec::new(),
            enabled: Vec::new(),
        })
    }

    fn upload_vertices(&mut self, buffer: &mut FakeBuffer, data: &[f32]) -> Result<(), DeviceError> {
        if self.fail_uploads {
            return Err(DeviceError::new("upload_vertices", "injected failure"));
        }
        self.calls.push(Call::Upload {
            buffer: buffer.id,
            floats: data.len(),
        });
        buffer.data = data.to_vec();
        Ok(())
    }

    fn vertex_attribute_pointer(
        &mut self,
        buffer: &mut FakeBuffer,
        pointer: AttributePointer,
    ) -> Result<(), DeviceError> {
        self.calls.push(Call::AttributePointer {
            buffer: buffer.id,
            pointer,
        });
        buffer.pointers.retain(|p| p.location != pointer.location);
        buffer.pointers.push(pointer);
        Ok(())
    }

    fn enable_attribute(&mut self, buffer: &mut FakeBuffer, location: u32) -> Result<(), DeviceError> {
        self.calls.push(Call::EnableAttribute {
            buffer: buffer.id,
            location,
        });
        if !buffer.enabled.contains(&location) {
            buffer.enabled.push(location);
        }
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: FakeBuffer) {
        self.calls.push(Call::DeleteBuffer(buffer.id));
        self.live_buffers -= 1;
    }

    fn clear(&mut self, _target: &mut (), color: Color) -> Result<(), DeviceError> {
        self.calls.push(Call::Clear(color));
        Ok(())
    }

    fn draw_triangle_fan(
        &mut self,
        _target: &mut (),
        program: &FakeProgram,
        buffer: &FakeBuffer,
        first: u32,
        count: u32,
    ) -> Result<(), DeviceError> {
        let index = self.draws;
        self.draws += 1;
        if self.fail_draw_at == Some(index) {
            return Err(DeviceError::new("draw_triangle_fan", "injected failure"));
        }
        if program.linked.is_err() {
            return Err(DeviceError::new("draw_triangle_fan", "program is not linked"));
        }
        if buffer.data.len() < 7 {
            return Err(DeviceError::new("draw_triangle_fan", "buffer holds no vertex"));
        }
        for pointer in &buffer.pointers {
            if !buffer.enabled.contains(&pointer.location) {
                return Err(DeviceError::new("draw_triangle_fan", "attribute not enabled"));
            }
        }

        let mut color = [0.0; 4];
        color.copy_from_slice(&buffer.data[3..7]);
        self.calls.push(Call::DrawFan {
            buffer: buffer.id,
            first,
            count,
            depth: buffer.data[2],
            color,
        });
        Ok(())
    }
}
