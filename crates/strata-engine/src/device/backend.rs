use crate::paint::Color;
use crate::shader::ShaderStage;

use super::DeviceError;

/// Vertex attribute read from an interleaved `f32` buffer.
///
/// Offsets and strides are in bytes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttributePointer {
    pub location: u32,
    /// Number of `f32` components (1..=4).
    pub components: u8,
    pub stride: u64,
    pub offset: u64,
}

impl AttributePointer {
    #[inline]
    pub const fn floats(location: u32, components: u8, stride_floats: u64, offset_floats: u64) -> Self {
        const F32: u64 = std::mem::size_of::<f32>() as u64;
        Self {
            location,
            components,
            stride: stride_floats * F32,
            offset: offset_floats * F32,
        }
    }
}

/// Capability set required from a graphics backend.
///
/// Every operation receives the object it acts on; there is no implicitly
/// bound shader, program or buffer. Resources are owned by the caller and
/// returned to the device through the matching `delete_*` call.
pub trait RenderDevice {
    type Shader;
    type Program;
    type Buffer;
    /// Frame-scoped destination for clears and draws.
    type Target;

    // ── shader stages ─────────────────────────────────────────────────────

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, DeviceError>;

    /// Compiles `source` into `shader`. The outcome is queried with
    /// [`shader_compiled`](Self::shader_compiled).
    fn compile_shader(&mut self, shader: &mut Self::Shader, source: &str);

    fn shader_compiled(&self, shader: &Self::Shader) -> bool;

    fn shader_info_log(&self, shader: &Self::Shader) -> String;

    fn delete_shader(&mut self, shader: Self::Shader);

    // ── programs ──────────────────────────────────────────────────────────

    fn create_program(&mut self) -> Result<Self::Program, DeviceError>;

    fn attach_shader(&mut self, program: &mut Self::Program, shader: &Self::Shader);

    fn link_program(&mut self, program: &mut Self::Program);

    fn program_linked(&self, program: &Self::Program) -> bool;

    fn program_info_log(&self, program: &Self::Program) -> String;

    fn delete_program(&mut self, program: Self::Program);

    /// Slot of the named vertex input in a linked program.
    fn attribute_location(&self, program: &Self::Program, name: &str) -> Option<u32>;

    // ── vertex buffers ────────────────────────────────────────────────────

    fn create_buffer(&mut self) -> Result<Self::Buffer, DeviceError>;

    fn upload_vertices(&mut self, buffer: &mut Self::Buffer, data: &[f32]) -> Result<(), DeviceError>;

    fn vertex_attribute_pointer(
        &mut self,
        buffer: &mut Self::Buffer,
        pointer: AttributePointer,
    ) -> Result<(), DeviceError>;

    fn enable_attribute(&mut self, buffer: &mut Self::Buffer, location: u32) -> Result<(), DeviceError>;

    fn delete_buffer(&mut self, buffer: Self::Buffer);

    // ── frame commands ────────────────────────────────────────────────────

    fn clear(&mut self, target: &mut Self::Target, color: Color) -> Result<(), DeviceError>;

    /// Draws `count` vertices starting at `first` as a triangle fan: triangle
    /// `k` is `(first, first + k + 1, first + k + 2)`.
    fn draw_triangle_fan(
        &mut self,
        target: &mut Self::Target,
        program: &Self::Program,
        buffer: &Self::Buffer,
        first: u32,
        count: u32,
    ) -> Result<(), DeviceError>;
}

/// Expands a triangle fan over `first..first + count` into a triangle list.
///
/// Fewer than 3 vertices produce no triangles.
pub fn fan_indices(first: u32, count: u32) -> Vec<u32> {
    if count < 3 {
        return Vec::new();
    }
    (1..count - 1)
        .flat_map(|k| [first, first + k, first + k + 1])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_fan_is_two_triangles_sharing_first_vertex() {
        assert_eq!(fan_indices(0, 4), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn fan_respects_first_vertex() {
        assert_eq!(fan_indices(4, 3), vec![4, 5, 6]);
    }

    #[test]
    fn degenerate_fans_are_empty() {
        assert!(fan_indices(0, 0).is_empty());
        assert!(fan_indices(0, 2).is_empty());
    }

    #[test]
    fn pointer_from_floats_is_in_bytes() {
        let color = AttributePointer::floats(1, 4, 7, 3);
        assert_eq!(color.stride, 28);
        assert_eq!(color.offset, 12);
    }
}
