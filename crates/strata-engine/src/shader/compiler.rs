use crate::device::RenderDevice;
use crate::render::RenderError;

use super::{ShaderSources, ShaderStage};

/// A successfully compiled shader stage.
///
/// Owns its backend shader object; hand it back with
/// [`ShaderCompiler::release_stage`] once it is no longer needed.
#[derive(Debug)]
pub struct CompiledStage<S> {
    stage: ShaderStage,
    shader: S,
}

impl<S> CompiledStage<S> {
    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[inline]
    pub fn shader(&self) -> &S {
        &self.shader
    }
}

/// Turns shader source into a linked program on a [`RenderDevice`].
///
/// A failed compile or link never leaves a usable handle behind: the partially
/// created backend object is deleted before the error is returned.
pub struct ShaderCompiler<'d, D: RenderDevice> {
    device: &'d mut D,
}

impl<'d, D: RenderDevice> ShaderCompiler<'d, D> {
    pub fn new(device: &'d mut D) -> Self {
        Self { device }
    }

    pub fn compile(
        &mut self,
        source: &str,
        stage: ShaderStage,
    ) -> Result<CompiledStage<D::Shader>, RenderError> {
        if source.trim().is_empty() {
            return Err(RenderError::ShaderCompile {
                stage,
                log: "shader source is empty".to_string(),
            });
        }

        let mut shader = self.device.create_shader(stage)?;
        self.device.compile_shader(&mut shader, source);

        if !self.device.shader_compiled(&shader) {
            let log = self.device.shader_info_log(&shader);
            self.device.delete_shader(shader);
            log::error!("error compiling {stage} shader: {log}");
            return Err(RenderError::ShaderCompile { stage, log });
        }

        log::debug!("compiled {stage} shader");
        Ok(CompiledStage { stage, shader })
    }

    pub fn link(
        &mut self,
        vertex: &CompiledStage<D::Shader>,
        fragment: &CompiledStage<D::Shader>,
    ) -> Result<D::Program, RenderError> {
        if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
            return Err(RenderError::ShaderLink {
                log: format!(
                    "expected vertex + fragment stages, got {} + {}",
                    vertex.stage, fragment.stage
                ),
            });
        }

        let mut program = self.device.create_program()?;
        self.device.attach_shader(&mut program, &vertex.shader);
        self.device.attach_shader(&mut program, &fragment.shader);
        self.device.link_program(&mut program);

        if !self.device.program_linked(&program) {
            let log = self.device.program_info_log(&program);
            self.device.delete_program(program);
            log::error!("error linking shader program: {log}");
            return Err(RenderError::ShaderLink { log });
        }

        log::debug!("linked shader program");
        Ok(program)
    }

    pub fn release_stage(&mut self, stage: CompiledStage<D::Shader>) {
        self.device.delete_shader(stage.shader);
    }

    /// Compiles both stages of `sources` and links them.
    ///
    /// Stage objects are released whether or not linking succeeds; the
    /// fragment stage is never compiled if the vertex stage fails.
    pub fn build_program(&mut self, sources: &ShaderSources<'_>) -> Result<D::Program, RenderError> {
        let vertex = self.compile(sources.vertex, ShaderStage::Vertex)?;
        let fragment = match self.compile(sources.fragment, ShaderStage::Fragment) {
            Ok(f) => f,
            Err(e) => {
                self.release_stage(vertex);
                return Err(e);
            }
        };

        let linked = self.link(&vertex, &fragment);
        self.release_stage(vertex);
        self.release_stage(fragment);
        linked
    }
}
