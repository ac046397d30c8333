use core::fmt;

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// Source text for a vertex/fragment pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ShaderSources<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

impl ShaderSources<'static> {
    /// Pass-through pair: clip-space position in, interpolated color out.
    pub const PAINTER: Self = Self {
        vertex: include_str!("shaders/painter.vert.wgsl"),
        fragment: include_str!("shaders/painter.frag.wgsl"),
    };
}
