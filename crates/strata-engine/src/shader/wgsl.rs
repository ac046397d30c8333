//! WGSL front end built on naga.
//!
//! Shader source is parsed and validated on the CPU so that malformed source
//! is reported as a diagnostic string instead of reaching the GPU driver.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{Binding, Handle, Module, Type, TypeInner};

use super::ShaderStage;

/// A `@location` slot on a stage boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceSlot {
    pub location: u32,
    pub name: Option<String>,
    pub ty: TypeInner,
}

/// A validated WGSL module with one entry point for `stage`.
#[derive(Debug, Clone)]
pub struct WgslStage {
    stage: ShaderStage,
    entry_point: String,
    inputs: Vec<InterfaceSlot>,
    outputs: Vec<InterfaceSlot>,
}

impl WgslStage {
    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[inline]
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    #[inline]
    pub fn inputs(&self) -> &[InterfaceSlot] {
        &self.inputs
    }

    #[inline]
    pub fn outputs(&self) -> &[InterfaceSlot] {
        &self.outputs
    }
}

/// Parses and validates `source` and picks its `stage` entry point.
///
/// Errors carry naga's rendered diagnostic.
pub fn compile(source: &str, stage: ShaderStage) -> Result<WgslStage, String> {
    if source.trim().is_empty() {
        return Err("shader source is empty".to_string());
    }

    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let naga_stage = stage.to_naga();
    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga_stage)
        .ok_or_else(|| format!("no @{stage} entry point in shader source"))?;

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_slots(&module, arg.binding.as_ref(), arg.name.as_deref(), arg.ty, &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_slots(&module, result.binding.as_ref(), None, result.ty, &mut outputs);
    }

    Ok(WgslStage {
        stage,
        entry_point: entry.name.clone(),
        inputs,
        outputs,
    })
}

/// Checks that every fragment input is written by the vertex stage with the
/// same type.
pub fn check_interface(vertex: &WgslStage, fragment: &WgslStage) -> Result<(), String> {
    if vertex.stage != ShaderStage::Vertex {
        return Err(format!("expected a vertex stage, got {}", vertex.stage));
    }
    if fragment.stage != ShaderStage::Fragment {
        return Err(format!("expected a fragment stage, got {}", fragment.stage));
    }

    for input in &fragment.inputs {
        let Some(output) = vertex.outputs.iter().find(|o| o.location == input.location) else {
            return Err(format!(
                "fragment input @location({}) is not written by the vertex stage",
                input.location
            ));
        };
        if output.ty != input.ty {
            return Err(format!(
                "type mismatch at @location({}): vertex writes {:?}, fragment reads {:?}",
                input.location, output.ty, input.ty
            ));
        }
    }
    Ok(())
}

/// Resolves a vertex input by name, looking through struct-typed arguments.
pub fn attribute_location(vertex: &WgslStage, name: &str) -> Option<u32> {
    vertex
        .inputs
        .iter()
        .find(|slot| slot.name.as_deref() == Some(name))
        .map(|slot| slot.location)
}

fn collect_slots(
    module: &Module,
    binding: Option<&Binding>,
    name: Option<&str>,
    ty: Handle<Type>,
    out: &mut Vec<InterfaceSlot>,
) {
    let inner = &module.types[ty].inner;
    match binding {
        Some(Binding::Location { location, .. }) => out.push(InterfaceSlot {
            location: *location,
            name: name.map(str::to_owned),
            ty: inner.clone(),
        }),
        Some(_) => {} // builtins are not part of the user interface
        None => {
            if let TypeInner::Struct { members, .. } = inner {
                for m in members {
                    collect_slots(module, m.binding.as_ref(), m.name.as_deref(), m.ty, out);
                }
            }
        }
    }
}
