//! Parsing, validation and uniform introspection of WGSL stages with naga.

use std::collections::HashMap;

use naga::{AddressSpace, ArraySize, ImageDimension, ScalarKind, TypeInner, VectorSize};

use crate::{
    backend::{ProgramLayout, ShaderStage, TextureKind, Uniform, UniformKind},
    error::LoadError,
};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

const UNIFORM_GROUP: u32 = 0;
const UNIFORM_BINDING: u32 = 0;
const TEXTURE_GROUP: u32 = 1;

/// Compiles both stages on the CPU and collects the program's uniforms.
///
/// The uniform block is the `var<uniform>` at group 0, binding 0. When both
/// stages declare it, every member they share must agree on offset and type.
pub fn reflect_program(
    program: &str,
    vertex: &str,
    fragment: &str,
) -> Result<ProgramLayout, LoadError> {
    let vs = parse_stage(program, ShaderStage::Vertex, vertex)?;
    let fs = parse_stage(program, ShaderStage::Fragment, fragment)?;

    require_entry(program, &vs, naga::ShaderStage::Vertex, VERTEX_ENTRY)?;
    require_entry(program, &fs, naga::ShaderStage::Fragment, FRAGMENT_ENTRY)?;

    let mut layout = ProgramLayout::default();
    for module in [&vs, &fs] {
        let (uniforms, size) = uniform_block(module);
        layout.block_size = layout.block_size.max(size);
        for (name, uniform) in uniforms {
            match layout.uniforms.get(&name) {
                Some(existing) if *existing != uniform => {
                    return Err(LoadError::Link {
                        program: program.to_string(),
                        message: format!(
                            "uniform `{}` is declared differently in the vertex and fragment stage",
                            name
                        ),
                    });
                }
                _ => {
                    layout.uniforms.insert(name, uniform);
                }
            }
        }
        if let Some(kind) = texture_kind(module) {
            layout.texture = Some(kind);
        }
    }
    log::debug!(
        "program `{}`: {} uniforms in a {} byte block, texture {:?}",
        program,
        layout.uniforms.len(),
        layout.block_size,
        layout.texture
    );
    Ok(layout)
}

fn parse_stage(
    program: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<naga::Module, LoadError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| LoadError::Shader {
        program: program.to_string(),
        stage,
        message: e.emit_to_string(source),
    })?;
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    );
    validator.validate(&module).map_err(|e| LoadError::Shader {
        program: program.to_string(),
        stage,
        message: e.emit_to_string(source),
    })?;
    Ok(module)
}

fn require_entry(
    program: &str,
    module: &naga::Module,
    stage: naga::ShaderStage,
    name: &str,
) -> Result<(), LoadError> {
    if module
        .entry_points
        .iter()
        .any(|ep| ep.stage == stage && ep.name == name)
    {
        Ok(())
    } else {
        Err(LoadError::Link {
            program: program.to_string(),
            message: format!("missing {:?} entry point `{}`", stage, name),
        })
    }
}

fn uniform_block(module: &naga::Module) -> (Vec<(String, Uniform)>, u32) {
    let block = module.global_variables.iter().find(|(_, var)| {
        var.space == AddressSpace::Uniform
            && var
                .binding
                .as_ref()
                .is_some_and(|b| b.group == UNIFORM_GROUP && b.binding == UNIFORM_BINDING)
    });
    let Some((_, var)) = block else {
        return (Vec::new(), 0);
    };
    match &module.types[var.ty].inner {
        TypeInner::Struct { members, span } => {
            let uniforms = members
                .iter()
                .filter_map(|member| {
                    let name = member.name.clone()?;
                    let (kind, array_size) = uniform_kind(module, member.ty);
                    Some((
                        name,
                        Uniform {
                            location: member.offset,
                            kind,
                            array_size,
                        },
                    ))
                })
                .collect();
            (uniforms, *span)
        }
        // a bare `var<uniform> x: mat4x4<f32>` is addressed through the variable name
        _ => {
            let (kind, array_size) = uniform_kind(module, var.ty);
            let name = var.name.clone().unwrap_or_default();
            let uniform = Uniform {
                location: 0,
                kind,
                array_size,
            };
            (vec![(name, uniform)], kind.size() * array_size)
        }
    }
}

fn uniform_kind(module: &naga::Module, ty: naga::Handle<naga::Type>) -> (UniformKind, u32) {
    match &module.types[ty].inner {
        TypeInner::Scalar(scalar) => (scalar_kind(scalar.kind), 1),
        TypeInner::Vector { size, scalar } if scalar.kind == ScalarKind::Float => match size {
            VectorSize::Bi => (UniformKind::Vec2, 1),
            VectorSize::Tri => (UniformKind::Vec3, 1),
            VectorSize::Quad => (UniformKind::Vec4, 1),
        },
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            ..
        } => (UniformKind::Mat4, 1),
        TypeInner::Matrix {
            columns: VectorSize::Tri,
            rows: VectorSize::Tri,
            ..
        } => (UniformKind::Mat3, 1),
        TypeInner::Array {
            base,
            size: ArraySize::Constant(len),
            ..
        } => (uniform_kind(module, *base).0, len.get()),
        _ => (UniformKind::Other, 1),
    }
}

fn scalar_kind(kind: ScalarKind) -> UniformKind {
    match kind {
        ScalarKind::Float => UniformKind::Float,
        ScalarKind::Sint => UniformKind::Int,
        ScalarKind::Uint => UniformKind::UInt,
        _ => UniformKind::Other,
    }
}

fn texture_kind(module: &naga::Module) -> Option<TextureKind> {
    module
        .global_variables
        .iter()
        .filter(|(_, var)| {
            var.binding
                .as_ref()
                .is_some_and(|b| b.group == TEXTURE_GROUP)
        })
        .find_map(|(_, var)| match &module.types[var.ty].inner {
            TypeInner::Image {
                dim: ImageDimension::Cube,
                ..
            } => Some(TextureKind::Cube),
            TypeInner::Image { .. } => Some(TextureKind::D2),
            _ => None,
        })
}

/// Names of all uniforms, sorted. Handy for diagnostics.
pub fn uniform_names(uniforms: &HashMap<String, Uniform>) -> Vec<&str> {
    let mut names: Vec<&str> = uniforms.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}
