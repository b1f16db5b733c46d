//! Load-time checks that a vertex/fragment pair fits the renderer's pipeline.
//!
//! wgpu only reports interface mismatches when the pipeline is created, which
//! happens at the first draw. Checking the naga modules here turns those into
//! load failures.

use naga::valid::Capabilities;

use super::LoadError;
use super::shader::{FRAGMENT_ENTRY, VERTEX_ENTRY};

/// Byte size of the group 0 uniform (projection).
pub const GLOBALS_UNIFORM_SIZE: u32 = 64;
/// Byte size of the group 1 uniform (view, transform, color).
pub const DRAW_UNIFORM_SIZE: u32 = 144;

/// Vertex buffer attributes: position at 0, uv at 1.
const VERTEX_ATTRIBUTES: [u32; 2] = [0, 1];
/// The renderer draws into a single color target.
const COLOR_TARGETS: [u32; 1] = [0];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Slot {
    Uniform { max_size: u32 },
    Texture,
    Sampler,
}

/// What the pipeline layout provides at `(group, binding)` for `stage`.
fn slot(stage: naga::ShaderStage, group: u32, binding: u32) -> Option<Slot> {
    let globals = Slot::Uniform {
        max_size: GLOBALS_UNIFORM_SIZE,
    };
    let draw = Slot::Uniform {
        max_size: DRAW_UNIFORM_SIZE,
    };
    match (stage, group, binding) {
        (naga::ShaderStage::Vertex, 0, 0) => Some(globals),
        (naga::ShaderStage::Vertex | naga::ShaderStage::Fragment, 1, 0) => Some(draw),
        (naga::ShaderStage::Fragment, 2, 0) => Some(Slot::Texture),
        (naga::ShaderStage::Fragment, 2, 1) => Some(Slot::Sampler),
        _ => None,
    }
}

/// naga capabilities backed by `features`.
pub fn capabilities_for(features: wgpu::Features) -> Capabilities {
    let mut caps = Capabilities::default();
    for (feature, cap) in [
        (wgpu::Features::SHADER_F64, Capabilities::FLOAT64),
        (wgpu::Features::SHADER_INT64, Capabilities::SHADER_INT64),
        (wgpu::Features::DUAL_SOURCE_BLENDING, Capabilities::DUAL_SOURCE_BLENDING),
    ] {
        if features.contains(feature) {
            caps |= cap;
        }
    }
    caps
}

/// Checks that `vertex` and `fragment` link with each other and with the
/// renderer's vertex layout, bind groups and color target.
pub fn check_program(vertex: &naga::Module, fragment: &naga::Module) -> Result<(), LoadError> {
    let vs = entry(vertex, naga::ShaderStage::Vertex, VERTEX_ENTRY)?;
    let fs = entry(fragment, naga::ShaderStage::Fragment, FRAGMENT_ENTRY)?;

    let mut inputs = Vec::new();
    for arg in &vs.function.arguments {
        locations(vertex, arg.binding.as_ref(), arg.ty, &mut inputs);
    }
    if let Some((location, _)) = inputs.iter().find(|(l, _)| !VERTEX_ATTRIBUTES.contains(l)) {
        return Err(link_error(format!(
            "vertex input @location({location}) has no vertex attribute"
        )));
    }

    let mut varyings = Vec::new();
    if let Some(result) = &vs.function.result {
        locations(vertex, result.binding.as_ref(), result.ty, &mut varyings);
    }
    let mut reads = Vec::new();
    for arg in &fs.function.arguments {
        locations(fragment, arg.binding.as_ref(), arg.ty, &mut reads);
    }
    for (location, ty) in &reads {
        match varyings.iter().find(|(l, _)| l == location) {
            None => {
                return Err(link_error(format!(
                    "fragment input @location({location}) is not written by the vertex stage"
                )));
            }
            Some((_, written)) if written != ty => {
                return Err(link_error(format!(
                    "@location({location}) has different types in the vertex and fragment stages"
                )));
            }
            Some(_) => {}
        }
    }

    let mut outputs = Vec::new();
    if let Some(result) = &fs.function.result {
        locations(fragment, result.binding.as_ref(), result.ty, &mut outputs);
    }
    if let Some((location, _)) = outputs.iter().find(|(l, _)| !COLOR_TARGETS.contains(l)) {
        return Err(link_error(format!(
            "fragment output @location({location}) has no color target"
        )));
    }

    check_resources(vertex, naga::ShaderStage::Vertex)?;
    check_resources(fragment, naga::ShaderStage::Fragment)
}

fn entry<'m>(
    module: &'m naga::Module,
    stage: naga::ShaderStage,
    name: &str,
) -> Result<&'m naga::EntryPoint, LoadError> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage && ep.name == name)
        .ok_or_else(|| link_error(format!("missing entry point `{name}`")))
}

/// Collects `@location` bindings, looking through struct members.
fn locations(
    module: &naga::Module,
    binding: Option<&naga::Binding>,
    ty: naga::Handle<naga::Type>,
    out: &mut Vec<(u32, naga::TypeInner)>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.push((*location, module.types[ty].inner.clone()));
        }
        Some(_) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    locations(module, member.binding.as_ref(), member.ty, out);
                }
            }
        }
    }
}

fn check_resources(module: &naga::Module, stage: naga::ShaderStage) -> Result<(), LoadError> {
    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else { continue };
        let (group, index) = (binding.group, binding.binding);
        let inner = &module.types[var.ty].inner;

        let fits = match slot(stage, group, index) {
            None => false,
            Some(Slot::Uniform { max_size }) => {
                var.space == naga::AddressSpace::Uniform && inner.size(module.to_ctx()) <= max_size
            }
            Some(Slot::Texture) => matches!(
                inner,
                naga::TypeInner::Image {
                    dim: naga::ImageDimension::D2,
                    arrayed: false,
                    class: naga::ImageClass::Sampled {
                        kind: naga::ScalarKind::Float,
                        multi: false,
                    },
                }
            ),
            Some(Slot::Sampler) => matches!(inner, naga::TypeInner::Sampler { comparison: false }),
        };

        if !fits {
            return Err(link_error(format!(
                "{} stage binding @group({group}) @binding({index}) does not match the renderer's layout",
                stage_name(stage)
            )));
        }
    }
    Ok(())
}

fn stage_name(stage: naga::ShaderStage) -> &'static str {
    match stage {
        naga::ShaderStage::Vertex => "vertex",
        naga::ShaderStage::Fragment => "fragment",
        _ => "compute",
    }
}

fn link_error(message: String) -> LoadError {
    LoadError::ShaderValidation {
        stage: "program",
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::shader::{embedded_source, validate_stage};

    fn modules(vertex: &str, fragment: &str) -> (naga::Module, naga::Module) {
        let caps = Capabilities::default();
        (
            validate_stage(naga::ShaderStage::Vertex, vertex, caps).unwrap(),
            validate_stage(naga::ShaderStage::Fragment, fragment, caps).unwrap(),
        )
    }

    fn vertex_source() -> &'static str {
        embedded_source("simple").unwrap().0
    }

    fn assert_link_error(result: Result<(), LoadError>, needle: &str) {
        match result {
            Err(LoadError::ShaderValidation { stage: "program", message }) => {
                assert!(message.contains(needle), "unexpected message: {message}")
            }
            other => panic!("expected a link error, got {other:?}"),
        }
    }

    #[test]
    fn embedded_programs_link() {
        for name in ["simple", "simple_texture"] {
            let (vertex, fragment) = embedded_source(name).unwrap();
            let (vs, fs) = modules(vertex, fragment);
            check_program(&vs, &fs).unwrap();
        }
    }

    #[test]
    fn fragment_reading_an_unwritten_location_is_rejected() {
        let fragment = "
            @fragment
            fn fs_main(@location(3) n: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(n, 1.0);
            }";
        let (vs, fs) = modules(vertex_source(), fragment);
        assert_link_error(check_program(&vs, &fs), "@location(3)");
    }

    #[test]
    fn mismatched_varying_type_is_rejected() {
        let fragment = "
            @fragment
            fn fs_main(@location(0) uv: vec4<f32>) -> @location(0) vec4<f32> {
                return uv;
            }";
        let (vs, fs) = modules(vertex_source(), fragment);
        assert_link_error(check_program(&vs, &fs), "different types");
    }

    #[test]
    fn bind_group_outside_the_layout_is_rejected() {
        let fragment = "
            @group(3) @binding(0) var<uniform> extra: vec4<f32>;

            @fragment
            fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
                return extra * uv.x;
            }";
        let (vs, fs) = modules(vertex_source(), fragment);
        assert_link_error(check_program(&vs, &fs), "@group(3)");
    }

    #[test]
    fn globals_are_not_visible_to_the_fragment_stage() {
        let fragment = "
            @group(0) @binding(0) var<uniform> projection: mat4x4<f32>;

            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return projection[0];
            }";
        let (vs, fs) = modules(vertex_source(), fragment);
        assert_link_error(check_program(&vs, &fs), "@group(0)");
    }

    #[test]
    fn oversized_uniform_is_rejected() {
        let fragment = "
            struct Big {
                values: array<vec4<f32>, 16>,
            };
            @group(1) @binding(0) var<uniform> draw: Big;

            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return draw.values[15];
            }";
        let (vs, fs) = modules(vertex_source(), fragment);
        assert_link_error(check_program(&vs, &fs), "@group(1)");
    }

    #[test]
    fn extra_color_output_is_rejected() {
        let fragment = "
            struct Out {
                @location(0) color: vec4<f32>,
                @location(1) glow: vec4<f32>,
            };

            @fragment
            fn fs_main() -> Out {
                var out: Out;
                out.color = vec4<f32>(1.0);
                out.glow = vec4<f32>(0.0);
                return out;
            }";
        let (vs, fs) = modules(vertex_source(), fragment);
        assert_link_error(check_program(&vs, &fs), "@location(1)");
    }

    #[test]
    fn capabilities_follow_device_features() {
        assert!(!capabilities_for(wgpu::Features::empty()).contains(Capabilities::FLOAT64));
        assert!(capabilities_for(wgpu::Features::SHADER_F64).contains(Capabilities::FLOAT64));
    }
}
