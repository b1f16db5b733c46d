//! Shader programs: WGSL sources validated with naga, then compiled by wgpu.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::linkage::{capabilities_for, check_program};
use super::{LoadError, LoadParams, Release, ResourceData, ResourceKind, ResourceLoader};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

const TRANSFORM_VERT: &str = include_str!("shaders/transform.vert.wgsl");
const COLOR_FRAG: &str = include_str!("shaders/color.frag.wgsl");
const TEXTURE_FRAG: &str = include_str!("shaders/texture.frag.wgsl");

/// Vertex and fragment sources of an embedded program.
pub fn embedded_source(name: &str) -> Option<(&'static str, &'static str)> {
    match name {
        "simple" => Some((TRANSFORM_VERT, COLOR_FRAG)),
        "simple_texture" => Some((TRANSFORM_VERT, TEXTURE_FRAG)),
        _ => None,
    }
}

/// Where a program's WGSL comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    Wgsl { vertex: String, fragment: String },
    Files { vertex_path: PathBuf, fragment_path: PathBuf },
    Embedded { name: String },
}

impl ShaderSource {
    pub fn embedded(name: impl Into<String>) -> Self {
        ShaderSource::Embedded { name: name.into() }
    }

    /// Reads the vertex and fragment sources.
    pub fn resolve(&self) -> Result<(Cow<'_, str>, Cow<'_, str>), LoadError> {
        match self {
            ShaderSource::Wgsl { vertex, fragment } => {
                Ok((Cow::Borrowed(vertex.as_str()), Cow::Borrowed(fragment.as_str())))
            }
            ShaderSource::Files {
                vertex_path,
                fragment_path,
            } => Ok((
                Cow::Owned(read_source(vertex_path)?),
                Cow::Owned(read_source(fragment_path)?),
            )),
            ShaderSource::Embedded { name } => embedded_source(name)
                .map(|(v, f)| (Cow::Borrowed(v), Cow::Borrowed(f)))
                .ok_or_else(|| LoadError::UnknownEmbeddedShader(name.clone())),
        }
    }
}

impl fmt::Display for ShaderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderSource::Wgsl { .. } => f.write_str("<inline wgsl>"),
            ShaderSource::Files {
                vertex_path,
                fragment_path,
            } => write!(f, "{} + {}", vertex_path.display(), fragment_path.display()),
            ShaderSource::Embedded { name } => write!(f, "embedded:{name}"),
        }
    }
}

fn read_source(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses and validates one WGSL stage against `capabilities`, checking its
/// entry point.
pub fn validate_stage(
    stage: naga::ShaderStage,
    source: &str,
    capabilities: Capabilities,
) -> Result<naga::Module, LoadError> {
    let (stage_name, entry) = match stage {
        naga::ShaderStage::Vertex => ("vertex", VERTEX_ENTRY),
        naga::ShaderStage::Fragment => ("fragment", FRAGMENT_ENTRY),
        _ => ("compute", "main"),
    };

    let module = naga::front::wgsl::parse_str(source).map_err(|e| LoadError::ShaderParse {
        stage: stage_name,
        message: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), capabilities)
        .validate(&module)
        .map_err(|e| LoadError::ShaderValidation {
            stage: stage_name,
            message: e.as_inner().to_string(),
        })?;

    let has_entry = module
        .entry_points
        .iter()
        .any(|ep| ep.stage == stage && ep.name == entry);
    if !has_entry {
        return Err(LoadError::ShaderValidation {
            stage: stage_name,
            message: format!("missing entry point `{entry}`"),
        });
    }

    Ok(module)
}

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

/// Compiled vertex + fragment pair.
///
/// `id` is unique per program and keys the renderer's pipeline cache.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    pub id: u64,
    pub vertex: wgpu::ShaderModule,
    pub fragment: wgpu::ShaderModule,
}

impl ShaderProgram {
    pub fn compile(device: &wgpu::Device, label: &str, source: &ShaderSource) -> Result<Self, LoadError> {
        let (vertex_src, fragment_src) = source.resolve()?;
        let capabilities = capabilities_for(device.features());
        let vertex_module = validate_stage(naga::ShaderStage::Vertex, &vertex_src, capabilities)?;
        let fragment_module = validate_stage(naga::ShaderStage::Fragment, &fragment_src, capabilities)?;
        check_program(&vertex_module, &fragment_module)?;

        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} vertex")),
            source: wgpu::ShaderSource::Wgsl(vertex_src),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} fragment")),
            source: wgpu::ShaderSource::Wgsl(fragment_src),
        });

        Ok(Self {
            id: NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed),
            vertex,
            fragment,
        })
    }
}

impl Release for ShaderProgram {
    // Modules are freed once the last handle drops.
    fn release(self) {}
}

pub struct ShaderLoader {
    device: wgpu::Device,
}

impl ShaderLoader {
    pub fn new(device: wgpu::Device) -> Self {
        Self { device }
    }
}

impl ResourceLoader for ShaderLoader {
    fn can_load(&self, kind: ResourceKind, _uri: &str, params: &LoadParams) -> bool {
        kind == ResourceKind::Shader && matches!(params, LoadParams::Shader(_))
    }

    fn load(&self, uri: &str, params: &LoadParams) -> Result<ResourceData, LoadError> {
        let LoadParams::Shader(source) = params else {
            return Err(LoadError::UnsupportedParams(params.to_string()));
        };
        ShaderProgram::compile(&self.device, uri, source).map(ResourceData::Shader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_programs_validate() {
        for name in ["simple", "simple_texture"] {
            let source = ShaderSource::embedded(name);
            let (vertex, fragment) = source.resolve().unwrap();
            validate_stage(naga::ShaderStage::Vertex, &vertex, Capabilities::default()).unwrap();
            validate_stage(naga::ShaderStage::Fragment, &fragment, Capabilities::default()).unwrap();
        }
    }

    #[test]
    fn unknown_embedded_name_is_an_error() {
        assert!(matches!(
            ShaderSource::embedded("fancy").resolve(),
            Err(LoadError::UnknownEmbeddedShader(name)) if name == "fancy"
        ));
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        let err = validate_stage(naga::ShaderStage::Vertex, "fn vs_main( {", Capabilities::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::ShaderParse { stage: "vertex", .. }));
    }

    #[test]
    fn missing_entry_point_is_rejected() {
        let err = validate_stage(naga::ShaderStage::Vertex, COLOR_FRAG, Capabilities::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::ShaderValidation { stage: "vertex", .. }));
    }

    #[test]
    fn missing_files_report_the_path() {
        let source = ShaderSource::Files {
            vertex_path: PathBuf::from("does/not/exist.wgsl"),
            fragment_path: PathBuf::from("frag.wgsl"),
        };
        match source.resolve() {
            Err(LoadError::Io { path, .. }) => assert_eq!(path, PathBuf::from("does/not/exist.wgsl")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
