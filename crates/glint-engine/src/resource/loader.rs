use std::fmt;

use super::{
    LoadError, MeshGeometry, ProceduralMesh, ResourceData, ResourceKind, ShaderSource,
    TextureParams,
};

/// Parameters of a load request. Loaders match on the variant they accept.
#[derive(Debug, Clone)]
pub enum LoadParams {
    ProceduralMesh(ProceduralMesh),
    Geometry(MeshGeometry),
    Shader(ShaderSource),
    Texture(TextureParams),
}

impl fmt::Display for LoadParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadParams::ProceduralMesh(mesh) => write!(f, "procedural mesh {mesh:?}"),
            LoadParams::Geometry(geometry) => write!(
                f,
                "geometry ({} vertices, {} indices, {:?})",
                geometry.vertices.len(),
                geometry.indices.len(),
                geometry.topology
            ),
            LoadParams::Shader(source) => write!(f, "shader {source}"),
            LoadParams::Texture(params) => write!(f, "texture {}", params.path.display()),
        }
    }
}

impl From<ProceduralMesh> for LoadParams {
    fn from(mesh: ProceduralMesh) -> Self {
        LoadParams::ProceduralMesh(mesh)
    }
}

impl From<MeshGeometry> for LoadParams {
    fn from(geometry: MeshGeometry) -> Self {
        LoadParams::Geometry(geometry)
    }
}

impl From<ShaderSource> for LoadParams {
    fn from(source: ShaderSource) -> Self {
        LoadParams::Shader(source)
    }
}

impl From<TextureParams> for LoadParams {
    fn from(params: TextureParams) -> Self {
        LoadParams::Texture(params)
    }
}

/// Produces payloads for the requests it accepts.
///
/// Loaders return only the payload; the manager owns the uri and kind of the
/// cached resource.
pub trait ResourceLoader<D = ResourceData> {
    fn can_load(&self, kind: ResourceKind, uri: &str, params: &LoadParams) -> bool;

    fn load(&self, uri: &str, params: &LoadParams) -> Result<D, LoadError>;
}
