//! Resource cache and loaders.
//!
//! Resources are addressed by an opaque uri string. A [`ResourceManager`]
//! asks its registered [`ResourceLoader`]s, in registration order, to produce
//! the payload for a `(kind, uri, params)` request and caches the result.
//! Failed loads are cached as empty placeholders so every preloaded uri
//! resolves to exactly one [`Resource`].

mod error;
pub mod linkage;
mod loader;
mod manager;
pub mod mesh;
pub mod shader;
pub mod texture;

use std::fmt;

pub use error::{LoadError, ResourceError};
pub use loader::{LoadParams, ResourceLoader};
pub use manager::ResourceManager;
pub use mesh::{GpuMesh, MeshGeometry, ProceduralMesh, ProceduralMeshLoader, Topology, Vertex};
pub use shader::{ShaderLoader, ShaderProgram, ShaderSource};
pub use texture::{GpuTexture, Rgba8Image, TextureLoader, TextureParams};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Mesh,
    Shader,
    Texture,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Mesh => "mesh",
            ResourceKind::Shader => "shader",
            ResourceKind::Texture => "texture",
        })
    }
}

/// Per-payload finalizer run when a cached resource leaves the manager.
pub trait Release {
    fn release(self);
}

/// Payloads produced by the built-in loaders.
#[derive(Debug, Clone)]
pub enum ResourceData {
    Mesh(GpuMesh),
    Shader(ShaderProgram),
    Texture(GpuTexture),
}

impl Release for ResourceData {
    fn release(self) {
        match self {
            ResourceData::Mesh(mesh) => mesh.release(),
            ResourceData::Shader(shader) => shader.release(),
            ResourceData::Texture(texture) => texture.release(),
        }
    }
}

/// A cached resource. `data` is `None` for placeholders of failed loads.
#[derive(Debug, Clone)]
pub struct Resource<D = ResourceData> {
    pub kind: ResourceKind,
    pub uri: String,
    pub data: Option<D>,
}

impl<D> Resource<D> {
    pub fn new(kind: ResourceKind, uri: impl Into<String>, data: D) -> Self {
        Self {
            kind,
            uri: uri.into(),
            data: Some(data),
        }
    }

    pub fn empty(kind: ResourceKind, uri: impl Into<String>) -> Self {
        Self {
            kind,
            uri: uri.into(),
            data: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }
}

impl<D: Release> Resource<D> {
    /// Runs the payload finalizer. The resource is empty afterwards.
    pub fn release(&mut self) {
        if let Some(data) = self.data.take() {
            data.release();
        }
    }
}

impl Resource<ResourceData> {
    pub fn mesh(&self) -> Option<&GpuMesh> {
        match &self.data {
            Some(ResourceData::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn shader(&self) -> Option<&ShaderProgram> {
        match &self.data {
            Some(ResourceData::Shader(shader)) => Some(shader),
            _ => None,
        }
    }

    pub fn texture(&self) -> Option<&GpuTexture> {
        match &self.data {
            Some(ResourceData::Texture(texture)) => Some(texture),
            _ => None,
        }
    }
}
