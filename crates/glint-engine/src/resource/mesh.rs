//! Meshes: CPU geometry, procedural shapes and the GPU upload loader.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::{LoadError, LoadParams, Release, ResourceData, ResourceKind, ResourceLoader};

pub const DEFAULT_CIRCLE_SEGMENTS: u32 = 24;

/// Interleaved vertex: position then uv, 20 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x2  // uv
    ];

    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y, 0.0],
            uv: [u, v],
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// How an index buffer is assembled into primitives.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    /// Uploaded as a triangle list; see [`fan_to_list`].
    TriangleFan,
    TriangleList,
    TriangleStrip,
    LineStrip,
    LineList,
}

impl Topology {
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::TriangleFan | Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
            Topology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            Topology::LineList => wgpu::PrimitiveTopology::LineList,
        }
    }

    /// Strip topologies need the index format at pipeline creation.
    pub fn strip_index_format(self) -> Option<wgpu::IndexFormat> {
        match self {
            Topology::TriangleStrip | Topology::LineStrip => Some(wgpu::IndexFormat::Uint32),
            _ => None,
        }
    }

    pub fn is_lines(self) -> bool {
        matches!(self, Topology::LineStrip | Topology::LineList)
    }
}

/// Expands triangle-fan indices into a triangle list: `a,b,c,d` becomes
/// `a,b,c, a,c,d`.
pub fn fan_to_list(indices: &[u32]) -> Vec<u32> {
    let Some((&center, rest)) = indices.split_first() else {
        return Vec::new();
    };
    rest.windows(2)
        .flat_map(|pair| [center, pair[0], pair[1]])
        .collect()
}

/// Vertices and indices of a mesh before upload.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl MeshGeometry {
    /// Unit quad centered on the origin, as a triangle fan.
    pub fn quad() -> Self {
        Self {
            vertices: quad_vertices(),
            indices: vec![0, 1, 2, 3],
            topology: Topology::TriangleFan,
        }
    }

    /// Outline of [`quad`](Self::quad).
    pub fn quad_border() -> Self {
        Self {
            vertices: quad_vertices(),
            indices: vec![0, 1, 2, 3, 0],
            topology: Topology::LineStrip,
        }
    }

    /// Unit-diameter disc: a center vertex followed by the ring.
    pub fn circle(segments: u32) -> Result<Self, LoadError> {
        check_segments(segments)?;
        let mut vertices = Vec::with_capacity(segments as usize + 1);
        vertices.push(Vertex::new(0.0, 0.0, 0.5, 0.5));
        vertices.extend(ring(segments));

        let mut indices: Vec<u32> = (0..=segments).collect();
        indices.push(1);

        Ok(Self {
            vertices,
            indices,
            topology: Topology::TriangleFan,
        })
    }

    /// Unit-diameter ring outline.
    pub fn circle_border(segments: u32) -> Result<Self, LoadError> {
        check_segments(segments)?;
        let mut indices: Vec<u32> = (0..segments).collect();
        indices.push(0);

        Ok(Self {
            vertices: ring(segments).collect(),
            indices,
            topology: Topology::LineStrip,
        })
    }

    /// Rejects empty meshes and out-of-range indices.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err(LoadError::InvalidGeometry("mesh has no vertices or indices".into()));
        }
        let count = self.vertices.len() as u32;
        if let Some(bad) = self.indices.iter().find(|&&i| i >= count) {
            return Err(LoadError::InvalidGeometry(format!(
                "index {bad} out of range for {count} vertices"
            )));
        }
        Ok(())
    }

    /// Indices in the layout the GPU draws.
    pub fn gpu_indices(&self) -> Vec<u32> {
        match self.topology {
            Topology::TriangleFan => fan_to_list(&self.indices),
            _ => self.indices.clone(),
        }
    }
}

fn quad_vertices() -> Vec<Vertex> {
    vec![
        Vertex::new(-0.5, -0.5, 0.0, 1.0),
        Vertex::new(0.5, -0.5, 1.0, 1.0),
        Vertex::new(0.5, 0.5, 1.0, 0.0),
        Vertex::new(-0.5, 0.5, 0.0, 0.0),
    ]
}

fn ring(segments: u32) -> impl Iterator<Item = Vertex> {
    (0..segments).map(move |i| {
        let angle = TAU * i as f32 / segments as f32;
        let (sin, cos) = angle.sin_cos();
        Vertex::new(cos / 2.0, sin / 2.0, 0.5 + cos / 2.0, 0.5 + sin / 2.0)
    })
}

fn check_segments(segments: u32) -> Result<(), LoadError> {
    if segments < 3 {
        return Err(LoadError::InvalidGeometry(format!(
            "a circle needs at least 3 segments, got {segments}"
        )));
    }
    Ok(())
}

/// Built-in shapes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ProceduralMesh {
    Quad,
    QuadBorder,
    Circle { segments: u32 },
    CircleBorder { segments: u32 },
}

impl ProceduralMesh {
    pub fn geometry(self) -> Result<MeshGeometry, LoadError> {
        match self {
            ProceduralMesh::Quad => Ok(MeshGeometry::quad()),
            ProceduralMesh::QuadBorder => Ok(MeshGeometry::quad_border()),
            ProceduralMesh::Circle { segments } => MeshGeometry::circle(segments),
            ProceduralMesh::CircleBorder { segments } => MeshGeometry::circle_border(segments),
        }
    }
}

/// Mesh uploaded to GPU buffers.
#[derive(Debug, Clone)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    /// Number of indices in `index_buffer`.
    pub index_count: u32,
    pub topology: Topology,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, geometry: &MeshGeometry) -> Result<Self, LoadError> {
        geometry.validate()?;
        let indices = geometry.gpu_indices();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vbo")),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} ibo")),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            topology: geometry.topology,
        })
    }
}

impl Release for GpuMesh {
    fn release(self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// Uploads procedural shapes and explicit geometry.
pub struct ProceduralMeshLoader {
    device: wgpu::Device,
}

impl ProceduralMeshLoader {
    pub fn new(device: wgpu::Device) -> Self {
        Self { device }
    }
}

impl ResourceLoader for ProceduralMeshLoader {
    fn can_load(&self, kind: ResourceKind, _uri: &str, params: &LoadParams) -> bool {
        kind == ResourceKind::Mesh
            && matches!(params, LoadParams::ProceduralMesh(_) | LoadParams::Geometry(_))
    }

    fn load(&self, uri: &str, params: &LoadParams) -> Result<ResourceData, LoadError> {
        let geometry = match params {
            LoadParams::ProceduralMesh(shape) => shape.geometry()?,
            LoadParams::Geometry(geometry) => geometry.clone(),
            other => return Err(LoadError::UnsupportedParams(other.to_string())),
        };
        GpuMesh::upload(&self.device, uri, &geometry).map(ResourceData::Mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn vertex_stride_is_20_bytes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 20);
        assert_eq!(Vertex::layout().array_stride, 20);
    }

    #[test]
    fn quad_is_a_fan_and_border_closes() {
        let quad = MeshGeometry::quad();
        assert_eq!(quad.vertices[0], Vertex::new(-0.5, -0.5, 0.0, 1.0));
        assert_eq!(quad.vertices[2].uv, [1.0, 0.0]);
        assert_eq!(quad.gpu_indices(), vec![0, 1, 2, 0, 2, 3]);

        let border = MeshGeometry::quad_border();
        assert_eq!(border.indices, vec![0, 1, 2, 3, 0]);
        assert_eq!(border.gpu_indices(), border.indices);
        assert_eq!(border.topology, Topology::LineStrip);
    }

    #[test]
    fn circle_with_four_segments() {
        let circle = MeshGeometry::circle(4).unwrap();
        assert_eq!(circle.vertices.len(), 5);
        assert_eq!(circle.vertices[0].uv, [0.5, 0.5]);
        assert_eq!(circle.indices, vec![0, 1, 2, 3, 4, 1]);

        for (i, angle) in [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2].into_iter().enumerate() {
            let v = circle.vertices[i + 1];
            assert!(close(v.position, [angle.cos() / 2.0, angle.sin() / 2.0, 0.0]));
        }

        // Four triangles around the center.
        assert_eq!(
            circle.gpu_indices(),
            vec![0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 4, 1]
        );
    }

    #[test]
    fn circle_border_is_a_closed_strip() {
        let border = MeshGeometry::circle_border(DEFAULT_CIRCLE_SEGMENTS).unwrap();
        assert_eq!(border.vertices.len(), 24);
        assert_eq!(border.indices.len(), 25);
        assert_eq!(border.indices.last(), Some(&0));
        assert!(border.validate().is_ok());
    }

    #[test]
    fn too_few_segments_are_rejected() {
        assert!(matches!(
            ProceduralMesh::Circle { segments: 2 }.geometry(),
            Err(LoadError::InvalidGeometry(_))
        ));
        assert!(MeshGeometry::circle_border(0).is_err());
    }

    #[test]
    fn fan_expansion() {
        assert_eq!(fan_to_list(&[0, 1, 2, 3]), vec![0, 1, 2, 0, 2, 3]);
        assert!(fan_to_list(&[7]).is_empty());
        assert!(fan_to_list(&[]).is_empty());
    }

    #[test]
    fn validate_catches_bad_indices() {
        let mut geometry = MeshGeometry::quad();
        geometry.indices.push(9);
        assert!(matches!(geometry.validate(), Err(LoadError::InvalidGeometry(_))));
    }

    #[test]
    fn strip_topologies_carry_index_format() {
        assert_eq!(Topology::LineStrip.strip_index_format(), Some(wgpu::IndexFormat::Uint32));
        assert_eq!(Topology::TriangleFan.strip_index_format(), None);
        assert_eq!(Topology::TriangleFan.to_wgpu(), wgpu::PrimitiveTopology::TriangleList);
    }
}
