use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::rc::Rc;

use anyhow::{Context, Result};
use glam::{Mat4, Vec2};
use wgpu::util::DeviceExt;

use crate::camera::Camera2d;
use crate::device::GpuFrame;
use crate::event::HandlerRef;
use crate::math::{model_transform, Color};
use crate::resource::mesh::DEFAULT_CIRCLE_SEGMENTS;
use crate::resource::{
    GpuMesh, GpuTexture, LoadError, MeshGeometry, ProceduralMesh, ProceduralMeshLoader, Resource,
    ResourceData, ResourceKind, ResourceManager, ShaderLoader, ShaderProgram, ShaderSource,
    TextureLoader,
};

use super::pipeline::{PipelineCache, PipelineKey};
use super::target::pass_viewport;
use super::uniforms::{DrawUniform, GlobalsUniform};
use super::{RenderState, RenderTarget, Scene2d, SyncState};

pub const DEFAULT_QUAD_MESH: &str = "default_quad_mesh";
pub const DEFAULT_CIRCLE_MESH: &str = "default_circle_mesh";
pub const DEFAULT_QUAD_BORDER_MESH: &str = "default_quad_border_mesh";
pub const DEFAULT_CIRCLE_BORDER_MESH: &str = "default_circle_border_mesh";
pub const DEFAULT_SHADER: &str = "default_simple_shader_program";
pub const DEFAULT_TEXTURE_SHADER: &str = "default_simple_texture_shader_program";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Shape {
    Quad,
    QuadBorder,
    Circle,
    CircleBorder,
}

/// Mesh handles fetched from the resource manager on sync.
#[derive(Default)]
struct MeshSet {
    quad: Option<GpuMesh>,
    quad_border: Option<GpuMesh>,
    circle: Option<GpuMesh>,
    circle_border: Option<GpuMesh>,
}

impl MeshSet {
    fn fetch(resources: &ResourceManager) -> Self {
        let mesh = |uri: &str| resources.get(uri).mesh().cloned();
        Self {
            quad: mesh(DEFAULT_QUAD_MESH),
            quad_border: mesh(DEFAULT_QUAD_BORDER_MESH),
            circle: mesh(DEFAULT_CIRCLE_MESH),
            circle_border: mesh(DEFAULT_CIRCLE_BORDER_MESH),
        }
    }

    fn get(&self, shape: Shape) -> Option<&GpuMesh> {
        match shape {
            Shape::Quad => self.quad.as_ref(),
            Shape::QuadBorder => self.quad_border.as_ref(),
            Shape::Circle => self.circle.as_ref(),
            Shape::CircleBorder => self.circle_border.as_ref(),
        }
    }
}

struct DrawCommand {
    key: PipelineKey,
    shader: ShaderProgram,
    mesh: GpuMesh,
    texture: Option<GpuTexture>,
    uniform: DrawUniform,
}

/// Immediate-style 2D renderer.
///
/// Draw calls made from [`Scene2d::render`] are recorded and encoded into a
/// single render pass at the end of [`render`](Self::render). Projection,
/// viewport, clear color and blending live in a [`SyncState`] and are only
/// reissued after they change.
pub struct Renderer2d {
    device: wgpu::Device,
    queue: wgpu::Queue,
    sync: Rc<RefCell<SyncState>>,

    meshes: MeshSet,
    shader_uri: String,
    shader: Option<ShaderProgram>,
    texture: Option<GpuTexture>,
    view: Mat4,
    wireframe: bool,
    circle_segments: u32,

    warned_line_width: bool,
    warned_wireframe: bool,

    commands: Vec<DrawCommand>,
    pipelines: PipelineCache,

    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,

    draw_buffer: Option<wgpu::Buffer>,
    draw_bind_group: Option<wgpu::BindGroup>,
    draw_capacity: usize,
    draw_stride: u64,

    white: GpuTexture,
    texture_bind_groups: HashMap<u64, wgpu::BindGroup>,
}

impl Renderer2d {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let pipelines = PipelineCache::new(device, format);

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glint globals ubo"),
            contents: bytemuck::bytes_of(&GlobalsUniform::new(Mat4::IDENTITY)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glint globals bind group"),
            layout: &pipelines.globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let white = GpuTexture::white(device, queue).context("failed to create fallback texture")?;
        let draw_stride = DrawUniform::stride(device.limits().min_uniform_buffer_offset_alignment);

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            sync: Rc::new(RefCell::new(SyncState::new(width, height))),
            meshes: MeshSet::default(),
            shader_uri: DEFAULT_SHADER.to_string(),
            shader: None,
            texture: None,
            view: Mat4::IDENTITY,
            wireframe: false,
            circle_segments: DEFAULT_CIRCLE_SEGMENTS,
            warned_line_width: false,
            warned_wireframe: false,
            commands: Vec::new(),
            pipelines,
            globals_buffer,
            globals_bind_group,
            draw_buffer: None,
            draw_bind_group: None,
            draw_capacity: 0,
            draw_stride,
            white,
            texture_bind_groups: HashMap::new(),
        })
    }

    /// Registers the built-in loaders and preloads the default meshes and
    /// shaders.
    pub fn init(&mut self, resources: &mut ResourceManager) {
        let segments = self.circle_segments;
        resources
            .add_loader(TextureLoader::new(self.device.clone(), self.queue.clone()))
            .add_loader(ShaderLoader::new(self.device.clone()))
            .add_loader(ProceduralMeshLoader::new(self.device.clone()))
            .preload(ResourceKind::Mesh, DEFAULT_QUAD_MESH, ProceduralMesh::Quad)
            .preload(ResourceKind::Mesh, DEFAULT_CIRCLE_MESH, ProceduralMesh::Circle { segments })
            .preload(ResourceKind::Mesh, DEFAULT_QUAD_BORDER_MESH, ProceduralMesh::QuadBorder)
            .preload(
                ResourceKind::Mesh,
                DEFAULT_CIRCLE_BORDER_MESH,
                ProceduralMesh::CircleBorder { segments },
            )
            .preload(ResourceKind::Shader, DEFAULT_SHADER, ShaderSource::embedded("simple"))
            .preload(
                ResourceKind::Shader,
                DEFAULT_TEXTURE_SHADER,
                ShaderSource::embedded("simple_texture"),
            );
    }

    /// Handler to register with the event queue; tracks window resizes.
    pub fn event_handler(&self) -> HandlerRef {
        self.sync.clone()
    }

    pub fn state(&self) -> RenderState {
        self.sync.borrow().state()
    }

    pub fn settings(&self) -> Ref<'_, SyncState> {
        self.sync.borrow()
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.sync.borrow_mut().set_clear_color(color);
    }

    pub fn set_alpha(&mut self, enabled: bool) {
        self.sync.borrow_mut().set_alpha(enabled);
    }

    /// Draws triangles as outlines. Needs `Features::POLYGON_MODE_LINE`.
    pub fn set_wireframe(&mut self, enabled: bool) {
        if enabled && !self.device.features().contains(wgpu::Features::POLYGON_MODE_LINE) {
            if !self.warned_wireframe {
                log::warn!("wireframe requested but POLYGON_MODE_LINE is not enabled; ignoring");
                self.warned_wireframe = true;
            }
            return;
        }
        self.wireframe = enabled;
    }

    /// Switches the program used by subsequent draws.
    pub fn set_shader(&mut self, resources: &ResourceManager, uri: &str) {
        self.shader_uri = uri.to_string();
        self.shader = resources.get(uri).shader().cloned();
    }

    pub fn shader(&self) -> Option<&ShaderProgram> {
        self.shader.as_ref()
    }

    /// Binds a texture for subsequent draws. Empty textures bind white.
    pub fn set_texture(&mut self, resources: &ResourceManager, uri: &str) {
        self.texture = resources.get(uri).texture().cloned();
    }

    pub fn clear_texture(&mut self) {
        self.texture = None;
    }

    pub fn apply_camera(&mut self, camera: &mut Camera2d) {
        self.view = camera.view_matrix();
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn circle_segments(&self) -> u32 {
        self.circle_segments
    }

    /// Re-tessellates the default circle meshes, replacing the cached ones.
    pub fn set_circle_segments(
        &mut self,
        resources: &mut ResourceManager,
        segments: u32,
    ) -> Result<(), LoadError> {
        let fill = GpuMesh::upload(&self.device, DEFAULT_CIRCLE_MESH, &MeshGeometry::circle(segments)?)?;
        let border = GpuMesh::upload(
            &self.device,
            DEFAULT_CIRCLE_BORDER_MESH,
            &MeshGeometry::circle_border(segments)?,
        )?;

        self.meshes.circle = None;
        self.meshes.circle_border = None;
        resources.insert(Resource::new(ResourceKind::Mesh, DEFAULT_CIRCLE_MESH, ResourceData::Mesh(fill)));
        resources.insert(Resource::new(
            ResourceKind::Mesh,
            DEFAULT_CIRCLE_BORDER_MESH,
            ResourceData::Mesh(border),
        ));

        self.circle_segments = segments;
        self.sync.borrow_mut().invalidate();
        log::debug!("circle meshes rebuilt with {segments} segments");
        Ok(())
    }

    pub fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32, rot: f32, color: Color) {
        self.push(Shape::Quad, model_transform(x, y, w, h, rot), color);
    }

    pub fn draw_rect_v(&mut self, pos: Vec2, size: Vec2, rot: f32, color: Color) {
        self.draw_rect(pos.x, pos.y, size.x, size.y, rot, color);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_border(&mut self, x: f32, y: f32, w: f32, h: f32, rot: f32, width: f32, color: Color) {
        self.check_line_width(width);
        self.push(Shape::QuadBorder, model_transform(x, y, w, h, rot), color);
    }

    pub fn draw_rect_border_v(&mut self, pos: Vec2, size: Vec2, rot: f32, width: f32, color: Color) {
        self.draw_rect_border(pos.x, pos.y, size.x, size.y, rot, width, color);
    }

    /// Ellipse inscribed in the `w` x `h` box centered on `(x, y)`.
    pub fn draw_ellipse(&mut self, x: f32, y: f32, w: f32, h: f32, rot: f32, color: Color) {
        self.push(Shape::Circle, model_transform(x, y, w, h, rot), color);
    }

    pub fn draw_ellipse_v(&mut self, pos: Vec2, size: Vec2, rot: f32, color: Color) {
        self.draw_ellipse(pos.x, pos.y, size.x, size.y, rot, color);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_ellipse_border(&mut self, x: f32, y: f32, w: f32, h: f32, rot: f32, width: f32, color: Color) {
        self.check_line_width(width);
        self.push(Shape::CircleBorder, model_transform(x, y, w, h, rot), color);
    }

    pub fn draw_ellipse_border_v(&mut self, pos: Vec2, size: Vec2, rot: f32, width: f32, color: Color) {
        self.draw_ellipse_border(pos.x, pos.y, size.x, size.y, rot, width, color);
    }

    /// Draws recorded so far this frame.
    pub fn pending_draws(&self) -> usize {
        self.commands.len()
    }

    /// Off-screen target in the renderer's color format.
    pub fn create_render_target(
        &self,
        width: u32,
        height: u32,
        nearest_filtering: bool,
    ) -> Result<RenderTarget, LoadError> {
        RenderTarget::new(&self.device, self.pipelines.format(), width, height, nearest_filtering)
    }

    /// Renders one frame: syncs dirty state, runs the scene and encodes its
    /// draws into `frame`.
    pub fn render<S>(&mut self, dt: f32, frame: &mut GpuFrame, resources: &ResourceManager, scene: &mut S)
    where
        S: Scene2d + ?Sized,
    {
        self.record(dt, resources, scene);

        let requested = self.sync.borrow().viewport();
        let attachment = frame.size();
        let GpuFrame { view, encoder, .. } = frame;
        self.encode(encoder, view, pass_viewport(requested, attachment), None);
    }

    /// Runs `scene` into `target` and submits it immediately, so the target
    /// can be sampled by draws recorded afterwards.
    ///
    /// The viewport covers the whole target; the projection keeps the
    /// window's aspect ratio. Draws that sample `target` itself are skipped.
    pub fn render_to_target<S>(
        &mut self,
        dt: f32,
        target: &RenderTarget,
        resources: &ResourceManager,
        scene: &mut S,
    ) where
        S: Scene2d + ?Sized,
    {
        self.record(dt, resources, scene);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("glint target encoder"),
            });
        let size = target.size();
        self.encode(&mut encoder, target.view(), pass_viewport(size, size), Some(target.texture().id));
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn record<S>(&mut self, dt: f32, resources: &ResourceManager, scene: &mut S)
    where
        S: Scene2d + ?Sized,
    {
        let synced = self.sync.borrow_mut().sync();
        if synced {
            self.apply_sync(resources);
        }

        self.commands.clear();
        scene.render(dt, self, resources);
    }

    fn apply_sync(&mut self, resources: &ResourceManager) {
        self.meshes = MeshSet::fetch(resources);
        self.shader = resources.get(&self.shader_uri).shader().cloned();
        self.texture_bind_groups.clear();

        let sync = self.sync.borrow();
        self.queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::bytes_of(&GlobalsUniform::new(sync.projection())),
        );

        let (width, height) = sync.viewport();
        log::debug!(
            "renderer synced: viewport {width}x{height}, alpha {}, shader '{}'",
            sync.alpha(),
            self.shader_uri
        );
    }

    fn check_line_width(&mut self, width: f32) {
        if width != 1.0 && !self.warned_line_width {
            log::debug!("line width {width} requested; lines are rasterized 1px wide");
            self.warned_line_width = true;
        }
    }

    fn push(&mut self, shape: Shape, transform: Mat4, color: Color) {
        let (Some(shader), Some(mesh)) = (self.shader.as_ref(), self.meshes.get(shape)) else {
            return;
        };

        let key = PipelineKey {
            shader: shader.id,
            topology: mesh.topology,
            alpha: self.sync.borrow().alpha(),
            wireframe: self.wireframe,
        };

        self.commands.push(DrawCommand {
            key,
            shader: shader.clone(),
            mesh: mesh.clone(),
            texture: self.texture.clone(),
            uniform: DrawUniform::new(self.view, transform, color),
        });
    }

    fn ensure_draw_capacity(&mut self, required: usize) {
        if required <= self.draw_capacity && self.draw_buffer.is_some() {
            return;
        }

        let capacity = required.next_power_of_two().max(64);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glint draw ubo"),
            size: capacity as u64 * self.draw_stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glint draw bind group"),
            layout: &self.pipelines.draw_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(DrawUniform::SIZE),
                }),
            }],
        });

        self.draw_buffer = Some(buffer);
        self.draw_bind_group = Some(bind_group);
        self.draw_capacity = capacity;
    }

    fn ensure_texture_bind_group(&mut self, texture: Option<&GpuTexture>) {
        let texture = texture.unwrap_or(&self.white);
        if self.texture_bind_groups.contains_key(&texture.id) {
            return;
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glint texture bind group"),
            layout: &self.pipelines.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });
        self.texture_bind_groups.insert(texture.id, bind_group);
    }

    /// Encodes the recorded draws into one pass over `view`. `target_id` is
    /// the texture being rendered to, which draws must not sample.
    fn encode(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        viewport: Option<(u32, u32)>,
        target_id: Option<u64>,
    ) {
        let mut commands = std::mem::take(&mut self.commands);
        if let Some(id) = target_id {
            commands.retain(|cmd| cmd.texture.as_ref().is_none_or(|t| t.id != id));
        }

        for cmd in &commands {
            self.pipelines.ensure(&self.device, cmd.key, &cmd.shader);
            self.ensure_texture_bind_group(cmd.texture.as_ref());
        }

        if !commands.is_empty() {
            self.ensure_draw_capacity(commands.len());
            if let Some(buffer) = self.draw_buffer.as_ref() {
                let stride = self.draw_stride as usize;
                let mut bytes = vec![0u8; commands.len() * stride];
                for (i, cmd) in commands.iter().enumerate() {
                    let offset = i * stride;
                    bytes[offset..offset + DrawUniform::SIZE as usize]
                        .copy_from_slice(bytemuck::bytes_of(&cmd.uniform));
                }
                self.queue.write_buffer(buffer, 0, &bytes);
            }
        }

        let clear_color = self.sync.borrow().clear_color();
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("glint 2d pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let (Some((width, height)), Some(draw_bind_group)) = (viewport, self.draw_bind_group.as_ref())
        else {
            drop(rpass);
            self.commands = commands;
            return;
        };
        rpass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
        rpass.set_bind_group(0, &self.globals_bind_group, &[]);

        for (i, cmd) in commands.iter().enumerate() {
            let Some(pipeline) = self.pipelines.get(&cmd.key) else { continue };
            let texture_id = cmd.texture.as_ref().map_or(self.white.id, |t| t.id);
            let Some(texture_bind_group) = self.texture_bind_groups.get(&texture_id) else {
                continue;
            };

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(1, draw_bind_group, &[(i as u64 * self.draw_stride) as u32]);
            rpass.set_bind_group(2, texture_bind_group, &[]);
            rpass.set_vertex_buffer(0, cmd.mesh.vertex_buffer.slice(..));
            rpass.set_index_buffer(cmd.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..cmd.mesh.index_count, 0, 0..1);
        }

        drop(rpass);
        // Keep the allocation for the next frame.
        self.commands = commands;
    }
}
