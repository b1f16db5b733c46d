use crate::resource::{GpuTexture, LoadError, Release, Resource, ResourceData, ResourceKind};

/// Off-screen color target.
///
/// Created by [`Renderer2d::create_render_target`](super::Renderer2d::create_render_target)
/// in the renderer's color format, drawn into with
/// [`Renderer2d::render_to_target`](super::Renderer2d::render_to_target) and
/// sampled like any other texture afterwards.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    texture: GpuTexture,
}

impl RenderTarget {
    pub(crate) fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        nearest_filtering: bool,
    ) -> Result<Self, LoadError> {
        let texture = GpuTexture::allocate(
            device,
            "glint render target",
            width,
            height,
            format,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            nearest_filtering,
        )?;
        log::debug!("render target {width}x{height} {format:?}");
        Ok(Self { texture })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width, self.texture.height)
    }

    pub fn texture(&self) -> &GpuTexture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.texture.view
    }

    /// Texture resource sharing this target's storage, for
    /// `ResourceManager::insert` and `Renderer2d::set_texture`.
    pub fn to_resource(&self, uri: impl Into<String>) -> Resource {
        Resource::new(ResourceKind::Texture, uri, ResourceData::Texture(self.texture.clone()))
    }
}

impl Release for RenderTarget {
    fn release(self) {
        self.texture.release();
    }
}

/// Viewport for a pass: the requested size clamped to the attachment, or
/// `None` when nothing would be visible.
pub(crate) fn pass_viewport(requested: (u32, u32), attachment: (u32, u32)) -> Option<(u32, u32)> {
    let width = requested.0.min(attachment.0);
    let height = requested.1.min(attachment.1);
    (width > 0 && height > 0).then_some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_is_clamped_to_the_attachment() {
        assert_eq!(pass_viewport((800, 600), (800, 600)), Some((800, 600)));
        assert_eq!(pass_viewport((1024, 600), (800, 700)), Some((800, 600)));
        assert_eq!(pass_viewport((0, 600), (800, 600)), None);
        assert_eq!(pass_viewport((800, 600), (800, 0)), None);
    }
}
