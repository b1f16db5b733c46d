//! 2D textures decoded with `image` and uploaded as RGBA8.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::{LoadError, LoadParams, Release, ResourceData, ResourceKind, ResourceLoader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureParams {
    pub path: PathBuf,
    pub nearest_filtering: bool,
}

impl TextureParams {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            nearest_filtering: false,
        }
    }

    pub fn nearest(mut self) -> Self {
        self.nearest_filtering = true;
        self
    }
}

/// Decoded, tightly packed RGBA8 pixels.
#[derive(Debug, Clone)]
pub struct Rgba8Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Rgba8Image {
    pub fn decode(bytes: &[u8]) -> Result<Self, LoadError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        let image = Self {
            width,
            height,
            pixels: rgba.into_raw(),
        };
        image.check_stride()?;
        Ok(image)
    }

    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&bytes)
    }

    /// Rows must be exactly `width * 4` bytes with no padding.
    pub fn check_stride(&self) -> Result<(), LoadError> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.pixels.len() != expected {
            return Err(LoadError::UnsupportedStride {
                width: self.width,
                height: self.height,
                expected,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }
}

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Sampled texture with its view and sampler.
#[derive(Debug, Clone)]
pub struct GpuTexture {
    /// Unique per upload; keys bind group caches.
    pub id: u64,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

/// Rejects empty textures and sides above `max_dimension`
/// (`Limits::max_texture_dimension_2d`).
pub fn check_texture_size(width: u32, height: u32, max_dimension: u32) -> Result<(), LoadError> {
    if width == 0 || height == 0 || width > max_dimension || height > max_dimension {
        return Err(LoadError::TextureSize {
            width,
            height,
            max: max_dimension,
        });
    }
    Ok(())
}

impl GpuTexture {
    /// Creates an uninitialized RGBA texture with its view and sampler.
    pub(crate) fn allocate(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
        nearest_filtering: bool,
    ) -> Result<Self, LoadError> {
        check_texture_size(width, height, device.limits().max_texture_dimension_2d)?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let filter = if nearest_filtering {
            wgpu::FilterMode::Nearest
        } else {
            wgpu::FilterMode::Linear
        };
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        });

        Ok(Self {
            id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            texture,
            view,
            sampler,
            width,
            height,
        })
    }

    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        image: &Rgba8Image,
        nearest_filtering: bool,
    ) -> Result<Self, LoadError> {
        image.check_stride()?;
        let gpu = Self::allocate(
            device,
            label,
            image.width,
            image.height,
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            nearest_filtering,
        )?;

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.width * 4),
                rows_per_image: Some(image.height),
            },
            gpu.texture.size(),
        );

        Ok(gpu)
    }

    /// 1x1 opaque white, bound when a draw has no texture.
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Self, LoadError> {
        let image = Rgba8Image {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        };
        Self::from_rgba8(device, queue, "glint white texture", &image, true)
    }
}

impl Release for GpuTexture {
    fn release(self) {
        self.texture.destroy();
    }
}

pub struct TextureLoader {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl TextureLoader {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

impl ResourceLoader for TextureLoader {
    fn can_load(&self, kind: ResourceKind, _uri: &str, params: &LoadParams) -> bool {
        kind == ResourceKind::Texture && matches!(params, LoadParams::Texture(_))
    }

    fn load(&self, uri: &str, params: &LoadParams) -> Result<ResourceData, LoadError> {
        let LoadParams::Texture(params) = params else {
            return Err(LoadError::UnsupportedParams(params.to_string()));
        };
        let image = Rgba8Image::open(&params.path)?;
        log::debug!(
            "decoded {} ({}x{})",
            params.path.display(),
            image.width,
            image.height
        );
        GpuTexture::from_rgba8(&self.device, &self.queue, uri, &image, params.nearest_filtering)
            .map(ResourceData::Texture)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_png_to_packed_rgba() {
        let image = Rgba8Image::decode(&png_bytes(3, 2)).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.pixels.len(), 24);
        assert_eq!(&image.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            Rgba8Image::decode(b"not an image"),
            Err(LoadError::Decode(_))
        ));
    }

    #[test]
    fn padded_rows_are_rejected() {
        let image = Rgba8Image {
            width: 3,
            height: 2,
            pixels: vec![0; 32],
        };
        assert!(matches!(
            image.check_stride(),
            Err(LoadError::UnsupportedStride { expected: 24, actual: 32, .. })
        ));
    }

    #[test]
    fn texture_size_must_fit_the_device() {
        assert!(check_texture_size(8192, 8192, 8192).is_ok());
        assert!(check_texture_size(1, 1, 8192).is_ok());
        assert!(matches!(
            check_texture_size(16384, 16384, 8192),
            Err(LoadError::TextureSize { width: 16384, height: 16384, max: 8192 })
        ));
        assert!(matches!(
            check_texture_size(100, 8193, 8192),
            Err(LoadError::TextureSize { height: 8193, .. })
        ));
        assert!(check_texture_size(0, 4, 8192).is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            Rgba8Image::open(Path::new("no/such/texture.png")),
            Err(LoadError::Io { .. })
        ));
    }
}
