use crate::backend::TextureId;
use crate::coords::TexRect;
use crate::framebuffer::{GpuFormat, PixelFormat, TexelDecode};

/// A GPU texture owned by one screen plus the description of its current
/// allocation.
///
/// `width`/`height` are in source pixels; the backend texture may be wider
/// in texels (see `GpuFormat::texel_width`). All descriptive fields change
/// together through `record_allocation`.
#[derive(Debug)]
pub struct TextureInfo {
    pub(crate) resource: Option<TextureId>,
    width: u32,
    height: u32,
    gpu_format: wgpu::TextureFormat,
    gpu_type: TexelDecode,
    pixel_format: PixelFormat,
}

impl TextureInfo {
    /// An entry with no allocation yet.
    pub(crate) fn unallocated() -> Self {
        Self {
            resource: None,
            width: 0,
            height: 0,
            gpu_format: GpuFormat::RGBA8.texture_format,
            gpu_type: GpuFormat::RGBA8.decode,
            pixel_format: PixelFormat::None,
        }
    }

    #[inline]
    pub fn resource(&self) -> Option<TextureId> {
        self.resource
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn gpu_format(&self) -> wgpu::TextureFormat {
        self.gpu_format
    }

    #[inline]
    pub fn gpu_type(&self) -> TexelDecode {
        self.gpu_type
    }

    /// Format of the data last written; `PixelFormat::None` while the
    /// texture holds the placeholder colour.
    #[inline]
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// The GPU format/type pair of the current allocation.
    #[inline]
    pub fn gpu(&self) -> GpuFormat {
        GpuFormat {
            texture_format: self.gpu_format,
            decode: self.gpu_type,
        }
    }

    /// True when the live allocation already has this shape.
    pub(crate) fn matches(&self, width: u32, height: u32, gpu: GpuFormat) -> bool {
        self.resource.is_some() && self.width == width && self.height == height && self.gpu() == gpu
    }

    pub(crate) fn record_allocation(
        &mut self,
        resource: TextureId,
        width: u32,
        height: u32,
        gpu: GpuFormat,
        pixel_format: PixelFormat,
    ) {
        self.resource = Some(resource);
        self.width = width;
        self.height = height;
        self.gpu_format = gpu.texture_format;
        self.gpu_type = gpu.decode;
        self.pixel_format = pixel_format;
    }

    pub(crate) fn set_pixel_format(&mut self, pixel_format: PixelFormat) {
        self.pixel_format = pixel_format;
    }

    /// Forgets the allocation, returning the handle for release.
    pub(crate) fn take_resource(&mut self) -> Option<TextureId> {
        let resource = self.resource.take();
        *self = Self::unallocated();
        resource
    }
}

/// Which texture a screen quad samples.
///
/// A non-owning reference resolved at draw time: either the screen's own
/// `TextureInfo` or the renderer-wide default texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DisplayTexture {
    /// The screen's own framebuffer texture.
    Framebuffer,
    /// The shared default texture created at init.
    Default,
}

/// Display state of one screen: what to sample and how.
#[derive(Debug)]
pub struct ScreenInfo {
    pub(crate) display_texture: DisplayTexture,
    pub(crate) display_texcoords: TexRect,
    pub(crate) texture: TextureInfo,
}

impl ScreenInfo {
    pub(crate) fn new(texcoords: TexRect) -> Self {
        Self {
            display_texture: DisplayTexture::Default,
            display_texcoords: texcoords,
            texture: TextureInfo::unallocated(),
        }
    }

    #[inline]
    pub fn display_texture(&self) -> DisplayTexture {
        self.display_texture
    }

    #[inline]
    pub fn display_texcoords(&self) -> TexRect {
        self.display_texcoords
    }

    #[inline]
    pub fn texture(&self) -> &TextureInfo {
        &self.texture
    }
}
