//! Frame uploader: moves one framebuffer into a screen's texture.
//!
//! Policy:
//! - same format/type and size as the live allocation: write in place
//! - anything else: reallocate first, then write
//! - no data: write the flat placeholder colour into a 1×1 RGBA8 texture

use crate::backend::{GpuBackend, TextureDesc, TextureId};
use crate::error::{RenderError, RenderResult};
use crate::framebuffer::{FramebufferInfo, GpuFormat, PixelFormat};

use super::texture::{DisplayTexture, ScreenInfo, TextureInfo};

/// What an upload did to the screen's texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UploadKind {
    /// The texture was (re)allocated before writing.
    Reallocated,
    /// The existing allocation was overwritten.
    InPlace,
    /// No data was available; the placeholder colour was written.
    Placeholder,
}

/// Loads `framebuffer` into `screen`, or the placeholder colour when absent.
///
/// On error the screen keeps its previous texture and display state.
pub(crate) fn load_fb_to_screen_info<B: GpuBackend>(
    backend: &mut B,
    framebuffer: Option<&FramebufferInfo<'_>>,
    screen: &mut ScreenInfo,
    placeholder: [u8; 4],
    label: &'static str,
) -> RenderResult<UploadKind> {
    let source = framebuffer.and_then(|fb| fb.format.gpu_format().map(|gpu| (fb, gpu)));

    let kind = match source {
        Some((fb, gpu)) => load_framebuffer(backend, fb, gpu, &mut screen.texture, label)?,
        None => {
            load_color_to_texture(backend, placeholder, &mut screen.texture, label)?;
            UploadKind::Placeholder
        }
    };

    screen.display_texture = DisplayTexture::Framebuffer;
    Ok(kind)
}

fn load_framebuffer<B: GpuBackend>(
    backend: &mut B,
    fb: &FramebufferInfo<'_>,
    gpu: GpuFormat,
    texture: &mut TextureInfo,
    label: &'static str,
) -> RenderResult<UploadKind> {
    let stride = fb.validate()?;

    let kind = match texture.resource.filter(|_| texture.matches(fb.width, fb.height, gpu)) {
        Some(resource) => {
            backend.write_texture(resource, fb.pixels, stride)?;
            UploadKind::InPlace
        }
        None => {
            configure_framebuffer_texture(backend, texture, fb.width, fb.height, gpu, fb.pixels, stride, label)?;
            UploadKind::Reallocated
        }
    };
    texture.set_pixel_format(fb.format);

    log::trace!(
        "{label}: uploaded {}x{} {:?} ({kind:?})",
        fb.width,
        fb.height,
        fb.format
    );
    Ok(kind)
}

/// Replaces the texture's storage with a fresh `width`×`height` allocation in
/// `gpu`'s format holding `pixels`.
///
/// The old texture is released only once the new one has been created and
/// written, so any failure leaves the previous texture in place.
#[allow(clippy::too_many_arguments)]
pub(crate) fn configure_framebuffer_texture<B: GpuBackend>(
    backend: &mut B,
    texture: &mut TextureInfo,
    width: u32,
    height: u32,
    gpu: GpuFormat,
    pixels: &[u8],
    bytes_per_row: u32,
    label: &'static str,
) -> RenderResult<TextureId> {
    let texel_width = gpu
        .texel_width(width)
        .ok_or(RenderError::FramebufferTooLarge { width, height })?;
    let desc = TextureDesc {
        label,
        width: texel_width,
        height,
        format: gpu.texture_format,
    };
    let resource = backend.create_texture(&desc)?;

    if let Err(e) = backend.write_texture(resource, pixels, bytes_per_row) {
        backend.destroy_texture(resource);
        return Err(e);
    }

    if let Some(old) = texture.take_resource() {
        backend.destroy_texture(old);
    }

    log::debug!(
        "{label}: allocated {width}x{height} texture ({:?}, {:?})",
        gpu.texture_format,
        gpu.decode
    );
    texture.record_allocation(resource, width, height, gpu, PixelFormat::None);
    Ok(resource)
}

/// Fills `texture` with a single flat colour (1×1 RGBA8).
pub(crate) fn load_color_to_texture<B: GpuBackend>(
    backend: &mut B,
    color: [u8; 4],
    texture: &mut TextureInfo,
    label: &'static str,
) -> RenderResult<()> {
    match texture.resource.filter(|_| texture.matches(1, 1, GpuFormat::RGBA8)) {
        Some(resource) => backend.write_texture(resource, &color, 4)?,
        None => {
            configure_framebuffer_texture(backend, texture, 1, 1, GpuFormat::RGBA8, &color, 4, label)?;
        }
    }
    texture.set_pixel_format(PixelFormat::None);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessBackend, HeadlessSurface};
    use crate::coords::TexRect;
    use crate::device::GpuInit;

    const GREY: [u8; 4] = [0x80, 0x80, 0x80, 0xFF];

    fn open(surface: &HeadlessSurface) -> HeadlessBackend {
        HeadlessBackend::open(surface, &GpuInit::default()).unwrap()
    }

    #[test]
    fn upload_kind_follows_allocation_shape() {
        let surface = HeadlessSurface::new(400, 480);
        let mut backend = open(&surface);
        let mut screen = ScreenInfo::new(TexRect::FULL);

        let rgba = vec![0xAA; 4 * 4 * 2];
        let fb = FramebufferInfo::new(&rgba, 4, 2, PixelFormat::Rgba8);
        fn load(backend: &mut HeadlessBackend, screen: &mut ScreenInfo, fb: Option<&FramebufferInfo<'_>>) -> UploadKind {
            load_fb_to_screen_info(backend, fb, screen, GREY, "top").unwrap()
        }

        assert_eq!(load(&mut backend, &mut screen, Some(&fb)), UploadKind::Reallocated);
        assert_eq!(load(&mut backend, &mut screen, Some(&fb)), UploadKind::InPlace);

        // Same byte size, different format.
        let rg = vec![0x55; 2 * 8 * 2];
        let fb565 = FramebufferInfo::new(&rg, 8, 2, PixelFormat::Rgb565);
        assert_eq!(load(&mut backend, &mut screen, Some(&fb565)), UploadKind::Reallocated);
        assert_eq!(screen.texture().pixel_format(), PixelFormat::Rgb565);

        assert_eq!(load(&mut backend, &mut screen, None), UploadKind::Placeholder);
        assert_eq!(screen.texture().pixel_format(), PixelFormat::None);
        assert_eq!(screen.display_texture(), DisplayTexture::Framebuffer);

        // Placeholder texture already 1x1 RGBA8.
        assert_eq!(load(&mut backend, &mut screen, None), UploadKind::Placeholder);
        assert_eq!(backend.live_textures(), 1);

        let counters = surface.counters();
        assert_eq!(counters.texture_allocations, 3);
        assert_eq!(counters.texture_releases, 2);
        assert_eq!(counters.texture_writes, 5);
    }

    #[test]
    fn failed_write_into_new_texture_keeps_previous_one() {
        let surface = HeadlessSurface::new(400, 480);
        let mut backend = open(&surface);
        let mut screen = ScreenInfo::new(TexRect::FULL);

        let rgba = vec![0xAA; 4 * 2 * 2];
        let fb = FramebufferInfo::new(&rgba, 2, 2, PixelFormat::Rgba8);
        load_fb_to_screen_info(&mut backend, Some(&fb), &mut screen, GREY, "top").unwrap();
        let before = screen.texture().resource();

        // An odd pitch passes the size check but is not texel aligned for
        // two-byte storage, so the backend rejects the write.
        let rg = vec![0u8; 7 + 6];
        let bad = FramebufferInfo::new(&rg, 3, 2, PixelFormat::Rgb565).with_stride(7);
        assert!(matches!(
            load_fb_to_screen_info(&mut backend, Some(&bad), &mut screen, GREY, "top"),
            Err(RenderError::InvalidResource(_))
        ));

        assert_eq!(screen.texture().resource(), before);
        assert_eq!(screen.texture().pixel_format(), PixelFormat::Rgba8);
        assert_eq!((screen.texture().width(), screen.texture().height()), (2, 2));
        assert_eq!(backend.live_textures(), 1);
        assert_eq!(surface.counters().live(), 1);
        assert_eq!(surface.counters().double_releases, 0);
    }

    #[test]
    fn oversized_framebuffer_is_an_error() {
        let surface = HeadlessSurface::new(400, 480);
        let mut backend = open(&surface);
        let mut screen = ScreenInfo::new(TexRect::FULL);

        let px = [0u8; 16];
        let fb = FramebufferInfo::new(&px, 0x4000_0000, 1, PixelFormat::Rgba8);
        assert_eq!(
            load_fb_to_screen_info(&mut backend, Some(&fb), &mut screen, GREY, "top"),
            Err(RenderError::FramebufferTooLarge {
                width: 0x4000_0000,
                height: 1,
            })
        );
        assert_eq!(screen.texture().resource(), None);
        assert_eq!(surface.counters().texture_allocations, 0);
    }
}
