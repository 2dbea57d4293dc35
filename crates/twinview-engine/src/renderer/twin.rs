use std::time::Instant;

use crate::backend::{GpuBackend, HeadlessBackend, ProgramId, QuadBufferId};
use crate::coords::TexRect;
use crate::error::{RenderError, RenderResult};
use crate::framebuffer::{ScreenFrames, ScreenId};
use crate::render::{
    display_source, draw_screens, load_color_to_texture, load_fb_to_screen_info, DisplayTexture,
    ScreenInfo, SharedDrawState, TextureInfo,
};
use crate::time::FrameCounter;

use super::{Renderer, RendererConfig};

/// GPU objects owned while the renderer is ready.
///
/// Fields are optional so a half-finished `init` can be unwound with the
/// same code as a regular shutdown.
struct GpuObjects<B: GpuBackend> {
    backend: B,
    quads: Option<QuadBufferId>,
    program: Option<ProgramId>,
    default_texture: TextureInfo,
}

impl<B: GpuBackend> GpuObjects<B> {
    fn new(backend: B) -> Self {
        Self {
            backend,
            quads: None,
            program: None,
            default_texture: TextureInfo::unallocated(),
        }
    }

    /// Creation order: quad buffer, program, default texture, screen
    /// textures.
    fn create(&mut self, screens: &mut [ScreenInfo; 2], placeholder: [u8; 4]) -> RenderResult<()> {
        self.quads = Some(self.backend.create_quad_buffer(ScreenId::ALL.len() as u32)?);
        self.program = Some(self.backend.create_program()?);

        load_color_to_texture(&mut self.backend, placeholder, &mut self.default_texture, "default texture")?;

        for id in ScreenId::ALL {
            load_color_to_texture(
                &mut self.backend,
                placeholder,
                &mut screens[id.index()].texture,
                id.name(),
            )?;
        }
        Ok(())
    }

    /// Releases in reverse creation order.
    fn release(&mut self, screens: &mut [ScreenInfo; 2]) {
        for screen in screens.iter_mut().rev() {
            if let Some(texture) = screen.texture.take_resource() {
                self.backend.destroy_texture(texture);
            }
            screen.display_texture = DisplayTexture::Default;
        }
        if let Some(texture) = self.default_texture.take_resource() {
            self.backend.destroy_texture(texture);
        }
        if let Some(program) = self.program.take() {
            self.backend.destroy_program(program);
        }
        if let Some(quads) = self.quads.take() {
            self.backend.destroy_quad_buffer(quads);
        }
    }

    fn shared(&self) -> RenderResult<SharedDrawState> {
        match (self.program, self.quads, self.default_texture.resource()) {
            (Some(program), Some(quads), Some(default_texture)) => Ok(SharedDrawState {
                program,
                quads,
                default_texture,
            }),
            _ => Err(RenderError::NotInitialized),
        }
    }
}

/// Two-screen compositor over a [`GpuBackend`].
///
/// `Uninitialized` while `gpu` is `None`, `Ready` otherwise.
pub struct TwinRenderer<B: GpuBackend> {
    config: RendererConfig,
    window: Option<B::Window>,
    gpu: Option<GpuObjects<B>>,
    screens: [ScreenInfo; 2],
    frame_counter: FrameCounter,
}

impl<B: GpuBackend> TwinRenderer<B> {
    pub fn new(config: RendererConfig) -> Self {
        let texcoords = if config.flip_vertical {
            TexRect::FLIPPED_VERTICAL
        } else {
            TexRect::FULL
        };

        Self {
            config,
            window: None,
            gpu: None,
            screens: [ScreenInfo::new(texcoords), ScreenInfo::new(texcoords)],
            frame_counter: FrameCounter::new(),
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn screen(&self, id: ScreenId) -> &ScreenInfo {
        &self.screens[id.index()]
    }

    /// Changes how `id` samples its texture (flip or crop) without
    /// re-uploading.
    pub fn set_texcoords(&mut self, id: ScreenId, texcoords: TexRect) {
        if !texcoords.is_normalized() {
            log::warn!("{}: texcoords {texcoords:?} leave [0, 1]; edge texels repeat", id.name());
        }
        self.screens[id.index()].display_texcoords = texcoords;
    }

    pub fn backend(&self) -> Option<&B> {
        self.gpu.as_ref().map(|gpu| &gpu.backend)
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.gpu.as_mut().map(|gpu| &mut gpu.backend)
    }

    /// Last reported frames per second, if a full second has been sampled
    /// since `init`.
    pub fn fps(&self) -> Option<f32> {
        self.frame_counter.fps()
    }

    pub fn frame_counter(&self) -> &FrameCounter {
        &self.frame_counter
    }
}

/// Counts one presented frame; returns a fresh rate once per second.
///
/// Advisory only: nothing is throttled on it. `swap_buffers` is the only
/// caller, so every presented frame is counted exactly once.
fn update_framerate(counter: &mut FrameCounter) -> Option<f32> {
    let fps = counter.record_frame();
    if let Some(fps) = fps {
        log::debug!("{fps:.1} fps");
    }
    fps
}

impl<B: GpuBackend> Renderer for TwinRenderer<B> {
    type Window = B::Window;

    fn set_window(&mut self, window: B::Window) {
        if self.is_ready() {
            log::warn!("window replaced while initialized; takes effect on next init");
        }
        self.window = Some(window);
    }

    fn init(&mut self) -> RenderResult<()> {
        if self.is_ready() {
            return Err(RenderError::AlreadyInitialized);
        }
        let window = self.window.as_ref().ok_or(RenderError::NoWindow)?;

        let backend = B::open(window, &self.config.gpu).inspect_err(|e| {
            log::error!("renderer init failed: {e}");
        })?;

        let mut gpu = GpuObjects::new(backend);
        if let Err(e) = gpu.create(&mut self.screens, self.config.placeholder_color) {
            log::error!("renderer init failed: {e}; releasing partial state");
            gpu.release(&mut self.screens);
            return Err(e);
        }

        self.gpu = Some(gpu);
        self.frame_counter.reset(Instant::now());
        log::info!("renderer initialized");
        Ok(())
    }

    fn shut_down(&mut self) {
        let Some(mut gpu) = self.gpu.take() else {
            log::debug!("shut_down: nothing to release");
            return;
        };
        gpu.release(&mut self.screens);
        log::info!("renderer shut down");
    }

    fn swap_buffers(&mut self, frames: Option<&ScreenFrames<'_>>) -> RenderResult<()> {
        let gpu = self.gpu.as_mut().ok_or(RenderError::NotInitialized)?;

        if let Some(frames) = frames {
            for id in ScreenId::ALL {
                load_fb_to_screen_info(
                    &mut gpu.backend,
                    frames.get(id),
                    &mut self.screens[id.index()],
                    self.config.placeholder_color,
                    id.name(),
                )
                .inspect_err(|e| log::error!("{} upload failed: {e}", id.name()))?;
            }
        }

        let surface = gpu.backend.surface_size();
        if !gpu.backend.begin_frame(self.config.clear_color)? {
            log::trace!("frame skipped ({}x{})", surface.width, surface.height);
            return Ok(());
        }

        let shared = gpu.shared()?;
        draw_screens(&mut gpu.backend, &shared, &self.screens, surface)
            .inspect_err(|e| log::error!("compositing failed: {e}"))?;

        update_framerate(&mut self.frame_counter);

        gpu.backend
            .present()
            .inspect_err(|e| log::error!("present failed: {e}"))
    }
}

impl TwinRenderer<HeadlessBackend> {
    /// Decodes what screen `id` shows at normalized `(u, v)` of its quad.
    ///
    /// Applies the screen's texcoords, so a flipped screen samples mirrored.
    /// `None` while uninitialized.
    pub fn sample_screen(&self, id: ScreenId, u: f32, v: f32) -> Option<[u8; 4]> {
        let gpu = self.gpu.as_ref()?;
        let screen = &self.screens[id.index()];
        let (texture, decode) = display_source(screen, gpu.default_texture.resource()?);
        let (tu, tv) = screen.display_texcoords.map(u, v);
        gpu.backend.read_pixel(texture, decode, tu, tv)
    }
}

impl<B: GpuBackend> Drop for TwinRenderer<B> {
    fn drop(&mut self) {
        self.shut_down();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FailPoint, HeadlessSurface};
    use crate::coords::SurfaceSize;
    use crate::framebuffer::{FramebufferInfo, PixelFormat};

    fn ready(surface: &HeadlessSurface) -> TwinRenderer<HeadlessBackend> {
        let mut r = TwinRenderer::new(RendererConfig::default());
        r.set_window(surface.clone());
        r.init().unwrap();
        r
    }

    #[test]
    fn init_without_window_fails() {
        let mut r = TwinRenderer::<HeadlessBackend>::new(RendererConfig::default());
        assert_eq!(r.init(), Err(RenderError::NoWindow));
        assert!(!r.is_ready());
    }

    #[test]
    fn init_twice_is_rejected() {
        let surface = HeadlessSurface::new(400, 480);
        let mut r = ready(&surface);
        assert_eq!(r.init(), Err(RenderError::AlreadyInitialized));
        assert!(r.is_ready());
    }

    #[test]
    fn init_allocates_program_buffer_and_textures() {
        let surface = HeadlessSurface::new(400, 480);
        let r = ready(&surface);

        let c = surface.counters();
        assert_eq!(c.program_allocations, 1);
        assert_eq!(c.quad_buffer_allocations, 1);
        // default texture plus one per screen
        assert_eq!(c.texture_allocations, 3);
        for id in ScreenId::ALL {
            assert_eq!(r.screen(id).display_texture(), DisplayTexture::Default);
            assert!(r.screen(id).texture().resource().is_some());
        }
    }

    #[test]
    fn swap_before_init_is_an_error() {
        let mut r = TwinRenderer::<HeadlessBackend>::new(RendererConfig::default());
        assert_eq!(r.swap_buffers(None), Err(RenderError::NotInitialized));
    }

    #[test]
    fn failed_program_rolls_back() {
        let surface = HeadlessSurface::new(400, 480).failing_at(FailPoint::Program);
        let mut r = TwinRenderer::<HeadlessBackend>::new(RendererConfig::default());
        r.set_window(surface.clone());

        assert!(matches!(r.init(), Err(RenderError::ShaderCompilation(_))));
        assert!(!r.is_ready());

        let c = surface.counters();
        assert_eq!(c.quad_buffer_allocations, 1);
        assert_eq!(c.live(), 0);
        assert_eq!(c.double_releases, 0);
    }

    #[test]
    fn shut_down_resets_screens() {
        let surface = HeadlessSurface::new(400, 480);
        let mut r = ready(&surface);
        r.swap_buffers(Some(&ScreenFrames::default())).unwrap();
        assert_eq!(r.screen(ScreenId::Top).display_texture(), DisplayTexture::Framebuffer);

        r.shut_down();
        assert!(!r.is_ready());
        for id in ScreenId::ALL {
            assert_eq!(r.screen(id).display_texture(), DisplayTexture::Default);
            assert!(r.screen(id).texture().resource().is_none());
        }
        assert_eq!(surface.counters().live(), 0);
    }

    #[test]
    fn drop_releases_everything() {
        let surface = HeadlessSurface::new(400, 480);
        drop(ready(&surface));
        assert_eq!(surface.counters().live(), 0);
        assert_eq!(surface.counters().double_releases, 0);
    }

    #[test]
    fn each_presented_frame_is_counted_once() {
        let surface = HeadlessSurface::new(400, 480);
        let mut r = ready(&surface);
        for _ in 0..5 {
            r.swap_buffers(None).unwrap();
        }
        assert_eq!(r.frame_counter().pending_frames(), 5);
        assert_eq!(r.backend().unwrap().frames_presented(), 5);

        // A minimized surface skips the frame without counting it.
        r.backend_mut().unwrap().set_surface_size(SurfaceSize::new(0, 0));
        r.swap_buffers(None).unwrap();
        assert_eq!(r.frame_counter().pending_frames(), 5);
        assert_eq!(r.backend().unwrap().frames_skipped(), 1);
    }

    #[test]
    fn clear_color_reaches_the_frame() {
        let clear = [0.1, 0.2, 0.3, 1.0];
        let surface = HeadlessSurface::new(400, 480);
        let mut r = TwinRenderer::<HeadlessBackend>::new(RendererConfig {
            clear_color: clear,
            ..RendererConfig::default()
        });
        r.set_window(surface.clone());
        r.init().unwrap();

        assert_eq!(r.backend().unwrap().last_clear(), None);
        r.swap_buffers(None).unwrap();
        assert_eq!(r.backend().unwrap().last_clear(), Some(clear));
    }

    #[test]
    fn failed_reallocation_keeps_the_screen_texture() {
        let surface = HeadlessSurface::new(400, 480);
        let mut r = ready(&surface);
        let placeholder = r.screen(ScreenId::Top).texture().resource();

        // init created three textures; the first upload asks for the fourth.
        r.backend_mut().unwrap().set_fail_point(Some(FailPoint::Texture(4)));
        let px = vec![0xFF; 400 * 240 * 4];
        let frames = ScreenFrames::new(Some(FramebufferInfo::new(&px, 400, 240, PixelFormat::Rgba8)), None);
        assert!(matches!(
            r.swap_buffers(Some(&frames)),
            Err(RenderError::ResourceAllocation(_))
        ));
        assert_eq!(r.screen(ScreenId::Top).texture().resource(), placeholder);
        assert_eq!(r.backend().unwrap().live_textures(), 3);

        r.backend_mut().unwrap().set_fail_point(None);
        r.swap_buffers(Some(&frames)).unwrap();
        assert_eq!(r.screen(ScreenId::Top).texture().pixel_format(), PixelFormat::Rgba8);
        assert_eq!(r.backend().unwrap().live_textures(), 3);
    }

    #[test]
    fn flip_config_applies_to_both_screens() {
        let config = RendererConfig {
            flip_vertical: true,
            ..RendererConfig::default()
        };
        let r = TwinRenderer::<HeadlessBackend>::new(config);
        for id in ScreenId::ALL {
            assert_eq!(r.screen(id).display_texcoords(), TexRect::FLIPPED_VERTICAL);
        }
    }
}
