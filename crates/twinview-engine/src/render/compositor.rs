use crate::backend::{GpuBackend, ProgramId, QuadBufferId, TextureId};
use crate::coords::{Rect, SurfaceSize};
use crate::error::RenderResult;
use crate::framebuffer::TexelDecode;

use super::common::{quad_vertices, ScreenUniform};
use super::layout::stacked_layout;
use super::texture::{DisplayTexture, ScreenInfo};

/// Shared GPU state every screen quad is drawn with.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct SharedDrawState {
    pub program: ProgramId,
    pub quads: QuadBufferId,
    pub default_texture: TextureId,
}

/// Resolves what a screen samples: its own texture or the shared default.
///
/// A screen pointing at its own texture before anything was allocated falls
/// back to the default.
pub(crate) fn display_source(screen: &ScreenInfo, default_texture: TextureId) -> (TextureId, TexelDecode) {
    match (screen.display_texture, screen.texture.resource()) {
        (DisplayTexture::Framebuffer, Some(id)) => (id, screen.texture.gpu_type()),
        _ => (default_texture, TexelDecode::Rgba8),
    }
}

/// Draws every screen in `ScreenId::ALL` order into the current frame.
///
/// Binds the shared program once; each screen then costs one uniform write,
/// one texture bind and one draw. Screens whose placement is empty (zero
/// surface) are skipped. Returns the number of quads drawn.
pub(crate) fn draw_screens<B: GpuBackend>(
    backend: &mut B,
    shared: &SharedDrawState,
    screens: &[ScreenInfo; 2],
    surface: SurfaceSize,
) -> RenderResult<u32> {
    backend.bind_program(shared.program, shared.quads)?;

    let mut drawn = 0;
    for (slot, (screen, rect)) in screens.iter().zip(stacked_layout(surface)).enumerate() {
        if rect.is_empty() {
            continue;
        }
        draw_single_screen(
            backend,
            shared,
            slot as u32,
            screen,
            rect.origin.x,
            rect.origin.y,
            rect.size.x,
            rect.size.y,
            surface,
        )?;
        drawn += 1;
    }
    Ok(drawn)
}

/// Draws one screen as a textured quad covering `(x, y, w, h)` in surface
/// pixels.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_single_screen<B: GpuBackend>(
    backend: &mut B,
    shared: &SharedDrawState,
    slot: u32,
    screen: &ScreenInfo,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    surface: SurfaceSize,
) -> RenderResult<()> {
    let (texture, decode) = display_source(screen, shared.default_texture);
    let vertices = quad_vertices(Rect::new(x, y, w, h), screen.display_texcoords);
    let uniform = ScreenUniform::new(surface, decode);

    backend.draw_quad(slot, &vertices, &uniform, texture)
}
