//! GPU backend seam.
//!
//! The compositor only talks to the GPU through [`GpuBackend`]. Two
//! implementations exist:
//! - [`WgpuBackend`]: a real surface via wgpu, bound to a winit window
//! - [`HeadlessBackend`]: CPU-side bookkeeping for tests and offscreen runs
//!
//! Resources are referred to by small copyable handles; the backend owns the
//! objects behind them.

mod gpu;
mod headless;

pub use headless::{DrawRecord, FailPoint, HeadlessBackend, HeadlessSurface, ResourceCounters};
pub use gpu::WgpuBackend;

use crate::coords::SurfaceSize;
use crate::device::GpuInit;
use crate::error::RenderResult;
use crate::render::{ScreenUniform, ScreenVertex};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }
    };
}

handle!(
    /// A texture owned by the backend.
    TextureId
);
handle!(
    /// The linked screen program (pipeline plus bind layouts).
    ProgramId
);
handle!(
    /// Vertex/uniform storage for a fixed number of quads.
    QuadBufferId
);

/// Hands out monotonically increasing handles; raw 0 is never issued.
#[derive(Debug, Default)]
pub(crate) struct HandleAllocator {
    next: u32,
}

impl HandleAllocator {
    pub(crate) fn next(&mut self) -> u32 {
        self.next = self.next.wrapping_add(1).max(1);
        self.next
    }
}

/// Texture allocation request.
///
/// `width` is in texels of `format`, which may differ from the source image
/// width in pixels (see `GpuFormat::texel_width`).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl TextureDesc {
    /// Bytes of one texel row without padding, or `None` if it overflows.
    #[inline]
    pub fn row_bytes(&self) -> Option<u32> {
        self.width.checked_mul(texel_size(self.format))
    }
}

/// Size in bytes of one texel of the storage formats used for screens.
pub fn texel_size(format: wgpu::TextureFormat) -> u32 {
    format.block_copy_size(None).unwrap_or(4)
}

/// GPU operations needed to composite the two screens.
///
/// A frame is `begin_frame` → `bind_program` → `draw_quad`* → `present`.
/// Destroy calls on handles that are not live are ignored (and logged), so
/// release paths can be run more than once.
pub trait GpuBackend: Sized {
    /// Externally owned window (or window stand-in) the backend renders to.
    type Window;

    /// Brings up the device and presentation surface for `window`.
    fn open(window: &Self::Window, init: &GpuInit) -> RenderResult<Self>;

    /// Current drawable size, picking up any pending resize.
    fn surface_size(&mut self) -> SurfaceSize;

    fn create_texture(&mut self, desc: &TextureDesc) -> RenderResult<TextureId>;

    /// Replaces the whole content of `id`.
    ///
    /// `data` holds `height` rows spaced `bytes_per_row` apart; only the
    /// first `desc.row_bytes()` of each row are read.
    fn write_texture(&mut self, id: TextureId, data: &[u8], bytes_per_row: u32) -> RenderResult<()>;

    fn destroy_texture(&mut self, id: TextureId);

    /// Compiles and links the shared screen program.
    fn create_program(&mut self) -> RenderResult<ProgramId>;

    fn destroy_program(&mut self, id: ProgramId);

    /// Allocates vertex and uniform storage for `quads` draws per frame.
    fn create_quad_buffer(&mut self, quads: u32) -> RenderResult<QuadBufferId>;

    fn destroy_quad_buffer(&mut self, id: QuadBufferId);

    /// Starts a frame cleared to `clear`.
    ///
    /// Returns `Ok(false)` when the surface cannot produce a frame right now
    /// (minimized, lost and reconfigured); the caller skips the frame.
    fn begin_frame(&mut self, clear: [f32; 4]) -> RenderResult<bool>;

    /// Binds the program and quad storage for the rest of the frame.
    fn bind_program(&mut self, program: ProgramId, quads: QuadBufferId) -> RenderResult<()>;

    /// Draws one quad from storage slot `slot`.
    ///
    /// Vertices and uniform are written into the slot immediately before
    /// the draw.
    fn draw_quad(
        &mut self,
        slot: u32,
        vertices: &[ScreenVertex; 4],
        uniform: &ScreenUniform,
        texture: TextureId,
    ) -> RenderResult<()>;

    /// Submits the frame and hands it to the window system.
    fn present(&mut self) -> RenderResult<()>;
}
