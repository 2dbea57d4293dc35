//! Renderer lifecycle.
//!
//! The surrounding application drives a [`Renderer`]:
//! `set_window` → `init` → `swap_buffers`* → `shut_down`.

mod config;
mod twin;

pub use config::RendererConfig;
pub use twin::TwinRenderer;

use crate::error::RenderResult;
use crate::framebuffer::ScreenFrames;

/// A presentation backend for the two emulated screens.
pub trait Renderer {
    /// Window handle supplied by the application; never created or
    /// destroyed by the renderer.
    type Window;

    /// Stores the window used by the next `init`.
    fn set_window(&mut self, window: Self::Window);

    /// Creates every GPU object. On error nothing is left allocated and the
    /// renderer may be initialized again.
    fn init(&mut self) -> RenderResult<()>;

    /// Releases all GPU objects. Safe to call repeatedly.
    fn shut_down(&mut self);

    /// Uploads any new frames, composites both screens and presents.
    ///
    /// `None` repeats whatever is resident.
    fn swap_buffers(&mut self, frames: Option<&ScreenFrames<'_>>) -> RenderResult<()>;
}
