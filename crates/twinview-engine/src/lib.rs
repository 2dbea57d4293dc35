//! twinview engine crate.
//!
//! Uploads the two framebuffers of a dual-screen handheld to the GPU and
//! composites them onto one window surface. The window and the emulated
//! core that fills the framebuffers belong to the application.

pub mod backend;
pub mod coords;
pub mod device;
pub mod error;
pub mod framebuffer;
pub mod logging;
pub mod render;
pub mod renderer;
pub mod time;

pub use error::{RenderError, RenderResult};
pub use framebuffer::{FramebufferInfo, PixelFormat, ScreenFrames, ScreenId};
pub use renderer::{Renderer, RendererConfig, TwinRenderer};
