//! Framebuffer descriptors handed over by the emulated core.
//!
//! The compositor never owns pixel memory: descriptors borrow the producer's
//! bytes for the duration of one `swap_buffers` call.

mod format;
mod info;

pub use format::{GpuFormat, PixelFormat, TexelDecode};
pub use info::{FramebufferInfo, ScreenFrames, ScreenId};
