//! Geometry shared by the layout and the compositor.
//!
//! Canonical space is surface pixels: origin top-left, +X right, +Y down.
//! The compositor converts to NDC with an orthographic model-view matrix.

mod rect;
mod surface;
mod tex_rect;
mod vec2;

pub use rect::Rect;
pub use surface::SurfaceSize;
pub use tex_rect::TexRect;
pub use vec2::Vec2;
