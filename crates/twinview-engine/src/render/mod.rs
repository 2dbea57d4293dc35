//! Screen compositing.
//!
//! Convention:
//! - CPU geometry is in surface pixels (top-left origin, +Y down).
//! - The vertex shader maps to NDC through the per-draw model-view matrix.
//! - Texture bytes are stored as delivered and unpacked in `screen.wgsl`.

mod common;
mod compositor;
mod layout;
mod texture;
mod upload;

pub use common::{
    orthographic_matrix, quad_vertices, ScreenUniform, ScreenVertex, QUAD_VERTEX_BYTES,
    QUAD_VERTEX_COUNT,
};
pub use layout::{stack_sizes, stacked_layout};
pub use texture::{DisplayTexture, ScreenInfo, TextureInfo};
pub use upload::UploadKind;

pub(crate) use compositor::{display_source, draw_screens, SharedDrawState};
pub(crate) use upload::{load_color_to_texture, load_fb_to_screen_info};
