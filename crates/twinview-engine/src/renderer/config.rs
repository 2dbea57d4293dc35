use crate::device::GpuInit;

/// Renderer configuration.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Straight RGBA8 colour shown on a screen with no signal.
    pub placeholder_color: [u8; 4],

    /// Linear RGBA colour the surface is cleared to around the screens.
    pub clear_color: [f32; 4],

    /// Show both screens mirrored vertically (for producers that write
    /// rows bottom-up). Applied when the renderer is constructed; use
    /// `TwinRenderer::set_texcoords` to change it later.
    pub flip_vertical: bool,

    /// GPU bring-up parameters (ignored by the headless backend).
    pub gpu: GpuInit,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            placeholder_color: [0, 0, 0, 0xFF],
            clear_color: [0.0, 0.0, 0.0, 1.0],
            flip_vertical: false,
            gpu: GpuInit::default(),
        }
    }
}
