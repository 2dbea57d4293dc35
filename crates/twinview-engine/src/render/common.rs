//! GPU-visible types shared by the compositor and every backend.

use bytemuck::{Pod, Zeroable};

use crate::coords::{Rect, SurfaceSize, TexRect};
use crate::framebuffer::TexelDecode;

// ── screen vertex ─────────────────────────────────────────────────────────

/// One corner of a screen quad: surface-pixel position plus texture UV.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ScreenVertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
}

impl ScreenVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2  // tex_coord
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ScreenVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Vertices drawn per screen (triangle strip, two triangles).
pub const QUAD_VERTEX_COUNT: u32 = 4;

/// Size in bytes of one quad's vertex data.
pub const QUAD_VERTEX_BYTES: u64 =
    QUAD_VERTEX_COUNT as u64 * std::mem::size_of::<ScreenVertex>() as u64;

/// Builds the strip for `rect`, sampling the texture through `texcoords`.
pub fn quad_vertices(rect: Rect, texcoords: TexRect) -> [ScreenVertex; 4] {
    let corners = rect.strip_corners();
    let uvs = texcoords.strip_uvs();
    std::array::from_fn(|i| ScreenVertex {
        position: [corners[i].x, corners[i].y],
        tex_coord: uvs[i],
    })
}

// ── per-draw uniform ──────────────────────────────────────────────────────

/// Per-draw constants. Layout matches `ScreenUniform` in `screen.wgsl`:
/// a `mat3x2<f32>` (three column vectors) followed by the decode selector.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ScreenUniform {
    pub modelview: [[f32; 2]; 3],
    pub texel_format: u32,
    pub _pad: u32, // 8-byte struct alignment
}

impl ScreenUniform {
    pub fn new(surface: SurfaceSize, decode: TexelDecode) -> Self {
        Self {
            modelview: orthographic_matrix(surface),
            texel_format: decode.shader_code(),
            _pad: 0,
        }
    }

    /// Applies the model-view matrix to a surface-pixel position.
    pub fn to_ndc(&self, p: [f32; 2]) -> [f32; 2] {
        let [c0, c1, c2] = self.modelview;
        [
            c0[0] * p[0] + c1[0] * p[1] + c2[0],
            c0[1] * p[0] + c1[1] * p[1] + c2[1],
        ]
    }
}

/// Column-major 3×2 orthographic projection mapping surface pixels
/// (top-left origin, +Y down) to NDC (+Y up).
///
/// Zero dimensions are treated as 1 so the matrix stays finite.
pub fn orthographic_matrix(surface: SurfaceSize) -> [[f32; 2]; 3] {
    let w = surface.width.max(1) as f32;
    let h = surface.height.max(1) as f32;
    [[2.0 / w, 0.0], [0.0, -2.0 / h], [-1.0, 1.0]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_32_bytes() {
        assert_eq!(std::mem::size_of::<ScreenUniform>(), 32);
        assert_eq!(std::mem::size_of::<ScreenVertex>(), 16);
    }

    fn assert_near(a: [f32; 2], b: [f32; 2]) {
        assert!(
            (a[0] - b[0]).abs() < 1e-5 && (a[1] - b[1]).abs() < 1e-5,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn ortho_maps_corners_to_ndc() {
        let u = ScreenUniform::new(SurfaceSize::new(800, 600), TexelDecode::Rgba8);
        assert_near(u.to_ndc([0.0, 0.0]), [-1.0, 1.0]);
        assert_near(u.to_ndc([800.0, 600.0]), [1.0, -1.0]);
        assert_near(u.to_ndc([400.0, 300.0]), [0.0, 0.0]);
    }

    #[test]
    fn ortho_survives_zero_surface() {
        let m = orthographic_matrix(SurfaceSize::new(0, 0));
        assert!(m.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn quad_vertices_pair_corners_with_uvs() {
        let v = quad_vertices(Rect::new(10.0, 20.0, 40.0, 30.0), TexRect::FLIPPED_VERTICAL);
        assert_eq!(v[0].position, [10.0, 20.0]);
        assert_eq!(v[0].tex_coord, [0.0, 1.0]);
        assert_eq!(v[3].position, [50.0, 50.0]);
        assert_eq!(v[3].tex_coord, [1.0, 0.0]);
    }
}
