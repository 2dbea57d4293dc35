/// Normalized texture-coordinate rectangle used to sample a screen texture.
///
/// `top > bottom` mirrors the image vertically without touching the pixels;
/// `left > right` mirrors it horizontally. Sub-ranges of `[0, 1]` crop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TexRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl TexRect {
    /// Whole texture, first row at the top of the quad.
    pub const FULL: TexRect = TexRect::new(0.0, 0.0, 1.0, 1.0);

    /// Whole texture, first row at the bottom of the quad.
    pub const FLIPPED_VERTICAL: TexRect = TexRect::new(0.0, 1.0, 1.0, 0.0);

    #[inline]
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// UVs in triangle-strip order matching `Rect::strip_corners`.
    #[inline]
    pub fn strip_uvs(self) -> [[f32; 2]; 4] {
        [
            [self.left, self.top],
            [self.right, self.top],
            [self.left, self.bottom],
            [self.right, self.bottom],
        ]
    }

    /// Maps a UV on the displayed quad to a UV in the texture.
    #[inline]
    pub fn map(self, u: f32, v: f32) -> (f32, f32) {
        (
            self.left + (self.right - self.left) * u,
            self.top + (self.bottom - self.top) * v,
        )
    }

    /// True when every coordinate lies in `[0, 1]`.
    pub fn is_normalized(self) -> bool {
        [self.left, self.top, self.right, self.bottom]
            .iter()
            .all(|c| (0.0..=1.0).contains(c))
    }
}

impl Default for TexRect {
    fn default() -> Self {
        Self::FULL
    }
}
