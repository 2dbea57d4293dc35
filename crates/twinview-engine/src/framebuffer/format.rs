use crate::error::RenderError;

/// Channel layout of a raw framebuffer.
///
/// Raw tags follow the console's framebuffer format register. Multi-byte
/// formats are little-endian.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PixelFormat {
    /// 4 bytes: R, G, B, A.
    Rgba8,
    /// 3 bytes: R, G, B.
    Rgb8,
    /// u16: R 11..16, G 5..11, B 0..5.
    Rgb565,
    /// u16: R 11..16, G 6..11, B 1..6, A bit 0.
    Rgb5a1,
    /// u16: R 12..16, G 8..12, B 4..8, A 0..4.
    Rgba4,
    /// u16: R 10..15, G 5..10, B 0..5; bit 15 unused.
    Rgb555,
    /// No pixel data for this screen.
    None,
}

impl PixelFormat {
    /// Raw tag of the "no data" sentinel.
    pub const NONE_TAG: u32 = 0xFF;

    pub const ALL: [PixelFormat; 6] = [
        PixelFormat::Rgba8,
        PixelFormat::Rgb8,
        PixelFormat::Rgb565,
        PixelFormat::Rgb5a1,
        PixelFormat::Rgba4,
        PixelFormat::Rgb555,
    ];

    /// Returns the raw tag for this format.
    pub fn raw(self) -> u32 {
        match self {
            PixelFormat::Rgba8 => 0,
            PixelFormat::Rgb8 => 1,
            PixelFormat::Rgb565 => 2,
            PixelFormat::Rgb5a1 => 3,
            PixelFormat::Rgba4 => 4,
            PixelFormat::Rgb555 => 5,
            PixelFormat::None => Self::NONE_TAG,
        }
    }

    /// Bytes occupied by one source pixel (0 for `None`).
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgb565 | PixelFormat::Rgb5a1 | PixelFormat::Rgba4 | PixelFormat::Rgb555 => 2,
            PixelFormat::None => 0,
        }
    }

    /// Resolves the GPU storage format and shader decode mode.
    ///
    /// Returns `None` for the "no data" sentinel, which is never uploaded.
    pub fn gpu_format(self) -> Option<GpuFormat> {
        let (texture_format, decode) = match self {
            PixelFormat::Rgba8 => (wgpu::TextureFormat::Rgba8Unorm, TexelDecode::Rgba8),
            PixelFormat::Rgb8 => (wgpu::TextureFormat::R8Unorm, TexelDecode::Rgb8),
            PixelFormat::Rgb565 => (wgpu::TextureFormat::Rg8Unorm, TexelDecode::Rgb565),
            PixelFormat::Rgb5a1 => (wgpu::TextureFormat::Rg8Unorm, TexelDecode::Rgb5a1),
            PixelFormat::Rgba4 => (wgpu::TextureFormat::Rg8Unorm, TexelDecode::Rgba4),
            PixelFormat::Rgb555 => (wgpu::TextureFormat::Rg8Unorm, TexelDecode::Rgb555),
            PixelFormat::None => return None,
        };
        Some(GpuFormat { texture_format, decode })
    }

    /// Decodes one source pixel into straight RGBA8.
    ///
    /// Mirrors the unpacking done in `screen.wgsl`. `bytes` must hold at least
    /// `bytes_per_pixel()` bytes; missing bytes read as zero.
    pub fn decode(self, bytes: &[u8]) -> [u8; 4] {
        let byte = |i: usize| bytes.get(i).copied().unwrap_or(0);
        let word = u16::from_le_bytes([byte(0), byte(1)]);

        match self {
            PixelFormat::Rgba8 => [byte(0), byte(1), byte(2), byte(3)],
            PixelFormat::Rgb8 => [byte(0), byte(1), byte(2), 0xFF],
            PixelFormat::Rgb565 => [
                expand5(word >> 11),
                expand6(word >> 5),
                expand5(word),
                0xFF,
            ],
            PixelFormat::Rgb5a1 => [
                expand5(word >> 11),
                expand5(word >> 6),
                expand5(word >> 1),
                if word & 1 != 0 { 0xFF } else { 0 },
            ],
            PixelFormat::Rgba4 => [
                expand4(word >> 12),
                expand4(word >> 8),
                expand4(word >> 4),
                expand4(word),
            ],
            PixelFormat::Rgb555 => [
                expand5(word >> 10),
                expand5(word >> 5),
                expand5(word),
                0xFF,
            ],
            PixelFormat::None => [0, 0, 0, 0],
        }
    }
}

impl TryFrom<u32> for PixelFormat {
    type Error = RenderError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(PixelFormat::Rgba8),
            1 => Ok(PixelFormat::Rgb8),
            2 => Ok(PixelFormat::Rgb565),
            3 => Ok(PixelFormat::Rgb5a1),
            4 => Ok(PixelFormat::Rgba4),
            5 => Ok(PixelFormat::Rgb555),
            Self::NONE_TAG => Ok(PixelFormat::None),
            other => Err(RenderError::UnknownPixelFormat(other)),
        }
    }
}

/// How the screen shader turns stored texels back into one pixel.
///
/// Discriminants are the values written into the per-draw uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum TexelDecode {
    Rgba8 = 0,
    Rgb8 = 1,
    Rgb565 = 2,
    Rgb5a1 = 3,
    Rgba4 = 4,
    Rgb555 = 5,
}

impl TexelDecode {
    #[inline]
    pub fn shader_code(self) -> u32 {
        self as u32
    }

    /// Source layout this mode unpacks.
    pub fn pixel_format(self) -> PixelFormat {
        match self {
            TexelDecode::Rgba8 => PixelFormat::Rgba8,
            TexelDecode::Rgb8 => PixelFormat::Rgb8,
            TexelDecode::Rgb565 => PixelFormat::Rgb565,
            TexelDecode::Rgb5a1 => PixelFormat::Rgb5a1,
            TexelDecode::Rgba4 => PixelFormat::Rgba4,
            TexelDecode::Rgb555 => PixelFormat::Rgb555,
        }
    }

    /// Number of stored texels making up one pixel along a row.
    #[inline]
    pub fn texels_per_pixel(self) -> u32 {
        match self {
            TexelDecode::Rgb8 => 3,
            _ => 1,
        }
    }
}

/// GPU-side format/type pair for one allocation.
///
/// Source bytes are stored verbatim in `texture_format`; `decode` selects the
/// unpacking path in the fragment shader.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct GpuFormat {
    pub texture_format: wgpu::TextureFormat,
    pub decode: TexelDecode,
}

impl GpuFormat {
    /// Placeholder fills are always written as RGBA8.
    pub const RGBA8: GpuFormat = GpuFormat {
        texture_format: wgpu::TextureFormat::Rgba8Unorm,
        decode: TexelDecode::Rgba8,
    };

    /// Texture width in texels for an image `pixel_width` pixels wide, or
    /// `None` if it overflows.
    #[inline]
    pub fn texel_width(self, pixel_width: u32) -> Option<u32> {
        pixel_width.checked_mul(self.decode.texels_per_pixel())
    }
}

#[inline]
fn expand4(v: u16) -> u8 {
    ((v & 0xF) as u8) * 17
}

#[inline]
fn expand5(v: u16) -> u8 {
    let v = (v & 0x1F) as u8;
    (v << 3) | (v >> 2)
}

#[inline]
fn expand6(v: u16) -> u8 {
    let v = (v & 0x3F) as u8;
    (v << 2) | (v >> 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_tags_round_trip_for_every_format() {
        for fmt in PixelFormat::ALL {
            assert_eq!(PixelFormat::try_from(fmt.raw()), Ok(fmt));
        }
        assert_eq!(PixelFormat::try_from(PixelFormat::NONE_TAG), Ok(PixelFormat::None));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        assert_eq!(PixelFormat::try_from(6), Err(RenderError::UnknownPixelFormat(6)));
        assert_eq!(
            PixelFormat::try_from(0xDEAD),
            Err(RenderError::UnknownPixelFormat(0xDEAD))
        );
    }

    #[test]
    fn none_has_no_gpu_format() {
        assert!(PixelFormat::None.gpu_format().is_none());
        assert_eq!(PixelFormat::None.bytes_per_pixel(), 0);
    }

    #[test]
    fn sixteen_bit_formats_share_rg8_storage() {
        for fmt in [
            PixelFormat::Rgb565,
            PixelFormat::Rgb5a1,
            PixelFormat::Rgba4,
            PixelFormat::Rgb555,
        ] {
            let gpu = fmt.gpu_format().unwrap();
            assert_eq!(gpu.texture_format, wgpu::TextureFormat::Rg8Unorm);
            assert_eq!(gpu.texel_width(10), Some(10));
        }
    }

    #[test]
    fn rgb8_uses_three_texels_per_pixel() {
        let gpu = PixelFormat::Rgb8.gpu_format().unwrap();
        assert_eq!(gpu.texture_format, wgpu::TextureFormat::R8Unorm);
        assert_eq!(gpu.texel_width(400), Some(1200));
        assert_eq!(gpu.texel_width(u32::MAX / 2), None);
    }

    #[test]
    fn decode_rgb565_primaries() {
        let red = 0xF800u16.to_le_bytes();
        let green = 0x07E0u16.to_le_bytes();
        let blue = 0x001Fu16.to_le_bytes();
        assert_eq!(PixelFormat::Rgb565.decode(&red), [255, 0, 0, 255]);
        assert_eq!(PixelFormat::Rgb565.decode(&green), [0, 255, 0, 255]);
        assert_eq!(PixelFormat::Rgb565.decode(&blue), [0, 0, 255, 255]);
    }

    #[test]
    fn decode_rgb5a1_alpha_bit() {
        let opaque_white = 0xFFFFu16.to_le_bytes();
        let clear_white = 0xFFFEu16.to_le_bytes();
        assert_eq!(PixelFormat::Rgb5a1.decode(&opaque_white), [255, 255, 255, 255]);
        assert_eq!(PixelFormat::Rgb5a1.decode(&clear_white), [255, 255, 255, 0]);
    }

    #[test]
    fn decode_rgba4_nibbles() {
        let px = 0xF08Cu16.to_le_bytes();
        assert_eq!(PixelFormat::Rgba4.decode(&px), [255, 0, 136, 204]);
    }

    #[test]
    fn decode_rgb555_ignores_top_bit() {
        let a = 0x7C00u16.to_le_bytes();
        let b = 0xFC00u16.to_le_bytes();
        assert_eq!(PixelFormat::Rgb555.decode(&a), [255, 0, 0, 255]);
        assert_eq!(PixelFormat::Rgb555.decode(&a), PixelFormat::Rgb555.decode(&b));
    }

    #[test]
    fn decode_byte_formats_pass_through() {
        assert_eq!(PixelFormat::Rgba8.decode(&[1, 2, 3, 4]), [1, 2, 3, 4]);
        assert_eq!(PixelFormat::Rgb8.decode(&[9, 8, 7]), [9, 8, 7, 255]);
    }
}
