//! Animated stand-ins for the emulated core's framebuffers.

use twinview_engine::{FramebufferInfo, PixelFormat, ScreenId};

/// Owns the pixel storage for one screen and redraws it per frame.
pub struct PatternSource {
    screen: ScreenId,
    format: PixelFormat,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PatternSource {
    pub fn new(screen: ScreenId, format: PixelFormat) -> Self {
        let (width, height) = screen.native_size();
        let len = (width * height * format.bytes_per_pixel()) as usize;
        Self {
            screen,
            format,
            width,
            height,
            pixels: vec![0; len],
        }
    }

    /// Redraws the pattern for frame `tick` and returns a view of it.
    pub fn render(&mut self, tick: u32) -> FramebufferInfo<'_> {
        let bpp = self.format.bytes_per_pixel() as usize;
        let width = self.width;

        for (i, px) in self.pixels.chunks_exact_mut(bpp).enumerate() {
            let x = i as u32 % width;
            let y = i as u32 / width;
            let rgb = match self.screen {
                ScreenId::Top => gradient(x, y, tick),
                ScreenId::Bottom => checker(x, y, tick),
            };
            encode(self.format, rgb, px);
        }

        FramebufferInfo::new(&self.pixels, self.width, self.height, self.format)
    }
}

fn gradient(x: u32, y: u32, tick: u32) -> [u8; 3] {
    let shift = tick.wrapping_mul(2);
    [
        (x.wrapping_add(shift) & 0xFF) as u8,
        (y & 0xFF) as u8,
        ((x ^ y).wrapping_add(shift / 2) & 0xFF) as u8,
    ]
}

fn checker(x: u32, y: u32, tick: u32) -> [u8; 3] {
    let cell = ((x + tick) / 16 + y / 16) % 2 == 0;
    if cell { [0xF0, 0xF0, 0xF0] } else { [0x20, 0x40, 0x90] }
}

/// Packs straight RGB into `format` (little-endian for the 16-bit ones).
fn encode(format: PixelFormat, [r, g, b]: [u8; 3], out: &mut [u8]) {
    let (r, g, b) = (r as u16, g as u16, b as u16);
    let word = match format {
        PixelFormat::Rgba8 => {
            out.copy_from_slice(&[r as u8, g as u8, b as u8, 0xFF]);
            return;
        }
        PixelFormat::Rgb8 => {
            out.copy_from_slice(&[r as u8, g as u8, b as u8]);
            return;
        }
        PixelFormat::Rgb565 => (r >> 3) << 11 | (g >> 2) << 5 | b >> 3,
        PixelFormat::Rgb5a1 => (r >> 3) << 11 | (g >> 3) << 6 | (b >> 3) << 1 | 1,
        PixelFormat::Rgba4 => (r >> 4) << 12 | (g >> 4) << 8 | (b >> 4) << 4 | 0xF,
        PixelFormat::Rgb555 => (r >> 3) << 10 | (g >> 3) << 5 | b >> 3,
        PixelFormat::None => return,
    };
    out.copy_from_slice(&word.to_le_bytes());
}
