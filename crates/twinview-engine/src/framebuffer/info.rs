use crate::error::{RenderError, RenderResult};

use super::PixelFormat;

/// One of the two composited screen regions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ScreenId {
    Top,
    Bottom,
}

impl ScreenId {
    /// Draw order: top first, then bottom.
    pub const ALL: [ScreenId; 2] = [ScreenId::Top, ScreenId::Bottom];

    /// Native resolution `(width, height)` of the screen in pixels.
    pub const fn native_size(self) -> (u32, u32) {
        match self {
            ScreenId::Top => (400, 240),
            ScreenId::Bottom => (320, 240),
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            ScreenId::Top => 0,
            ScreenId::Bottom => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ScreenId::Top => "top",
            ScreenId::Bottom => "bottom",
        }
    }
}

/// Borrowed view of one frame of raw pixels for one screen.
///
/// Rows are stored top to bottom. `stride` is the distance in bytes between
/// the starts of two consecutive rows; when absent rows are tightly packed.
#[derive(Debug, Copy, Clone)]
pub struct FramebufferInfo<'a> {
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub stride: Option<u32>,
}

impl<'a> FramebufferInfo<'a> {
    pub fn new(pixels: &'a [u8], width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            pixels,
            width,
            height,
            format,
            stride: None,
        }
    }

    /// Builds a descriptor from the producer's raw format tag.
    pub fn from_raw(pixels: &'a [u8], width: u32, height: u32, raw_format: u32) -> RenderResult<Self> {
        let format = PixelFormat::try_from(raw_format)?;
        Ok(Self::new(pixels, width, height, format))
    }

    /// Sets an explicit row stride in bytes.
    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = Some(stride);
        self
    }

    /// Descriptor carrying the "no data" sentinel.
    pub fn blank() -> Self {
        Self::new(&[], 0, 0, PixelFormat::None)
    }

    /// True when the descriptor carries no pixel data.
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.format == PixelFormat::None
    }

    /// Bytes between the starts of two rows, or `None` if it overflows.
    #[inline]
    pub fn row_stride(&self) -> Option<u32> {
        self.stride.or_else(|| self.row_bytes())
    }

    /// Bytes of meaningful data in one row, or `None` if it overflows.
    #[inline]
    pub fn row_bytes(&self) -> Option<u32> {
        self.width.checked_mul(self.format.bytes_per_pixel())
    }

    /// Checks that the slice covers every row the dimensions promise and
    /// returns the row pitch to read it with.
    pub fn validate(&self) -> RenderResult<u32> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::EmptyFramebuffer);
        }

        let too_large = RenderError::FramebufferTooLarge {
            width: self.width,
            height: self.height,
        };
        let (Some(row), Some(stride)) = (self.row_bytes(), self.row_stride()) else {
            return Err(too_large);
        };

        let stride = stride.max(row);
        let required = u64::from(stride)
            .checked_mul(u64::from(self.height - 1))
            .and_then(|body| body.checked_add(u64::from(row)))
            .and_then(|total| usize::try_from(total).ok())
            .ok_or(too_large)?;

        if self.pixels.len() < required {
            return Err(RenderError::FramebufferTooSmall {
                width: self.width,
                height: self.height,
                stride,
                required,
                actual: self.pixels.len(),
            });
        }
        Ok(stride)
    }
}

/// Framebuffers delivered for one output frame.
///
/// A `None` entry means the screen has no signal this frame.
#[derive(Debug, Copy, Clone, Default)]
pub struct ScreenFrames<'a> {
    pub top: Option<FramebufferInfo<'a>>,
    pub bottom: Option<FramebufferInfo<'a>>,
}

impl<'a> ScreenFrames<'a> {
    pub fn new(top: Option<FramebufferInfo<'a>>, bottom: Option<FramebufferInfo<'a>>) -> Self {
        Self { top, bottom }
    }

    #[inline]
    pub fn get(&self, screen: ScreenId) -> Option<&FramebufferInfo<'a>> {
        match screen {
            ScreenId::Top => self.top.as_ref(),
            ScreenId::Bottom => self.bottom.as_ref(),
        }
    }
}
