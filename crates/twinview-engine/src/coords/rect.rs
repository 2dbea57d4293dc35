use super::Vec2;

/// Axis-aligned rectangle in surface pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.origin.is_finite() && self.size.is_finite()
    }

    /// Width over height, or `None` for an empty rectangle.
    #[inline]
    pub fn aspect(self) -> Option<f32> {
        if self.is_empty() {
            None
        } else {
            Some(self.size.x / self.size.y)
        }
    }

    /// The four corners in triangle-strip order: top-left, top-right,
    /// bottom-left, bottom-right.
    #[inline]
    pub fn strip_corners(self) -> [Vec2; 4] {
        let Vec2 { x, y } = self.origin;
        let Vec2 { x: x1, y: y1 } = self.max();
        [
            Vec2::new(x, y),
            Vec2::new(x1, y),
            Vec2::new(x, y1),
            Vec2::new(x1, y1),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    #[test]
    fn max_is_origin_plus_size() {
        assert_eq!(r(1.0, 2.0, 10.0, 20.0).max(), Vec2::new(11.0, 22.0));
    }

    #[test]
    fn is_empty_zero_size() {
        assert!(r(0.0, 0.0, 0.0, 5.0).is_empty());
        assert!(r(0.0, 0.0, 5.0, 0.0).is_empty());
        assert!(!r(0.0, 0.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn aspect_of_empty_is_none() {
        assert_eq!(r(0.0, 0.0, 0.0, 0.0).aspect(), None);
        assert_eq!(r(0.0, 0.0, 400.0, 240.0).aspect(), Some(400.0 / 240.0));
    }

    #[test]
    fn strip_corners_order() {
        let c = r(10.0, 20.0, 4.0, 2.0).strip_corners();
        assert_eq!(c[0], Vec2::new(10.0, 20.0));
        assert_eq!(c[1], Vec2::new(14.0, 20.0));
        assert_eq!(c[2], Vec2::new(10.0, 22.0));
        assert_eq!(c[3], Vec2::new(14.0, 22.0));
    }
}
