//! Placement of the two screens on the target surface.
//!
//! Both screens share one uniform scale factor so each keeps its native
//! aspect ratio and their relative size is preserved:
//!
//! - `scale = min(surface_w / widest_native_w, surface_h / total_native_h)`
//! - screens are stacked top to bottom without a gap
//! - the stack is centred vertically, each screen horizontally
//!
//! Degenerate surfaces (zero or non-finite size) produce empty placements.

use crate::coords::{Rect, SurfaceSize};
use crate::framebuffer::ScreenId;

/// Computes where each screen is drawn, in `ScreenId::ALL` order.
pub fn stacked_layout(surface: SurfaceSize) -> [Rect; 2] {
    stack_sizes(surface, ScreenId::ALL.map(|s| s.native_size()))
}

/// Same as [`stacked_layout`] for arbitrary native sizes (top first).
pub fn stack_sizes(surface: SurfaceSize, natives: [(u32, u32); 2]) -> [Rect; 2] {
    let widest = natives.iter().map(|&(w, _)| w).max().unwrap_or(0) as f32;
    let total_h: f32 = natives.iter().map(|&(_, h)| h as f32).sum();

    let sw = surface.width as f32;
    let sh = surface.height as f32;

    let scale = if widest <= 0.0 || total_h <= 0.0 || surface.is_empty() {
        0.0
    } else {
        (sw / widest).min(sh / total_h)
    };
    let scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };

    let stack_h = total_h * scale;
    let mut y = ((sh - stack_h) * 0.5).max(0.0);

    natives.map(|(nw, nh)| {
        let w = nw as f32 * scale;
        let h = nh as f32 * scale;
        let x = ((sw - w) * 0.5).max(0.0);
        let rect = Rect::new(x, y, w, h);
        y += h;
        rect
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-3;

    fn check_invariants(surface: SurfaceSize) {
        let placements = stacked_layout(surface);

        for (rect, screen) in placements.iter().zip(ScreenId::ALL) {
            assert!(rect.is_finite(), "{surface:?}: {rect:?}");
            assert!(rect.size.x >= 0.0 && rect.size.y >= 0.0, "{surface:?}: {rect:?}");
            assert!(rect.origin.x >= 0.0 && rect.origin.y >= 0.0, "{surface:?}: {rect:?}");

            if let Some(aspect) = rect.aspect() {
                let (nw, nh) = screen.native_size();
                let native = nw as f32 / nh as f32;
                assert!(
                    (aspect - native).abs() / native < TOLERANCE,
                    "{surface:?} {screen:?}: aspect {aspect} != {native}"
                );

                // Relative slack: at u32::MAX one f32 ulp is hundreds of pixels.
                let max = rect.max();
                let limit = |v: u32| v as f32 * (1.0 + 1e-6) + TOLERANCE;
                assert!(max.x <= limit(surface.width), "{surface:?}: {rect:?}");
                assert!(max.y <= limit(surface.height), "{surface:?}: {rect:?}");
            }
        }

        // Top screen is never below the bottom screen.
        assert!(placements[0].max().y <= placements[1].origin.y + TOLERANCE);
    }

    #[test]
    fn invariants_hold_for_many_surfaces() {
        let sizes = [
            (0, 0),
            (0, 480),
            (400, 0),
            (1, 1),
            (1, 10_000),
            (10_000, 1),
            (400, 480),
            (800, 960),
            (1280, 720),
            (1920, 1080),
            (320, 240),
            (u32::MAX, u32::MAX),
            (u32::MAX, 1),
        ];
        for (w, h) in sizes {
            check_invariants(SurfaceSize::new(w, h));
        }
    }

    #[test]
    fn native_size_surface_is_exact() {
        let [top, bottom] = stacked_layout(SurfaceSize::new(400, 480));
        assert_eq!(top, Rect::new(0.0, 0.0, 400.0, 240.0));
        assert_eq!(bottom, Rect::new(40.0, 240.0, 320.0, 240.0));
    }

    #[test]
    fn wide_surface_is_height_bound_and_centred() {
        let [top, bottom] = stacked_layout(SurfaceSize::new(1920, 960));
        // scale = min(1920/400, 960/480) = 2
        assert_eq!(top, Rect::new(560.0, 0.0, 800.0, 480.0));
        assert_eq!(bottom, Rect::new(640.0, 480.0, 640.0, 480.0));
    }

    #[test]
    fn tall_surface_is_width_bound_and_centred_vertically() {
        let [top, bottom] = stacked_layout(SurfaceSize::new(400, 1080));
        // scale = 1, stack height 480, leftover 600 split evenly.
        assert_eq!(top.origin.y, 300.0);
        assert_eq!(bottom.origin.y, 540.0);
        assert_eq!(top.size.x, 400.0);
    }

    #[test]
    fn zero_surface_gives_empty_screens() {
        for surface in [SurfaceSize::new(0, 0), SurfaceSize::new(0, 720), SurfaceSize::new(1280, 0)] {
            for rect in stacked_layout(surface) {
                assert!(rect.is_empty());
                assert!(rect.size.x >= 0.0 && rect.size.y >= 0.0);
            }
        }
    }

    #[test]
    fn layout_follows_resize() {
        let small = stacked_layout(SurfaceSize::new(400, 480));
        let large = stacked_layout(SurfaceSize::new(800, 960));
        assert_eq!(large[0].size.x, small[0].size.x * 2.0);
        assert_eq!(large[1].size.y, small[1].size.y * 2.0);
    }

    #[test]
    fn equal_aspect_screens_share_column() {
        let [a, b] = stack_sizes(SurfaceSize::new(100, 100), [(10, 5), (10, 5)]);
        assert_eq!(a, Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(b, Rect::new(0.0, 50.0, 100.0, 50.0));
    }
}
