use std::time::{Duration, Instant};

/// Rolling frames-per-second counter.
///
/// Frames are counted until at least `window` has elapsed since the last
/// sample; the rate over that window then becomes the current report and the
/// count restarts. Purely observational: nothing waits on it.
#[derive(Debug, Clone)]
pub struct FrameCounter {
    last_sample: Instant,
    frames: u32,
    fps: Option<f32>,
    window: Duration,
}

impl FrameCounter {
    /// Creates a counter sampling once per second.
    pub fn new() -> Self {
        Self::with_window(Instant::now(), Duration::from_secs(1))
    }

    /// Creates a counter with an explicit baseline and sampling window.
    pub fn with_window(now: Instant, window: Duration) -> Self {
        debug_assert!(!window.is_zero());
        Self {
            last_sample: now,
            frames: 0,
            fps: None,
            window,
        }
    }

    /// Clears the count and any previous report, starting a new window at `now`.
    pub fn reset(&mut self, now: Instant) {
        self.last_sample = now;
        self.frames = 0;
        self.fps = None;
    }

    /// Records one presented frame at the current time.
    pub fn record_frame(&mut self) -> Option<f32> {
        self.record_frame_at(Instant::now())
    }

    /// Records one presented frame at `now`.
    ///
    /// Returns the new rate when this frame closed a sampling window.
    pub fn record_frame_at(&mut self, now: Instant) -> Option<f32> {
        self.frames = self.frames.saturating_add(1);

        let elapsed = now.saturating_duration_since(self.last_sample);
        if elapsed < self.window {
            return None;
        }

        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.fps = Some(fps);
        self.frames = 0;
        self.last_sample = now;
        Some(fps)
    }

    /// Most recent report, if a full window has elapsed since the last reset.
    #[inline]
    pub fn fps(&self) -> Option<f32> {
        self.fps
    }

    /// Frames counted in the current, still open window.
    #[inline]
    pub fn pending_frames(&self) -> u32 {
        self.frames
    }
}

impl Default for FrameCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feeds `n` frames evenly spaced over `secs`, ending exactly at `secs`.
    fn feed(counter: &mut FrameCounter, start: Instant, n: u32, secs: f64) -> Option<f32> {
        let mut last = None;
        for i in 1..=n {
            let t = start + Duration::from_secs_f64(secs * i as f64 / n as f64);
            if let Some(fps) = counter.record_frame_at(t) {
                last = Some(fps);
            }
        }
        last
    }

    #[test]
    fn no_report_before_one_second() {
        let start = Instant::now();
        let mut c = FrameCounter::with_window(start, Duration::from_secs(1));
        assert_eq!(feed(&mut c, start, 30, 0.5), None);
        assert_eq!(c.fps(), None);
        assert_eq!(c.pending_frames(), 30);
    }

    #[test]
    fn reports_sixty_over_one_second() {
        let start = Instant::now();
        let mut c = FrameCounter::with_window(start, Duration::from_secs(1));
        let fps = feed(&mut c, start, 60, 1.0).unwrap();
        assert!((fps - 60.0).abs() < 0.01, "fps = {fps}");
        assert_eq!(c.pending_frames(), 0);
    }

    #[test]
    fn long_gap_is_averaged_over_elapsed_time() {
        let start = Instant::now();
        let mut c = FrameCounter::with_window(start, Duration::from_secs(1));
        // A single frame after 4 seconds closes the window at 0.25 fps.
        let fps = c.record_frame_at(start + Duration::from_secs(4)).unwrap();
        assert!((fps - 0.25).abs() < 1e-6);
    }

    #[test]
    fn reset_discards_previous_window() {
        let start = Instant::now();
        let mut c = FrameCounter::with_window(start, Duration::from_secs(1));
        assert!(feed(&mut c, start, 120, 1.0).is_some());

        let restart = start + Duration::from_secs(5);
        c.reset(restart);
        assert_eq!(c.fps(), None);

        // Half a window later the old 120 fps must not be reported.
        assert_eq!(feed(&mut c, restart, 10, 0.5), None);
        assert_eq!(c.fps(), None);

        let fps = feed(&mut c, restart + Duration::from_millis(500), 20, 0.5).unwrap();
        assert!((fps - 30.0).abs() < 0.01, "fps = {fps}");
    }

    #[test]
    fn consecutive_windows_are_independent() {
        let start = Instant::now();
        let mut c = FrameCounter::with_window(start, Duration::from_secs(1));
        let first = feed(&mut c, start, 60, 1.0).unwrap();
        let second = feed(&mut c, start + Duration::from_secs(1), 30, 1.0).unwrap();
        assert!((first - 60.0).abs() < 0.01);
        assert!((second - 30.0).abs() < 0.01);
    }
}
