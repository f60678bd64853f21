//! Frame clock driving tweens and shader time.
//!
//! The clock produces two readings per frame:
//!
//! - `now_ms()` - milliseconds since the clock started, fed to
//!   [`TransitionController::tick`](crate::TransitionController::tick)
//! - `delta()` - seconds since the previous frame, fed to
//!   [`TransitionController::update`](crate::TransitionController::update)
//!
//! # Example
//!
//! ```ignore
//! use image_particles::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // Once per display frame:
//! clock.update();
//! controller.tick(clock.now_ms())?;
//! controller.update(clock.delta());
//! ```

use std::time::{Duration, Instant};

/// Frame timing for the particle view.
///
/// Tracks elapsed time, delta time and frame count. Supports pausing, time
/// scaling and a fixed delta for deterministic stepping.
#[derive(Debug)]
pub struct FrameClock {
    /// Last real instant observed.
    last_frame: Instant,
    /// Accumulated scaled clock time in milliseconds.
    now_ms: f64,
    /// Time since last frame in seconds.
    delta_secs: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Whether time is paused.
    paused: bool,
    /// Fixed delta time in seconds (optional).
    fixed_delta: Option<f32>,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
}

impl FrameClock {
    /// Create a clock starting from now.
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            now_ms: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
        }
    }

    /// Create a clock that always advances by `delta` seconds per frame.
    ///
    /// Real time is ignored, which makes frame sequences reproducible.
    pub fn fixed(delta: f32) -> Self {
        let mut clock = Self::new();
        clock.set_fixed_delta(Some(delta));
        clock
    }

    /// Advance the clock by one frame using real time (or the fixed delta).
    ///
    /// Returns `(now_ms, delta_secs)` for convenience.
    pub fn update(&mut self) -> (f64, f32) {
        let now = Instant::now();
        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.step(self.fixed_delta.unwrap_or(raw_delta))
    }

    /// Advance the clock by an explicit number of seconds.
    ///
    /// Useful when the host already measures frame time.
    pub fn step(&mut self, delta: f32) -> (f64, f32) {
        if self.paused {
            self.delta_secs = 0.0;
            return (self.now_ms, self.delta_secs);
        }

        self.delta_secs = delta.max(0.0) * self.time_scale;
        self.now_ms += self.delta_secs as f64 * 1000.0;
        self.frame_count += 1;

        (self.now_ms, self.delta_secs)
    }

    /// Milliseconds since the clock started (scaled, excluding pauses).
    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Time since last frame in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Delta time as a Duration.
    #[inline]
    pub fn delta_duration(&self) -> Duration {
        Duration::from_secs_f32(self.delta_secs)
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Pause time progression.
    ///
    /// While paused, `delta()` returns 0 and `now_ms()` stops increasing.
    /// Pause while the view is off screen to freeze the field.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after pausing. The paused interval is not counted.
    pub fn resume(&mut self) {
        if self.paused {
            self.last_frame = Instant::now();
            self.paused = false;
        }
    }

    /// Set a fixed delta time in seconds. `None` uses real frame timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Set time scale multiplier. Negative values clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.now_ms(), 0.0);
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_clock_update_real_time() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        let (now, delta) = clock.update();

        assert!(now >= 10.0);
        assert!(delta > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_fixed_delta() {
        let mut clock = FrameClock::fixed(1.0 / 60.0);
        thread::sleep(Duration::from_millis(50));
        clock.update();
        clock.update();

        assert!((clock.delta() - 1.0 / 60.0).abs() < 1e-6);
        assert!((clock.now_ms() - 2000.0 / 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_pause() {
        let mut clock = FrameClock::fixed(0.016);
        clock.update();
        clock.pause();
        let before = clock.now_ms();
        clock.update();

        assert_eq!(clock.now_ms(), before);
        assert_eq!(clock.delta(), 0.0);

        clock.resume();
        clock.update();
        assert!(clock.now_ms() > before);
    }

    #[test]
    fn test_time_scale() {
        let mut clock = FrameClock::new();
        clock.set_time_scale(2.0);
        clock.step(0.5);
        assert!((clock.now_ms() - 1000.0).abs() < 1e-6);

        clock.set_time_scale(-1.0);
        assert_eq!(clock.time_scale(), 0.0);
    }
}
