//! Frame-synchronous tweens.
//!
//! A [`Tween`] is an explicit state object advanced by the host's frame
//! driver. Each call to [`Tween::tick`] with the current frame time yields the
//! next interpolated vector until the duration has elapsed:
//!
//! - the first tick binds the start time and yields the curve at `t = 0`
//! - each later tick yields the curve at the elapsed time
//! - once `t >= duration`, one final value at exactly `t = duration` is
//!   yielded and the tween is done; further ticks yield `None`
//!
//! Timing starts at the first tick, not at creation, so scheduling jitter
//! before the first frame does not eat into the animation.
//!
//! [`TweenScheduler`] runs several tweens side by side. Cancelling a tween
//! removes it from the scheduler; nothing ticks it again.
//!
//! # Example
//!
//! ```ignore
//! use image_particles::{Easing, Tween};
//!
//! let mut tween = Tween::vector(Easing::EaseInOutQuad, &[0.5, 0.0], &[1.5, 2.0], 1000.0)?;
//! while let Some(values) = tween.tick(clock.now_ms()) {
//!     apply(&values);
//!     clock.update();
//! }
//! ```

use crate::easing::Easing;
use crate::error::TweenError;
use slotmap::{new_key_type, SlotMap};

/// Stateless description of a tween.
#[derive(Clone, Debug, PartialEq)]
pub struct TweenRequest {
    /// Curve applied to every component.
    pub easing: Easing,
    /// Start values.
    pub from: Vec<f32>,
    /// End values, same arity as `from`.
    pub to: Vec<f32>,
    /// Duration in milliseconds.
    pub duration_ms: f64,
    /// Optional curve parameter shared by all components.
    pub param: Option<f64>,
}

impl TweenRequest {
    /// Describe a tween from `from` to `to` over `duration_ms`.
    pub fn new(easing: Easing, from: Vec<f32>, to: Vec<f32>, duration_ms: f64) -> Self {
        Self {
            easing,
            from,
            to,
            duration_ms,
            param: None,
        }
    }

    /// Set the curve parameter (overshoot for the `Back` curves).
    pub fn with_param(mut self, s: f64) -> Self {
        self.param = Some(s);
        self
    }

    /// Number of components per emitted vector.
    pub fn arity(&self) -> usize {
        self.from.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Created but not yet ticked.
    Pending,
    Running,
    Done,
}

/// A running vector tween.
#[derive(Clone, Debug)]
pub struct Tween {
    request: TweenRequest,
    start_ms: Option<f64>,
    phase: Phase,
}

impl Tween {
    /// Validate a request and create a tween from it.
    ///
    /// Fails with [`TweenError::ArityMismatch`] if `from` and `to` differ in
    /// length, or [`TweenError::InvalidDuration`] for a negative or
    /// non-finite duration.
    pub fn new(request: TweenRequest) -> Result<Self, TweenError> {
        if request.from.len() != request.to.len() {
            return Err(TweenError::ArityMismatch {
                from: request.from.len(),
                to: request.to.len(),
            });
        }
        if !request.duration_ms.is_finite() || request.duration_ms < 0.0 {
            return Err(TweenError::InvalidDuration(request.duration_ms));
        }
        Ok(Self {
            request,
            start_ms: None,
            phase: Phase::Pending,
        })
    }

    /// Create a multi-component tween.
    pub fn vector(easing: Easing, from: &[f32], to: &[f32], duration_ms: f64) -> Result<Self, TweenError> {
        Self::new(TweenRequest::new(easing, from.to_vec(), to.to_vec(), duration_ms))
    }

    /// Evaluate the curve for every component at elapsed time `t`.
    pub fn sample(&self, t: f64) -> Vec<f32> {
        let r = &self.request;
        r.from
            .iter()
            .zip(&r.to)
            .map(|(&b, &c)| {
                r.easing
                    .value_with(t, b as f64, c as f64, r.duration_ms, r.param) as f32
            })
            .collect()
    }

    /// Advance to frame time `now_ms` and return the value for this frame.
    ///
    /// Returns `None` once the final value has been emitted.
    pub fn tick(&mut self, now_ms: f64) -> Option<Vec<f32>> {
        let start = match self.phase {
            Phase::Done => return None,
            Phase::Pending => {
                self.phase = Phase::Running;
                self.start_ms = Some(now_ms);
                now_ms
            }
            Phase::Running => self.start_ms.unwrap_or(now_ms),
        };

        let t = (now_ms - start).max(0.0);
        let d = self.request.duration_ms;
        if t < d {
            Some(self.sample(t))
        } else {
            self.phase = Phase::Done;
            Some(self.sample(d))
        }
    }

    /// Drive the tween with a sequence of frame times.
    ///
    /// The returned iterator is lazy and ends after the final value; dropping
    /// it stops the tween.
    pub fn drive<I>(self, frame_times: I) -> Frames<I::IntoIter>
    where
        I: IntoIterator<Item = f64>,
    {
        Frames {
            tween: self,
            times: frame_times.into_iter(),
        }
    }

    /// Frame time bound on the first tick.
    pub fn start_ms(&self) -> Option<f64> {
        self.start_ms
    }

    /// Whether the final value has been emitted.
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Whether the tween has been ticked at least once.
    pub fn is_started(&self) -> bool {
        self.phase != Phase::Pending
    }

    pub fn request(&self) -> &TweenRequest {
        &self.request
    }
}

/// Lazy sequence of tween values, one per frame time.
pub struct Frames<I> {
    tween: Tween,
    times: I,
}

impl<I: Iterator<Item = f64>> Iterator for Frames<I> {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.tween.is_done() {
            return None;
        }
        let now = self.times.next()?;
        self.tween.tick(now)
    }
}

/// Single-value tween sharing the vector engine.
#[derive(Clone, Debug)]
pub struct ScalarTween {
    inner: Tween,
}

impl ScalarTween {
    /// Create a tween from `from` to `to` over `duration_ms`.
    pub fn new(easing: Easing, from: f32, to: f32, duration_ms: f64) -> Result<Self, TweenError> {
        Ok(Self {
            inner: Tween::vector(easing, &[from], &[to], duration_ms)?,
        })
    }

    /// Set the curve parameter.
    pub fn with_param(mut self, s: f64) -> Self {
        self.inner.request.param = Some(s);
        self
    }

    /// Advance to `now_ms`. See [`Tween::tick`].
    pub fn tick(&mut self, now_ms: f64) -> Option<f32> {
        self.inner.tick(now_ms).and_then(|v| v.first().copied())
    }

    pub fn is_done(&self) -> bool {
        self.inner.is_done()
    }
}

new_key_type! {
    /// Handle to a tween owned by a [`TweenScheduler`].
    pub struct TweenId;
}

/// Output of one scheduler tick for one tween.
#[derive(Clone, Debug, PartialEq)]
pub struct TweenFrame {
    pub id: TweenId,
    pub values: Vec<f32>,
    /// `true` for the final value; the tween has been removed.
    pub finished: bool,
}

/// Runs any number of tweens off one frame clock.
#[derive(Default)]
pub struct TweenScheduler {
    tweens: SlotMap<TweenId, Tween>,
}

impl TweenScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a request and schedule it.
    pub fn start(&mut self, request: TweenRequest) -> Result<TweenId, TweenError> {
        let tween = Tween::new(request)?;
        Ok(self.insert(tween))
    }

    /// Schedule an existing tween.
    pub fn insert(&mut self, tween: Tween) -> TweenId {
        let id = self.tweens.insert(tween);
        log::debug!("tween {:?} scheduled", id);
        id
    }

    /// Stop a tween. Returns `false` if it already finished or was cancelled.
    pub fn cancel(&mut self, id: TweenId) -> bool {
        let removed = self.tweens.remove(id).is_some();
        if removed {
            log::debug!("tween {:?} cancelled", id);
        }
        removed
    }

    /// Cancel every tween.
    pub fn clear(&mut self) {
        self.tweens.clear();
    }

    pub fn get(&self, id: TweenId) -> Option<&Tween> {
        self.tweens.get(id)
    }

    pub fn is_running(&self, id: TweenId) -> bool {
        self.tweens.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Tick every scheduled tween once. Finished tweens are removed.
    pub fn tick(&mut self, now_ms: f64) -> Vec<TweenFrame> {
        let mut frames = Vec::with_capacity(self.tweens.len());
        for (id, tween) in self.tweens.iter_mut() {
            if let Some(values) = tween.tick(now_ms) {
                frames.push(TweenFrame {
                    id,
                    values,
                    finished: tween.is_done(),
                });
            }
        }
        self.tweens.retain(|_, t| !t.is_done());
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Frame times at 60 fps starting at `start`.
    fn frames_60fps(start: f64) -> impl Iterator<Item = f64> {
        (0..).map(move |i| start + i as f64 * (1000.0 / 60.0))
    }

    #[test]
    fn test_first_value_is_curve_at_zero() {
        let mut tween = Tween::vector(Easing::Linear, &[0.0], &[100.0], 2000.0).unwrap();
        assert!(!tween.is_started());
        // First tick at an arbitrary clock time still samples t = 0
        assert_eq!(tween.tick(5_000.0), Some(vec![0.0]));
        assert_eq!(tween.start_ms(), Some(5_000.0));
    }

    #[test]
    fn test_linear_terminates_at_end_value() {
        let tween = Tween::vector(Easing::Linear, &[0.0], &[100.0], 2000.0).unwrap();
        let mut last_time = 0.0;
        let mut last = None;
        for (now, values) in frames_60fps(0.0).zip(tween.drive(frames_60fps(0.0))) {
            last_time = now;
            last = Some(values);
        }

        assert_eq!(last, Some(vec![100.0]));
        assert!((last_time - 2000.0).abs() <= 1000.0 / 60.0 + 1e-9);
    }

    #[test]
    fn test_final_value_lands_exactly_on_duration() {
        let mut tween = Tween::vector(Easing::Linear, &[0.0], &[100.0], 1000.0).unwrap();
        tween.tick(0.0);
        tween.tick(900.0);
        // Overshooting frame clamps to t = duration
        assert_eq!(tween.tick(1_250.0), Some(vec![100.0]));
        assert!(tween.is_done());
        assert_eq!(tween.tick(1_300.0), None);
    }

    #[test]
    fn test_values_monotonic_in_time() {
        let tween = Tween::vector(Easing::EaseInOutQuad, &[0.5], &[1.5], 1000.0).unwrap();
        let values: Vec<f32> = tween.drive(frames_60fps(0.0)).map(|v| v[0]).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(values.first(), Some(&0.5));
        assert_eq!(values.last(), Some(&1.5));
    }

    #[test]
    fn test_vector_components_independent() {
        let mut tween =
            Tween::vector(Easing::EaseInOutQuad, &[0.5, 0.0, 70.0], &[1.5, 2.0, 4.0], 1000.0).unwrap();
        tween.tick(0.0);
        let mid = tween.tick(500.0).unwrap();
        assert!((mid[0] - 1.0).abs() < 1e-6);
        assert!((mid[1] - 1.0).abs() < 1e-6);
        assert!((mid[2] - 37.0).abs() < 1e-4);
    }

    #[test]
    fn test_arity_mismatch_fails_at_creation() {
        let err = Tween::vector(Easing::Linear, &[0.0, 1.0], &[1.0], 100.0).unwrap_err();
        assert_eq!(err, TweenError::ArityMismatch { from: 2, to: 1 });
    }

    #[test]
    fn test_invalid_duration() {
        assert!(Tween::vector(Easing::Linear, &[0.0], &[1.0], -1.0).is_err());
        assert!(Tween::vector(Easing::Linear, &[0.0], &[1.0], f64::NAN).is_err());
    }

    #[test]
    fn test_zero_duration_emits_single_final_value() {
        let tween = Tween::vector(Easing::Linear, &[3.0], &[7.0], 0.0).unwrap();
        let values: Vec<_> = tween.drive(frames_60fps(10.0)).collect();
        assert_eq!(values, vec![vec![7.0]]);
    }

    #[test]
    fn test_scalar_tween() {
        let mut tween = ScalarTween::new(Easing::Linear, 10.0, 20.0, 100.0).unwrap();
        assert_eq!(tween.tick(0.0), Some(10.0));
        assert_eq!(tween.tick(50.0), Some(15.0));
        assert_eq!(tween.tick(100.0), Some(20.0));
        assert!(tween.is_done());
    }

    #[test]
    fn test_scheduler_removes_finished() {
        let mut scheduler = TweenScheduler::new();
        let short = scheduler
            .start(TweenRequest::new(Easing::Linear, vec![0.0], vec![1.0], 100.0))
            .unwrap();
        let long = scheduler
            .start(TweenRequest::new(Easing::Linear, vec![0.0], vec![1.0], 1000.0))
            .unwrap();

        assert_eq!(scheduler.tick(0.0).len(), 2);
        let frames = scheduler.tick(200.0);
        let short_frame = frames.iter().find(|f| f.id == short).unwrap();
        assert!(short_frame.finished);
        assert_eq!(short_frame.values, vec![1.0]);

        assert!(!scheduler.is_running(short));
        assert!(scheduler.is_running(long));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_scheduler_cancel_stops_ticks() {
        let mut scheduler = TweenScheduler::new();
        let id = scheduler
            .start(TweenRequest::new(Easing::Linear, vec![0.0], vec![1.0], 100.0))
            .unwrap();
        scheduler.tick(0.0);

        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(scheduler.tick(50.0).is_empty());
        assert!(scheduler.is_empty());
    }
}
