//! Easing curves for tweens.
//!
//! Every curve follows the classic Penner signature `f(t, b, c, d)`:
//!
//! - `t` - elapsed time (same unit as `d`)
//! - `b` - start value
//! - `c` - **end** value (absolute, not a delta)
//! - `d` - total duration
//!
//! Callers always pass absolute start and end values. The change in value is
//! computed internally as `c - b`.
//!
//! # Example
//!
//! ```ignore
//! use image_particles::easing::Easing;
//!
//! let v = Easing::Linear.value(500.0, 0.0, 100.0, 2000.0);
//! assert_eq!(v, 25.0);
//! ```

use std::f64::consts::{FRAC_PI_2, PI};
use std::str::FromStr;

/// Default overshoot for the `Back` curves.
pub const DEFAULT_BACK_OVERSHOOT: f64 = 1.70158;

/// Named easing curve.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    /// `b + (c - b) * t / d`.
    Linear,
    EaseInQuad,
    EaseOutQuad,
    /// Quadratic ease-in-out, split at `t = d / 2`.
    #[default]
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInSine,
    /// `c * sin(t / d * PI / 2) + b`. Used by the touch envelope.
    EaseOutSine,
    EaseInOutSine,
    /// Overshoots backwards before moving forwards. Uses the curve parameter.
    EaseInBack,
    /// Overshoots past the end before settling. Uses the curve parameter.
    EaseOutBack,
}

impl Easing {
    /// Evaluate the curve with its default curve parameter.
    pub fn value(&self, t: f64, b: f64, c: f64, d: f64) -> f64 {
        self.value_with(t, b, c, d, None)
    }

    /// Evaluate the curve with an optional curve parameter.
    ///
    /// Only the `Back` curves read `s`; other curves ignore it.
    /// A zero or negative duration yields the end value.
    pub fn value_with(&self, t: f64, b: f64, c: f64, d: f64, s: Option<f64>) -> f64 {
        if d <= 0.0 {
            return c;
        }
        let delta = c - b;
        match self {
            Easing::Linear => delta * t / d + b,
            Easing::EaseInQuad => {
                let t = t / d;
                delta * t * t + b
            }
            Easing::EaseOutQuad => {
                let t = t / d;
                -delta * t * (t - 2.0) + b
            }
            Easing::EaseInOutQuad => {
                let t = t / (d / 2.0);
                if t < 1.0 {
                    delta / 2.0 * t * t + b
                } else {
                    let t = t - 1.0;
                    -delta / 2.0 * (t * (t - 2.0) - 1.0) + b
                }
            }
            Easing::EaseInCubic => {
                let t = t / d;
                delta * t * t * t + b
            }
            Easing::EaseOutCubic => {
                let t = t / d - 1.0;
                delta * (t * t * t + 1.0) + b
            }
            Easing::EaseInOutCubic => {
                let t = t / (d / 2.0);
                if t < 1.0 {
                    delta / 2.0 * t * t * t + b
                } else {
                    let t = t - 2.0;
                    delta / 2.0 * (t * t * t + 2.0) + b
                }
            }
            Easing::EaseInSine => -delta * (t / d * FRAC_PI_2).cos() + delta + b,
            Easing::EaseOutSine => delta * (t / d * FRAC_PI_2).sin() + b,
            Easing::EaseInOutSine => -delta / 2.0 * ((PI * t / d).cos() - 1.0) + b,
            Easing::EaseInBack => {
                let s = s.unwrap_or(DEFAULT_BACK_OVERSHOOT);
                let t = t / d;
                delta * t * t * ((s + 1.0) * t - s) + b
            }
            Easing::EaseOutBack => {
                let s = s.unwrap_or(DEFAULT_BACK_OVERSHOOT);
                let t = t / d - 1.0;
                delta * (t * t * ((s + 1.0) * t + s) + 1.0) + b
            }
        }
    }

    /// Curve identifier as used in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseInQuad => "easeInQuad",
            Easing::EaseOutQuad => "easeOutQuad",
            Easing::EaseInOutQuad => "easeInOutQuad",
            Easing::EaseInCubic => "easeInCubic",
            Easing::EaseOutCubic => "easeOutCubic",
            Easing::EaseInOutCubic => "easeInOutCubic",
            Easing::EaseInSine => "easeInSine",
            Easing::EaseOutSine => "easeOutSine",
            Easing::EaseInOutSine => "easeInOutSine",
            Easing::EaseInBack => "easeInBack",
            Easing::EaseOutBack => "easeOutBack",
        }
    }
}

impl FromStr for Easing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [Easing; 12] = [
            Easing::Linear,
            Easing::EaseInQuad,
            Easing::EaseOutQuad,
            Easing::EaseInOutQuad,
            Easing::EaseInCubic,
            Easing::EaseOutCubic,
            Easing::EaseInOutCubic,
            Easing::EaseInSine,
            Easing::EaseOutSine,
            Easing::EaseInOutSine,
            Easing::EaseInBack,
            Easing::EaseOutBack,
        ];
        ALL.iter()
            .find(|e| e.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("Unknown easing curve '{}'", s))
    }
}
