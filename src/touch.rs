//! Interaction field painted from pointer input.
//!
//! The touch field is a small square intensity grid (64x64 by default). Each
//! pointer move appends a trail point; once per frame every point ages, old
//! points are dropped and the grid is repainted from the survivors. The
//! displacement model samples the grid to push particles outwards around the
//! pointer.
//!
//! # Envelope
//!
//! A point's intensity rises over the first 30% of `max_age` and falls over the
//! remaining 70%, both along an ease-out sine, then scales by the point's
//! force. Force comes from the distance to the previous point: fast strokes
//! paint strongly, a resting pointer paints nothing.
//!
//! # Grid orientation
//!
//! The grid is stored top row first, like a 2D canvas: a point at `(x, y)` is
//! painted at column `x * S` and row `(1 - y) * S`. [`TouchField::texture_bytes`]
//! flips rows on the way out so that texture coordinate `v = y` lands on the
//! painted row.

use crate::easing::Easing;

/// Configuration for the touch field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchConfig {
    /// Grid side length in cells.
    pub size: u32,
    /// Frames a trail point lives for.
    pub max_age: u32,
    /// Brush radius as a fraction of `size`.
    pub radius: f32,
    /// Multiplier turning squared stroke distance into force.
    pub force_gain: f32,
}

impl TouchConfig {
    /// Default configuration: 64x64 grid, 120-frame trail, radius 0.15.
    pub fn new() -> Self {
        Self {
            size: 64,
            max_age: 120,
            radius: 0.15,
            force_gain: 10_000.0,
        }
    }

    /// Set the grid size (clamped to 8..=1024).
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size.clamp(8, 1024);
        self
    }

    /// Set the trail lifetime in frames (at least 1).
    pub fn with_max_age(mut self, max_age: u32) -> Self {
        self.max_age = max_age.max(1);
        self
    }

    /// Set the brush radius fraction (clamped to 0.0-1.0).
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius.clamp(0.0, 1.0);
        self
    }

    /// Set the force gain (non-negative).
    pub fn with_force_gain(mut self, gain: f32) -> Self {
        self.force_gain = gain.max(0.0);
        self
    }
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One aging pointer sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
    pub x: f32,
    pub y: f32,
    /// Frames since the point was added.
    pub age: u32,
    /// Stroke strength in `[0, 1]`.
    pub force: f32,
}

/// Inner solid core as a fraction of the brush radius.
const CORE_FRACTION: f32 = 0.25;
/// Brush alpha at the core.
const CORE_ALPHA: f32 = 0.2;

/// Decaying intensity grid fed by pointer moves.
#[derive(Clone, Debug)]
pub struct TouchField {
    config: TouchConfig,
    trail: Vec<TrailPoint>,
    /// `size * size` intensities in `[0, 1]`, top row first.
    grid: Vec<f32>,
    dirty: bool,
}

impl TouchField {
    /// Create an empty field with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TouchConfig::default())
    }

    /// Create an empty field. Out-of-range settings are clamped as the
    /// [`TouchConfig`] setters would.
    pub fn with_config(config: TouchConfig) -> Self {
        let config = TouchConfig::new()
            .with_size(config.size)
            .with_max_age(config.max_age)
            .with_radius(config.radius)
            .with_force_gain(config.force_gain);
        let cells = (config.size * config.size) as usize;
        Self {
            config,
            trail: Vec::new(),
            grid: vec![0.0; cells],
            dirty: true,
        }
    }

    pub fn config(&self) -> &TouchConfig {
        &self.config
    }

    /// Grid side length.
    #[inline]
    pub fn size(&self) -> u32 {
        self.config.size
    }

    /// Current trail, oldest first.
    pub fn trail(&self) -> &[TrailPoint] {
        &self.trail
    }

    /// Raw intensities, top row first.
    pub fn grid(&self) -> &[f32] {
        &self.grid
    }

    /// Append a pointer sample at `(x, y)` in `[0, 1]` image space.
    ///
    /// Force is the squared distance to the previous point times the force
    /// gain, clamped to 1. The first point of a trail has zero force.
    pub fn add_touch(&mut self, x: f32, y: f32) {
        let x = x.clamp(0.0, 1.0);
        let y = y.clamp(0.0, 1.0);
        let force = match self.trail.last() {
            Some(last) => {
                let dx = last.x - x;
                let dy = last.y - y;
                (dx * dx + dy * dy) * self.config.force_gain
            }
            None => 0.0,
        }
        .min(1.0);

        self.trail.push(TrailPoint { x, y, age: 0, force });
    }

    /// Age the trail and repaint the grid. Call once per rendered frame.
    pub fn update(&mut self) {
        let max_age = self.config.max_age;
        for point in &mut self.trail {
            point.age += 1;
        }
        self.trail.retain(|p| p.age <= max_age);

        let Self { config, trail, grid, .. } = self;
        grid.fill(0.0);
        for point in trail.iter() {
            paint(grid, config, point);
        }
        self.dirty = true;
    }

    /// Envelope value of a point before force scaling.
    pub fn envelope(&self, age: u32) -> f32 {
        envelope(self.config.max_age, age)
    }

    /// Intensity of a trail point, in `[0, 1]`.
    pub fn intensity(&self, point: &TrailPoint) -> f32 {
        self.envelope(point.age) * point.force
    }

    /// Intensity at grid cell `(col, row)`, top row first.
    pub fn cell(&self, col: u32, row: u32) -> f32 {
        let n = self.config.size;
        self.grid[(row.min(n - 1) * n + col.min(n - 1)) as usize]
    }

    /// Bilinear sample at texture coordinate `(u, v)` with `v = 0` at the
    /// bottom, clamped to the edge. Matches a linear-filtered fetch of
    /// [`texture_bytes`](Self::texture_bytes).
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        let n = self.config.size as f32;
        let fx = (u.clamp(0.0, 1.0) * n - 0.5).clamp(0.0, n - 1.0);
        // Canvas rows count from the top.
        let fy = ((1.0 - v.clamp(0.0, 1.0)) * n - 0.5).clamp(0.0, n - 1.0);

        let (c0, r0) = (fx.floor() as u32, fy.floor() as u32);
        let (c1, r1) = (c0 + 1, r0 + 1);
        let (tx, ty) = (fx - c0 as f32, fy - r0 as f32);

        let top = self.cell(c0, r0) * (1.0 - tx) + self.cell(c1, r0) * tx;
        let bottom = self.cell(c0, r1) * (1.0 - tx) + self.cell(c1, r1) * tx;
        top * (1.0 - ty) + bottom * ty
    }

    /// Whether no cell holds any intensity.
    pub fn is_blank(&self) -> bool {
        self.grid.iter().all(|&v| v == 0.0)
    }

    /// Single-channel texture data, bottom row first.
    pub fn texture_bytes(&self) -> Vec<u8> {
        let n = self.config.size as usize;
        let mut bytes = Vec::with_capacity(n * n);
        for row in self.grid.chunks_exact(n).rev() {
            bytes.extend(row.iter().map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8));
        }
        bytes
    }

    /// Whether the grid changed since the last call, clearing the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Drop every trail point and blank the grid.
    pub fn clear(&mut self) {
        self.trail.clear();
        self.grid.iter_mut().for_each(|v| *v = 0.0);
        self.dirty = true;
    }
}

/// Attack-then-release envelope of a point `age` frames old.
fn envelope(max_age: u32, age: u32) -> f32 {
    let max_age = max_age as f64;
    let attack = max_age * 0.3;
    let age = age as f64;
    let t = if age < attack {
        age / attack
    } else {
        1.0 - (age - attack) / (max_age * 0.7)
    };
    Easing::EaseOutSine.value(t, 0.0, 1.0, 1.0) as f32
}

/// Blend one brush stamp for `point` into `grid`.
fn paint(grid: &mut [f32], config: &TouchConfig, point: &TrailPoint) {
    let size = config.size as f32;
    let intensity = envelope(config.max_age, point.age) * point.force;
    let radius = size * config.radius * intensity;
    if radius <= 0.0 {
        return;
    }

    let cx = point.x * size;
    let cy = (1.0 - point.y) * size;
    let core = radius * CORE_FRACTION;

    let n = config.size as i32;
    let x0 = ((cx - radius).floor() as i32).max(0);
    let x1 = ((cx + radius).ceil() as i32).min(n - 1);
    let y0 = ((cy - radius).floor() as i32).max(0);
    let y1 = ((cy + radius).ceil() as i32).min(n - 1);

    for row in y0..=y1 {
        for col in x0..=x1 {
            let dx = col as f32 + 0.5 - cx;
            let dy = row as f32 + 0.5 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > radius {
                continue;
            }

            // White at the core fading to transparent black at the rim.
            let fade = if dist <= core {
                1.0
            } else {
                1.0 - (dist - core) / (radius - core)
            };
            let alpha = CORE_ALPHA * fade;
            let cell = &mut grid[(row * n + col) as usize];
            *cell = fade * alpha + *cell * (1.0 - alpha);
        }
    }
}

impl Default for TouchField {
    fn default() -> Self {
        Self::new()
    }
}
