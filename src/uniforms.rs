//! Shader parameters for the particle material.
//!
//! [`ShaderParams`] is the CPU-side parameter set owned by the transition
//! controller. Each frame the renderer packs it, together with the camera
//! matrices, into [`ParticleUniforms`] for upload.
//!
//! | Uniform        | Meaning                                     |
//! |----------------|---------------------------------------------|
//! | `time`         | seconds, advanced by frame delta            |
//! | `random`       | in-plane random displacement magnitude      |
//! | `depth`        | out-of-plane displacement scale (signed)    |
//! | `size`         | global particle size multiplier             |
//! | `texture_size` | source image size in pixels                 |

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

/// The three animated parameters, in tween component order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animated {
    pub size: f32,
    pub random: f32,
    pub depth: f32,
}

impl Animated {
    pub const fn new(size: f32, random: f32, depth: f32) -> Self {
        Self { size, random, depth }
    }

    /// Components as `[size, random, depth]`.
    pub fn to_array(self) -> [f32; 3] {
        [self.size, self.random, self.depth]
    }

    /// Build from `[size, random, depth]`. Missing components are left at 0.
    pub fn from_slice(values: &[f32]) -> Self {
        let get = |i: usize| values.get(i).copied().unwrap_or(0.0);
        Self::new(get(0), get(1), get(2))
    }
}

impl From<[f32; 3]> for Animated {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Parameter set for one live particle field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShaderParams {
    /// Seconds since the field was created.
    pub time: f32,
    pub random: f32,
    pub depth: f32,
    pub size: f32,
    /// Source image size `(W, H)`.
    pub texture_size: Vec2,
}

impl ShaderParams {
    /// Parameters for a fresh field of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            time: 0.0,
            random: 1.0,
            depth: 2.0,
            size: 0.0,
            texture_size: Vec2::new(width as f32, height as f32),
        }
    }

    /// Current animated values.
    pub fn animated(&self) -> Animated {
        Animated::new(self.size, self.random, self.depth)
    }

    /// Overwrite the animated values.
    pub fn set_animated(&mut self, values: Animated) {
        self.size = values.size;
        self.random = values.random;
        self.depth = values.depth;
    }

    /// Advance `time` by `delta` seconds.
    pub fn advance(&mut self, delta: f32) {
        self.time += delta;
    }

    /// Pack for upload with the given transforms.
    pub fn to_uniforms(&self, model_view: Mat4, projection: Mat4) -> ParticleUniforms {
        ParticleUniforms {
            model_view: model_view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            texture_size: self.texture_size.to_array(),
            time: self.time,
            random: self.random,
            depth: self.depth,
            size: self.size,
            _padding: [0.0; 2],
        }
    }
}

/// GPU layout of the particle uniform block. Must match `Uniforms` in the
/// render shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ParticleUniforms {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub texture_size: [f32; 2],
    pub time: f32,
    pub random: f32,
    pub depth: f32,
    pub size: f32,
    pub _padding: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_size_is_16_aligned() {
        assert_eq!(std::mem::size_of::<ParticleUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<ParticleUniforms>(), 160);
    }

    #[test]
    fn test_animated_roundtrip() {
        let mut params = ShaderParams::new(4, 2);
        params.set_animated(Animated::from_slice(&[1.5, 2.0, 4.0]));
        assert_eq!(params.animated().to_array(), [1.5, 2.0, 4.0]);
        assert_eq!(params.texture_size, Vec2::new(4.0, 2.0));
    }

    #[test]
    fn test_pack() {
        let mut params = ShaderParams::new(10, 20);
        params.advance(0.25);
        params.advance(0.25);
        let u = params.to_uniforms(Mat4::IDENTITY, Mat4::IDENTITY);
        assert_eq!(u.time, 0.5);
        assert_eq!(u.texture_size, [10.0, 20.0]);
        assert_eq!(u.model_view[0][0], 1.0);
    }
}
