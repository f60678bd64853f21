//! CPU reference of the particle displacement model.
//!
//! The renderer evaluates this model in the vertex and fragment shaders (see
//! [`crate::shader`]). The functions here compute the same contract on the
//! CPU, for tests, debugging and hosts without a GPU.
//!
//! Per particle and frame:
//!
//! 1. Random in-plane jitter: `(random(p) - 0.5, random(offset.x + p) - 0.5) * random_amount`
//! 2. Depth: `rndz = random(p) + snoise(p * 0.1, time * 0.1)`,
//!    `z += rndz * random(p) * 2 * depth`
//! 3. Centre the image on the origin: `xy -= texture_size / 2`
//! 4. Touch: with `t` the touch field sample,
//!    `(x, y, z) += (cos(angle), sin(angle), 1) * t * 20 * rndz`
//! 5. Size: `(snoise((time, p) * 0.5) + 2) * max(grey, 0.2) * size`
//!
//! `grey` is the luma `0.21 r + 0.71 g + 0.07 b` of the particle's pixel.

use crate::particles::{ParticleField, ParticleInstance};
use crate::sample::ImageSample;
use crate::touch::TouchField;
use crate::uniforms::ShaderParams;
use glam::{Vec2, Vec3};

/// Touch displacement gain.
pub const TOUCH_GAIN: f32 = 20.0;
/// Lower bound on the luma used for sizing, so dark particles stay visible.
pub const MIN_GREY: f32 = 0.2;
/// Radius of the round particle mask in quad uv units.
pub const MASK_RADIUS: f32 = 0.5;
/// Width of the antialiased mask border.
pub const MASK_BORDER: f32 = 0.3;

/// Result of displacing one particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Displaced {
    /// Position in image space, centred on the origin.
    pub position: Vec3,
    /// Quad scale.
    pub size: f32,
}

#[inline]
fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Hash `n` to `[0, 1]`: `fract(sin(n) * 43758.5453123)`.
#[inline]
pub fn random(n: f32) -> f32 {
    fract(n.sin() * 43758.545)
}

fn mod289_2(x: Vec2) -> Vec2 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn mod289_3(x: Vec3) -> Vec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute(x: Vec3) -> Vec3 {
    mod289_3(((x * 34.0) + 1.0) * x)
}

/// 2D simplex noise in roughly `[-1, 1]`.
///
/// Ian McEwan / Ashima Arts' textureless formulation (MIT).
pub fn snoise(v: Vec2) -> f32 {
    const CX: f32 = 0.211_324_87; // (3 - sqrt(3)) / 6
    const CY: f32 = 0.366_025_42; // (sqrt(3) - 1) / 2
    const CZ: f32 = -0.577_350_26; // -1 + 2 * CX
    const CW: f32 = 0.024_390_243; // 1 / 41

    // First corner
    let mut i = (v + Vec2::splat(v.x * CY + v.y * CY)).floor();
    let x0 = v - i + Vec2::splat(i.x * CX + i.y * CX);

    // Other corners
    let i1 = if x0.x > x0.y { Vec2::new(1.0, 0.0) } else { Vec2::new(0.0, 1.0) };
    let x1 = x0 + Vec2::splat(CX) - i1;
    let x2 = x0 + Vec2::splat(CZ);

    // Permutations
    i = mod289_2(i);
    let p = permute(
        permute(Vec3::splat(i.y) + Vec3::new(0.0, i1.y, 1.0)) + Vec3::splat(i.x) + Vec3::new(0.0, i1.x, 1.0),
    );

    let mut m = (Vec3::splat(0.5) - Vec3::new(x0.dot(x0), x1.dot(x1), x2.dot(x2))).max(Vec3::ZERO);
    m = m * m;
    m = m * m;

    // Gradients: 41 points on a line mapped onto a diamond
    let pw = p * CW;
    let x = (pw - pw.floor()) * 2.0 - 1.0;
    let h = x.abs() - 0.5;
    let ox = (x + 0.5).floor();
    let a0 = x - ox;

    m *= Vec3::splat(1.792_842_9) - (a0 * a0 + h * h) * 0.853_734_7;

    let g = Vec3::new(
        a0.x * x0.x + h.x * x0.y,
        a0.y * x1.x + h.y * x1.y,
        a0.z * x2.x + h.z * x2.y,
    );
    130.0 * m.dot(g)
}

/// Luma of an RGB colour.
#[inline]
pub fn grey(color: [f32; 4]) -> f32 {
    color[0] * 0.21 + color[1] * 0.71 + color[2] * 0.07
}

/// Signed depth factor shared by the depth and touch terms.
#[inline]
pub fn rndz(pindex: f32, time: f32) -> f32 {
    random(pindex) + snoise(Vec2::new(pindex * 0.1, time * 0.1))
}

/// Displace one particle.
///
/// `color` is the particle's pixel colour in `[0, 1]`; `touch` is the touch
/// field intensity at the particle's texture coordinate.
pub fn displace(p: &ParticleInstance, params: &ShaderParams, color: [f32; 4], touch: f32) -> Displaced {
    let offset = Vec3::from_array(p.offset);
    let mut displaced = offset;

    displaced.x += (random(p.pindex) - 0.5) * params.random;
    displaced.y += (random(offset.x + p.pindex) - 0.5) * params.random;

    let rndz = rndz(p.pindex, params.time);
    displaced.z += rndz * (random(p.pindex) * 2.0 * params.depth);

    displaced.x -= params.texture_size.x * 0.5;
    displaced.y -= params.texture_size.y * 0.5;

    let push = touch * TOUCH_GAIN * rndz;
    displaced.z += push;
    displaced.x += p.angle.cos() * push;
    displaced.y += p.angle.sin() * push;

    let jitter = snoise(Vec2::new(params.time, p.pindex) * 0.5) + 2.0;
    let size = jitter * grey(color).max(MIN_GREY) * params.size;

    Displaced {
        position: displaced,
        size,
    }
}

/// Texture coordinate of a particle: its grid offset over the image size.
#[inline]
pub fn particle_uv(p: &ParticleInstance, params: &ShaderParams) -> Vec2 {
    Vec2::new(p.offset[0], p.offset[1]) / params.texture_size
}

/// Displace every particle of a field.
pub fn evaluate(
    field: &ParticleField,
    image: &ImageSample,
    touch: Option<&TouchField>,
    params: &ShaderParams,
) -> Vec<Displaced> {
    field
        .instances()
        .iter()
        .map(|p| {
            let color = image.color_at(p.offset[0] as u32, p.offset[1] as u32);
            let uv = particle_uv(p, params);
            let t = touch.map_or(0.0, |f| f.sample(uv.x, uv.y));
            displace(p, params, color, t)
        })
        .collect()
}

/// Hermite smoothstep.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Alpha of the round particle mask at quad uv `uv`.
pub fn circle_alpha(uv: Vec2) -> f32 {
    let dist = MASK_RADIUS - uv.distance(Vec2::splat(0.5));
    smoothstep(0.0, MASK_BORDER, dist)
}

/// Final fragment colour: the pixel colour with the round mask as alpha.
pub fn fragment_color(color: [f32; 4], uv: Vec2) -> [f32; 4] {
    [color[0], color[1], color[2], circle_alpha(uv)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(pindex: f32, x: f32, y: f32, angle: f32) -> ParticleInstance {
        ParticleInstance {
            pindex,
            offset: [x, y, 0.0],
            angle,
        }
    }

    fn still_params() -> ShaderParams {
        let mut params = ShaderParams::new(100, 50);
        params.random = 0.0;
        params.depth = 0.0;
        params.size = 1.0;
        params
    }

    #[test]
    fn test_random_in_unit_range() {
        for i in 0..1000 {
            let r = random(i as f32 * 0.37);
            assert!((0.0..=1.0).contains(&r));
        }
    }

    #[test]
    fn test_snoise_bounds_and_origin() {
        assert_eq!(snoise(Vec2::ZERO), 0.0);
        for i in 0..50 {
            for j in 0..50 {
                let n = snoise(Vec2::new(i as f32 * 0.37, j as f32 * 0.53));
                assert!(n.abs() <= 1.01, "noise out of range: {}", n);
            }
        }
    }

    #[test]
    fn test_snoise_is_continuous() {
        let a = snoise(Vec2::new(3.3, 1.7));
        let b = snoise(Vec2::new(3.3001, 1.7));
        assert!((a - b).abs() < 0.01);
    }

    #[test]
    fn test_still_particle_is_centred_offset() {
        let params = still_params();
        let d = displace(&particle(7.0, 30.0, 20.0, 0.0), &params, [1.0; 4], 0.0);
        assert_eq!(d.position, Vec3::new(-20.0, -5.0, 0.0));
    }

    #[test]
    fn test_random_jitter_bounded() {
        let mut params = still_params();
        params.random = 2.0;
        for i in 0..200 {
            let p = particle(i as f32, 50.0, 25.0, 0.0);
            let d = displace(&p, &params, [1.0; 4], 0.0);
            assert!(d.position.x.abs() <= 1.0);
            assert!(d.position.y.abs() <= 1.0);
        }
    }

    #[test]
    fn test_depth_sign_flips_z() {
        let mut params = still_params();
        let p = particle(11.0, 0.0, 0.0, 0.0);
        params.depth = 4.0;
        let up = displace(&p, &params, [1.0; 4], 0.0).position.z;
        params.depth = -4.0;
        let down = displace(&p, &params, [1.0; 4], 0.0).position.z;
        assert!((up + down).abs() < 1e-4);
    }

    #[test]
    fn test_touch_pushes_along_angle() {
        let params = still_params();
        let angle = 0.6;
        let p = particle(5.0, 50.0, 25.0, angle);
        let rest = displace(&p, &params, [1.0; 4], 0.0).position;
        let pushed = displace(&p, &params, [1.0; 4], 0.5).position;

        let push = 0.5 * TOUCH_GAIN * rndz(5.0, 0.0);
        let expected = Vec3::new(angle.cos() * push, angle.sin() * push, push);
        assert!((pushed - rest - expected).length() < 1e-3);
    }

    #[test]
    fn test_size_scales_with_luma_and_uniform() {
        let mut params = still_params();
        let p = particle(3.0, 0.0, 0.0, 0.0);
        let bright = displace(&p, &params, [1.0, 1.0, 1.0, 1.0], 0.0).size;
        let dark = displace(&p, &params, [0.0, 0.0, 0.0, 1.0], 0.0).size;
        // 0.99 luma vs the 0.2 floor
        assert!((bright / dark - 0.99 / 0.2).abs() < 1e-3);

        params.size = 0.0;
        assert_eq!(displace(&p, &params, [1.0; 4], 0.0).size, 0.0);
    }

    #[test]
    fn test_circle_mask() {
        assert_eq!(circle_alpha(Vec2::splat(0.5)), 1.0);
        assert_eq!(circle_alpha(Vec2::new(0.0, 0.0)), 0.0);
        let edge = circle_alpha(Vec2::new(0.5, 0.1));
        assert!(edge > 0.0 && edge < 1.0);
        assert_eq!(fragment_color([0.2, 0.4, 0.6, 1.0], Vec2::splat(0.5)), [0.2, 0.4, 0.6, 1.0]);
    }

    #[test]
    fn test_evaluate_field() {
        let image = ImageSample::solid(4, 4, [255, 255, 255, 255]).unwrap();
        let field = crate::particles::FieldBuilder::new().with_seed(9).build(&image).unwrap();
        let mut params = ShaderParams::new(4, 4);
        params.random = 0.0;
        params.depth = 0.0;
        params.size = 1.5;

        let out = evaluate(&field, &image, None, &params);
        assert_eq!(out.len(), 16);
        assert_eq!(out[0].position, Vec3::new(-2.0, -2.0, 0.0));
        assert!(out.iter().all(|d| d.size > 0.0));
    }
}
