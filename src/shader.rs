//! WGSL source for the particle material.
//!
//! The render shader evaluates the displacement model of
//! [`crate::displacement`] per instance in the vertex stage and applies the
//! round particle mask in the fragment stage.
//!
//! # Bindings (group 0)
//!
//! | Binding | Resource                                  |
//! |---------|-------------------------------------------|
//! | 0       | `Uniforms` ([`ParticleUniforms`](crate::uniforms::ParticleUniforms)) |
//! | 1       | image texture, `texture_2d<f32>`          |
//! | 2       | image sampler                             |
//! | 3       | touch texture, `texture_2d<f32>` (R8)     |
//! | 4       | touch sampler                             |
//!
//! # Vertex inputs
//!
//! | Location | Attribute | Step     |
//! |----------|-----------|----------|
//! | 0        | position  | vertex   |
//! | 1        | uv        | vertex   |
//! | 2        | pindex    | instance |
//! | 3        | offset    | instance |
//! | 4        | angle     | instance |
//!
//! ## Helper functions
//! - `random(n: f32) -> f32` - hash to `[0, 1)`
//! - `snoise(v: vec2<f32>) -> f32` - 2D simplex noise in `[-1, 1]`

/// WGSL code for the float hash.
pub const RANDOM_WGSL: &str = r#"
// Hash a float to [0, 1)
fn random(n: f32) -> f32 {
    return fract(sin(n) * 43758.5453123);
}
"#;

/// WGSL code for 2D simplex noise.
pub const NOISE_WGSL: &str = r#"
// Simplex noise helpers
fn mod289_2(x: vec2<f32>) -> vec2<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_3(x: vec3<f32>) -> vec3<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute3(x: vec3<f32>) -> vec3<f32> {
    return mod289_3(((x * 34.0) + 1.0) * x);
}

// 2D Simplex noise
fn snoise(v: vec2<f32>) -> f32 {
    let C = vec4<f32>(0.211324865405187, 0.366025403784439, -0.577350269189626, 0.024390243902439);

    // First corner
    var i = floor(v + dot(v, C.yy));
    let x0 = v - i + dot(i, C.xx);

    // Other corners
    var i1 = vec2<f32>(0.0, 1.0);
    if x0.x > x0.y {
        i1 = vec2<f32>(1.0, 0.0);
    }
    let x1 = x0 + C.xx - i1;
    let x2 = x0 + C.zz;

    // Permutations
    i = mod289_2(i);
    let p = permute3(permute3(i.y + vec3<f32>(0.0, i1.y, 1.0)) + i.x + vec3<f32>(0.0, i1.x, 1.0));

    var m = max(0.5 - vec3<f32>(dot(x0, x0), dot(x1, x1), dot(x2, x2)), vec3<f32>(0.0));
    m = m * m;
    m = m * m;

    // Gradients
    let x = 2.0 * fract(p * C.www) - 1.0;
    let h = abs(x) - 0.5;
    let ox = floor(x + 0.5);
    let a0 = x - ox;

    m *= 1.79284291400159 - 0.85373472095314 * (a0 * a0 + h * h);

    let g = vec3<f32>(
        a0.x * x0.x + h.x * x0.y,
        a0.y * x1.x + h.y * x1.y,
        a0.z * x2.x + h.z * x2.y
    );
    return 130.0 * dot(m, g);
}
"#;

const RENDER_WGSL: &str = r#"
struct Uniforms {
    model_view: mat4x4<f32>,
    projection: mat4x4<f32>,
    texture_size: vec2<f32>,
    time: f32,
    random: f32,
    depth: f32,
    size: f32,
    _pad: vec2<f32>,
};

@group(0) @binding(0) var<uniform> uniforms: Uniforms;
@group(0) @binding(1) var image_texture: texture_2d<f32>;
@group(0) @binding(2) var image_sampler: sampler;
@group(0) @binding(3) var touch_texture: texture_2d<f32>;
@group(0) @binding(4) var touch_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) pindex: f32,
    @location(3) offset: vec3<f32>,
    @location(4) angle: f32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) puv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.uv = in.uv;

    // Particle uv in the image
    let puv = in.offset.xy / uniforms.texture_size;
    out.puv = puv;

    let color = textureSampleLevel(image_texture, image_sampler, puv, 0.0);
    let grey = color.r * 0.21 + color.g * 0.71 + color.b * 0.07;

    var displaced = in.offset;
    displaced.x += (random(in.pindex) - 0.5) * uniforms.random;
    displaced.y += (random(in.offset.x + in.pindex) - 0.5) * uniforms.random;
    let rndz = random(in.pindex) + snoise(vec2<f32>(in.pindex * 0.1, uniforms.time * 0.1));
    displaced.z += rndz * (random(in.pindex) * 2.0 * uniforms.depth);

    // Centre
    displaced.x -= uniforms.texture_size.x * 0.5;
    displaced.y -= uniforms.texture_size.y * 0.5;

    // Touch
    let t = textureSampleLevel(touch_texture, touch_sampler, puv, 0.0).r;
    let push = t * 20.0 * rndz;
    displaced.z += push;
    displaced.x += cos(in.angle) * push;
    displaced.y += sin(in.angle) * push;

    let psize = (snoise(vec2<f32>(uniforms.time, in.pindex) * 0.5) + 2.0) * max(grey, 0.2) * uniforms.size;

    // Billboard the quad in view space
    let mv = uniforms.model_view * vec4<f32>(displaced, 1.0);
    let corner = vec4<f32>(mv.xyz + in.position * psize, mv.w);
    out.clip_position = uniforms.projection * corner;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(image_texture, image_sampler, in.puv);

    // Round mask
    let dist = 0.5 - distance(in.uv, vec2<f32>(0.5, 0.5));
    let alpha = smoothstep(0.0, 0.3, dist);

    return vec4<f32>(color.rgb, alpha);
}
"#;

/// Vertex entry point name.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment entry point name.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Hash and noise helpers combined.
pub fn all_utils_wgsl() -> String {
    format!("// Built-in utility functions\n{}\n{}\n", RANDOM_WGSL, NOISE_WGSL)
}

/// Complete render shader: helpers, bindings and both entry points.
pub fn render_shader_wgsl() -> String {
    format!("{}\n{}", all_utils_wgsl(), RENDER_WGSL)
}
