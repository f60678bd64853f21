//! wgpu resources for drawing particle fields.
//!
//! The crate does not create devices or surfaces. The host owns the
//! `wgpu::Device`, `wgpu::Queue` and render pass; this module owns everything
//! the particle draw needs on top of them:
//!
//! - [`GpuParticleField`]: instance and quad buffers, image texture, uniform
//!   buffer and bind group for one live field
//! - [`TouchTexture`]: the R8 copy of the touch field
//! - [`ParticleRenderer`]: the pipeline, kept in step with a
//!   [`TransitionController`](crate::transition::TransitionController)
//!
//! # Example
//!
//! ```ignore
//! let mut renderer = ParticleRenderer::new(&device, &queue, surface_format, 64);
//!
//! // Each frame
//! controller.frame(now_ms, delta)?;
//! renderer.sync(&device, &queue, &mut controller, &camera)?;
//! {
//!     let mut pass = encoder.begin_render_pass(&desc);
//!     renderer.draw(&mut pass);
//! }
//! ```

mod particle_field;
mod renderer;
mod touch_texture;

pub use particle_field::GpuParticleField;
pub use renderer::ParticleRenderer;
pub use touch_texture::TouchTexture;

use crate::uniforms::ParticleUniforms;

/// Bind group layout shared by every field: uniforms, image texture and
/// sampler, touch texture and sampler.
pub fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding: u32, visibility: wgpu::ShaderStages| wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };
    let sampler_entry = |binding: u32, visibility: wgpu::ShaderStages| wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    };
    let both = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Particle Bind Group Layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<ParticleUniforms>() as u64),
                },
                count: None,
            },
            texture_entry(1, both),
            sampler_entry(2, both),
            texture_entry(3, wgpu::ShaderStages::VERTEX),
            sampler_entry(4, wgpu::ShaderStages::VERTEX),
        ],
    })
}

/// Clamp-to-edge linear sampler.
pub(crate) fn create_linear_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}
