//! GPU copy of one particle field.

use super::TouchTexture;
use crate::error::GpuError;
use crate::particles::{ParticleField, QUAD_INDICES, QUAD_VERTICES};
use crate::sample::ImageSample;
use crate::uniforms::ParticleUniforms;
use bytemuck::Zeroable;
use wgpu::util::DeviceExt;

/// Buffers, image texture and bind group for one live field.
pub struct GpuParticleField {
    quad_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    num_instances: u32,
    generation: u64,
    destroyed: bool,
}

impl GpuParticleField {
    /// Upload `field` and its source `image`.
    ///
    /// Fails if the field has no particles or the image does not fit in a
    /// texture on this device.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        field: &ParticleField,
        image: &ImageSample,
        touch: &TouchTexture,
        generation: u64,
    ) -> Result<Self, GpuError> {
        if field.is_empty() {
            return Err(GpuError::EmptyField);
        }
        let (width, height) = (image.width(), image.height());
        check_texture_size(width, height, device.limits().max_texture_dimension_2d)?;

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Quad Buffer"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Index Buffer"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instances = field.instances();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Instance Buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Uniform Buffer"),
            contents: bytemuck::bytes_of(&ParticleUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Particle Image Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.data(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = super::create_linear_sampler(device, "Particle Image Sampler");

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(touch.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(touch.sampler()),
                },
            ],
        });

        log::debug!(
            "uploaded field {}: {} instances, {}x{} texture",
            generation,
            instances.len(),
            width,
            height
        );

        Ok(Self {
            quad_buffer,
            index_buffer,
            instance_buffer,
            uniform_buffer,
            texture,
            bind_group,
            num_instances: instances.len() as u32,
            generation,
            destroyed: false,
        })
    }

    pub fn num_instances(&self) -> u32 {
        self.num_instances
    }

    /// Controller generation this upload belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Queue a uniform update.
    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &ParticleUniforms) {
        if !self.destroyed {
            queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
        }
    }

    /// Record the instanced draw. The caller sets the pipeline.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.destroyed {
            return;
        }
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..self.num_instances);
    }

    /// Release buffers and the texture. Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.quad_buffer.destroy();
        self.index_buffer.destroy();
        self.instance_buffer.destroy();
        self.uniform_buffer.destroy();
        self.texture.destroy();
        self.destroyed = true;
        log::debug!("released field {}", self.generation);
    }
}

/// Reject images that do not fit a 2D texture of side `limit`.
pub(crate) fn check_texture_size(width: u32, height: u32, limit: u32) -> Result<(), GpuError> {
    if width > limit || height > limit {
        return Err(GpuError::TextureTooLarge { width, height, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_size_limit() {
        assert!(check_texture_size(64, 64, 64).is_ok());
        assert_eq!(
            check_texture_size(65, 8, 64),
            Err(GpuError::TextureTooLarge {
                width: 65,
                height: 8,
                limit: 64
            })
        );
        assert!(check_texture_size(8, 8192, 4096).is_err());
    }
}
