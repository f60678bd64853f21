//! R8 texture mirroring the touch field.

use crate::touch::TouchField;

/// Single-channel `size x size` texture the vertex shader samples for touch
/// intensity.
pub struct TouchTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    size: u32,
    destroyed: bool,
}

impl TouchTexture {
    /// Create a blank texture.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, size: u32) -> Self {
        let size = size.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Touch Texture"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = super::create_linear_sampler(device, "Touch Sampler");

        let touch = Self {
            texture,
            view,
            sampler,
            size,
            destroyed: false,
        };
        touch.write(queue, &vec![0u8; (size * size) as usize]);
        touch
    }

    /// Side length in texels.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    fn write(&self, queue: &wgpu::Queue, bytes: &[u8]) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.size),
                rows_per_image: Some(self.size),
            },
            wgpu::Extent3d {
                width: self.size,
                height: self.size,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Copy the touch field to the texture if it changed since the last
    /// upload. Returns `true` if a copy was queued.
    pub fn upload_if_dirty(&self, queue: &wgpu::Queue, field: &mut TouchField) -> bool {
        if self.destroyed || field.size() != self.size || !field.take_dirty() {
            return false;
        }
        self.write(queue, &field.texture_bytes());
        true
    }

    /// Release the texture. Safe to call more than once.
    pub fn destroy(&mut self) {
        if !self.destroyed {
            self.texture.destroy();
            self.destroyed = true;
        }
    }
}
