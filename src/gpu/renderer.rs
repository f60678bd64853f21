//! Pipeline and per-frame sync for the live particle field.

use super::{create_bind_group_layout, GpuParticleField, TouchTexture};
use crate::camera::ImageCamera;
use crate::error::GpuError;
use crate::particles::{ParticleInstance, QuadVertex};
use crate::sample::ImageLoader;
use crate::shader::{render_shader_wgsl, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::transition::TransitionController;

/// Draws whatever field a [`TransitionController`] has live.
pub struct ParticleRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    touch: TouchTexture,
    field: Option<GpuParticleField>,
    /// Controller generation last synced; `None` forces a rebuild.
    synced: Option<u64>,
}

impl ParticleRenderer {
    /// Create the pipeline for `target_format` and a blank touch texture of
    /// `touch_size` texels.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target_format: wgpu::TextureFormat,
        touch_size: u32,
    ) -> Self {
        let bind_group_layout = create_bind_group_layout(device);
        let pipeline = create_pipeline(device, &bind_group_layout, target_format);
        let touch = TouchTexture::new(device, queue, touch_size);

        Self {
            pipeline,
            bind_group_layout,
            touch,
            field: None,
            synced: None,
        }
    }

    /// The uploaded field, if any.
    pub fn field(&self) -> Option<&GpuParticleField> {
        self.field.as_ref()
    }

    /// Bring GPU state in line with `controller`.
    ///
    /// Re-uploads when the controller's live field changed, releases GPU
    /// resources when no field is live, and writes uniforms and touch data
    /// for this frame. A field with no visible particles is not uploaded
    /// and draws nothing.
    ///
    /// If the upload fails the previous field is released anyway and the
    /// error is returned once; later calls draw nothing until the controller
    /// installs another field.
    pub fn sync<L: ImageLoader>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        controller: &mut TransitionController<L>,
        camera: &ImageCamera,
    ) -> Result<(), GpuError> {
        if let Some(touch) = controller.touch() {
            if touch.size() != self.touch.size() {
                self.touch.destroy();
                self.touch = TouchTexture::new(device, queue, touch.size());
                self.synced = None;
            }
        }

        let generation = controller.generation();
        if self.synced != Some(generation) {
            let next = match (controller.field(), controller.image()) {
                (Some(field), Some(image)) if !field.is_empty() => GpuParticleField::new(
                    device,
                    queue,
                    &self.bind_group_layout,
                    field,
                    image,
                    &self.touch,
                    generation,
                )
                .map(Some),
                (Some(_), Some(_)) => {
                    log::debug!("field {} has no visible particles, nothing to draw", generation);
                    Ok(None)
                }
                _ => Ok(None),
            };

            // The old upload belongs to a field the controller no longer holds
            if let Some(mut old) = self.field.take() {
                old.destroy();
            }
            self.synced = Some(generation);
            match next {
                Ok(field) => self.field = field,
                Err(e) => {
                    log::warn!("field {} could not be uploaded: {}", generation, e);
                    return Err(e);
                }
            }
        }

        if let (Some(gpu), Some(params)) = (&self.field, controller.params()) {
            let height = params.texture_size.y as u32;
            let uniforms = params.to_uniforms(camera.model_view(height), camera.projection_matrix());
            gpu.write_uniforms(queue, &uniforms);
        }
        if let Some(touch) = controller.touch_mut() {
            self.touch.upload_if_dirty(queue, touch);
        }
        Ok(())
    }

    /// Record the draw for the uploaded field. Returns `false` if there was
    /// nothing to draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) -> bool {
        match &self.field {
            Some(field) if !field.is_destroyed() => {
                pass.set_pipeline(&self.pipeline);
                field.draw(pass);
                true
            }
            _ => false,
        }
    }

    /// Release every GPU resource. Safe to call more than once.
    pub fn destroy(&mut self) {
        if let Some(mut field) = self.field.take() {
            field.destroy();
        }
        self.touch.destroy();
        self.synced = None;
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    target_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Particle Shader"),
        source: wgpu::ShaderSource::Wgsl(render_shader_wgsl().into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Particle Pipeline Layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Particle Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some(VERTEX_ENTRY),
            buffers: &[QuadVertex::layout(), ParticleInstance::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some(FRAGMENT_ENTRY),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        // Particles are blended without depth testing
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
