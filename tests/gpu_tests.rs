//! GPU integration tests.
//!
//! These need a wgpu adapter. On machines without one each test returns
//! early after logging why.

use image_particles::{
    FieldBuilder, GpuError, ImageCamera, ImageSample, MemoryLoader, ParticleRenderer, TouchTexture,
    TransitionController,
};

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

fn gpu() -> Option<(wgpu::Device, wgpu::Queue)> {
    gpu_with_texture_limit(None)
}

/// Device whose 2D texture limit is lowered to `limit`, if given.
fn gpu_with_texture_limit(limit: Option<u32>) -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()));
    let Some(adapter) = adapter else {
        eprintln!("no wgpu adapter available, skipping");
        return None;
    };
    let mut required_limits = adapter.limits();
    if let Some(limit) = limit {
        required_limits.max_texture_dimension_2d = limit.min(required_limits.max_texture_dimension_2d);
    }
    let desc = wgpu::DeviceDescriptor {
        label: Some("Test Device"),
        required_limits,
        ..Default::default()
    };
    pollster::block_on(adapter.request_device(&desc, None)).ok()
}

fn controller() -> TransitionController<MemoryLoader> {
    let loader = MemoryLoader::new()
        .with("bright", ImageSample::solid(24, 16, [230, 200, 180, 255]).unwrap())
        .with("wide", ImageSample::solid(100, 8, [230, 230, 230, 255]).unwrap())
        .with("dark", ImageSample::solid(8, 8, [5, 5, 5, 255]).unwrap());
    TransitionController::new(loader).with_builder(FieldBuilder::new().with_seed(4))
}

/// Render one frame into an offscreen target. Returns whether anything drew.
fn render(device: &wgpu::Device, queue: &wgpu::Queue, renderer: &ParticleRenderer) -> bool {
    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Test Target"),
        size: wgpu::Extent3d {
            width: 64,
            height: 64,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Test Encoder"),
    });
    let drew = {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Test Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        renderer.draw(&mut pass)
    };
    queue.submit(Some(encoder.finish()));
    device.poll(wgpu::Maintain::Wait);
    drew
}

#[test]
fn test_renderer_follows_controller() {
    let Some((device, queue)) = gpu() else { return };
    let mut renderer = ParticleRenderer::new(&device, &queue, FORMAT, 64);
    let mut controller = controller();
    let camera = ImageCamera::new(Default::default(), 64, 64);

    // Nothing live yet
    renderer.sync(&device, &queue, &mut controller, &camera).unwrap();
    assert!(renderer.field().is_none());
    assert!(!render(&device, &queue, &renderer));

    controller.request_image_change("bright").unwrap();
    controller.add_touch(0.5, 0.5);
    controller.frame(0.0, 1.0 / 60.0).unwrap();
    renderer.sync(&device, &queue, &mut controller, &camera).unwrap();

    let field = renderer.field().unwrap();
    assert_eq!(field.num_instances(), 24 * 16);
    assert_eq!(field.generation(), controller.generation());
    assert!(render(&device, &queue, &renderer));

    controller.destroy();
    renderer.sync(&device, &queue, &mut controller, &camera).unwrap();
    assert!(renderer.field().is_none());
    assert!(!render(&device, &queue, &renderer));

    renderer.destroy();
    renderer.destroy();
}

#[test]
fn test_empty_field_is_not_uploaded() {
    let Some((device, queue)) = gpu() else { return };
    let mut renderer = ParticleRenderer::new(&device, &queue, FORMAT, 64);
    let mut controller = controller();
    let camera = ImageCamera::default();

    controller.request_image_change("dark").unwrap();
    renderer.sync(&device, &queue, &mut controller, &camera).unwrap();
    assert!(renderer.field().is_none());
    assert!(!render(&device, &queue, &renderer));
}

#[test]
fn test_touch_texture_uploads_once_per_change() {
    let Some((device, queue)) = gpu() else { return };
    let mut touch = image_particles::TouchField::new();
    let texture = TouchTexture::new(&device, &queue, touch.size());

    // A fresh field starts dirty
    assert!(texture.upload_if_dirty(&queue, &mut touch));
    assert!(!texture.upload_if_dirty(&queue, &mut touch));

    touch.add_touch(0.2, 0.2);
    touch.update();
    assert!(texture.upload_if_dirty(&queue, &mut touch));
}

#[test]
fn test_failed_upload_drops_stale_field() {
    let Some((device, queue)) = gpu_with_texture_limit(Some(64)) else { return };
    if device.limits().max_texture_dimension_2d != 64 {
        return;
    }
    let mut renderer = ParticleRenderer::new(&device, &queue, FORMAT, 64);
    let mut controller = controller();
    let camera = ImageCamera::default();

    controller.request_image_change("bright").unwrap();
    renderer.sync(&device, &queue, &mut controller, &camera).unwrap();
    assert_eq!(renderer.field().unwrap().generation(), 1);

    // Run frames until the wide image replaces the bright one
    controller.request_image_change("wide").unwrap();
    let mut now = 0.0;
    while controller.generation() == 1 && now < 10_000.0 {
        controller.frame(now, 1.0 / 60.0).unwrap();
        now += 1000.0 / 60.0;
    }
    assert_eq!(controller.generation(), 2);

    let err = renderer.sync(&device, &queue, &mut controller, &camera).unwrap_err();
    assert_eq!(
        err,
        GpuError::TextureTooLarge {
            width: 100,
            height: 8,
            limit: 64
        }
    );
    assert!(renderer.field().is_none());
    assert!(!render(&device, &queue, &renderer));

    // The failure is reported once, not on every frame
    renderer.sync(&device, &queue, &mut controller, &camera).unwrap();
    assert!(renderer.field().is_none());
}
