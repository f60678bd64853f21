//! # image-particles
//!
//! Render an image as a field of GPU particles that react to touch and
//! cross-fade between images.
//!
//! Every sufficiently bright pixel of the source image becomes one instanced
//! quad. A vertex shader scatters the quads with hash and simplex noise,
//! pushes them away from recent pointer strokes, and sizes them by
//! brightness. Swapping images dissolves the current field, rebuilds it from
//! the new image and condenses it back.
//!
//! ## Quick Start
//!
//! ```ignore
//! use image_particles::prelude::*;
//!
//! let mut controller = TransitionController::new(FileLoader::with_root("assets"));
//! let mut camera = ImageCamera::new(CameraConfig::default(), width, height);
//! let mut renderer = ParticleRenderer::new(&device, &queue, surface_format, 64);
//! let mut pointer = Pointer::new();
//! let mut clock = FrameClock::new();
//!
//! controller.request_image_change("sample-01.png")?;
//!
//! // Each frame
//! for ndc in pointer.take_moves() {
//!     controller.pointer_touch(&camera, ndc);
//! }
//! let (now_ms, delta) = clock.update();
//! controller.frame(now_ms, delta)?;
//! renderer.sync(&device, &queue, &mut controller, &camera)?;
//! renderer.draw(&mut pass);
//! ```
//!
//! ## Core Concepts
//!
//! ### Particle fields
//!
//! [`FieldBuilder`] turns an [`ImageSample`] into a [`ParticleField`]: the
//! pixel index, grid offset and random angle of every visible pixel. Pixels
//! with a red channel at or below the threshold (34) are discarded.
//!
//! ### Touch
//!
//! [`TouchField`] keeps a trail of recent pointer samples and paints them
//! into a small decaying intensity grid. The shader samples it to displace
//! particles.
//!
//! ### Tweens
//!
//! [`Tween`] interpolates a vector of values over time with an [`Easing`]
//! curve. It is advanced explicitly with the frame time.
//!
//! ### Transitions
//!
//! [`TransitionController`] owns the live field and its [`ShaderParams`],
//! and runs the show / hide / rebuild cycle when the image changes.
//!
//! ## Module Overview
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`sample`] | decoded images, loaders |
//! | [`particles`] | field builder, instance layout |
//! | [`touch`] | interaction field |
//! | [`easing`], [`tween`] | curves, tweens, scheduler |
//! | [`uniforms`] | shader parameters |
//! | [`displacement`], [`shader`] | displacement model on CPU and in WGSL |
//! | [`camera`], [`input`] | framing, hit testing, pointer events |
//! | [`transition`] | field lifecycle |
//! | [`gpu`] | wgpu buffers, textures and pipeline |

pub mod camera;
pub mod displacement;
pub mod easing;
pub mod error;
pub mod gpu;
pub mod input;
pub mod particles;
pub mod sample;
pub mod shader;
pub mod time;
pub mod touch;
pub mod transition;
pub mod tween;
pub mod uniforms;

pub use bytemuck;
pub use camera::{CameraConfig, ImageCamera};
pub use easing::Easing;
pub use error::{GpuError, ImageError, TransitionError, TweenError};
pub use glam::{Mat4, Vec2, Vec3};
pub use gpu::{GpuParticleField, ParticleRenderer, TouchTexture};
pub use input::Pointer;
pub use particles::{FieldBuilder, ParticleField, ParticleInstance, QuadVertex};
pub use sample::{FileLoader, ImageLoader, ImageSample, MemoryLoader};
pub use time::FrameClock;
pub use touch::{TouchConfig, TouchField, TrailPoint};
pub use transition::{TransitionConfig, TransitionController, TransitionState};
pub use tween::{ScalarTween, Tween, TweenFrame, TweenId, TweenRequest, TweenScheduler};
pub use uniforms::{Animated, ParticleUniforms, ShaderParams};

/// Convenient re-exports for common usage.
///
/// # Usage
///
/// ```ignore
/// use image_particles::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::{CameraConfig, ImageCamera};
    pub use crate::easing::Easing;
    pub use crate::error::{ImageError, TransitionError};
    pub use crate::gpu::ParticleRenderer;
    pub use crate::input::Pointer;
    pub use crate::particles::{FieldBuilder, ParticleField};
    pub use crate::sample::{FileLoader, ImageLoader, ImageSample, MemoryLoader};
    pub use crate::time::FrameClock;
    pub use crate::touch::{TouchConfig, TouchField};
    pub use crate::transition::{TransitionConfig, TransitionController, TransitionState};
    pub use crate::tween::{Tween, TweenScheduler};
    pub use crate::uniforms::{Animated, ShaderParams};
    pub use crate::{Vec2, Vec3};
}
