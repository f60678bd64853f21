//! Particle field builder.
//!
//! Turns an [`ImageSample`] into the packed, instanced attribute layout the
//! renderer draws: one particle per visible pixel, each instancing a shared
//! unit quad.
//!
//! # Visibility
//!
//! With discarding enabled, a pixel produces a particle only if its red
//! channel is strictly greater than the threshold (34 by default, i.e. the
//! colour `#222222` and darker is dropped). With discarding disabled every
//! pixel produces a particle.
//!
//! # Layout
//!
//! The field stores three index-aligned sequences:
//!
//! | Sequence  | Per particle                                   |
//! |-----------|------------------------------------------------|
//! | `indices` | source pixel index, strictly increasing        |
//! | `offsets` | grid position `(i % W, i / W, 0)`              |
//! | `angles`  | random angle in `[0, PI)`                      |
//!
//! [`ParticleField::instances`] interleaves them into [`ParticleInstance`]s
//! for a single instance vertex buffer.
//!
//! # Example
//!
//! ```ignore
//! let field = FieldBuilder::new()
//!     .with_threshold(34)
//!     .with_seed(7)
//!     .build(&image)?;
//! println!("{} of {} pixels visible", field.num_visible(), image.pixel_count());
//! ```

use crate::error::ImageError;
use crate::sample::ImageSample;
use bytemuck::{Pod, Zeroable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// Default red-channel discard threshold (0-255).
pub const DEFAULT_THRESHOLD: u8 = 34;

/// One corner of the shared particle quad.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Unit quad centred on the origin.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { position: [-0.5, 0.5, 0.0], uv: [0.0, 0.0] },
    QuadVertex { position: [0.5, 0.5, 0.0], uv: [1.0, 0.0] },
    QuadVertex { position: [-0.5, -0.5, 0.0], uv: [0.0, 1.0] },
    QuadVertex { position: [0.5, -0.5, 0.0], uv: [1.0, 1.0] },
];

/// Two triangles covering [`QUAD_VERTICES`].
pub const QUAD_INDICES: [u16; 6] = [0, 2, 1, 2, 3, 1];

/// Packed per-instance attributes.
///
/// `pindex` is stored as `f32` because the displacement model feeds it to
/// float noise and hash functions. Exact up to 2^24 pixels.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub pindex: f32,
    pub offset: [f32; 3],
    pub angle: f32,
}

impl QuadVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    /// Per-vertex buffer layout (slot 0).
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl ParticleInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![2 => Float32, 3 => Float32x3, 4 => Float32];

    /// Per-instance buffer layout (slot 1).
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ParticleInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Configuration for building particle fields.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldBuilder {
    /// Drop pixels whose red channel is at or below `threshold`.
    pub discard: bool,
    /// Red-channel cutoff (0-255).
    pub threshold: u8,
    /// Seed for the angle draw. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl FieldBuilder {
    /// Builder with discarding on, threshold 34 and an entropy seed.
    pub fn new() -> Self {
        Self {
            discard: true,
            threshold: DEFAULT_THRESHOLD,
            seed: None,
        }
    }

    /// Enable or disable dark-pixel discarding.
    pub fn with_discard(mut self, discard: bool) -> Self {
        self.discard = discard;
        self
    }

    /// Set the red-channel threshold.
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Seed the angle draw for reproducible fields.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Whether the pixel at `i` produces a particle.
    #[inline]
    pub fn is_visible(&self, image: &ImageSample, i: usize) -> bool {
        !self.discard || image.red(i) > self.threshold
    }

    /// Number of particles `image` would produce.
    pub fn count_visible(&self, image: &ImageSample) -> usize {
        if !self.discard {
            return image.pixel_count();
        }
        (0..image.pixel_count())
            .filter(|&i| self.is_visible(image, i))
            .count()
    }

    /// Build a particle field from `image`.
    ///
    /// Buffers are pre-sized from a counting pass, then filled in row-major
    /// pixel order. Fails with an [`ImageError`] if the image has a zero
    /// dimension.
    pub fn build(&self, image: &ImageSample) -> Result<ParticleField, ImageError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(ImageError::ZeroDimension { width, height });
        }

        let num_visible = self.count_visible(image);
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut indices = Vec::with_capacity(num_visible);
        let mut offsets = Vec::with_capacity(num_visible);
        let mut angles = Vec::with_capacity(num_visible);

        let w = width as usize;
        for i in 0..image.pixel_count() {
            if !self.is_visible(image, i) {
                continue;
            }
            indices.push(i as u32);
            offsets.push([(i % w) as f32, (i / w) as f32, 0.0]);
            angles.push(rng.gen::<f32>() * PI);
        }

        debug_assert_eq!(indices.len(), num_visible);
        log::info!(
            "built particle field {}x{}: {} of {} pixels visible (threshold {})",
            width,
            height,
            num_visible,
            image.pixel_count(),
            if self.discard { self.threshold as i32 } else { -1 },
        );

        Ok(ParticleField {
            width,
            height,
            indices,
            offsets,
            angles,
        })
    }
}

impl Default for FieldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a field with default settings and the given discard flag.
pub fn build(image: &ImageSample, discard: bool) -> Result<ParticleField, ImageError> {
    FieldBuilder::new().with_discard(discard).build(image)
}

/// The packed attributes of one image's visible pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleField {
    width: u32,
    height: u32,
    indices: Vec<u32>,
    offsets: Vec<[f32; 3]>,
    angles: Vec<f32>,
}

impl ParticleField {
    /// Number of particles.
    #[inline]
    pub fn num_visible(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Source image size `(W, H)`, the `uTextureSize` uniform.
    #[inline]
    pub fn texture_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Source pixel index per particle.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Grid offset per particle.
    pub fn offsets(&self) -> &[[f32; 3]] {
        &self.offsets
    }

    /// Random angle per particle.
    pub fn angles(&self) -> &[f32] {
        &self.angles
    }

    /// Interleave the three sequences for upload.
    pub fn instances(&self) -> Vec<ParticleInstance> {
        self.indices
            .iter()
            .zip(&self.offsets)
            .zip(&self.angles)
            .map(|((&pindex, &offset), &angle)| ParticleInstance {
                pindex: pindex as f32,
                offset,
                angle,
            })
            .collect()
    }
}
