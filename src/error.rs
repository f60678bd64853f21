//! Error types for image-particles.
//!
//! One error enum per concern: image acquisition, tween creation, transitions
//! and GPU upload. Transition requests that arrive while a change is in flight
//! are not errors; they are coalesced by the controller.

use std::fmt;

/// Errors raised while acquiring or validating an image.
///
/// Every variant belongs to the `InvalidImage` class: the requested build is
/// abandoned and any live particle field stays untouched.
#[derive(Debug)]
pub enum ImageError {
    /// Width or height is zero.
    ZeroDimension { width: u32, height: u32 },
    /// The RGBA buffer length does not equal `width * height * 4`.
    BufferSizeMismatch { expected: usize, actual: usize },
    /// The image could not be decoded.
    Decode(image::ImageError),
    /// The image file could not be read.
    Io(std::io::Error),
    /// No image is registered under the requested url.
    NotFound(String),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::ZeroDimension { width, height } => {
                write!(f, "Invalid image: dimensions must be non-zero (got {}x{})", width, height)
            }
            ImageError::BufferSizeMismatch { expected, actual } => write!(
                f,
                "Invalid image: RGBA buffer holds {} bytes, expected {}",
                actual, expected
            ),
            ImageError::Decode(e) => write!(f, "Invalid image: failed to decode: {}", e),
            ImageError::Io(e) => write!(f, "Invalid image: failed to read file: {}", e),
            ImageError::NotFound(url) => write!(f, "Invalid image: no image found for '{}'", url),
        }
    }
}

impl std::error::Error for ImageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImageError::Decode(e) => Some(e),
            ImageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for ImageError {
    fn from(e: image::ImageError) -> Self {
        ImageError::Decode(e)
    }
}

impl From<std::io::Error> for ImageError {
    fn from(e: std::io::Error) -> Self {
        ImageError::Io(e)
    }
}

/// Errors raised when a tween is created.
///
/// Tweens validate eagerly so a running tween never fails mid-sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum TweenError {
    /// `from` and `to` have different lengths.
    ArityMismatch { from: usize, to: usize },
    /// Duration is negative or not finite.
    InvalidDuration(f64),
}

impl fmt::Display for TweenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TweenError::ArityMismatch { from, to } => write!(
                f,
                "Tween arity mismatch: start has {} components, end has {}",
                from, to
            ),
            TweenError::InvalidDuration(d) => {
                write!(f, "Tween duration must be finite and non-negative (got {})", d)
            }
        }
    }
}

impl std::error::Error for TweenError {}

/// Errors raised by the transition controller.
#[derive(Debug)]
pub enum TransitionError {
    /// The requested image could not be loaded or built.
    Image(ImageError),
    /// A transition tween could not be created.
    Tween(TweenError),
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::Image(e) => write!(f, "Transition failed: {}", e),
            TransitionError::Tween(e) => write!(f, "Transition failed: {}", e),
        }
    }
}

impl std::error::Error for TransitionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransitionError::Image(e) => Some(e),
            TransitionError::Tween(e) => Some(e),
        }
    }
}

impl From<ImageError> for TransitionError {
    fn from(e: ImageError) -> Self {
        TransitionError::Image(e)
    }
}

impl From<TweenError> for TransitionError {
    fn from(e: TweenError) -> Self {
        TransitionError::Tween(e)
    }
}

/// Errors raised while uploading a particle field to the GPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuError {
    /// The source image exceeds the device's 2D texture limit.
    TextureTooLarge { width: u32, height: u32, limit: u32 },
    /// The field has no visible particles, so there is nothing to instance.
    EmptyField,
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::TextureTooLarge { width, height, limit } => write!(
                f,
                "Image {}x{} exceeds the device texture limit of {}",
                width, height, limit
            ),
            GpuError::EmptyField => write!(f, "Particle field has no visible particles"),
        }
    }
}

impl std::error::Error for GpuError {}
