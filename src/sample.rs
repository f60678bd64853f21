//! Decoded images and image loaders.
//!
//! An [`ImageSample`] is the immutable RGBA pixel buffer a particle field is
//! built from. Samples are produced either from raw bytes or by decoding a
//! file with the `image` crate.
//!
//! # Row order
//!
//! [`ImageSample::from_rgba`] keeps rows exactly as given. The decoding
//! constructors ([`ImageSample::from_dynamic`], [`ImageSample::open`]) flip the
//! image vertically so that row 0 is the **bottom** row. The particle grid has
//! `y` pointing up, so pixel index `i` maps to grid row `i / width` counted
//! from the bottom, matching GL texture coordinates.
//!
//! # Loaders
//!
//! The transition controller acquires images by url through the
//! [`ImageLoader`] trait. [`FileLoader`] reads from disk; [`MemoryLoader`]
//! serves preloaded samples.

use crate::error::ImageError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A decoded RGBA image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSample {
    width: u32,
    height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long.
    data: Vec<u8>,
}

impl ImageSample {
    /// Create a sample from raw RGBA bytes.
    ///
    /// Fails if either dimension is zero or the buffer length is not
    /// `width * height * 4`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // 2x1 image: one bright pixel, one dark pixel
    /// let sample = ImageSample::from_rgba(vec![255, 255, 255, 255, 10, 10, 10, 255], 2, 1)?;
    /// ```
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::ZeroDimension { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(ImageError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Create a sample by evaluating `f(x, y)` for every pixel, top row first.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Result<Self, ImageError>
    where
        F: FnMut(u32, u32) -> [u8; 4],
    {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::from_rgba(data, width, height)
    }

    /// Solid colour sample.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, ImageError> {
        Self::from_fn(width, height, |_, _| rgba)
    }

    /// Convert a decoded image, flipping it so row 0 is the bottom row.
    pub fn from_dynamic(img: image::DynamicImage) -> Result<Self, ImageError> {
        let rgba = image::imageops::flip_vertical(&img.into_rgba8());
        let (width, height) = rgba.dimensions();
        Self::from_rgba(rgba.into_raw(), width, height)
    }

    /// Decode an encoded image held in memory (PNG or JPEG).
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        Self::from_dynamic(image::load_from_memory(bytes)?)
    }

    /// Load and decode an image file (PNG or JPEG).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::decode(&bytes)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw RGBA bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// RGBA value of the pixel at row-major index `i`.
    #[inline]
    pub fn pixel(&self, i: usize) -> [u8; 4] {
        let o = i * 4;
        [self.data[o], self.data[o + 1], self.data[o + 2], self.data[o + 3]]
    }

    /// Red channel of the pixel at row-major index `i`.
    #[inline]
    pub fn red(&self, i: usize) -> u8 {
        self.data[i * 4]
    }

    /// Normalized RGBA colour at `(x, y)`, clamped to the image edge.
    pub fn color_at(&self, x: u32, y: u32) -> [f32; 4] {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let p = self.pixel((y * self.width + x) as usize);
        [
            p[0] as f32 / 255.0,
            p[1] as f32 / 255.0,
            p[2] as f32 / 255.0,
            p[3] as f32 / 255.0,
        ]
    }

    /// Give up the pixel buffer.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

/// Source of images for the transition controller.
pub trait ImageLoader {
    /// Load and decode the image identified by `url`.
    fn load(&mut self, url: &str) -> Result<ImageSample, ImageError>;
}

impl<F> ImageLoader for F
where
    F: FnMut(&str) -> Result<ImageSample, ImageError>,
{
    fn load(&mut self, url: &str) -> Result<ImageSample, ImageError> {
        self(url)
    }
}

/// Loads images from the filesystem, relative to an optional root directory.
#[derive(Clone, Debug, Default)]
pub struct FileLoader {
    root: Option<PathBuf>,
}

impl FileLoader {
    /// Loader resolving urls as paths relative to the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader resolving urls relative to `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(url),
            None => PathBuf::from(url),
        }
    }
}

impl ImageLoader for FileLoader {
    fn load(&mut self, url: &str) -> Result<ImageSample, ImageError> {
        ImageSample::open(self.resolve(url))
    }
}

/// Serves preloaded images by url.
#[derive(Clone, Debug, Default)]
pub struct MemoryLoader {
    images: HashMap<String, ImageSample>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image under `url`, replacing any previous one.
    pub fn insert(&mut self, url: impl Into<String>, image: ImageSample) {
        self.images.insert(url.into(), image);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, url: impl Into<String>, image: ImageSample) -> Self {
        self.insert(url, image);
        self
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageLoader for MemoryLoader {
    fn load(&mut self, url: &str) -> Result<ImageSample, ImageError> {
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| ImageError::NotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_validates() {
        assert!(matches!(
            ImageSample::from_rgba(vec![], 0, 1),
            Err(ImageError::ZeroDimension { width: 0, height: 1 })
        ));
        assert!(matches!(
            ImageSample::from_rgba(vec![0; 7], 1, 2),
            Err(ImageError::BufferSizeMismatch { expected: 8, actual: 7 })
        ));
        let ok = ImageSample::from_rgba(vec![1, 2, 3, 4, 5, 6, 7, 8], 2, 1).unwrap();
        assert_eq!(ok.pixel(1), [5, 6, 7, 8]);
        assert_eq!(ok.red(0), 1);
    }

    #[test]
    fn test_from_dynamic_flips_rows() {
        // Top row red, bottom row blue
        let mut img = image::RgbaImage::new(1, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));

        let sample = ImageSample::from_dynamic(image::DynamicImage::ImageRgba8(img)).unwrap();
        assert_eq!(sample.pixel(0), [0, 0, 255, 255]);
        assert_eq!(sample.pixel(1), [255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_png_roundtrip() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([200, 100, 50, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let sample = ImageSample::decode(&bytes).unwrap();
        assert_eq!((sample.width(), sample.height()), (3, 2));
        assert_eq!(sample.pixel(5), [200, 100, 50, 255]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = ImageSample::decode(b"not an image").unwrap_err();
        assert!(matches!(err, ImageError::Decode(_)));
    }

    #[test]
    fn test_memory_loader() {
        let mut loader = MemoryLoader::new().with("a", ImageSample::solid(2, 2, [9; 4]).unwrap());
        assert_eq!(loader.load("a").unwrap().width(), 2);
        assert!(matches!(loader.load("b"), Err(ImageError::NotFound(_))));
    }

    #[test]
    fn test_missing_file() {
        let mut loader = FileLoader::with_root("/definitely/not/here");
        assert!(matches!(loader.load("x.png"), Err(ImageError::Io(_))));
    }

    #[test]
    fn test_color_at_clamps() {
        let sample = ImageSample::solid(2, 2, [255, 0, 51, 255]).unwrap();
        let c = sample.color_at(10, 10);
        assert_eq!(c[0], 1.0);
        assert!((c[2] - 0.2).abs() < 1e-6);
    }
}
