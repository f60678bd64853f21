//! Perspective camera that frames an image and picks points on it.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Camera settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Distance from the camera to the image plane.
    pub distance: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraConfig {
    pub fn new() -> Self {
        Self {
            fov_degrees: 50.0,
            distance: 300.0,
            near: 1.0,
            far: 10_000.0,
        }
    }

    /// Set the vertical field of view, clamped to `[1, 179]` degrees.
    pub fn with_fov(mut self, degrees: f32) -> Self {
        self.fov_degrees = degrees.clamp(1.0, 179.0);
        self
    }

    /// Set the camera distance (minimum 0.01).
    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = distance.max(0.01);
        self
    }

    /// Set the clip planes. `far` is kept above `near`.
    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near.max(1e-4);
        self.far = far.max(self.near + 1e-3);
        self
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera on the +Z axis looking at the origin, where the image lies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageCamera {
    config: CameraConfig,
    viewport: (u32, u32),
}

impl ImageCamera {
    /// Camera for a viewport of `width` x `height` pixels.
    pub fn new(config: CameraConfig, width: u32, height: u32) -> Self {
        Self {
            config,
            viewport: (width.max(1), height.max(1)),
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Viewport size in pixels.
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Update the viewport after a window resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.0 as f32 / self.viewport.1 as f32
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.config.distance)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.config.fov_degrees.to_radians(),
            self.aspect(),
            self.config.near,
            self.config.far,
        )
    }

    /// Height of the view frustum at the image plane.
    pub fn fov_height(&self) -> f32 {
        2.0 * (self.config.fov_degrees.to_radians() * 0.5).tan() * self.config.distance
    }

    /// Uniform scale that makes an image `image_height` pixels tall fill the
    /// viewport height.
    pub fn fit_scale(&self, image_height: u32) -> f32 {
        self.fov_height() / image_height.max(1) as f32
    }

    /// Model matrix for an image `image_height` pixels tall.
    pub fn model_matrix(&self, image_height: u32) -> Mat4 {
        let s = self.fit_scale(image_height);
        Mat4::from_scale(Vec3::new(s, s, 1.0))
    }

    /// View times model, the `model_view` uniform.
    pub fn model_view(&self, image_height: u32) -> Mat4 {
        self.view_matrix() * self.model_matrix(image_height)
    }

    /// Convert a position in physical pixels (origin top-left) to NDC.
    pub fn screen_to_ndc(&self, x: f32, y: f32) -> Vec2 {
        let (w, h) = (self.viewport.0 as f32, self.viewport.1 as f32);
        Vec2::new((2.0 * x / w) - 1.0, 1.0 - (2.0 * y / h))
    }

    /// World-space ray through an NDC point: `(origin, direction)`.
    pub fn ray(&self, ndc: Vec2) -> (Vec3, Vec3) {
        let inv = (self.projection_matrix() * self.view_matrix()).inverse();
        let p_far = inv * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let p1 = p_far.truncate() / p_far.w;
        let ro = self.position();
        (ro, (p1 - ro).normalize())
    }

    /// Intersect the ray through `ndc` with the image's hit area.
    ///
    /// The hit area is a `width` x `height` plane centred on the origin and
    /// scaled by [`fit_scale`](Self::fit_scale). Returns its texture
    /// coordinate with `v` pointing up, or `None` on a miss.
    pub fn pick_uv(&self, ndc: Vec2, image_size: (u32, u32)) -> Option<Vec2> {
        let (ro, rd) = self.ray(ndc);
        if rd.z >= 0.0 {
            return None;
        }
        let t = -ro.z / rd.z;
        let hit = ro + rd * t;

        let s = self.fit_scale(image_size.1);
        let (w, h) = (image_size.0.max(1) as f32, image_size.1.max(1) as f32);
        let uv = Vec2::new(hit.x / s / w + 0.5, hit.y / s / h + 0.5);
        if (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y) {
            Some(uv)
        } else {
            None
        }
    }
}

impl Default for ImageCamera {
    fn default() -> Self {
        Self::new(CameraConfig::default(), 1280, 720)
    }
}
