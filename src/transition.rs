//! Transition controller: the lifecycle of the live particle field.
//!
//! The controller owns at most one live [`ParticleField`] together with its
//! [`ShaderParams`], the shared [`TouchField`] and the tween that animates the
//! three parameters `[size, random, depth]`.
//!
//! # States
//!
//! ```text
//!            request            show done
//!   Idle ──────────────▶ Showing ─────────▶ Steady
//!                           ▲                  │ request
//!                           │ rebuild          ▼
//!                           └────────────── Hiding
//! ```
//!
//! - The first request builds a field and tweens from `show_from` to `steady`.
//! - Later requests tween the live values to `dissolve`, then replace the
//!   field with one built from the new image and tween from `dissolve` to
//!   `steady`.
//! - While a change is in flight (`is_changing()`), requests are deferred.
//!   Only the latest deferred request is kept; it starts as soon as the
//!   current change settles.
//!
//! Images are loaded when requested, so a bad url fails the call and leaves
//! the live field alone.
//!
//! # Frame order
//!
//! ```ignore
//! let (now_ms, delta) = clock.update();
//! controller.tick(now_ms)?;   // advance the tween, maybe rebuild
//! controller.update(delta);   // advance time, decay touch
//! renderer.sync(&device, &queue, &controller, &camera)?;
//! ```

use crate::camera::ImageCamera;
use crate::easing::Easing;
use crate::error::TransitionError;
use crate::particles::{FieldBuilder, ParticleField};
use crate::sample::{ImageLoader, ImageSample};
use crate::touch::{TouchConfig, TouchField};
use crate::tween::{Tween, TweenId, TweenRequest, TweenScheduler};
use crate::uniforms::{Animated, ShaderParams};
use glam::Vec2;

/// Phase of the field lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionState {
    /// No field.
    Idle,
    /// Tweening towards the steady values.
    Showing,
    /// At rest on the steady values.
    Steady,
    /// Dissolving the current field before a rebuild.
    Hiding,
}

/// Tween targets and timing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionConfig {
    /// Start values of the first show.
    pub show_from: Animated,
    /// Resting values.
    pub steady: Animated,
    /// End values of a hide and start values of the following show.
    pub dissolve: Animated,
    pub show_duration_ms: f64,
    pub hide_duration_ms: f64,
    pub easing: Easing,
}

impl TransitionConfig {
    pub fn new() -> Self {
        Self {
            show_from: Animated::new(0.5, 0.0, 70.0),
            steady: Animated::new(1.5, 2.0, 4.0),
            dissolve: Animated::new(0.0, 5.0, -20.0),
            show_duration_ms: 1000.0,
            hide_duration_ms: 1000.0,
            easing: Easing::EaseInOutQuad,
        }
    }

    pub fn with_show_from(mut self, values: Animated) -> Self {
        self.show_from = values;
        self
    }

    pub fn with_steady(mut self, values: Animated) -> Self {
        self.steady = values;
        self
    }

    pub fn with_dissolve(mut self, values: Animated) -> Self {
        self.dissolve = values;
        self
    }

    /// Set the show duration (minimum 0).
    pub fn with_show_duration(mut self, ms: f64) -> Self {
        self.show_duration_ms = ms.max(0.0);
        self
    }

    /// Set the hide duration (minimum 0).
    pub fn with_hide_duration(mut self, ms: f64) -> Self {
        self.hide_duration_ms = ms.max(0.0);
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// The field currently on screen.
#[derive(Debug)]
struct LiveField {
    particles: ParticleField,
    params: ShaderParams,
    image: ImageSample,
    url: String,
}

/// A change waiting for the current one to settle.
#[derive(Debug)]
struct PendingChange {
    url: String,
    image: ImageSample,
}

/// Drives field builds and the show/hide tweens.
pub struct TransitionController<L: ImageLoader> {
    loader: L,
    builder: FieldBuilder,
    config: TransitionConfig,
    touch_config: TouchConfig,

    live: Option<LiveField>,
    touch: Option<TouchField>,
    tweens: TweenScheduler,
    active: Option<TweenId>,

    state: TransitionState,
    changing: bool,
    pending: Option<PendingChange>,
    generation: u64,
}

impl<L: ImageLoader> TransitionController<L> {
    /// Controller with default settings, loading images through `loader`.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            builder: FieldBuilder::default(),
            config: TransitionConfig::default(),
            touch_config: TouchConfig::default(),
            live: None,
            touch: None,
            tweens: TweenScheduler::new(),
            active: None,
            state: TransitionState::Idle,
            changing: false,
            pending: None,
            generation: 0,
        }
    }

    pub fn with_builder(mut self, builder: FieldBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_config(mut self, config: TransitionConfig) -> Self {
        self.config = config;
        self
    }

    /// Touch settings. Only applies if the touch field has not been created
    /// yet.
    pub fn with_touch_config(mut self, config: TouchConfig) -> Self {
        self.touch_config = config;
        self
    }

    /// Request that the image at `url` replace the current one.
    ///
    /// The image is loaded immediately. If loading fails the error is
    /// returned and nothing changes. If a change is already in flight the
    /// request is deferred, replacing any earlier deferred request.
    pub fn request_image_change(&mut self, url: &str) -> Result<(), TransitionError> {
        let image = self.loader.load(url).map_err(|e| {
            log::warn!("rejected image '{}': {}", url, e);
            e
        })?;

        if self.changing {
            if let Some(previous) = &self.pending {
                log::debug!("coalesced image request '{}' into '{}'", previous.url, url);
            } else {
                log::debug!("deferred image request '{}'", url);
            }
            self.pending = Some(PendingChange {
                url: url.to_string(),
                image,
            });
            return Ok(());
        }

        self.begin_change(url.to_string(), image)
    }

    /// Alias of [`request_image_change`](Self::request_image_change).
    pub fn set_image(&mut self, url: &str) -> Result<(), TransitionError> {
        self.request_image_change(url)
    }

    fn begin_change(&mut self, url: String, image: ImageSample) -> Result<(), TransitionError> {
        match &self.live {
            None => {
                let particles = self.builder.build(&image)?;
                self.install(particles, image, url, self.config.show_from);
                self.start_tween(self.config.show_from, self.config.steady, self.config.show_duration_ms)?;
                self.set_state(TransitionState::Showing);
            }
            Some(live) => {
                let from = live.params.animated();
                self.pending = Some(PendingChange { url, image });
                self.start_tween(from, self.config.dissolve, self.config.hide_duration_ms)?;
                self.set_state(TransitionState::Hiding);
            }
        }
        self.changing = true;
        Ok(())
    }

    fn install(&mut self, particles: ParticleField, image: ImageSample, url: String, values: Animated) {
        let (w, h) = particles.texture_size();
        let mut params = ShaderParams::new(w, h);
        params.set_animated(values);

        if self.touch.is_none() {
            self.touch = Some(TouchField::with_config(self.touch_config));
        }

        self.generation += 1;
        log::info!(
            "field {} live: '{}' ({} particles)",
            self.generation,
            url,
            particles.num_visible()
        );
        self.live = Some(LiveField {
            particles,
            params,
            image,
            url,
        });
    }

    fn start_tween(&mut self, from: Animated, to: Animated, duration_ms: f64) -> Result<(), TransitionError> {
        if let Some(id) = self.active.take() {
            self.tweens.cancel(id);
        }
        let request = TweenRequest::new(
            self.config.easing,
            from.to_array().to_vec(),
            to.to_array().to_vec(),
            duration_ms,
        );
        self.active = Some(self.tweens.start(request)?);
        Ok(())
    }

    fn set_state(&mut self, state: TransitionState) {
        if self.state != state {
            log::info!("transition {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Advance the active tween to frame time `now_ms`.
    ///
    /// Applies the tweened values to the live field and handles tween
    /// completion. Returns an error only if a rebuild failed; the previous
    /// field then stays live and is tweened back to rest.
    pub fn tick(&mut self, now_ms: f64) -> Result<(), TransitionError> {
        let mut finished = false;
        for frame in self.tweens.tick(now_ms) {
            if Some(frame.id) != self.active {
                continue;
            }
            if let Some(live) = &mut self.live {
                live.params.set_animated(Animated::from_slice(&frame.values));
            }
            finished |= frame.finished;
        }

        if finished {
            self.active = None;
            self.on_tween_finished()?;
        }
        Ok(())
    }

    fn on_tween_finished(&mut self) -> Result<(), TransitionError> {
        match self.state {
            TransitionState::Showing => {
                self.set_state(TransitionState::Steady);
                self.changing = false;
                if let Some(next) = self.pending.take() {
                    self.begin_change(next.url, next.image)?;
                }
            }
            TransitionState::Hiding => match self.pending.take() {
                Some(next) => self.rebuild(next)?,
                None => {
                    let dissolve = self.config.dissolve;
                    self.start_tween(dissolve, self.config.steady, self.config.show_duration_ms)?;
                    self.set_state(TransitionState::Showing);
                }
            },
            TransitionState::Idle | TransitionState::Steady => {}
        }
        Ok(())
    }

    fn rebuild(&mut self, next: PendingChange) -> Result<(), TransitionError> {
        let dissolve = self.config.dissolve;
        let steady = self.config.steady;
        let duration = self.config.show_duration_ms;

        match self.builder.build(&next.image) {
            Ok(particles) => {
                // The old field is dropped here, after the new one built
                self.install(particles, next.image, next.url, dissolve);
                self.start_tween(dissolve, steady, duration)?;
                self.set_state(TransitionState::Showing);
                Ok(())
            }
            Err(e) => {
                log::warn!("rebuild for '{}' failed, keeping current field: {}", next.url, e);
                self.start_tween(dissolve, steady, duration)?;
                self.set_state(TransitionState::Showing);
                Err(e.into())
            }
        }
    }

    /// Advance shader time by `delta` seconds and decay the touch field.
    ///
    /// Does nothing while no field is live.
    pub fn update(&mut self, delta: f32) {
        let Some(live) = &mut self.live else {
            return;
        };
        live.params.advance(delta);
        if let Some(touch) = &mut self.touch {
            touch.update();
        }
    }

    /// [`tick`](Self::tick) then [`update`](Self::update).
    pub fn frame(&mut self, now_ms: f64, delta: f32) -> Result<(), TransitionError> {
        let result = self.tick(now_ms);
        self.update(delta);
        result
    }

    /// Feed a touch at image coordinate `(x, y)` in `[0, 1]`, `y` up.
    ///
    /// Returns `false` if no field is live.
    pub fn add_touch(&mut self, x: f32, y: f32) -> bool {
        if self.live.is_none() {
            return false;
        }
        match &mut self.touch {
            Some(touch) => {
                touch.add_touch(x, y);
                true
            }
            None => false,
        }
    }

    /// Hit-test a pointer at `ndc` against the live image and feed a touch
    /// on a hit.
    pub fn pointer_touch(&mut self, camera: &ImageCamera, ndc: Vec2) -> bool {
        let Some(live) = &self.live else {
            return false;
        };
        match camera.pick_uv(ndc, live.particles.texture_size()) {
            Some(uv) => self.add_touch(uv.x, uv.y),
            None => false,
        }
    }

    /// Drop the live field, the tween and any deferred request.
    ///
    /// Calling it again is a no-op. The touch field survives; a later
    /// request starts over from `Idle`.
    pub fn destroy(&mut self) {
        if self.live.is_none() && self.active.is_none() && self.pending.is_none() {
            return;
        }
        self.tweens.clear();
        self.active = None;
        self.pending = None;
        if let Some(live) = self.live.take() {
            log::info!("destroyed field {} ('{}')", self.generation, live.url);
            self.generation += 1;
        }
        self.changing = false;
        self.set_state(TransitionState::Idle);
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// Whether a show or hide is in flight.
    pub fn is_changing(&self) -> bool {
        self.changing
    }

    pub fn field(&self) -> Option<&ParticleField> {
        self.live.as_ref().map(|l| &l.particles)
    }

    pub fn params(&self) -> Option<&ShaderParams> {
        self.live.as_ref().map(|l| &l.params)
    }

    /// Source image of the live field.
    pub fn image(&self) -> Option<&ImageSample> {
        self.live.as_ref().map(|l| &l.image)
    }

    pub fn current_url(&self) -> Option<&str> {
        self.live.as_ref().map(|l| l.url.as_str())
    }

    /// Url of the deferred request, if any.
    pub fn pending_url(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.url.as_str())
    }

    pub fn touch(&self) -> Option<&TouchField> {
        self.touch.as_ref()
    }

    pub fn touch_mut(&mut self) -> Option<&mut TouchField> {
        self.touch.as_mut()
    }

    /// Incremented every time the live field is replaced or dropped.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_tween(&self) -> Option<&Tween> {
        self.active.and_then(|id| self.tweens.get(id))
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    pub fn builder(&self) -> &FieldBuilder {
        &self.builder
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageError;
    use crate::sample::MemoryLoader;

    fn loader() -> MemoryLoader {
        MemoryLoader::new()
            .with("a", ImageSample::solid(4, 4, [255; 4]).unwrap())
            .with("b", ImageSample::solid(2, 3, [200, 0, 0, 255]).unwrap())
            .with("c", ImageSample::solid(5, 1, [100, 0, 0, 255]).unwrap())
    }

    fn controller() -> TransitionController<MemoryLoader> {
        TransitionController::new(loader()).with_builder(FieldBuilder::new().with_seed(1))
    }

    /// Tick at 60 fps from `start` until the controller settles.
    fn settle(c: &mut TransitionController<MemoryLoader>, start: f64) -> f64 {
        let mut now = start;
        for _ in 0..1000 {
            c.frame(now, 1.0 / 60.0).unwrap();
            if !c.is_changing() {
                return now;
            }
            now += 1000.0 / 60.0;
        }
        panic!("controller never settled");
    }

    #[test]
    fn test_first_request_shows() {
        let mut c = controller();
        assert_eq!(c.state(), TransitionState::Idle);
        c.request_image_change("a").unwrap();

        assert_eq!(c.state(), TransitionState::Showing);
        assert!(c.is_changing());
        assert_eq!(c.params().unwrap().animated().to_array(), [0.5, 0.0, 70.0]);
        assert_eq!(c.generation(), 1);

        // First tick emits the curve at t = 0
        c.tick(0.0).unwrap();
        assert_eq!(c.params().unwrap().animated().to_array(), [0.5, 0.0, 70.0]);

        c.tick(1000.0).unwrap();
        assert_eq!(c.state(), TransitionState::Steady);
        assert!(!c.is_changing());
        assert_eq!(c.params().unwrap().animated().to_array(), [1.5, 2.0, 4.0]);
    }

    #[test]
    fn test_change_hides_then_rebuilds() {
        let mut c = controller();
        c.request_image_change("a").unwrap();
        let now = settle(&mut c, 0.0);

        c.request_image_change("b").unwrap();
        assert_eq!(c.state(), TransitionState::Hiding);
        assert_eq!(c.current_url(), Some("a"));
        assert_eq!(c.pending_url(), Some("b"));

        c.tick(now + 10.0).unwrap();
        c.tick(now + 1010.0).unwrap();
        assert_eq!(c.state(), TransitionState::Showing);
        assert_eq!(c.current_url(), Some("b"));
        assert_eq!(c.field().unwrap().texture_size(), (2, 3));
        assert_eq!(c.params().unwrap().animated().to_array(), [0.0, 5.0, -20.0]);
        assert_eq!(c.generation(), 2);

        settle(&mut c, now + 1020.0);
        assert_eq!(c.state(), TransitionState::Steady);
        assert_eq!(c.params().unwrap().animated().to_array(), [1.5, 2.0, 4.0]);
    }

    #[test]
    fn test_requests_coalesce_latest_wins() {
        let mut c = controller();
        c.request_image_change("a").unwrap();
        c.tick(0.0).unwrap();

        c.request_image_change("b").unwrap();
        c.request_image_change("c").unwrap();
        assert_eq!(c.pending_url(), Some("c"));
        assert_eq!(c.current_url(), Some("a"));

        settle(&mut c, 16.0);
        assert_eq!(c.state(), TransitionState::Steady);
        assert_eq!(c.current_url(), Some("c"));
        // One build for "a", one for "c"
        assert_eq!(c.generation(), 2);
    }

    #[test]
    fn test_bad_url_leaves_field_alone() {
        let mut c = controller();
        c.request_image_change("a").unwrap();
        settle(&mut c, 0.0);

        let err = c.request_image_change("missing").unwrap_err();
        assert!(matches!(err, TransitionError::Image(ImageError::NotFound(_))));
        assert_eq!(c.state(), TransitionState::Steady);
        assert_eq!(c.current_url(), Some("a"));
    }

    #[test]
    fn test_update_without_field_is_noop() {
        let mut c = controller();
        c.update(1.0);
        assert!(c.params().is_none());
        assert!(c.touch().is_none());
        assert!(!c.add_touch(0.5, 0.5));
    }

    #[test]
    fn test_update_advances_time_and_touch() {
        let mut c = controller();
        c.request_image_change("a").unwrap();
        assert!(c.add_touch(0.5, 0.5));
        c.update(0.5);
        c.update(0.25);
        assert_eq!(c.params().unwrap().time, 0.75);
        assert_eq!(c.touch().unwrap().trail()[0].age, 2);
    }

    #[test]
    fn test_touch_field_survives_rebuild() {
        let mut c = controller();
        c.request_image_change("a").unwrap();
        c.add_touch(0.2, 0.2);
        let now = settle(&mut c, 0.0);
        c.request_image_change("b").unwrap();
        settle(&mut c, now + 16.0);
        assert!(c.touch().is_some());
    }

    #[test]
    fn test_destroy_twice() {
        let mut c = controller();
        c.request_image_change("a").unwrap();
        c.destroy();
        assert_eq!(c.state(), TransitionState::Idle);
        assert!(c.field().is_none());
        let generation = c.generation();

        c.destroy();
        assert_eq!(c.generation(), generation);

        // Usable again afterwards
        c.request_image_change("b").unwrap();
        assert_eq!(c.state(), TransitionState::Showing);
    }

    #[test]
    fn test_pointer_touch_hits_centre() {
        let mut c = controller();
        let camera = ImageCamera::default();
        assert!(!c.pointer_touch(&camera, Vec2::ZERO));

        c.request_image_change("a").unwrap();
        assert!(c.pointer_touch(&camera, Vec2::ZERO));
        let point = c.touch().unwrap().trail()[0];
        assert!((point.x - 0.5).abs() < 1e-3);
        assert!((point.y - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_zero_duration_config() {
        let mut c = controller().with_config(TransitionConfig::new().with_show_duration(0.0));
        c.request_image_change("a").unwrap();
        c.tick(5.0).unwrap();
        assert_eq!(c.state(), TransitionState::Steady);
        assert_eq!(c.params().unwrap().animated().to_array(), [1.5, 2.0, 4.0]);
    }
}
