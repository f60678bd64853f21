//! Pointer tracking for touch interaction.
//!
//! [`Pointer`] folds raw window events into the pointer position and a list
//! of moves since the last frame. Mouse cursors and touch screens feed the
//! same stream, so either drives the touch field.
//!
//! # Usage
//!
//! ```ignore
//! // In the winit event handler
//! pointer.handle_event(&event);
//!
//! // Once per frame
//! for ndc in pointer.take_moves() {
//!     controller.pointer_touch(&camera, ndc);
//! }
//! ```

use glam::Vec2;
use winit::event::{TouchPhase, WindowEvent};

/// Pointer state from mouse and touch events.
#[derive(Debug, Default)]
pub struct Pointer {
    position: Vec2,
    ndc: Vec2,
    inside: bool,

    // NDC of every move since the last take
    moves: Vec<Vec2>,

    // Window size for NDC calculation
    window_size: (u32, u32),
}

impl Pointer {
    pub fn new() -> Self {
        Self {
            window_size: (800, 600),
            ..Default::default()
        }
    }

    /// Pointer position in physical pixels, origin top-left.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Pointer position in normalized device coordinates (-1 to 1).
    ///
    /// Origin is at center of window. X increases to the right, Y increases upward.
    pub fn ndc(&self) -> Vec2 {
        self.ndc
    }

    /// Whether the pointer is over the window.
    pub fn is_inside(&self) -> bool {
        self.inside
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    /// Moves recorded since the last call, oldest first.
    pub fn take_moves(&mut self) -> Vec<Vec2> {
        std::mem::take(&mut self.moves)
    }

    /// Number of moves waiting to be taken.
    pub fn pending_moves(&self) -> usize {
        self.moves.len()
    }

    /// Update window size for NDC calculations.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    /// Record a move to `(x, y)` in physical pixels.
    pub fn on_moved(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
        self.inside = true;

        let (w, h) = self.window_size;
        if w > 0 && h > 0 {
            self.ndc = Vec2::new(
                (x / w as f32) * 2.0 - 1.0,
                1.0 - (y / h as f32) * 2.0, // Y flipped
            );
            self.moves.push(self.ndc);
        }
    }

    /// Process a winit window event. Returns `true` if it was a pointer or
    /// resize event.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.on_moved(position.x as f32, position.y as f32);
                true
            }

            WindowEvent::Touch(touch) => {
                if matches!(touch.phase, TouchPhase::Started | TouchPhase::Moved) {
                    self.on_moved(touch.location.x as f32, touch.location.y as f32);
                }
                true
            }

            WindowEvent::CursorLeft { .. } => {
                self.inside = false;
                true
            }

            WindowEvent::Resized(size) => {
                self.set_window_size(size.width, size.height);
                true
            }

            _ => false,
        }
    }
}
