//! Pointer input for the windowed scene.
//!
//! [`Pointer`] turns raw winit window events into the two gestures the
//! scene reacts to: cursor movement in normalized device coordinates and
//! double clicks.

use std::time::{Duration, Instant};

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};

use crate::math::screen_to_ndc;

/// Two presses closer than this count as a double click.
pub const DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(300);

/// Gesture recognized from a window event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    /// The cursor moved; carries the new NDC position.
    Moved(Vec2),
    /// Second left press within [`DOUBLE_CLICK_INTERVAL`].
    DoubleClick,
}

/// Cursor tracking state.
#[derive(Debug, Clone)]
pub struct Pointer {
    window_size: (u32, u32),
    position: Vec2,
    ndc: Vec2,
    last_press: Option<Instant>,
}

impl Pointer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            window_size: (width, height),
            position: Vec2::ZERO,
            ndc: Vec2::ZERO,
            last_press: None,
        }
    }

    /// Cursor position in window pixels.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Cursor position in normalized device coordinates (-1 to 1).
    ///
    /// Origin is at center of window. X increases to the right, Y increases upward.
    pub fn ndc(&self) -> Vec2 {
        self.ndc
    }

    /// Update window size for NDC calculations.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
        self.ndc = self.compute_ndc();
    }

    /// Move the cursor to a window pixel position. Returns the new NDC.
    pub fn set_cursor(&mut self, x: f32, y: f32) -> Vec2 {
        self.position = Vec2::new(x, y);
        self.ndc = self.compute_ndc();
        self.ndc
    }

    /// Record a left press at `at`. Returns `true` when it completes a
    /// double click; the pair is then consumed.
    pub fn register_press(&mut self, at: Instant) -> bool {
        match self.last_press {
            Some(previous) if at.saturating_duration_since(previous) <= DOUBLE_CLICK_INTERVAL => {
                self.last_press = None;
                true
            }
            _ => {
                self.last_press = Some(at);
                false
            }
        }
    }

    fn compute_ndc(&self) -> Vec2 {
        let (w, h) = self.window_size;
        screen_to_ndc(self.position.x, self.position.y, w as f32, h as f32)
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<PointerAction> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let ndc = self.set_cursor(position.x as f32, position.y as f32);
                Some(PointerAction::Moved(ndc))
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self
                .register_press(Instant::now())
                .then_some(PointerAction::DoubleClick),
            WindowEvent::Resized(size) => {
                self.set_window_size(size.width, size.height);
                None
            }
            _ => None,
        }
    }
}

impl Default for Pointer {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
