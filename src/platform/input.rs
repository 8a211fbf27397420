//! Pointer and touch capture
//!
//! Raw browser events are translated into [`InputEvent`]s here, so the rules
//! (primary button only, first touch only) are testable without a DOM. The
//! platform layer registers the listeners and hands a detach hook to
//! [`InputCapture::set_detach`]; `dispose` runs it exactly once.

use glam::Vec2;

/// `MouseEvent.button` value of the primary button
pub const PRIMARY_BUTTON: i16 = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Primary press at an element-relative position
    Fire(Vec2),
    /// Cursor moved (crosshair only, never scored)
    Move(Vec2),
    /// Press released
    Release,
}

/// Convert a client-space position to element-relative pixels
pub fn element_relative(client: Vec2, element_origin: Vec2) -> Vec2 {
    client - element_origin
}

#[derive(Default)]
pub struct InputCapture {
    pressed: bool,
    cursor: Option<Vec2>,
    detach: Option<Box<dyn FnOnce()>>,
    disposed: bool,
}

impl std::fmt::Debug for InputCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputCapture")
            .field("pressed", &self.pressed)
            .field("cursor", &self.cursor)
            .field("attached", &self.detach.is_some())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl InputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hook that unregisters the platform listeners. Replaces (and runs) any
    /// previous hook.
    pub fn set_detach(&mut self, hook: impl FnOnce() + 'static) {
        if let Some(previous) = self.detach.take() {
            previous();
        }
        if self.disposed {
            hook();
            return;
        }
        self.detach = Some(Box::new(hook));
    }

    pub fn mouse_down(&mut self, button: i16, position: Vec2) -> Option<InputEvent> {
        if self.disposed || button != PRIMARY_BUTTON {
            return None;
        }
        self.pressed = true;
        self.cursor = Some(position);
        Some(InputEvent::Fire(position))
    }

    pub fn mouse_move(&mut self, position: Vec2) -> Option<InputEvent> {
        if self.disposed {
            return None;
        }
        self.cursor = Some(position);
        Some(InputEvent::Move(position))
    }

    pub fn mouse_up(&mut self, button: i16) -> Option<InputEvent> {
        if self.disposed || button != PRIMARY_BUTTON {
            return None;
        }
        self.pressed = false;
        Some(InputEvent::Release)
    }

    /// `first_touch` is the first entry of the event's touch list, if any.
    /// Fingers landing while a touch is held never fire.
    pub fn touch_start(&mut self, first_touch: Option<Vec2>) -> Option<InputEvent> {
        if self.disposed || self.pressed {
            return None;
        }
        let position = first_touch?;
        self.pressed = true;
        self.cursor = Some(position);
        Some(InputEvent::Fire(position))
    }

    pub fn touch_move(&mut self, first_touch: Option<Vec2>) -> Option<InputEvent> {
        if self.disposed {
            return None;
        }
        let position = first_touch?;
        self.cursor = Some(position);
        Some(InputEvent::Move(position))
    }

    pub fn touch_end(&mut self) -> Option<InputEvent> {
        if self.disposed {
            return None;
        }
        self.pressed = false;
        Some(InputEvent::Release)
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Last known cursor position
    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Detach listeners and ignore all further events
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.pressed = false;
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}
