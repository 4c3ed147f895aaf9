// Pointer/touch tracking.
// Turns winit events into the single "latest interaction point" the
// simulation reads once per frame.

use glam::Vec2;
use winit::event::{TouchPhase, WindowEvent};

/// Input the tracker cares about, decoupled from winit so it can be fed from
/// tests or other hosts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Moved(Vec2),
    TouchMoved(Vec2),
    Left,
    TouchEnded,
    TouchCancelled,
}

impl PointerEvent {
    /// Translate a window event into a pointer event. `scale_factor` converts
    /// physical pixels to the logical pixels the simulation works in.
    pub fn from_window_event(event: &WindowEvent, scale_factor: f64) -> Option<Self> {
        match event {
            WindowEvent::CursorMoved { position, .. } => Some(PointerEvent::Moved(
                to_logical(position.x, position.y, scale_factor),
            )),
            WindowEvent::CursorLeft { .. } => Some(PointerEvent::Left),
            WindowEvent::Touch(touch) => Some(PointerEvent::from_touch_phase(
                touch.phase,
                to_logical(touch.location.x, touch.location.y, scale_factor),
            )),
            _ => None,
        }
    }

    /// Touch start/move sets the point at `at`; end and cancel clear it.
    pub fn from_touch_phase(phase: TouchPhase, at: Vec2) -> Self {
        match phase {
            TouchPhase::Started | TouchPhase::Moved => PointerEvent::TouchMoved(at),
            TouchPhase::Ended => PointerEvent::TouchEnded,
            TouchPhase::Cancelled => PointerEvent::TouchCancelled,
        }
    }
}

/// Physical window coordinates to logical pixels.
pub fn to_logical(x: f64, y: f64, scale_factor: f64) -> Vec2 {
    Vec2::new((x / scale_factor) as f32, (y / scale_factor) as f32)
}

/// Holds the most recent pointer or touch position. Only the latest value
/// matters; every event overwrites the previous one.
pub struct PointerTracker {
    point: Option<Vec2>,
    attached: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self { point: None, attached: true }
    }

    /// Feed a winit WindowEvent into the tracker.
    /// Call this once per event before the app's own event handling.
    pub fn process_event(&mut self, event: &WindowEvent, scale_factor: f64) {
        if let Some(pointer) = PointerEvent::from_window_event(event, scale_factor) {
            self.apply(pointer);
        }
    }

    pub fn apply(&mut self, event: PointerEvent) {
        if !self.attached {
            return;
        }
        self.point = match event {
            PointerEvent::Moved(at) | PointerEvent::TouchMoved(at) => Some(at),
            PointerEvent::Left | PointerEvent::TouchEnded | PointerEvent::TouchCancelled => None,
        };
    }

    /// Current interaction point, or `None` when no pointer is active.
    pub fn current(&self) -> Option<Vec2> {
        self.point
    }

    /// Stop recording events and forget the last point.
    pub fn detach(&mut self) {
        self.attached = false;
        self.point = None;
    }

    #[cfg(test)]
    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new()
    }
}
