//! Translating winit input into viewer actions.

use winit::dpi::PhysicalPosition;
use winit::event::MouseScrollDelta;
use winit::keyboard::KeyCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    ToggleWalk,
    Poke,
    Exit,
}

pub fn action_for_key(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::Space => Some(Action::ToggleWalk),
        KeyCode::KeyP => Some(Action::Poke),
        KeyCode::Escape => Some(Action::Exit),
        _ => None,
    }
}

/// Left-button drag state. Shift+click pokes instead of starting a drag.
#[derive(Debug, Default)]
pub struct DragTracker {
    cursor: Option<PhysicalPosition<f64>>,
    dragging: bool,
}

impl DragTracker {
    /// Returns `Some(Action::Poke)` for a shift+click.
    pub fn press(&mut self, shift: bool) -> Option<Action> {
        if shift {
            return Some(Action::Poke);
        }
        self.dragging = true;
        None
    }

    pub fn release(&mut self) {
        self.dragging = false;
    }

    /// New cursor position; yields the pixel delta while dragging. The
    /// position is tracked even when `captured` (the UI owns the pointer),
    /// but no delta is reported then.
    pub fn moved(&mut self, pos: PhysicalPosition<f64>, captured: bool) -> Option<(f32, f32)> {
        let prev = self.cursor.replace(pos);
        if !self.dragging || captured {
            return None;
        }
        let prev = prev?;
        Some(((pos.x - prev.x) as f32, (pos.y - prev.y) as f32))
    }

    pub fn cursor_left(&mut self) {
        self.cursor = None;
        self.dragging = false;
    }
}

/// Wheel delta in notches; positive zooms in. One event is one notch
/// whatever its magnitude.
pub fn wheel_steps(delta: MouseScrollDelta) -> f32 {
    let y = match delta {
        MouseScrollDelta::LineDelta(_, y) => f64::from(y),
        MouseScrollDelta::PixelDelta(p) => p.y,
    };
    if y > 0.0 {
        1.0
    } else if y < 0.0 {
        -1.0
    } else {
        0.0
    }
}
