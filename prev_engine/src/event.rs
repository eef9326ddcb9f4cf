//! Application events forwarded to layers and the graphics backend

use winit::keyboard::KeyCode;

/// Event from the windowing layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    WindowClose,
    WindowResize { width: u32, height: u32 },
    KeyPressed { key: KeyCode, repeat: bool },
    KeyReleased { key: KeyCode },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::WindowClose => "WindowClose",
            Event::WindowResize { .. } => "WindowResize",
            Event::KeyPressed { .. } => "KeyPressed",
            Event::KeyReleased { .. } => "KeyReleased",
        }
    }

    pub fn is_window_event(&self) -> bool {
        matches!(self, Event::WindowClose | Event::WindowResize { .. })
    }
}
