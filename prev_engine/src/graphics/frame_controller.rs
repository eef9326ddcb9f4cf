/// FrameController - per-frame entry points for the application loop
///
/// Wraps a [`GraphicsBackend`]. Frames must alternate `start_frame` /
/// `end_frame`, and display-mode commands are only accepted between frames.
/// While the device has no valid resources (after a failed transition),
/// frames are skipped instead of rendered. A window resize or an out-of-date
/// swap chain is handled at the next `start_frame` by refreshing the swap
/// chain at the current mode.

use crate::error::{Error, Result};
use crate::event::Event;
use crate::graphics::graphics_backend::GraphicsBackend;
use crate::{engine_debug, engine_trace, engine_warn};

const SOURCE: &str = "prev::FrameController";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramePhase {
    Idle,
    Rendering,
    Skipping,
}

pub struct FrameController {
    backend: GraphicsBackend,
    phase: FramePhase,
    frames_presented: u64,
    frames_skipped: u64,
}

impl FrameController {
    pub fn new(backend: GraphicsBackend) -> Self {
        Self {
            backend,
            phase: FramePhase::Idle,
            frames_presented: 0,
            frames_skipped: 0,
        }
    }

    /// Begin a frame: clear color and depth
    ///
    /// # Errors
    ///
    /// `InvalidState` if a frame is already open, or the driver error. A
    /// failed start leaves no frame open.
    pub fn start_frame(&mut self) -> Result<()> {
        if self.phase != FramePhase::Idle {
            return Err(Error::InvalidState(
                "start_frame called twice without end_frame".to_string(),
            ));
        }

        if self.backend.needs_swap_chain_refresh() {
            if let Err(e) = self.backend.refresh_swap_chain() {
                engine_warn!(SOURCE, "Swap chain refresh failed: {}", e);
            }
        }

        if !self.backend.is_renderable() {
            engine_trace!(SOURCE, "Device not renderable, skipping frame");
            self.phase = FramePhase::Skipping;
            return Ok(());
        }

        match self.backend.start_frame() {
            Ok(()) => {
                self.phase = FramePhase::Rendering;
                Ok(())
            }
            // Out of date: refreshed at the next start_frame
            Err(e) if self.backend.needs_swap_chain_refresh() => {
                engine_debug!(SOURCE, "Skipping frame on a stale swap chain: {}", e);
                self.phase = FramePhase::Skipping;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// End the frame: present (or close a skipped frame)
    pub fn end_frame(&mut self) -> Result<()> {
        match self.phase {
            FramePhase::Idle => Err(Error::InvalidState(
                "end_frame called without start_frame".to_string(),
            )),
            FramePhase::Skipping => {
                self.phase = FramePhase::Idle;
                self.frames_skipped += 1;
                Ok(())
            }
            FramePhase::Rendering => {
                self.phase = FramePhase::Idle;
                self.backend.end_frame()?;
                self.frames_presented += 1;
                Ok(())
            }
        }
    }

    /// Forward an event to the device
    pub fn on_event(&mut self, event: &Event) {
        self.backend.on_event(event);
    }

    // ===== DISPLAY MODE COMMANDS =====

    fn ensure_between_frames(&self, operation: &str) -> Result<()> {
        if self.phase != FramePhase::Idle {
            engine_warn!(SOURCE, "{} rejected: a frame is in progress", operation);
            return Err(Error::InvalidState(format!(
                "{} is only allowed between frames",
                operation
            )));
        }
        Ok(())
    }

    pub fn toggle_fullscreen(&mut self) -> Result<()> {
        self.ensure_between_frames("toggle_fullscreen")?;
        self.backend.toggle_fullscreen()
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        self.ensure_between_frames("set_fullscreen")?;
        self.backend.set_fullscreen(fullscreen)
    }

    pub fn change_resolution(&mut self, index: isize) -> Result<()> {
        self.ensure_between_frames("change_resolution")?;
        self.backend.change_resolution(index)
    }

    pub fn supported_resolutions(&self) -> Vec<(u32, u32)> {
        self.backend.supported_resolutions()
    }

    // ===== ACCESSORS =====

    pub fn backend(&self) -> &GraphicsBackend {
        &self.backend
    }

    pub fn is_in_frame(&self) -> bool {
        self.phase != FramePhase::Idle
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    /// Mutable backend access, between frames only
    pub fn backend_mut(&mut self) -> Result<&mut GraphicsBackend> {
        self.ensure_between_frames("backend_mut")?;
        Ok(&mut self.backend)
    }

    /// Give the backend back
    pub fn into_backend(self) -> GraphicsBackend {
        self.backend
    }
}

#[cfg(test)]
#[path = "frame_controller_tests.rs"]
mod tests;
