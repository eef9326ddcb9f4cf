/// DisplayModeSwitcher - windowed/fullscreen and resolution transitions
///
/// States are `Windowed(index)` and `Fullscreen(index)`. Both transitions go
/// through [`GraphicsDevice::recreate_for_mode`], which runs the resize
/// protocol and rebuilds the resource set.

use std::fmt;

use crate::error::{Error, Result};
use crate::graphics::driver::Driver;
use crate::graphics::graphics_device::GraphicsDevice;
use crate::graphics::swap_chain_resources::ResourceStage;

/// Step of the resize protocol that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStep {
    QueryFullscreenState,
    ResizeTarget,
    EnterFullscreen,
    LeaveFullscreen,
    FitWindow,
    ResizeBuffers,
    RebuildResources(ResourceStage),
}

impl TransitionStep {
    /// Wrap a driver error as a `TransitionError` for this step
    pub fn error(self, cause: Error) -> Error {
        Error::TransitionError {
            step: self,
            message: cause.message().to_string(),
        }
    }
}

impl fmt::Display for TransitionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionStep::QueryFullscreenState => f.write_str("query fullscreen state"),
            TransitionStep::ResizeTarget => f.write_str("resize target"),
            TransitionStep::EnterFullscreen => f.write_str("enter fullscreen"),
            TransitionStep::LeaveFullscreen => f.write_str("leave fullscreen"),
            TransitionStep::FitWindow => f.write_str("fit window"),
            TransitionStep::ResizeBuffers => f.write_str("resize buffers"),
            TransitionStep::RebuildResources(stage) => write!(f, "rebuild {}", stage),
        }
    }
}

/// Display state of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Windowed(usize),
    Fullscreen(usize),
}

impl DisplayState {
    /// Catalog index of the state
    pub fn index(self) -> usize {
        match self {
            DisplayState::Windowed(index) | DisplayState::Fullscreen(index) => index,
        }
    }

    pub fn is_fullscreen(self) -> bool {
        matches!(self, DisplayState::Fullscreen(_))
    }
}

impl<D: Driver> GraphicsDevice<D> {
    /// Current state, from the live fullscreen flag and catalog index
    pub fn display_state(&self) -> DisplayState {
        let index = self.catalog().current_index();
        if self.is_fullscreen() {
            DisplayState::Fullscreen(index)
        } else {
            DisplayState::Windowed(index)
        }
    }

    /// Flip between windowed and fullscreen at the current resolution
    ///
    /// # Errors
    ///
    /// `TransitionError`, see [`GraphicsDevice::recreate_for_mode`].
    pub fn toggle_fullscreen(&mut self) -> Result<()> {
        let desired = !self.is_fullscreen();
        self.set_fullscreen(desired)
    }

    /// Enter or leave fullscreen at the current resolution
    pub fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        let index = self.catalog().current_index() as isize;
        self.recreate_for_mode(index, fullscreen)
    }

    /// Switch to catalog entry `index` (wrapped), keeping the fullscreen state
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use prev_engine::prev::graphics::{GraphicsDevice, HeadlessDriver};
    /// # fn step(device: &mut GraphicsDevice<HeadlessDriver>) -> prev_engine::prev::Result<()> {
    /// let next = device.catalog().current_index() as isize + 1;
    /// device.change_resolution(next)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn change_resolution(&mut self, index: isize) -> Result<()> {
        let fullscreen = self.is_fullscreen();
        self.recreate_for_mode(index, fullscreen)
    }
}

#[cfg(test)]
#[path = "display_mode_switcher_tests.rs"]
mod tests;
