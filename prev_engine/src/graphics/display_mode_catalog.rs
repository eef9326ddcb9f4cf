/// DisplayModeCatalog - deduplicated list of output modes with a cyclic cursor

use crate::error::{Error, Result};
use crate::graphics::display_mode::{DisplayMode, PixelFormat};
use crate::graphics::driver::Driver;
use crate::engine_error;

/// Format every catalog is enumerated with
pub const CATALOG_PIXEL_FORMAT: PixelFormat = PixelFormat::R8G8B8A8Unorm;

/// Collapse adjacent modes that share a resolution, keeping the first one
///
/// Only the last kept entry is compared, not the whole list: drivers report
/// modes width-major, so refresh-rate variants of a resolution are adjacent.
pub fn dedup_adjacent_resolutions(raw: &[DisplayMode]) -> Vec<DisplayMode> {
    let mut modes: Vec<DisplayMode> = Vec::with_capacity(raw.len());
    for mode in raw {
        match modes.last() {
            Some(last) if last.same_resolution(mode) => {}
            _ => modes.push(*mode),
        }
    }
    modes
}

/// Supported modes of the primary output
///
/// The mode list is immutable once built; only the current index moves.
/// Invariant: the list is never empty and `current_index < len()`.
#[derive(Debug, Clone)]
pub struct DisplayModeCatalog {
    modes: Vec<DisplayMode>,
    current_index: usize,
}

impl DisplayModeCatalog {
    /// Query the driver's primary output and build the catalog
    ///
    /// The current index starts at the last entry (the last mode the driver
    /// reported, which is not necessarily the largest).
    ///
    /// # Errors
    ///
    /// `AdapterQueryError` when the output can't be queried or reports no mode.
    pub fn enumerate<D: Driver + ?Sized>(driver: &D) -> Result<Self> {
        let raw = driver.output_modes(CATALOG_PIXEL_FORMAT).map_err(|e| match e {
            Error::AdapterQueryError(_) => e,
            other => Error::AdapterQueryError(other.message().to_string()),
        })?;
        Self::from_modes(&raw)
    }

    /// Build from an already-fetched raw mode list
    ///
    /// # Errors
    ///
    /// `AdapterQueryError` if `raw` is empty.
    pub fn from_modes(raw: &[DisplayMode]) -> Result<Self> {
        let modes = dedup_adjacent_resolutions(raw);
        if modes.is_empty() {
            engine_error!("prev::DisplayModeCatalog", "Output reported no display mode");
            return Err(Error::AdapterQueryError(
                "output reported no display mode".to_string(),
            ));
        }
        let current_index = modes.len() - 1;
        Ok(Self { modes, current_index })
    }

    /// Mode at the current index
    pub fn selected_mode(&self) -> &DisplayMode {
        &self.modes[self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Wrap `index` into `0..len()`; negative values count from the end
    pub fn wrap_index(&self, index: isize) -> usize {
        index.rem_euclid(self.modes.len() as isize) as usize
    }

    /// Move the cursor; out-of-range and negative indices wrap around
    ///
    /// # Returns
    ///
    /// The index actually selected.
    pub fn set_index(&mut self, index: isize) -> usize {
        self.current_index = self.wrap_index(index);
        self.current_index
    }

    /// Step to the next mode, wrapping to the first
    pub fn next(&mut self) -> usize {
        self.set_index(self.current_index as isize + 1)
    }

    /// Step to the previous mode, wrapping to the last
    pub fn previous(&mut self) -> usize {
        self.set_index(self.current_index as isize - 1)
    }

    pub fn modes(&self) -> &[DisplayMode] {
        &self.modes
    }

    pub fn get(&self, index: usize) -> Option<&DisplayMode> {
        self.modes.get(index)
    }

    /// (width, height) of every entry, in catalog order
    pub fn resolutions(&self) -> Vec<(u32, u32)> {
        self.modes.iter().map(DisplayMode::resolution).collect()
    }

    /// Index of the first entry with this resolution
    pub fn find(&self, width: u32, height: u32) -> Option<usize> {
        self.modes
            .iter()
            .position(|m| m.width == width && m.height == height)
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    /// Always false for a constructed catalog; provided for API symmetry
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

#[cfg(test)]
#[path = "display_mode_catalog_tests.rs"]
mod tests;
