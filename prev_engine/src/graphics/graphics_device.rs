/// GraphicsDevice - device, swap chain and per-resolution resources
///
/// The device owns its driver (and through it the logical device and swap
/// chain), the display-mode catalog and the current [`SwapChainResources`].
/// Every mutating call takes `&mut self`, so frame rendering and display-mode
/// transitions can't overlap.

use crate::error::{Error, Result};
use crate::graphics::config::GraphicsConfig;
use crate::graphics::display_mode::{
    AdapterInfo, CapabilityTier, DisplayMode, RefreshRate, REQUESTED_CAPABILITY_TIERS,
};
use crate::graphics::display_mode_catalog::{DisplayModeCatalog, CATALOG_PIXEL_FORMAT};
use crate::graphics::display_mode_switcher::TransitionStep;
use crate::graphics::driver::{ClearFlags, Driver, SwapchainDesc, BACKGROUND_COLOR};
use crate::graphics::swap_chain_resources::SwapChainResources;
use crate::{engine_debug, engine_error, engine_info, engine_warn};

const SOURCE: &str = "prev::GraphicsDevice";

/// Back buffers in the swap chain
pub const BACK_BUFFER_COUNT: u32 = 2;

/// Depth value written by `start_frame`
pub const CLEAR_DEPTH: f32 = 1.0;

/// Graphics device over a concrete [`Driver`]
pub struct GraphicsDevice<D: Driver> {
    driver: D,
    config: GraphicsConfig,
    adapter: AdapterInfo,
    catalog: DisplayModeCatalog,
    capability_tier: CapabilityTier,
    resources: Option<SwapChainResources>,
    /// Window resized since the last buffer resize
    refresh_pending: bool,
    alive: bool,
}

impl<D: Driver> GraphicsDevice<D> {
    /// Create the device and swap chain and build the first resource set
    ///
    /// The swap chain is sized to the catalog's selected mode.
    ///
    /// # Arguments
    ///
    /// * `driver` - Driver bound to the target window
    /// * `config` - Vsync and initial fullscreen state
    /// * `adapter` - Adapter description captured at startup
    /// * `catalog` - Supported display modes
    ///
    /// # Errors
    ///
    /// - `UnsupportedCapabilityError` if no requested tier is supported
    /// - `ResourceCreationError` naming the stage that failed
    ///
    /// Nothing created by a failed call survives it.
    pub fn initialize(
        mut driver: D,
        config: GraphicsConfig,
        adapter: AdapterInfo,
        catalog: DisplayModeCatalog,
    ) -> Result<Self> {
        let mode = *catalog.selected_mode();
        let desc = SwapchainDesc {
            width: mode.width,
            height: mode.height,
            format: CATALOG_PIXEL_FORMAT,
            refresh_rate: if config.vsync {
                mode.refresh_rate
            } else {
                RefreshRate::new(0, 1)
            },
            buffer_count: BACK_BUFFER_COUNT,
            fullscreen: config.fullscreen,
            vsync: config.vsync,
        };

        let capability_tier =
            match driver.create_device_and_swapchain(&desc, &REQUESTED_CAPABILITY_TIERS) {
                Ok(tier) => tier,
                Err(e) => {
                    driver.destroy_swapchain();
                    driver.destroy_device();
                    engine_error!(SOURCE, "Device creation failed: {}", e);
                    return Err(e);
                }
            };

        engine_info!(
            SOURCE,
            "{} device created: tier {}, {} ({} buffers, vsync {})",
            driver.name(),
            capability_tier,
            mode,
            BACK_BUFFER_COUNT,
            if config.vsync { "on" } else { "off" }
        );

        // From here on, Drop tears down whatever exists.
        let mut device = Self {
            driver,
            config,
            adapter,
            catalog,
            capability_tier,
            resources: None,
            refresh_pending: false,
            alive: true,
        };

        let (width, height) = device
            .driver
            .back_buffer_size()
            .unwrap_or((mode.width, mode.height));
        let resources = SwapChainResources::build(&mut device.driver, width, height)
            .map_err(|e| {
                engine_error!(SOURCE, "Initial resource build failed: {}", e);
                e
            })?;
        resources.bind(&mut device.driver);
        device.resources = Some(resources);

        Ok(device)
    }

    // ===== FRAME =====

    /// Clear the back buffer to the background color and the depth plane to 1.0
    ///
    /// # Errors
    ///
    /// `InvalidState` when there are no valid resources (failed transition or
    /// torn-down device), or the driver error.
    pub fn start_frame(&mut self) -> Result<()> {
        let resources = self.resources.as_ref().ok_or_else(|| {
            Error::InvalidState("no swap chain resources to render into".to_string())
        })?;
        let render_target = resources.render_target_view();
        let depth_stencil = resources.depth_stencil_view();

        self.driver.begin_frame()?;
        self.driver.clear_render_target(render_target, BACKGROUND_COLOR)?;
        self.driver
            .clear_depth_stencil(depth_stencil, ClearFlags::DEPTH, CLEAR_DEPTH, 0)
    }

    /// Present the swap chain (sync interval 1 with vsync, else 0)
    pub fn end_frame(&mut self) -> Result<()> {
        if self.resources.is_none() {
            return Err(Error::InvalidState(
                "no swap chain resources to present".to_string(),
            ));
        }
        self.driver.present(self.config.sync_interval())
    }

    // ===== DISPLAY MODE =====

    /// Run the resize protocol for catalog entry `index`
    ///
    /// `index` wraps into the catalog; the wrapped index is committed before
    /// any driver call. The protocol always rebuilds the resource set, even
    /// when neither the resolution nor the fullscreen state changes.
    ///
    /// # Errors
    ///
    /// `TransitionError` naming the failing step. The device is then left
    /// without resources and won't render until a later transition succeeds.
    pub fn recreate_for_mode(&mut self, index: isize, going_fullscreen: bool) -> Result<()> {
        if !self.alive {
            return Err(Error::InvalidState("device has been torn down".to_string()));
        }

        self.catalog.set_index(index);
        let mode = self.catalog.selected_mode().with_unspecified_refresh();
        engine_debug!(
            SOURCE,
            "Transition to {} ({})",
            mode,
            if going_fullscreen { "fullscreen" } else { "windowed" }
        );

        match self.resize_protocol(&mode, going_fullscreen) {
            Ok(()) => {
                engine_info!(
                    SOURCE,
                    "Display mode is now {} ({})",
                    mode,
                    if self.config.fullscreen { "fullscreen" } else { "windowed" }
                );
                Ok(())
            }
            Err(e) => {
                self.release_resources();
                engine_error!(SOURCE, "{}", e);
                Err(e)
            }
        }
    }

    fn resize_protocol(&mut self, mode: &DisplayMode, going_fullscreen: bool) -> Result<()> {
        let live_fullscreen = self
            .driver
            .fullscreen_state()
            .map_err(|e| TransitionStep::QueryFullscreenState.error(e))?;

        if live_fullscreen != going_fullscreen {
            if going_fullscreen {
                // The output must accept the mode before exclusive fullscreen.
                self.driver
                    .resize_target(mode)
                    .map_err(|e| TransitionStep::ResizeTarget.error(e))?;
                self.driver
                    .set_fullscreen_state(true, mode)
                    .map_err(|e| TransitionStep::EnterFullscreen.error(e))?;
                self.config.fullscreen = true;
            } else {
                self.driver
                    .set_fullscreen_state(false, mode)
                    .map_err(|e| TransitionStep::LeaveFullscreen.error(e))?;
                self.config.fullscreen = false;
                self.driver
                    .fit_window_to_client(mode.width, mode.height)
                    .map_err(|e| TransitionStep::FitWindow.error(e))?;
            }
        } else {
            self.config.fullscreen = live_fullscreen;
        }

        let resized = self.driver.resize_target(mode);
        self.release_resources();
        resized.map_err(|e| TransitionStep::ResizeTarget.error(e))?;

        self.rebuild_resources()
    }

    // ===== SWAP-CHAIN REFRESH =====

    /// Note a new client-area size; the swap chain needs a refresh afterwards
    ///
    /// A zero size (minimized window) is ignored.
    pub fn on_window_resized(&mut self, width: u32, height: u32) {
        if !self.alive || width == 0 || height == 0 {
            return;
        }
        self.driver.window_resized(width, height);
        self.refresh_pending = true;
    }

    /// True when the back buffers no longer match the window or the surface
    pub fn needs_swap_chain_refresh(&self) -> bool {
        self.alive && (self.refresh_pending || self.driver.is_swapchain_stale())
    }

    /// Resize the back buffers to the current target and rebuild the resource set
    ///
    /// Neither the selected mode nor the fullscreen state changes. Like a
    /// transition, this is only valid between frames.
    ///
    /// # Errors
    ///
    /// `TransitionError` for the buffer resize or the rebuild stage. The
    /// device is then left without resources, as after a failed transition.
    pub fn refresh_swap_chain(&mut self) -> Result<()> {
        if !self.alive {
            return Err(Error::InvalidState("device has been torn down".to_string()));
        }
        self.release_resources();
        match self.rebuild_resources() {
            Ok(()) => {
                if let Some(resources) = &self.resources {
                    let (width, height) = resources.size();
                    engine_debug!(SOURCE, "Swap chain refreshed at {}x{}", width, height);
                }
                Ok(())
            }
            Err(e) => {
                engine_error!(SOURCE, "Swap chain refresh failed: {}", e);
                Err(e)
            }
        }
    }

    /// Resize the back buffers, then build and bind a resource set at their size
    ///
    /// The previous set must already be released.
    fn rebuild_resources(&mut self) -> Result<()> {
        self.refresh_pending = false;
        self.driver
            .resize_buffers()
            .map_err(|e| TransitionStep::ResizeBuffers.error(e))?;
        let (width, height) = self
            .driver
            .back_buffer_size()
            .map_err(|e| TransitionStep::ResizeBuffers.error(e))?;

        let resources = SwapChainResources::build(&mut self.driver, width, height)
            .map_err(|e| match e {
                Error::ResourceCreationError { stage, message } => Error::TransitionError {
                    step: TransitionStep::RebuildResources(stage),
                    message,
                },
                other => TransitionStep::ResizeBuffers.error(other),
            })?;
        resources.bind(&mut self.driver);
        self.resources = Some(resources);
        Ok(())
    }

    /// Unbind and destroy the current resource set, if any
    fn release_resources(&mut self) {
        self.driver.clear_state();
        if let Some(resources) = self.resources.take() {
            resources.release(&mut self.driver);
        }
    }

    // ===== TEARDOWN =====

    /// Release resources, swap chain and device, in reverse creation order
    ///
    /// Idempotent. Leaves exclusive fullscreen first.
    pub fn teardown(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;

        self.release_resources();

        if let Ok(true) = self.driver.fullscreen_state() {
            let mode = *self.catalog.selected_mode();
            if let Err(e) = self.driver.set_fullscreen_state(false, &mode) {
                engine_warn!(SOURCE, "Could not leave fullscreen before teardown: {}", e);
            }
        }

        self.driver.destroy_swapchain();
        self.driver.destroy_device();
        engine_info!(SOURCE, "{} device torn down", self.driver.name());
    }

    // ===== ACCESSORS =====

    /// False after a failed transition or teardown
    pub fn is_renderable(&self) -> bool {
        self.alive && self.resources.is_some()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_fullscreen(&self) -> bool {
        self.config.fullscreen
    }

    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    pub fn adapter_info(&self) -> &AdapterInfo {
        &self.adapter
    }

    pub fn capability_tier(&self) -> CapabilityTier {
        self.capability_tier
    }

    pub fn catalog(&self) -> &DisplayModeCatalog {
        &self.catalog
    }

    pub fn selected_mode(&self) -> &DisplayMode {
        self.catalog.selected_mode()
    }

    /// (width, height) pairs of the catalog; refresh rate and format stripped
    pub fn supported_resolutions(&self) -> Vec<(u32, u32)> {
        self.catalog.resolutions()
    }

    /// Current resource set; invalid across transitions, re-fetch after each
    pub fn resources(&self) -> Option<&SwapChainResources> {
        self.resources.as_ref()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub(crate) fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

impl<D: Driver> Drop for GraphicsDevice<D> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "graphics_device_tests.rs"]
mod tests;
