/// GraphicsBackend - closed set of backends and the factory that builds them
///
/// The backend set is fixed at compile time. `GraphicsBackend` is a tagged
/// union over `GraphicsDevice<D>` for each driver, and every operation
/// dispatches with a `match`.

use std::fmt;
use std::sync::Arc;

use winit::window::Window;

use crate::error::{Error, Result};
use crate::event::Event;
use crate::graphics::config::GraphicsConfig;
use crate::graphics::display_mode::{AdapterInfo, CapabilityTier, DisplayMode};
use crate::graphics::display_mode_catalog::DisplayModeCatalog;
use crate::graphics::display_mode_switcher::DisplayState;
use crate::graphics::driver::Driver;
use crate::graphics::graphics_device::GraphicsDevice;
use crate::graphics::headless_driver::{HeadlessDriver, VirtualDisplay};
#[cfg(feature = "vulkan")]
use crate::graphics::vulkan::VulkanDriver;
use crate::{engine_debug, engine_error, engine_info, engine_trace};

const SOURCE: &str = "prev::GraphicsBackendFactory";

/// Window the backend renders into; the tag is the windowing API
#[derive(Clone)]
pub enum WindowTarget {
    /// Native window created with winit
    Winit(Arc<Window>),
    /// Simulated display, for the headless backend
    Virtual(VirtualDisplay),
}

impl WindowTarget {
    pub fn api_name(&self) -> &'static str {
        match self {
            WindowTarget::Winit(_) => "winit",
            WindowTarget::Virtual(_) => "virtual",
        }
    }
}

impl fmt::Debug for WindowTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowTarget::Winit(window) => f.debug_tuple("Winit").field(&window.id()).finish(),
            WindowTarget::Virtual(display) => f.debug_tuple("Virtual").field(display).finish(),
        }
    }
}

/// Backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Headless,
    Vulkan,
}

impl BackendKind {
    /// Whether this build contains the backend
    pub fn is_available(self) -> bool {
        match self {
            BackendKind::Headless => true,
            BackendKind::Vulkan => cfg!(feature = "vulkan"),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Headless => f.write_str("headless"),
            BackendKind::Vulkan => f.write_str("Vulkan"),
        }
    }
}

/// A fully initialized device of one backend
pub enum GraphicsBackend {
    Headless(GraphicsDevice<HeadlessDriver>),
    #[cfg(feature = "vulkan")]
    Vulkan(GraphicsDevice<VulkanDriver>),
}

macro_rules! dispatch {
    ($backend:expr, $device:ident => $body:expr) => {
        match $backend {
            GraphicsBackend::Headless($device) => $body,
            #[cfg(feature = "vulkan")]
            GraphicsBackend::Vulkan($device) => $body,
        }
    };
}

impl GraphicsBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            GraphicsBackend::Headless(_) => BackendKind::Headless,
            #[cfg(feature = "vulkan")]
            GraphicsBackend::Vulkan(_) => BackendKind::Vulkan,
        }
    }

    pub fn start_frame(&mut self) -> Result<()> {
        dispatch!(self, device => device.start_frame())
    }

    pub fn end_frame(&mut self) -> Result<()> {
        dispatch!(self, device => device.end_frame())
    }

    /// Device-level event hook
    ///
    /// A window resize marks the swap chain for a refresh before the next frame.
    pub fn on_event(&mut self, event: &Event) {
        engine_trace!("prev::GraphicsBackend", "{} backend saw {}", self.kind(), event.name());
        if let Event::WindowResize { width, height } = *event {
            dispatch!(self, device => device.on_window_resized(width, height))
        }
    }

    pub fn needs_swap_chain_refresh(&self) -> bool {
        dispatch!(self, device => device.needs_swap_chain_refresh())
    }

    pub fn refresh_swap_chain(&mut self) -> Result<()> {
        dispatch!(self, device => device.refresh_swap_chain())
    }

    pub fn toggle_fullscreen(&mut self) -> Result<()> {
        dispatch!(self, device => device.toggle_fullscreen())
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        dispatch!(self, device => device.set_fullscreen(fullscreen))
    }

    pub fn change_resolution(&mut self, index: isize) -> Result<()> {
        dispatch!(self, device => device.change_resolution(index))
    }

    pub fn supported_resolutions(&self) -> Vec<(u32, u32)> {
        dispatch!(self, device => device.supported_resolutions())
    }

    pub fn selected_mode(&self) -> DisplayMode {
        dispatch!(self, device => *device.selected_mode())
    }

    pub fn display_state(&self) -> DisplayState {
        dispatch!(self, device => device.display_state())
    }

    pub fn adapter_info(&self) -> &AdapterInfo {
        dispatch!(self, device => device.adapter_info())
    }

    pub fn capability_tier(&self) -> CapabilityTier {
        dispatch!(self, device => device.capability_tier())
    }

    pub fn config(&self) -> &GraphicsConfig {
        dispatch!(self, device => device.config())
    }

    pub fn is_fullscreen(&self) -> bool {
        dispatch!(self, device => device.is_fullscreen())
    }

    pub fn is_renderable(&self) -> bool {
        dispatch!(self, device => device.is_renderable())
    }

    /// Driver objects currently alive
    pub fn live_resource_count(&self) -> usize {
        dispatch!(self, device => device.driver().live_resource_count())
    }

    pub fn teardown(&mut self) {
        dispatch!(self, device => device.teardown())
    }

    /// The headless device, if this is the headless backend
    pub fn as_headless(&self) -> Option<&GraphicsDevice<HeadlessDriver>> {
        match self {
            GraphicsBackend::Headless(device) => Some(device),
            #[cfg(feature = "vulkan")]
            _ => None,
        }
    }

    pub fn as_headless_mut(&mut self) -> Option<&mut GraphicsDevice<HeadlessDriver>> {
        match self {
            GraphicsBackend::Headless(device) => Some(device),
            #[cfg(feature = "vulkan")]
            _ => None,
        }
    }
}

impl fmt::Debug for GraphicsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsBackend")
            .field("kind", &self.kind())
            .field("mode", &self.selected_mode())
            .field("fullscreen", &self.is_fullscreen())
            .finish()
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Builds one backend from a [`BackendKind`]
pub struct GraphicsBackendFactory;

impl GraphicsBackendFactory {
    /// Create a fully initialized backend, or `None`
    ///
    /// The failure reason is logged. The caller owns the returned backend;
    /// dropping it tears the device down.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use prev_engine::prev::graphics::{
    ///     BackendKind, GraphicsBackendFactory, GraphicsConfig, VirtualDisplay, WindowTarget,
    /// };
    ///
    /// let backend = GraphicsBackendFactory::create(
    ///     WindowTarget::Virtual(VirtualDisplay::default()),
    ///     GraphicsConfig::default(),
    ///     BackendKind::Headless,
    /// );
    /// assert!(backend.is_some());
    /// ```
    pub fn create(
        window: WindowTarget,
        config: GraphicsConfig,
        kind: BackendKind,
    ) -> Option<GraphicsBackend> {
        match Self::try_create(window, config, kind) {
            Ok(backend) => Some(backend),
            Err(e) => {
                engine_error!(SOURCE, "Unable to create the {} backend: {}", kind, e);
                None
            }
        }
    }

    /// Same as [`create`](Self::create) but returns the error
    pub fn try_create(
        window: WindowTarget,
        config: GraphicsConfig,
        kind: BackendKind,
    ) -> Result<GraphicsBackend> {
        engine_debug!(
            SOURCE,
            "Creating {} backend on a {} window",
            kind,
            window.api_name()
        );
        match kind {
            BackendKind::Headless => {
                let display = match window {
                    WindowTarget::Virtual(display) => display,
                    WindowTarget::Winit(window) => {
                        let size = window.inner_size();
                        VirtualDisplay {
                            window_size: (size.width, size.height),
                            ..VirtualDisplay::default()
                        }
                    }
                };
                let device = Self::build_device(HeadlessDriver::new(display), config)?;
                Ok(GraphicsBackend::Headless(device))
            }
            BackendKind::Vulkan => Self::create_vulkan(window, config),
        }
    }

    #[cfg(feature = "vulkan")]
    fn create_vulkan(window: WindowTarget, config: GraphicsConfig) -> Result<GraphicsBackend> {
        match window {
            WindowTarget::Winit(window) => {
                let driver = VulkanDriver::new(window, &config)?;
                Ok(GraphicsBackend::Vulkan(Self::build_device(driver, config)?))
            }
            WindowTarget::Virtual(_) => Err(Error::BackendError(
                "the Vulkan backend needs a native window".to_string(),
            )),
        }
    }

    #[cfg(not(feature = "vulkan"))]
    fn create_vulkan(_window: WindowTarget, _config: GraphicsConfig) -> Result<GraphicsBackend> {
        Err(Error::BackendError(
            "the Vulkan backend is not compiled in (enable the `vulkan` feature)".to_string(),
        ))
    }

    /// Adapter query, catalog, then device
    fn build_device<D: Driver>(driver: D, config: GraphicsConfig) -> Result<GraphicsDevice<D>> {
        let adapter = driver.adapter_info().map_err(|e| match e {
            Error::AdapterQueryError(_) => e,
            other => Error::AdapterQueryError(other.message().to_string()),
        })?;
        engine_info!(
            SOURCE,
            "Adapter: {} ({} MB dedicated memory)",
            adapter.description,
            adapter.dedicated_memory_mb
        );

        let catalog = DisplayModeCatalog::enumerate(&driver)?;
        engine_debug!(
            SOURCE,
            "{} display modes, starting at {}",
            catalog.len(),
            catalog.selected_mode()
        );

        GraphicsDevice::initialize(driver, config, adapter, catalog)
    }
}

#[cfg(test)]
#[path = "graphics_backend_tests.rs"]
mod tests;
