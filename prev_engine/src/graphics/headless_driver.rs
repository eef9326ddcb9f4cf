/// HeadlessDriver - in-memory driver simulating an adapter, outputs and a swap chain
///
/// No GPU is touched. The driver enforces the rules a real swap chain has:
///
/// - exclusive fullscreen is only accepted for a resolution the output lists
/// - back buffers can't be resized while a render-target view on them is alive
/// - depth-stencil views need an existing depth-stencil buffer
///
/// It backs CI, servers without a display, and the lifecycle tests.

use glam::Vec4;
use slotmap::SlotMap;

use crate::error::{Error, Result};
use crate::graphics::display_mode::{
    AdapterInfo, CapabilityTier, DisplayMode, PixelFormat, RefreshRate,
};
use crate::graphics::graphics_device::GraphicsDevice;
use crate::graphics::driver::{
    ClearFlags, DepthStencilDesc, Driver, RasterizerDesc, ResourceId, SwapchainDesc, Viewport,
};
use crate::{engine_bail, engine_debug, engine_warn};

const SOURCE: &str = "prev::headless";

// ============================================================================
// Virtual display
// ============================================================================

/// Description of the simulated machine
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualDisplay {
    /// `None` simulates a machine without adapter
    pub adapter: Option<AdapterInfo>,

    /// Raw mode list of each output, in driver order; the first is primary
    pub outputs: Vec<Vec<DisplayMode>>,

    /// Capability tiers the simulated device supports
    pub capability_tiers: Vec<CapabilityTier>,

    /// Initial client size of the simulated window
    pub window_size: (u32, u32),
}

impl Default for VirtualDisplay {
    fn default() -> Self {
        Self {
            adapter: Some(AdapterInfo::from_bytes("PrevEngine Headless Adapter", 1024 * 1024 * 1024)),
            outputs: vec![standard_modes()],
            capability_tiers: vec![
                CapabilityTier::new(1, 3),
                CapabilityTier::new(1, 2),
                CapabilityTier::new(1, 1),
                CapabilityTier::new(1, 0),
            ],
            window_size: (1280, 720),
        }
    }
}

impl VirtualDisplay {
    /// One output listing `resolutions` at 60 Hz
    pub fn with_resolutions(resolutions: &[(u32, u32)]) -> Self {
        Self {
            outputs: vec![resolutions
                .iter()
                .map(|&(w, h)| mode(w, h, 60))
                .collect()],
            ..Self::default()
        }
    }

    /// Adapter present, but no output attached
    pub fn without_outputs() -> Self {
        Self { outputs: Vec::new(), ..Self::default() }
    }

    /// No adapter at all
    pub fn without_adapter() -> Self {
        Self { adapter: None, ..Self::default() }
    }

    pub fn with_capability_tiers(mut self, tiers: Vec<CapabilityTier>) -> Self {
        self.capability_tiers = tiers;
        self
    }

    fn primary_output(&self) -> Option<&[DisplayMode]> {
        self.outputs.first().map(Vec::as_slice)
    }

    /// Whether the primary output lists this resolution
    pub fn supports(&self, width: u32, height: u32) -> bool {
        self.primary_output()
            .map(|modes| modes.iter().any(|m| m.width == width && m.height == height))
            .unwrap_or(false)
    }
}

fn mode(width: u32, height: u32, hz: u32) -> DisplayMode {
    DisplayMode::new(width, height, RefreshRate::new(hz, 1), PixelFormat::R8G8B8A8Unorm)
}

/// Typical monitor mode list, width-major with refresh variants adjacent
pub fn standard_modes() -> Vec<DisplayMode> {
    vec![
        mode(640, 480, 60),
        mode(800, 600, 60),
        mode(800, 600, 75),
        mode(1024, 768, 60),
        mode(1280, 720, 60),
        mode(1600, 900, 60),
        mode(1920, 1080, 60),
        mode(1920, 1080, 144),
    ]
}

// ============================================================================
// Driver state
// ============================================================================

/// Kind of a simulated driver object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessResource {
    RenderTargetView { width: u32, height: u32 },
    DepthStencilBuffer { width: u32, height: u32 },
    DepthStencilState,
    DepthStencilView { buffer: ResourceId },
    RasterizerState,
}

#[derive(Debug, Clone, Copy)]
struct HeadlessSwapchain {
    target_size: (u32, u32),
    buffer_size: (u32, u32),
    buffer_count: u32,
    fullscreen: bool,
}

/// What is bound to the simulated command context
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundState {
    pub render_target: Option<ResourceId>,
    pub depth_stencil_view: Option<ResourceId>,
    pub depth_stencil_state: Option<ResourceId>,
    pub rasterizer_state: Option<ResourceId>,
    pub viewport: Option<Viewport>,
}

/// Counters exposed for inspection
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeadlessStats {
    pub frames_presented: u64,
    pub last_sync_interval: Option<u32>,
    pub buffer_resizes: u64,
    pub fullscreen_switches: u64,
    pub last_clear_color: Option<Vec4>,
}

/// Driver without GPU
pub struct HeadlessDriver {
    display: VirtualDisplay,
    device: Option<CapabilityTier>,
    swapchain: Option<HeadlessSwapchain>,
    window_size: (u32, u32),
    /// Window resized since the last buffer resize
    stale: bool,
    resources: SlotMap<ResourceId, HeadlessResource>,
    bound: BoundState,
    stats: HeadlessStats,
}

impl HeadlessDriver {
    pub fn new(display: VirtualDisplay) -> Self {
        let window_size = display.window_size;
        Self {
            display,
            device: None,
            swapchain: None,
            window_size,
            stale: false,
            resources: SlotMap::with_key(),
            bound: BoundState::default(),
            stats: HeadlessStats::default(),
        }
    }

    pub fn display(&self) -> &VirtualDisplay {
        &self.display
    }

    /// Client size of the simulated window
    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.swapchain.map(|s| s.target_size)
    }

    pub fn buffer_size(&self) -> Option<(u32, u32)> {
        self.swapchain.map(|s| s.buffer_size)
    }

    pub fn buffer_count(&self) -> Option<u32> {
        self.swapchain.map(|s| s.buffer_count)
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn has_swapchain(&self) -> bool {
        self.swapchain.is_some()
    }

    pub fn bound(&self) -> &BoundState {
        &self.bound
    }

    pub fn stats(&self) -> &HeadlessStats {
        &self.stats
    }

    pub fn resource(&self, id: ResourceId) -> Option<&HeadlessResource> {
        self.resources.get(id)
    }

    /// Simulate the monitor being unplugged: the primary output lists no mode
    pub fn detach_outputs(&mut self) {
        engine_warn!(SOURCE, "Outputs detached");
        self.display.outputs.clear();
    }

    /// Plug a primary output back in
    pub fn attach_output(&mut self, modes: Vec<DisplayMode>) {
        self.display.outputs.insert(0, modes);
    }

    fn count_render_target_views(&self) -> usize {
        self.resources
            .values()
            .filter(|r| matches!(r, HeadlessResource::RenderTargetView { .. }))
            .count()
    }

    fn swapchain_mut(&mut self) -> Result<&mut HeadlessSwapchain> {
        match self.swapchain.as_mut() {
            Some(swapchain) => Ok(swapchain),
            None => Err(Error::BackendError("no swap chain".to_string())),
        }
    }

    fn require_device(&self) -> Result<()> {
        if self.device.is_none() {
            engine_bail!(SOURCE, "No device");
        }
        Ok(())
    }
}

impl Driver for HeadlessDriver {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn adapter_info(&self) -> Result<AdapterInfo> {
        self.display
            .adapter
            .clone()
            .ok_or_else(|| Error::AdapterQueryError("no adapter found".to_string()))
    }

    fn output_modes(&self, format: PixelFormat) -> Result<Vec<DisplayMode>> {
        if self.display.adapter.is_none() {
            return Err(Error::AdapterQueryError("no adapter found".to_string()));
        }
        let modes = self
            .display
            .primary_output()
            .ok_or_else(|| Error::AdapterQueryError("adapter has no output".to_string()))?;
        Ok(modes
            .iter()
            .filter(|m| m.pixel_format == format)
            .copied()
            .collect())
    }

    fn create_device_and_swapchain(
        &mut self,
        desc: &SwapchainDesc,
        tiers: &[CapabilityTier],
    ) -> Result<CapabilityTier> {
        if self.device.is_some() {
            engine_bail!(SOURCE, "Device already created");
        }
        let tier = tiers
            .iter()
            .copied()
            .find(|t| self.display.capability_tiers.contains(t))
            .ok_or_else(|| {
                Error::UnsupportedCapabilityError(format!(
                    "none of the requested tiers {:?} is supported (device supports {:?})",
                    tiers.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    self.display
                        .capability_tiers
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                ))
            })?;

        if desc.width == 0 || desc.height == 0 {
            engine_bail!(SOURCE, "Invalid swap chain size {}x{}", desc.width, desc.height);
        }
        if desc.fullscreen && !self.display.supports(desc.width, desc.height) {
            engine_bail!(
                SOURCE,
                "Output does not support {}x{} in fullscreen",
                desc.width,
                desc.height
            );
        }

        self.device = Some(tier);
        self.swapchain = Some(HeadlessSwapchain {
            target_size: (desc.width, desc.height),
            buffer_size: (desc.width, desc.height),
            buffer_count: desc.buffer_count,
            fullscreen: desc.fullscreen,
        });
        if !desc.fullscreen {
            self.window_size = (desc.width, desc.height);
        }
        engine_debug!(SOURCE, "Swap chain {}x{} created", desc.width, desc.height);
        Ok(tier)
    }

    fn destroy_swapchain(&mut self) {
        self.swapchain = None;
        self.stale = false;
    }

    fn destroy_device(&mut self) {
        if self.device.take().is_some() && !self.resources.is_empty() {
            engine_warn!(
                SOURCE,
                "Device destroyed with {} live objects",
                self.resources.len()
            );
            self.resources.clear();
        }
        self.bound = BoundState::default();
    }

    fn fullscreen_state(&self) -> Result<bool> {
        self.swapchain
            .map(|s| s.fullscreen)
            .ok_or_else(|| Error::BackendError("no swap chain".to_string()))
    }

    fn set_fullscreen_state(&mut self, fullscreen: bool, _mode: &DisplayMode) -> Result<()> {
        let (width, height) = self.swapchain_mut()?.target_size;
        if fullscreen && !self.display.supports(width, height) {
            engine_bail!(SOURCE, "Output does not support {}x{} in fullscreen", width, height);
        }
        let swapchain = self.swapchain_mut()?;
        if swapchain.fullscreen != fullscreen {
            swapchain.fullscreen = fullscreen;
            self.stats.fullscreen_switches += 1;
        }
        Ok(())
    }

    fn resize_target(&mut self, mode: &DisplayMode) -> Result<()> {
        let fullscreen = self.swapchain_mut()?.fullscreen;
        if fullscreen && !self.display.supports(mode.width, mode.height) {
            engine_bail!(SOURCE, "Output does not support {}x{}", mode.width, mode.height);
        }
        self.swapchain_mut()?.target_size = (mode.width, mode.height);
        if !fullscreen {
            self.window_size = (mode.width, mode.height);
        }
        Ok(())
    }

    fn fit_window_to_client(&mut self, width: u32, height: u32) -> Result<()> {
        self.window_size = (width, height);
        Ok(())
    }

    fn resize_buffers(&mut self) -> Result<()> {
        let views = self.count_render_target_views();
        if views > 0 {
            engine_bail!(
                SOURCE,
                "Back buffer is still referenced by {} render-target view(s)",
                views
            );
        }
        let swapchain = self.swapchain_mut()?;
        swapchain.buffer_size = swapchain.target_size;
        self.stale = false;
        self.stats.buffer_resizes += 1;
        Ok(())
    }

    fn back_buffer_size(&self) -> Result<(u32, u32)> {
        self.buffer_size()
            .ok_or_else(|| Error::BackendError("no swap chain".to_string()))
    }

    fn window_resized(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
        if let Some(swapchain) = self.swapchain.as_mut() {
            if !swapchain.fullscreen {
                swapchain.target_size = (width, height);
            }
            self.stale = true;
        }
    }

    fn is_swapchain_stale(&self) -> bool {
        self.stale
    }

    fn clear_state(&mut self) {
        self.bound = BoundState::default();
    }

    fn create_render_target_view(&mut self) -> Result<ResourceId> {
        let (width, height) = self.swapchain_mut()?.buffer_size;
        Ok(self
            .resources
            .insert(HeadlessResource::RenderTargetView { width, height }))
    }

    fn create_depth_stencil_buffer(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<ResourceId> {
        self.require_device()?;
        if !format.is_depth_stencil() {
            engine_bail!(SOURCE, "{:?} is not a depth-stencil format", format);
        }
        if width == 0 || height == 0 {
            engine_bail!(SOURCE, "Invalid depth-stencil size {}x{}", width, height);
        }
        Ok(self
            .resources
            .insert(HeadlessResource::DepthStencilBuffer { width, height }))
    }

    fn create_depth_stencil_state(&mut self, _desc: &DepthStencilDesc) -> Result<ResourceId> {
        self.require_device()?;
        Ok(self.resources.insert(HeadlessResource::DepthStencilState))
    }

    fn create_depth_stencil_view(&mut self, buffer: ResourceId) -> Result<ResourceId> {
        self.require_device()?;
        match self.resources.get(buffer) {
            Some(HeadlessResource::DepthStencilBuffer { .. }) => {}
            _ => engine_bail!(SOURCE, "Depth-stencil view needs a live depth-stencil buffer"),
        }
        Ok(self
            .resources
            .insert(HeadlessResource::DepthStencilView { buffer }))
    }

    fn create_rasterizer_state(&mut self, _desc: &RasterizerDesc) -> Result<ResourceId> {
        self.require_device()?;
        Ok(self.resources.insert(HeadlessResource::RasterizerState))
    }

    fn release(&mut self, id: ResourceId) {
        self.resources.remove(id);
    }

    fn live_resource_count(&self) -> usize {
        self.resources.len()
    }

    fn bind_render_targets(&mut self, render_target: ResourceId, depth_stencil_view: ResourceId) {
        self.bound.render_target = Some(render_target);
        self.bound.depth_stencil_view = Some(depth_stencil_view);
    }

    fn bind_depth_stencil_state(&mut self, state: ResourceId) {
        self.bound.depth_stencil_state = Some(state);
    }

    fn bind_rasterizer_state(&mut self, state: ResourceId) {
        self.bound.rasterizer_state = Some(state);
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.bound.viewport = Some(*viewport);
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.swapchain_mut().map(|_| ())
    }

    fn clear_render_target(&mut self, render_target: ResourceId, color: Vec4) -> Result<()> {
        match self.resources.get(render_target) {
            Some(HeadlessResource::RenderTargetView { .. }) => {}
            _ => engine_bail!(SOURCE, "Clear of a stale render-target view"),
        }
        self.stats.last_clear_color = Some(color);
        Ok(())
    }

    fn clear_depth_stencil(
        &mut self,
        view: ResourceId,
        flags: ClearFlags,
        _depth: f32,
        _stencil: u8,
    ) -> Result<()> {
        match self.resources.get(view) {
            Some(HeadlessResource::DepthStencilView { .. }) => {}
            _ => engine_bail!(SOURCE, "Clear of a stale depth-stencil view"),
        }
        if flags.is_empty() {
            engine_bail!(SOURCE, "Depth-stencil clear without planes");
        }
        Ok(())
    }

    fn present(&mut self, sync_interval: u32) -> Result<()> {
        self.swapchain_mut()?;
        self.stats.frames_presented += 1;
        self.stats.last_sync_interval = Some(sync_interval);
        Ok(())
    }
}

impl GraphicsDevice<HeadlessDriver> {
    /// Unplug the simulated monitor under a live device
    pub fn simulate_output_loss(&mut self) {
        self.driver_mut().detach_outputs();
    }

    /// Plug the standard monitor back in
    pub fn simulate_output_restore(&mut self) {
        self.driver_mut().attach_output(standard_modes());
    }
}

#[cfg(test)]
#[path = "headless_driver_tests.rs"]
mod tests;
