/// Mock Driver for unit tests (no GPU required)
///
/// Records every driver call as a string, in call order, and can be told to
/// fail one named call. Used to check the ordering of the resize protocol.

#[cfg(test)]
use std::cell::{Cell, RefCell};

#[cfg(test)]
use glam::Vec4;
#[cfg(test)]
use slotmap::SlotMap;

#[cfg(test)]
use crate::error::{Error, Result};
#[cfg(test)]
use crate::graphics::display_mode::{
    AdapterInfo, CapabilityTier, DisplayMode, PixelFormat, RefreshRate,
};
#[cfg(test)]
use crate::graphics::driver::{
    ClearFlags, DepthStencilDesc, Driver, RasterizerDesc, ResourceId, SwapchainDesc, Viewport,
};

#[cfg(test)]
pub struct MockDriver {
    pub calls: RefCell<Vec<String>>,
    pub modes: Vec<DisplayMode>,
    pub adapter: Option<AdapterInfo>,
    pub supported_tiers: Vec<CapabilityTier>,
    pub fullscreen: Cell<bool>,
    /// Name of the call that returns an error
    pub fail_on: Option<&'static str>,
    /// Size requested by the last swap-chain creation, target resize or window resize
    pub target_size: (u32, u32),
    /// Size of the back buffers, follows `target_size` on `resize_buffers`
    pub buffer_size: (u32, u32),
    pub stale: bool,
    resources: SlotMap<ResourceId, &'static str>,
}

#[cfg(test)]
impl MockDriver {
    /// Catalog of [(800,600), (1024,768), (1920,1080)] at 60 Hz
    pub fn new() -> Self {
        Self::with_resolutions(&[(800, 600), (1024, 768), (1920, 1080)])
    }

    pub fn with_resolutions(resolutions: &[(u32, u32)]) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            modes: resolutions
                .iter()
                .map(|&(w, h)| {
                    DisplayMode::new(w, h, RefreshRate::new(60, 1), PixelFormat::R8G8B8A8Unorm)
                })
                .collect(),
            adapter: Some(AdapterInfo::from_bytes("Mock Adapter", 512 * 1024 * 1024)),
            supported_tiers: vec![CapabilityTier::new(1, 2), CapabilityTier::new(1, 1)],
            fullscreen: Cell::new(false),
            fail_on: None,
            target_size: (0, 0),
            buffer_size: (0, 0),
            stale: false,
            resources: SlotMap::with_key(),
        }
    }

    pub fn failing_on(mut self, call: &'static str) -> Self {
        self.fail_on = Some(call);
        self
    }

    fn record(&self, name: &'static str, detail: String) -> Result<()> {
        let entry = if detail.is_empty() {
            name.to_string()
        } else {
            format!("{} {}", name, detail)
        };
        self.calls.borrow_mut().push(entry);
        if self.fail_on == Some(name) {
            return Err(Error::BackendError(format!("mock failure in {}", name)));
        }
        Ok(())
    }

    fn create(&mut self, name: &'static str, detail: String) -> Result<ResourceId> {
        self.record(name, detail)?;
        Ok(self.resources.insert(name))
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Number of calls whose entry starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Index of the first call entry equal to `entry`
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|c| c == entry)
    }
}

#[cfg(test)]
impl Driver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn adapter_info(&self) -> Result<AdapterInfo> {
        self.record("adapter_info", String::new())?;
        self.adapter
            .clone()
            .ok_or_else(|| Error::AdapterQueryError("no adapter".to_string()))
    }

    fn output_modes(&self, _format: PixelFormat) -> Result<Vec<DisplayMode>> {
        self.record("output_modes", String::new())?;
        Ok(self.modes.clone())
    }

    fn create_device_and_swapchain(
        &mut self,
        desc: &SwapchainDesc,
        tiers: &[CapabilityTier],
    ) -> Result<CapabilityTier> {
        self.record(
            "create_device_and_swapchain",
            format!("{}x{}", desc.width, desc.height),
        )?;
        self.fullscreen.set(desc.fullscreen);
        self.target_size = (desc.width, desc.height);
        self.buffer_size = self.target_size;
        tiers
            .iter()
            .copied()
            .find(|t| self.supported_tiers.contains(t))
            .ok_or_else(|| Error::UnsupportedCapabilityError("no tier".to_string()))
    }

    fn destroy_swapchain(&mut self) {
        let _ = self.record("destroy_swapchain", String::new());
    }

    fn destroy_device(&mut self) {
        let _ = self.record("destroy_device", String::new());
    }

    fn fullscreen_state(&self) -> Result<bool> {
        self.record("fullscreen_state", String::new())?;
        Ok(self.fullscreen.get())
    }

    fn set_fullscreen_state(&mut self, fullscreen: bool, mode: &DisplayMode) -> Result<()> {
        self.record(
            "set_fullscreen_state",
            format!("{} {}x{}", fullscreen, mode.width, mode.height),
        )?;
        self.fullscreen.set(fullscreen);
        Ok(())
    }

    fn resize_target(&mut self, mode: &DisplayMode) -> Result<()> {
        self.record("resize_target", format!("{}x{}", mode.width, mode.height))?;
        self.target_size = (mode.width, mode.height);
        Ok(())
    }

    fn fit_window_to_client(&mut self, width: u32, height: u32) -> Result<()> {
        self.record("fit_window_to_client", format!("{}x{}", width, height))
    }

    fn resize_buffers(&mut self) -> Result<()> {
        self.stale = false;
        self.record("resize_buffers", String::new())?;
        self.buffer_size = self.target_size;
        Ok(())
    }

    fn back_buffer_size(&self) -> Result<(u32, u32)> {
        Ok(self.buffer_size)
    }

    fn window_resized(&mut self, width: u32, height: u32) {
        let _ = self.record("window_resized", format!("{}x{}", width, height));
        if !self.fullscreen.get() {
            self.target_size = (width, height);
        }
        self.stale = true;
    }

    fn is_swapchain_stale(&self) -> bool {
        self.stale
    }

    fn clear_state(&mut self) {
        let _ = self.record("clear_state", String::new());
    }

    fn create_render_target_view(&mut self) -> Result<ResourceId> {
        self.create("create_render_target_view", String::new())
    }

    fn create_depth_stencil_buffer(
        &mut self,
        width: u32,
        height: u32,
        _format: PixelFormat,
    ) -> Result<ResourceId> {
        self.create("create_depth_stencil_buffer", format!("{}x{}", width, height))
    }

    fn create_depth_stencil_state(&mut self, _desc: &DepthStencilDesc) -> Result<ResourceId> {
        self.create("create_depth_stencil_state", String::new())
    }

    fn create_depth_stencil_view(&mut self, _buffer: ResourceId) -> Result<ResourceId> {
        self.create("create_depth_stencil_view", String::new())
    }

    fn create_rasterizer_state(&mut self, _desc: &RasterizerDesc) -> Result<ResourceId> {
        self.create("create_rasterizer_state", String::new())
    }

    fn release(&mut self, id: ResourceId) {
        if let Some(name) = self.resources.remove(id) {
            let _ = self.record("release", name.to_string());
        }
    }

    fn live_resource_count(&self) -> usize {
        self.resources.len()
    }

    fn bind_render_targets(&mut self, _render_target: ResourceId, _depth_stencil_view: ResourceId) {
        let _ = self.record("bind_render_targets", String::new());
    }

    fn bind_depth_stencil_state(&mut self, _state: ResourceId) {
        let _ = self.record("bind_depth_stencil_state", String::new());
    }

    fn bind_rasterizer_state(&mut self, _state: ResourceId) {
        let _ = self.record("bind_rasterizer_state", String::new());
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        let _ = self.record(
            "set_viewport",
            format!("{}x{}", viewport.width, viewport.height),
        );
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.record("begin_frame", String::new())
    }

    fn clear_render_target(&mut self, _render_target: ResourceId, color: Vec4) -> Result<()> {
        self.record(
            "clear_render_target",
            format!("{} {} {} {}", color.x, color.y, color.z, color.w),
        )
    }

    fn clear_depth_stencil(
        &mut self,
        _view: ResourceId,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    ) -> Result<()> {
        self.record(
            "clear_depth_stencil",
            format!("{:?} {} {}", flags, depth, stencil),
        )
    }

    fn present(&mut self, sync_interval: u32) -> Result<()> {
        self.record("present", sync_interval.to_string())
    }
}
