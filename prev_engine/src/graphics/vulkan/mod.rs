/// VulkanDriver - `Driver` implementation on ash
///
/// The instance, surface and physical device live as long as the driver.
/// The logical device and the swap chain are created and destroyed through
/// the `Driver` calls, so a `GraphicsDevice` controls their lifetime.
///
/// Frames record transfer clears only: the acquired swap-chain image is moved
/// to TRANSFER_DST, cleared, moved to PRESENT_SRC and presented. Exclusive
/// fullscreen goes through winit.

mod vulkan_context;
mod vulkan_debug;
mod vulkan_resources;
mod vulkan_swapchain;

use std::ffi::{CStr, CString};
use std::sync::Arc;

use ash::vk;
use glam::Vec4;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use slotmap::SlotMap;
use winit::dpi::PhysicalSize;
use winit::monitor::{MonitorHandle, VideoModeHandle};
use winit::window::{Fullscreen, Window};

use crate::error::{Error, Result};
use crate::graphics::config::GraphicsConfig;
use crate::graphics::display_mode::{
    AdapterInfo, CapabilityTier, DisplayMode, PixelFormat, RefreshRate,
};
use crate::graphics::driver::{
    ClearFlags, DepthStencilDesc, Driver, RasterizerDesc, ResourceId, SwapchainDesc, Viewport,
};
use crate::{engine_bail, engine_debug, engine_err, engine_info, engine_trace, engine_warn};

use vulkan_context::DeviceContext;
use vulkan_resources::VulkanResource;
use vulkan_swapchain::Swapchain;

pub(crate) const SOURCE: &str = "prev::vulkan";

/// Validation layer enabled with `GraphicsConfig::enable_validation`
const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Bit depths winit reports for 8-bit-per-channel color modes
const COLOR_BIT_DEPTHS: [u16; 2] = [32, 24];

/// Pipeline-facing state recorded by the bind calls
#[derive(Debug, Clone, Copy, Default)]
struct BoundState {
    render_target: Option<ResourceId>,
    depth_stencil_view: Option<ResourceId>,
    depth_compare: Option<vk::CompareOp>,
    depth_write: bool,
    polygon_mode: Option<vk::PolygonMode>,
    cull_mode: Option<vk::CullModeFlags>,
    viewport: Option<vk::Viewport>,
}

pub struct VulkanDriver {
    window: Arc<Window>,
    monitor: Option<MonitorHandle>,

    entry: ash::Entry,
    instance: ash::Instance,
    debug_utils: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    surface_loader: ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
    adapter: AdapterInfo,

    context: Option<DeviceContext>,
    swapchain: Option<Swapchain>,
    target_size: (u32, u32),
    buffer_count: u32,
    vsync: bool,
    /// Surface changed under the swap chain (resize, out-of-date or suboptimal)
    stale: bool,

    resources: SlotMap<ResourceId, VulkanResource>,
    bound: BoundState,
    /// Swap-chain image acquired for the frame being recorded
    frame_image: Option<u32>,
}

impl VulkanDriver {
    /// Load Vulkan, create the instance and surface, and pick the adapter
    ///
    /// # Errors
    ///
    /// `BackendError` when Vulkan is missing or the window can't host a
    /// surface, `AdapterQueryError` when no device can present to it.
    pub fn new(window: Arc<Window>, config: &GraphicsConfig) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| engine_err!(SOURCE, "Failed to load Vulkan library: {:?}", e))?;

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| engine_err!(SOURCE, "Invalid application name: {}", e))?;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"PrevEngine")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window
                .display_handle()
                .map_err(|e| engine_err!(SOURCE, "Failed to get display handle: {}", e))?;
            let mut extension_names =
                ash_window::enumerate_required_extensions(display_handle.as_raw())
                    .map_err(|e| engine_err!(SOURCE, "Failed to get required extensions: {}", e))?
                    .to_vec();

            let validation = config.enable_validation && Self::validation_available(&entry);
            if config.enable_validation && !validation {
                engine_warn!(SOURCE, "Validation requested but {:?} is not installed", VALIDATION_LAYER);
            }
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }
            let layer_names = if validation {
                vec![VALIDATION_LAYER.as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);
            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create Vulkan instance: {:?}", e))?;

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
            let monitor = window.current_monitor().or_else(|| window.primary_monitor());

            // From here on Drop releases whatever is already created.
            let mut driver = Self {
                window: Arc::clone(&window),
                monitor,
                entry,
                instance,
                debug_utils: None,
                surface_loader,
                surface: vk::SurfaceKHR::null(),
                physical_device: vk::PhysicalDevice::null(),
                adapter: AdapterInfo::from_bytes("", 0),
                context: None,
                swapchain: None,
                target_size: (0, 0),
                buffer_count: 0,
                stale: false,
                vsync: config.vsync,
                resources: SlotMap::with_key(),
                bound: BoundState::default(),
                frame_image: None,
            };

            if validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&driver.entry, &driver.instance);
                let messenger = debug_utils
                    .create_debug_utils_messenger(&vulkan_debug::messenger_create_info(), None)
                    .map_err(|e| engine_err!(SOURCE, "Failed to create debug messenger: {:?}", e))?;
                driver.debug_utils = Some((debug_utils, messenger));
            }

            let window_handle = window
                .window_handle()
                .map_err(|e| engine_err!(SOURCE, "Failed to get window handle: {}", e))?;
            driver.surface = ash_window::create_surface(
                &driver.entry,
                &driver.instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| engine_err!(SOURCE, "Failed to create surface: {:?}", e))?;

            driver.physical_device = driver.pick_physical_device()?;
            driver.adapter = driver.describe_adapter();
            engine_info!(SOURCE, "Vulkan adapter: {}", driver.adapter.description);

            Ok(driver)
        }
    }

    fn validation_available(entry: &ash::Entry) -> bool {
        unsafe { entry.enumerate_instance_layer_properties() }
            .map(|layers| {
                layers.iter().any(|layer| unsafe {
                    CStr::from_ptr(layer.layer_name.as_ptr()) == VALIDATION_LAYER
                })
            })
            .unwrap_or(false)
    }

    /// First discrete GPU able to present, else any device able to present
    fn pick_physical_device(&self) -> Result<vk::PhysicalDevice> {
        let devices = unsafe { self.instance.enumerate_physical_devices() }.map_err(|e| {
            Error::AdapterQueryError(format!("failed to enumerate physical devices: {:?}", e))
        })?;

        let presentable: Vec<vk::PhysicalDevice> = devices
            .into_iter()
            .filter(|&device| {
                vulkan_context::find_queue_families(
                    &self.instance,
                    &self.surface_loader,
                    self.surface,
                    device,
                )
                .is_some()
            })
            .collect();

        presentable
            .iter()
            .copied()
            .find(|&device| {
                let properties = unsafe { self.instance.get_physical_device_properties(device) };
                properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU
            })
            .or_else(|| presentable.first().copied())
            .ok_or_else(|| {
                Error::AdapterQueryError("no Vulkan device can present to the window".to_string())
            })
    }

    fn describe_adapter(&self) -> AdapterInfo {
        unsafe {
            let properties = self.instance.get_physical_device_properties(self.physical_device);
            let name = CStr::from_ptr(properties.device_name.as_ptr())
                .to_string_lossy()
                .into_owned();
            let memory = self
                .instance
                .get_physical_device_memory_properties(self.physical_device);
            let dedicated: u64 = memory.memory_heaps[..memory.memory_heap_count as usize]
                .iter()
                .filter(|heap| heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL))
                .map(|heap| heap.size)
                .sum();
            AdapterInfo::from_bytes(name, dedicated)
        }
    }

    fn context(&self) -> Result<&DeviceContext> {
        self.context
            .as_ref()
            .ok_or_else(|| Error::BackendError("no device".to_string()))
    }

    fn swapchain(&self) -> Result<&Swapchain> {
        self.swapchain
            .as_ref()
            .ok_or_else(|| Error::BackendError("no swap chain".to_string()))
    }

    /// Exclusive video mode of the monitor matching `width`x`height`, highest refresh first
    fn find_video_mode(&self, width: u32, height: u32) -> Option<VideoModeHandle> {
        self.monitor
            .as_ref()?
            .video_modes()
            .filter(|m| {
                let size = m.size();
                size.width == width && size.height == height && m.bit_depth() >= 24
            })
            .max_by_key(|m| m.refresh_rate_millihertz())
    }

    fn enter_fullscreen(&self, width: u32, height: u32) -> Result<()> {
        let Some(video_mode) = self.find_video_mode(width, height) else {
            engine_bail!(SOURCE, "Output does not support {}x{} in fullscreen", width, height);
        };
        self.window.set_fullscreen(Some(Fullscreen::Exclusive(video_mode)));
        Ok(())
    }

    fn image_barrier(
        &self,
        image: vk::Image,
        range: vk::ImageSubresourceRange,
        (old_layout, src_access, src_stage): (vk::ImageLayout, vk::AccessFlags, vk::PipelineStageFlags),
        (new_layout, dst_access, dst_stage): (vk::ImageLayout, vk::AccessFlags, vk::PipelineStageFlags),
    ) -> Result<()> {
        let context = self.context()?;
        let barrier = vk::ImageMemoryBarrier::default()
            .old_layout(old_layout)
            .new_layout(new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(range)
            .src_access_mask(src_access)
            .dst_access_mask(dst_access);
        unsafe {
            context.device.cmd_pipeline_barrier(
                context.command_buffer,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
        Ok(())
    }

    fn current_image(&self) -> Result<(u32, vk::Image)> {
        let index = self
            .frame_image
            .ok_or_else(|| Error::BackendError("no frame in progress".to_string()))?;
        let image = self
            .swapchain()?
            .images
            .get(index as usize)
            .copied()
            .ok_or_else(|| Error::BackendError(format!("swap-chain image {} is gone", index)))?;
        Ok((index, image))
    }

    fn destroy_all_resources(&mut self) {
        let Some(context) = self.context.as_mut() else {
            return;
        };
        context.wait_idle();
        for (_, resource) in self.resources.drain() {
            unsafe { resource.destroy(context) };
        }
        self.bound = BoundState::default();
    }
}

impl Driver for VulkanDriver {
    fn name(&self) -> &'static str {
        "vulkan"
    }

    fn adapter_info(&self) -> Result<AdapterInfo> {
        Ok(self.adapter.clone())
    }

    fn output_modes(&self, format: PixelFormat) -> Result<Vec<DisplayMode>> {
        let monitor = self
            .monitor
            .as_ref()
            .ok_or_else(|| Error::AdapterQueryError("adapter has no output".to_string()))?;
        if format.is_depth_stencil() {
            return Ok(Vec::new());
        }
        Ok(monitor
            .video_modes()
            .filter(|m| COLOR_BIT_DEPTHS.contains(&m.bit_depth()))
            .map(|m| {
                let size = m.size();
                DisplayMode::new(
                    size.width,
                    size.height,
                    RefreshRate::new(m.refresh_rate_millihertz(), 1000),
                    format,
                )
            })
            .collect())
    }

    fn create_device_and_swapchain(
        &mut self,
        desc: &SwapchainDesc,
        tiers: &[CapabilityTier],
    ) -> Result<CapabilityTier> {
        if self.context.is_some() {
            engine_bail!(SOURCE, "Device already created");
        }
        let tier = vulkan_context::select_tier(&self.instance, self.physical_device, tiers)?;

        self.context = Some(DeviceContext::new(
            &self.instance,
            &self.surface_loader,
            self.surface,
            self.physical_device,
        )?);

        self.target_size = (desc.width, desc.height);
        self.buffer_count = desc.buffer_count;
        self.vsync = desc.vsync;
        if desc.fullscreen {
            self.enter_fullscreen(desc.width, desc.height)?;
        } else {
            let _ = self
                .window
                .request_inner_size(PhysicalSize::new(desc.width, desc.height));
        }

        let swapchain = Swapchain::new(
            &self.instance,
            self.context()?,
            &self.surface_loader,
            self.surface,
            self.physical_device,
            self.target_size,
            self.buffer_count,
            self.vsync,
            None,
        )?;
        self.swapchain = Some(swapchain);
        engine_debug!(SOURCE, "Device created for Vulkan {}", tier);
        Ok(tier)
    }

    fn destroy_swapchain(&mut self) {
        let Some(swapchain) = self.swapchain.take() else {
            return;
        };
        self.frame_image = None;
        if let Some(context) = self.context.as_ref() {
            context.wait_idle();
            unsafe { swapchain.destroy(&context.device) };
        }
    }

    fn destroy_device(&mut self) {
        if self.context.is_none() {
            return;
        }
        if !self.resources.is_empty() {
            engine_warn!(
                SOURCE,
                "Device destroyed with {} live objects",
                self.resources.len()
            );
        }
        self.destroy_all_resources();
        self.destroy_swapchain();
        if let Some(mut context) = self.context.take() {
            unsafe { context.destroy() };
        }
    }

    fn fullscreen_state(&self) -> Result<bool> {
        self.context()?;
        Ok(self.window.fullscreen().is_some())
    }

    fn set_fullscreen_state(&mut self, fullscreen: bool, mode: &DisplayMode) -> Result<()> {
        self.context()?;
        if fullscreen {
            self.enter_fullscreen(mode.width, mode.height)
        } else {
            self.window.set_fullscreen(None);
            Ok(())
        }
    }

    fn resize_target(&mut self, mode: &DisplayMode) -> Result<()> {
        self.context()?;
        if self.window.fullscreen().is_some() {
            self.enter_fullscreen(mode.width, mode.height)?;
        } else {
            let _ = self
                .window
                .request_inner_size(PhysicalSize::new(mode.width, mode.height));
        }
        self.target_size = (mode.width, mode.height);
        Ok(())
    }

    fn fit_window_to_client(&mut self, width: u32, height: u32) -> Result<()> {
        let _ = self.window.request_inner_size(PhysicalSize::new(width, height));
        Ok(())
    }

    fn resize_buffers(&mut self) -> Result<()> {
        let views = self.resources.values().filter(|r| r.is_render_target()).count();
        if views > 0 {
            engine_bail!(
                SOURCE,
                "Back buffer is still referenced by {} render-target view(s)",
                views
            );
        }
        // A failed resize leaves no swap chain; the next one starts fresh.
        let old = self.swapchain.take();
        self.frame_image = None;
        self.stale = false;

        let context = self.context()?;
        context.wait_idle();
        let swapchain = Swapchain::new(
            &self.instance,
            context,
            &self.surface_loader,
            self.surface,
            self.physical_device,
            self.target_size,
            self.buffer_count,
            self.vsync,
            old,
        )?;
        self.swapchain = Some(swapchain);
        Ok(())
    }

    fn back_buffer_size(&self) -> Result<(u32, u32)> {
        let extent = self.swapchain()?.extent;
        Ok((extent.width, extent.height))
    }

    fn window_resized(&mut self, width: u32, height: u32) {
        if self.window.fullscreen().is_none() {
            self.target_size = (width, height);
        }
        self.stale = true;
    }

    fn is_swapchain_stale(&self) -> bool {
        self.stale
    }

    fn clear_state(&mut self) {
        if let Some(context) = self.context.as_ref() {
            context.wait_idle();
        }
        self.bound = BoundState::default();
    }

    fn create_render_target_view(&mut self) -> Result<ResourceId> {
        let swapchain = self.swapchain()?;
        let views = vulkan_resources::create_render_target_views(
            &self.context()?.device,
            &swapchain.images,
            swapchain.format,
        )?;
        Ok(self.resources.insert(VulkanResource::RenderTarget { views }))
    }

    fn create_depth_stencil_buffer(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<ResourceId> {
        if !format.is_depth_stencil() {
            engine_bail!(SOURCE, "{:?} is not a depth-stencil format", format);
        }
        if width == 0 || height == 0 {
            engine_bail!(SOURCE, "Invalid depth-stencil size {}x{}", width, height);
        }
        let vk_format = vulkan_resources::depth_stencil_format(&self.instance, self.physical_device)
            .ok_or_else(|| engine_err!(SOURCE, "Device has no depth-stencil attachment format"))?;
        let context = self
            .context
            .as_mut()
            .ok_or_else(|| Error::BackendError("no device".to_string()))?;
        let resource = vulkan_resources::create_depth_stencil_image(context, width, height, vk_format)?;
        Ok(self.resources.insert(resource))
    }

    fn create_depth_stencil_state(&mut self, desc: &DepthStencilDesc) -> Result<ResourceId> {
        self.context()?;
        Ok(self.resources.insert(VulkanResource::DepthStencilState(*desc)))
    }

    fn create_depth_stencil_view(&mut self, buffer: ResourceId) -> Result<ResourceId> {
        let (image, format) = match self.resources.get(buffer) {
            Some(VulkanResource::DepthStencilBuffer { image, format, .. }) => (*image, *format),
            _ => engine_bail!(SOURCE, "Depth-stencil view needs a live depth-stencil buffer"),
        };
        let resource =
            vulkan_resources::create_depth_stencil_image_view(&self.context()?.device, image, format)?;
        Ok(self.resources.insert(resource))
    }

    fn create_rasterizer_state(&mut self, desc: &RasterizerDesc) -> Result<ResourceId> {
        self.context()?;
        Ok(self.resources.insert(VulkanResource::RasterizerState(*desc)))
    }

    fn release(&mut self, id: ResourceId) {
        let Some(resource) = self.resources.remove(id) else {
            return;
        };
        if let Some(context) = self.context.as_mut() {
            context.wait_idle();
            unsafe { resource.destroy(context) };
        }
    }

    fn live_resource_count(&self) -> usize {
        self.resources.len()
    }

    fn bind_render_targets(&mut self, render_target: ResourceId, depth_stencil_view: ResourceId) {
        self.bound.render_target = Some(render_target);
        self.bound.depth_stencil_view = Some(depth_stencil_view);
    }

    fn bind_depth_stencil_state(&mut self, state: ResourceId) {
        if let Some(VulkanResource::DepthStencilState(desc)) = self.resources.get(state) {
            self.bound.depth_compare = desc
                .depth_test
                .then(|| vulkan_resources::compare_op(desc.depth_func));
            self.bound.depth_write = desc.depth_write;
        }
    }

    fn bind_rasterizer_state(&mut self, state: ResourceId) {
        if let Some(VulkanResource::RasterizerState(desc)) = self.resources.get(state) {
            self.bound.polygon_mode = Some(vulkan_resources::polygon_mode(desc.fill_mode));
            self.bound.cull_mode = Some(vulkan_resources::cull_mode(desc.cull_mode));
        }
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.bound.viewport = Some(vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        });
        engine_trace!(SOURCE, "Bound state: {:?}", self.bound);
    }

    fn begin_frame(&mut self) -> Result<()> {
        if self.frame_image.is_some() {
            engine_bail!(SOURCE, "Previous frame was never presented");
        }
        let acquired = {
            let context = self.context()?;
            let swapchain = self.swapchain()?;
            unsafe {
                context
                    .device
                    .wait_for_fences(&[context.in_flight_fence], true, u64::MAX)
                    .map_err(|e| engine_err!(SOURCE, "Failed to wait for frame fence: {:?}", e))?;
                swapchain.loader.acquire_next_image(
                    swapchain.handle,
                    u64::MAX,
                    context.image_available,
                    vk::Fence::null(),
                )
            }
        };
        let image_index = match acquired {
            Ok((index, suboptimal)) => {
                self.stale |= suboptimal;
                index
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                self.stale = true;
                return Err(Error::BackendError("swap chain out of date".to_string()));
            }
            Err(e) => return Err(engine_err!(SOURCE, "Failed to acquire swap-chain image: {:?}", e)),
        };

        let context = self.context()?;
        unsafe {
            context
                .device
                .reset_command_buffer(context.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!(SOURCE, "Failed to reset command buffer: {:?}", e))?;
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            context
                .device
                .begin_command_buffer(context.command_buffer, &begin_info)
                .map_err(|e| engine_err!(SOURCE, "Failed to begin command buffer: {:?}", e))?;
        }
        self.frame_image = Some(image_index);

        let (_, image) = self.current_image()?;
        self.image_barrier(
            image,
            vulkan_resources::color_range(),
            (vk::ImageLayout::UNDEFINED, vk::AccessFlags::empty(), vk::PipelineStageFlags::TOP_OF_PIPE),
            (
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::AccessFlags::TRANSFER_WRITE,
                vk::PipelineStageFlags::TRANSFER,
            ),
        )
    }

    fn clear_render_target(&mut self, render_target: ResourceId, color: Vec4) -> Result<()> {
        if !matches!(self.resources.get(render_target), Some(VulkanResource::RenderTarget { .. })) {
            engine_bail!(SOURCE, "Clear of a stale render-target view");
        }
        let (_, image) = self.current_image()?;
        let context = self.context()?;
        let clear = vk::ClearColorValue { float32: color.to_array() };
        unsafe {
            context.device.cmd_clear_color_image(
                context.command_buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &clear,
                &[vulkan_resources::color_range()],
            );
        }
        Ok(())
    }

    fn clear_depth_stencil(
        &mut self,
        view: ResourceId,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    ) -> Result<()> {
        let image = match self.resources.get(view) {
            Some(VulkanResource::DepthStencilView { image, .. }) => *image,
            _ => engine_bail!(SOURCE, "Clear of a stale depth-stencil view"),
        };
        let aspects = vulkan_resources::clear_aspects(flags);
        if aspects.is_empty() {
            engine_bail!(SOURCE, "Depth-stencil clear without planes");
        }
        self.current_image()?;

        self.image_barrier(
            image,
            vulkan_resources::depth_stencil_range(
                vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
            ),
            (vk::ImageLayout::UNDEFINED, vk::AccessFlags::empty(), vk::PipelineStageFlags::TOP_OF_PIPE),
            (
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::AccessFlags::TRANSFER_WRITE,
                vk::PipelineStageFlags::TRANSFER,
            ),
        )?;

        let context = self.context()?;
        let clear = vk::ClearDepthStencilValue { depth, stencil: stencil as u32 };
        unsafe {
            context.device.cmd_clear_depth_stencil_image(
                context.command_buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &clear,
                &[vulkan_resources::depth_stencil_range(aspects)],
            );
        }
        Ok(())
    }

    fn present(&mut self, sync_interval: u32) -> Result<()> {
        let (index, image) = self.current_image()?;
        let fifo = self.swapchain()?.present_mode == vk::PresentModeKHR::FIFO;
        if (sync_interval > 0) != fifo {
            engine_trace!(
                SOURCE,
                "Sync interval {} differs from the swap-chain present mode",
                sync_interval
            );
        }

        self.image_barrier(
            image,
            vulkan_resources::color_range(),
            (
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::AccessFlags::TRANSFER_WRITE,
                vk::PipelineStageFlags::TRANSFER,
            ),
            (
                vk::ImageLayout::PRESENT_SRC_KHR,
                vk::AccessFlags::empty(),
                vk::PipelineStageFlags::BOTTOM_OF_PIPE,
            ),
        )?;
        self.frame_image = None;

        let context = self.context()?;
        let swapchain = self.swapchain()?;
        let render_finished = swapchain
            .render_finished
            .get(index as usize)
            .copied()
            .ok_or_else(|| Error::BackendError(format!("no semaphore for image {}", index)))?;

        let presented = unsafe {
            context
                .device
                .end_command_buffer(context.command_buffer)
                .map_err(|e| engine_err!(SOURCE, "Failed to end command buffer: {:?}", e))?;
            context
                .device
                .reset_fences(&[context.in_flight_fence])
                .map_err(|e| engine_err!(SOURCE, "Failed to reset frame fence: {:?}", e))?;

            let wait_semaphores = [context.image_available];
            let wait_stages = [vk::PipelineStageFlags::TRANSFER];
            let command_buffers = [context.command_buffer];
            let signal_semaphores = [render_finished];
            let submit_info = vk::SubmitInfo::default()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_stages)
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores);
            context
                .device
                .queue_submit(context.graphics_queue, &[submit_info], context.in_flight_fence)
                .map_err(|e| engine_err!(SOURCE, "Failed to submit frame: {:?}", e))?;

            let swapchains = [swapchain.handle];
            let image_indices = [index];
            let present_info = vk::PresentInfoKHR::default()
                .wait_semaphores(&signal_semaphores)
                .swapchains(&swapchains)
                .image_indices(&image_indices);
            swapchain.loader.queue_present(context.present_queue, &present_info)
        };

        // The frame was submitted; an outdated surface only needs a refresh.
        match presented {
            Ok(false) => Ok(()),
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                engine_debug!(SOURCE, "Swap chain out of date after present");
                self.stale = true;
                Ok(())
            }
            Err(e) => Err(engine_err!(SOURCE, "Failed to present: {:?}", e)),
        }
    }
}

impl Drop for VulkanDriver {
    fn drop(&mut self) {
        self.destroy_device();
        unsafe {
            if self.surface != vk::SurfaceKHR::null() {
                self.surface_loader.destroy_surface(self.surface, None);
            }
            if let Some((debug_utils, messenger)) = self.debug_utils.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_tests.rs"]
mod tests;
