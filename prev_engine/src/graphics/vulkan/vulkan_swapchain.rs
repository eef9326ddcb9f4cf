/// Swapchain - Vulkan swap chain and its per-image present semaphores

use ash::vk;

use crate::error::Result;
use crate::{engine_debug, engine_err};

use super::vulkan_context::DeviceContext;
use super::SOURCE;

pub(super) struct Swapchain {
    pub loader: ash::khr::swapchain::Device,
    pub handle: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
    pub present_mode: vk::PresentModeKHR,
    /// One per image, signaled by the frame submit and waited by present
    pub render_finished: Vec<vk::Semaphore>,
}

/// FIFO with vsync; otherwise IMMEDIATE, then MAILBOX, then FIFO (always available)
pub(super) fn choose_present_mode(available: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }
    [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::MAILBOX]
        .into_iter()
        .find(|mode| available.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// Prefer the RGBA back-buffer format, then BGRA, then whatever comes first
pub(super) fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    [vk::Format::R8G8B8A8_UNORM, vk::Format::B8G8R8A8_UNORM]
        .into_iter()
        .find_map(|wanted| formats.iter().find(|f| f.format == wanted).copied())
        .or_else(|| formats.first().copied())
}

/// Surface extent if the platform fixes it, else the target clamped to the limits
pub(super) fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, target: (u32, u32)) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: target.0.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: target.1.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

impl Swapchain {
    /// Create a swap chain, retiring `old` if given
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instance: &ash::Instance,
        context: &DeviceContext,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        physical_device: vk::PhysicalDevice,
        target: (u32, u32),
        buffer_count: u32,
        vsync: bool,
        old: Option<Swapchain>,
    ) -> Result<Self> {
        unsafe {
            let capabilities = surface_loader
                .get_physical_device_surface_capabilities(physical_device, surface)
                .map_err(|e| engine_err!(SOURCE, "Failed to get surface capabilities: {:?}", e))?;
            let formats = surface_loader
                .get_physical_device_surface_formats(physical_device, surface)
                .map_err(|e| engine_err!(SOURCE, "Failed to get surface formats: {:?}", e))?;
            let present_modes = surface_loader
                .get_physical_device_surface_present_modes(physical_device, surface)
                .map_err(|e| engine_err!(SOURCE, "Failed to get present modes: {:?}", e))?;

            let surface_format = choose_surface_format(&formats)
                .ok_or_else(|| engine_err!(SOURCE, "Surface reports no format"))?;
            let extent = choose_extent(&capabilities, target);
            if extent.width == 0 || extent.height == 0 {
                return Err(engine_err!(
                    SOURCE,
                    "Surface has a zero extent ({}x{}), window minimized?",
                    extent.width,
                    extent.height
                ));
            }
            let present_mode = choose_present_mode(&present_modes, vsync);

            let mut image_count = buffer_count.max(capabilities.min_image_count);
            if capabilities.max_image_count > 0 {
                image_count = image_count.min(capabilities.max_image_count);
            }

            let old_handle = old.as_ref().map(|s| s.handle).unwrap_or(vk::SwapchainKHR::null());
            let create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(surface)
                .min_image_count(image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(present_mode)
                .clipped(true)
                .old_swapchain(old_handle);

            let loader = match &old {
                Some(previous) => previous.loader.clone(),
                None => ash::khr::swapchain::Device::new(instance, &context.device),
            };
            let created = loader.create_swapchain(&create_info, None);

            // The old swap chain is retired either way.
            if let Some(previous) = old {
                previous.destroy(&context.device);
            }
            let handle =
                created.map_err(|e| engine_err!(SOURCE, "Failed to create swapchain: {:?}", e))?;

            let images = match loader.get_swapchain_images(handle) {
                Ok(images) => images,
                Err(e) => {
                    loader.destroy_swapchain(handle, None);
                    return Err(engine_err!(SOURCE, "Failed to get swapchain images: {:?}", e));
                }
            };

            let mut swapchain = Self {
                loader,
                handle,
                images,
                format: surface_format.format,
                extent,
                present_mode,
                render_finished: Vec::new(),
            };
            for _ in 0..swapchain.images.len() {
                match context
                    .device
                    .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                {
                    Ok(semaphore) => swapchain.render_finished.push(semaphore),
                    Err(e) => {
                        swapchain.destroy(&context.device);
                        return Err(engine_err!(SOURCE, "Failed to create semaphore: {:?}", e));
                    }
                }
            }

            engine_debug!(
                SOURCE,
                "Swapchain {}x{} ({} images, {:?}, {:?})",
                extent.width,
                extent.height,
                swapchain.images.len(),
                surface_format.format,
                present_mode
            );
            Ok(swapchain)
        }
    }

    /// # Safety
    ///
    /// The device must be idle and no view on the images may be alive.
    pub unsafe fn destroy(self, device: &ash::Device) {
        for semaphore in &self.render_finished {
            device.destroy_semaphore(*semaphore, None);
        }
        self.loader.destroy_swapchain(self.handle, None);
    }
}
