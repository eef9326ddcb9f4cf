/// DeviceContext - logical device, queues, allocator and frame sync objects
///
/// Created by `create_device_and_swapchain`, destroyed by `destroy_device`.
/// One frame is in flight at a time: a single command buffer guarded by a
/// single fence.

use std::mem::ManuallyDrop;

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};

use crate::error::{Error, Result};
use crate::graphics::display_mode::CapabilityTier;
use crate::engine_err;

use super::SOURCE;

pub(super) struct DeviceContext {
    pub device: ash::Device,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
    /// Dropped before the device is destroyed
    pub allocator: ManuallyDrop<Allocator>,
    pub command_pool: vk::CommandPool,
    pub command_buffer: vk::CommandBuffer,
    pub in_flight_fence: vk::Fence,
    pub image_available: vk::Semaphore,
}

/// Pick the first requested tier the physical device supports
pub(super) fn select_tier(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    tiers: &[CapabilityTier],
) -> Result<CapabilityTier> {
    let properties = unsafe { instance.get_physical_device_properties(physical_device) };
    let supported = CapabilityTier::new(
        vk::api_version_major(properties.api_version),
        vk::api_version_minor(properties.api_version),
    );
    tiers
        .iter()
        .copied()
        .find(|tier| *tier <= supported)
        .ok_or_else(|| {
            Error::UnsupportedCapabilityError(format!(
                "device supports Vulkan {}, requested {}",
                supported,
                tiers
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
}

/// Graphics and present queue family indices for `surface`
pub(super) fn find_queue_families(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
) -> Option<(u32, u32)> {
    let families =
        unsafe { instance.get_physical_device_queue_family_properties(physical_device) };

    let graphics = families
        .iter()
        .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))? as u32;

    let present = (0..families.len() as u32).find(|&index| unsafe {
        surface_loader
            .get_physical_device_surface_support(physical_device, index, surface)
            .unwrap_or(false)
    })?;

    Some((graphics, present))
}

impl DeviceContext {
    pub fn new(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Self> {
        let (graphics_family, present_family) =
            find_queue_families(instance, surface_loader, surface, physical_device).ok_or_else(
                || engine_err!(SOURCE, "No graphics queue family able to present to the window"),
            )?;

        unsafe {
            let queue_priorities = [1.0];
            let mut queue_create_infos = vec![vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family)
                .queue_priorities(&queue_priorities)];
            if present_family != graphics_family {
                queue_create_infos.push(
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(present_family)
                        .queue_priorities(&queue_priorities),
                );
            }

            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create logical device: {:?}", e))?;

            let graphics_queue = device.get_device_queue(graphics_family, 0);
            let present_queue = device.get_device_queue(present_family, 0);

            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    device.destroy_device(None);
                    return Err(engine_err!(SOURCE, "Failed to create GPU allocator: {:?}", e));
                }
            };

            let mut context = Self {
                device,
                graphics_queue,
                present_queue,
                allocator: ManuallyDrop::new(allocator),
                command_pool: vk::CommandPool::null(),
                command_buffer: vk::CommandBuffer::null(),
                in_flight_fence: vk::Fence::null(),
                image_available: vk::Semaphore::null(),
            };

            if let Err(e) = context.create_frame_objects(graphics_family) {
                context.destroy();
                return Err(e);
            }
            Ok(context)
        }
    }

    unsafe fn create_frame_objects(&mut self, graphics_family: u32) -> Result<()> {
        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(graphics_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        self.command_pool = self
            .device
            .create_command_pool(&pool_info, None)
            .map_err(|e| engine_err!(SOURCE, "Failed to create command pool: {:?}", e))?;

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        self.command_buffer = self
            .device
            .allocate_command_buffers(&alloc_info)
            .map_err(|e| engine_err!(SOURCE, "Failed to allocate command buffer: {:?}", e))?
            .into_iter()
            .next()
            .ok_or_else(|| engine_err!(SOURCE, "Driver returned no command buffer"))?;

        let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
        self.in_flight_fence = self
            .device
            .create_fence(&fence_info, None)
            .map_err(|e| engine_err!(SOURCE, "Failed to create fence: {:?}", e))?;

        self.image_available = self
            .device
            .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
            .map_err(|e| engine_err!(SOURCE, "Failed to create semaphore: {:?}", e))?;
        Ok(())
    }

    /// Wait until the GPU is idle; errors are ignored (device lost is final anyway)
    pub fn wait_idle(&self) {
        unsafe {
            self.device.device_wait_idle().ok();
        }
    }

    /// Destroy sync objects, pool, allocator and device, in that order
    ///
    /// # Safety
    ///
    /// Every object created from this device must already be destroyed.
    pub unsafe fn destroy(&mut self) {
        self.device.device_wait_idle().ok();
        if self.image_available != vk::Semaphore::null() {
            self.device.destroy_semaphore(self.image_available, None);
        }
        if self.in_flight_fence != vk::Fence::null() {
            self.device.destroy_fence(self.in_flight_fence, None);
        }
        if self.command_pool != vk::CommandPool::null() {
            self.device.destroy_command_pool(self.command_pool, None);
        }
        ManuallyDrop::drop(&mut self.allocator);
        self.device.destroy_device(None);
    }
}
