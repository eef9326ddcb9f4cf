/// Driver objects of the Vulkan backend
///
/// Depth-stencil and rasterizer "states" have no Vulkan object of their own
/// outside a pipeline; they are kept as descriptors until a pipeline consumes
/// them.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;

use crate::error::Result;
use crate::graphics::driver::{
    ClearFlags, CompareFunc, CullMode, DepthStencilDesc, FillMode, RasterizerDesc,
};
use crate::engine_err;

use super::vulkan_context::DeviceContext;
use super::SOURCE;

pub(super) enum VulkanResource {
    /// One view per swap-chain image
    RenderTarget { views: Vec<vk::ImageView> },
    DepthStencilBuffer {
        image: vk::Image,
        allocation: Option<Allocation>,
        format: vk::Format,
    },
    DepthStencilState(DepthStencilDesc),
    /// The image is kept for transfer clears
    DepthStencilView { view: vk::ImageView, image: vk::Image },
    RasterizerState(RasterizerDesc),
}

impl VulkanResource {
    pub fn is_render_target(&self) -> bool {
        matches!(self, VulkanResource::RenderTarget { .. })
    }

    /// # Safety
    ///
    /// The GPU must no longer use the object.
    pub unsafe fn destroy(self, context: &mut DeviceContext) {
        match self {
            VulkanResource::RenderTarget { views } => {
                for view in views {
                    context.device.destroy_image_view(view, None);
                }
            }
            VulkanResource::DepthStencilBuffer { image, allocation, .. } => {
                context.device.destroy_image(image, None);
                if let Some(allocation) = allocation {
                    context.allocator.free(allocation).ok();
                }
            }
            VulkanResource::DepthStencilView { view, .. } => {
                context.device.destroy_image_view(view, None);
            }
            VulkanResource::DepthStencilState(_) | VulkanResource::RasterizerState(_) => {}
        }
    }
}

/// D24S8 when the device supports it as an attachment, else D32S8
pub(super) fn depth_stencil_format(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> Option<vk::Format> {
    [vk::Format::D24_UNORM_S8_UINT, vk::Format::D32_SFLOAT_S8_UINT]
        .into_iter()
        .find(|&format| {
            let properties = unsafe {
                instance.get_physical_device_format_properties(physical_device, format)
            };
            properties
                .optimal_tiling_features
                .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
        })
}

pub(super) fn color_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

pub(super) fn depth_stencil_range(aspect_mask: vk::ImageAspectFlags) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange { aspect_mask, ..color_range() }
}

pub(super) fn clear_aspects(flags: ClearFlags) -> vk::ImageAspectFlags {
    let mut aspects = vk::ImageAspectFlags::empty();
    if flags.contains(ClearFlags::DEPTH) {
        aspects |= vk::ImageAspectFlags::DEPTH;
    }
    if flags.contains(ClearFlags::STENCIL) {
        aspects |= vk::ImageAspectFlags::STENCIL;
    }
    aspects
}

/// Views on every swap-chain image; on failure the ones already made are destroyed
pub(super) fn create_render_target_views(
    device: &ash::Device,
    images: &[vk::Image],
    format: vk::Format,
) -> Result<Vec<vk::ImageView>> {
    let mut views = Vec::with_capacity(images.len());
    for &image in images {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(color_range());
        match unsafe { device.create_image_view(&create_info, None) } {
            Ok(view) => views.push(view),
            Err(e) => {
                for view in views {
                    unsafe { device.destroy_image_view(view, None) };
                }
                return Err(engine_err!(SOURCE, "Failed to create render-target view: {:?}", e));
            }
        }
    }
    Ok(views)
}

pub(super) fn create_depth_stencil_image(
    context: &mut DeviceContext,
    width: u32,
    height: u32,
    format: vk::Format,
) -> Result<VulkanResource> {
    let image_info = vk::ImageCreateInfo::default()
        .image_type(vk::ImageType::TYPE_2D)
        .format(format)
        .extent(vk::Extent3D { width, height, depth: 1 })
        .mip_levels(1)
        .array_layers(1)
        .samples(vk::SampleCountFlags::TYPE_1)
        .tiling(vk::ImageTiling::OPTIMAL)
        .usage(
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST,
        )
        .sharing_mode(vk::SharingMode::EXCLUSIVE)
        .initial_layout(vk::ImageLayout::UNDEFINED);

    unsafe {
        let image = context
            .device
            .create_image(&image_info, None)
            .map_err(|e| engine_err!(SOURCE, "Failed to create depth-stencil image: {:?}", e))?;

        let requirements = context.device.get_image_memory_requirements(image);
        let allocation = match context.allocator.allocate(&AllocationCreateDesc {
            name: "depth_stencil_buffer",
            requirements,
            location: MemoryLocation::GpuOnly,
            linear: false,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        }) {
            Ok(allocation) => allocation,
            Err(e) => {
                context.device.destroy_image(image, None);
                return Err(engine_err!(SOURCE, "Failed to allocate depth-stencil memory: {:?}", e));
            }
        };

        if let Err(e) = context
            .device
            .bind_image_memory(image, allocation.memory(), allocation.offset())
        {
            context.device.destroy_image(image, None);
            context.allocator.free(allocation).ok();
            return Err(engine_err!(SOURCE, "Failed to bind depth-stencil memory: {:?}", e));
        }

        Ok(VulkanResource::DepthStencilBuffer {
            image,
            allocation: Some(allocation),
            format,
        })
    }
}

pub(super) fn create_depth_stencil_image_view(
    device: &ash::Device,
    image: vk::Image,
    format: vk::Format,
) -> Result<VulkanResource> {
    let create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .subresource_range(depth_stencil_range(
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
        ));
    let view = unsafe { device.create_image_view(&create_info, None) }
        .map_err(|e| engine_err!(SOURCE, "Failed to create depth-stencil view: {:?}", e))?;
    Ok(VulkanResource::DepthStencilView { view, image })
}

// ============================================================================
// State conversions, recorded when states are bound
// ============================================================================

pub(super) fn compare_op(func: CompareFunc) -> vk::CompareOp {
    match func {
        CompareFunc::Never => vk::CompareOp::NEVER,
        CompareFunc::Less => vk::CompareOp::LESS,
        CompareFunc::Equal => vk::CompareOp::EQUAL,
        CompareFunc::LessEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareFunc::Greater => vk::CompareOp::GREATER,
        CompareFunc::NotEqual => vk::CompareOp::NOT_EQUAL,
        CompareFunc::GreaterEqual => vk::CompareOp::GREATER_OR_EQUAL,
        CompareFunc::Always => vk::CompareOp::ALWAYS,
    }
}

pub(super) fn polygon_mode(mode: FillMode) -> vk::PolygonMode {
    match mode {
        FillMode::Solid => vk::PolygonMode::FILL,
        FillMode::Wireframe => vk::PolygonMode::LINE,
    }
}

pub(super) fn cull_mode(mode: CullMode) -> vk::CullModeFlags {
    match mode {
        CullMode::None => vk::CullModeFlags::NONE,
        CullMode::Front => vk::CullModeFlags::FRONT,
        CullMode::Back => vk::CullModeFlags::BACK,
    }
}
