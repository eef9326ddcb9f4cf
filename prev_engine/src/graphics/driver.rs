/// Driver trait - the contract between the device lifecycle and a GPU API
///
/// Every call the device lifecycle makes into a concrete API goes through this
/// trait. Drivers are constructed from a window target, so the window handle
/// never appears here.
///
/// Drivers hand out [`ResourceId`]s for the objects they create. The ids are
/// plain keys: holding one gives no access to the object, and the id becomes
/// stale once [`Driver::release`] is called on it.

use bitflags::bitflags;
use glam::Vec4;
use slotmap::new_key_type;

use crate::error::Result;
use crate::graphics::display_mode::{
    AdapterInfo, CapabilityTier, DisplayMode, PixelFormat, RefreshRate,
};

new_key_type! {
    /// Key of a driver object (view, buffer, state object)
    pub struct ResourceId;
}

// ============================================================================
// Descriptors
// ============================================================================

/// Swap chain creation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapchainDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Refresh rate requested in fullscreen (unspecified when vsync is off)
    pub refresh_rate: RefreshRate,
    pub buffer_count: u32,
    pub fullscreen: bool,
    pub vsync: bool,
}

/// Comparison function for depth and stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Stencil buffer update operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementSaturate,
    DecrementSaturate,
    Invert,
    Increment,
    Decrement,
}

/// Stencil behaviour for one face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilFaceDesc {
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub func: CompareFunc,
}

/// Depth-stencil state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilDesc {
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_func: CompareFunc,
    pub stencil_test: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
    pub front_face: StencilFaceDesc,
    pub back_face: StencilFaceDesc,
}

impl Default for DepthStencilDesc {
    /// Depth LESS with writes; stencil counts depth failures up on front
    /// faces and down on back faces.
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            depth_func: CompareFunc::Less,
            stencil_test: true,
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
            front_face: StencilFaceDesc {
                fail_op: StencilOp::Keep,
                depth_fail_op: StencilOp::Increment,
                pass_op: StencilOp::Keep,
                func: CompareFunc::Always,
            },
            back_face: StencilFaceDesc {
                fail_op: StencilOp::Keep,
                depth_fail_op: StencilOp::Decrement,
                pass_op: StencilOp::Keep,
                func: CompareFunc::Always,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Solid,
    Wireframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    Clockwise,
    CounterClockwise,
}

/// Rasterizer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterizerDesc {
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub depth_clip: bool,
    pub scissor: bool,
    pub multisample: bool,
    pub antialiased_lines: bool,
}

impl Default for RasterizerDesc {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::Solid,
            cull_mode: CullMode::Back,
            front_face: FrontFace::Clockwise,
            depth_clip: true,
            scissor: false,
            multisample: false,
            antialiased_lines: false,
        }
    }
}

/// Viewport covering the back buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-surface viewport, depth range 0..1
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

bitflags! {
    /// Which planes of a depth-stencil view to clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const DEPTH = 1 << 0;
        const STENCIL = 1 << 1;
    }
}

/// Background color of every frame (opaque blue)
pub const BACKGROUND_COLOR: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);

// ============================================================================
// Driver trait
// ============================================================================

/// Low-level GPU API used by [`GraphicsDevice`](crate::graphics::GraphicsDevice)
///
/// Calls are synchronous and made from the render-loop thread only. Failures
/// are returned as `Error::BackendError`; the caller decides which
/// lifecycle error they turn into.
pub trait Driver {
    /// Short backend name for logs ("headless", "vulkan")
    fn name(&self) -> &'static str;

    // ===== Queries =====

    /// Describe the primary adapter
    ///
    /// # Errors
    ///
    /// `AdapterQueryError` when the machine has no usable adapter.
    fn adapter_info(&self) -> Result<AdapterInfo>;

    /// All modes of the primary output for `format`, in driver order
    ///
    /// # Errors
    ///
    /// `AdapterQueryError` when there is no output or the list can't be read.
    fn output_modes(&self, format: PixelFormat) -> Result<Vec<DisplayMode>>;

    // ===== Device =====

    /// Create the logical device and swap chain
    ///
    /// `tiers` is ordered highest first; the driver accepts the first one it
    /// supports and returns it.
    ///
    /// # Errors
    ///
    /// `UnsupportedCapabilityError` when no tier matches, `BackendError` otherwise.
    fn create_device_and_swapchain(
        &mut self,
        desc: &SwapchainDesc,
        tiers: &[CapabilityTier],
    ) -> Result<CapabilityTier>;

    /// Destroy the swap chain (no-op if absent)
    fn destroy_swapchain(&mut self);

    /// Destroy the logical device (no-op if absent)
    fn destroy_device(&mut self);

    // ===== Display mode =====

    /// Live fullscreen state of the swap chain
    fn fullscreen_state(&self) -> Result<bool>;

    /// Enter or leave exclusive fullscreen
    ///
    /// When entering, the output must already accept `mode`.
    fn set_fullscreen_state(&mut self, fullscreen: bool, mode: &DisplayMode) -> Result<()>;

    /// Resize the swap-chain target (window client area or output mode)
    fn resize_target(&mut self, mode: &DisplayMode) -> Result<()>;

    /// Resize the OS window so its client area is `width`x`height`
    fn fit_window_to_client(&mut self, width: u32, height: u32) -> Result<()>;

    /// Resize the back buffers to the target size
    ///
    /// Count and format keep their swap-chain defaults; mode switches are allowed.
    /// Fails while a render-target view of the old buffers is still alive.
    /// Creates the buffers anew if an earlier resize left none.
    fn resize_buffers(&mut self) -> Result<()>;

    /// (width, height) of the current back buffers
    ///
    /// Can differ from the requested target when the surface fixes its size.
    fn back_buffer_size(&self) -> Result<(u32, u32)>;

    /// The OS window's client area is now `width`x`height`
    ///
    /// A windowed target follows it on the next `resize_buffers`.
    fn window_resized(&mut self, _width: u32, _height: u32) {}

    /// True once the back buffers no longer match the surface
    ///
    /// Set by a window resize or an out-of-date present, cleared by `resize_buffers`.
    fn is_swapchain_stale(&self) -> bool {
        false
    }

    // ===== Resources =====

    /// Unbind every resource from the command context
    fn clear_state(&mut self);

    /// Acquire the back buffer and create a render-target view on it
    fn create_render_target_view(&mut self) -> Result<ResourceId>;

    fn create_depth_stencil_buffer(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<ResourceId>;

    fn create_depth_stencil_state(&mut self, desc: &DepthStencilDesc) -> Result<ResourceId>;

    fn create_depth_stencil_view(&mut self, buffer: ResourceId) -> Result<ResourceId>;

    fn create_rasterizer_state(&mut self, desc: &RasterizerDesc) -> Result<ResourceId>;

    /// Destroy a driver object; unknown ids are ignored
    fn release(&mut self, id: ResourceId);

    /// Number of driver objects currently alive
    fn live_resource_count(&self) -> usize;

    // ===== Binding =====

    fn bind_render_targets(&mut self, render_target: ResourceId, depth_stencil_view: ResourceId);

    fn bind_depth_stencil_state(&mut self, state: ResourceId);

    fn bind_rasterizer_state(&mut self, state: ResourceId);

    fn set_viewport(&mut self, viewport: &Viewport);

    // ===== Frame =====

    /// Prepare the back buffer for this frame (image acquisition)
    fn begin_frame(&mut self) -> Result<()> {
        Ok(())
    }

    fn clear_render_target(&mut self, render_target: ResourceId, color: Vec4) -> Result<()>;

    fn clear_depth_stencil(
        &mut self,
        view: ResourceId,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    ) -> Result<()>;

    /// Present the back buffer; `sync_interval` is 1 with vsync, 0 without
    fn present(&mut self, sync_interval: u32) -> Result<()>;
}
