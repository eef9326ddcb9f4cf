/// Graphics module - device lifecycle and display-mode switching
///
/// Layers, leaves first:
/// - `display_mode` / `display_mode_catalog`: output modes and the catalog
/// - `driver`: the trait every GPU API implements
/// - `swap_chain_resources`: per-resolution resource set and its builder
/// - `graphics_device`: device, frame clear/present, resize protocol
/// - `display_mode_switcher`: fullscreen and resolution transitions
/// - `frame_controller`: per-frame entry points for the application loop
/// - `graphics_backend`: closed backend enum and factory

pub mod config;
pub mod display_mode;
pub mod display_mode_catalog;
pub mod display_mode_switcher;
pub mod driver;
pub mod frame_controller;
pub mod graphics_backend;
pub mod graphics_device;
pub mod headless_driver;
pub mod swap_chain_resources;

#[cfg(feature = "vulkan")]
pub mod vulkan;

#[cfg(test)]
pub(crate) mod mock_driver;

pub use config::GraphicsConfig;
pub use display_mode::{
    AdapterInfo, CapabilityTier, DisplayMode, PixelFormat, RefreshRate,
    REQUESTED_CAPABILITY_TIERS,
};
pub use display_mode_catalog::{dedup_adjacent_resolutions, DisplayModeCatalog, CATALOG_PIXEL_FORMAT};
pub use display_mode_switcher::{DisplayState, TransitionStep};
pub use driver::{
    ClearFlags, CompareFunc, CullMode, DepthStencilDesc, Driver, FillMode, FrontFace,
    RasterizerDesc, ResourceId, StencilFaceDesc, StencilOp, SwapchainDesc, Viewport,
    BACKGROUND_COLOR,
};
pub use frame_controller::FrameController;
pub use graphics_backend::{BackendKind, GraphicsBackend, GraphicsBackendFactory, WindowTarget};
pub use graphics_device::{GraphicsDevice, BACK_BUFFER_COUNT, CLEAR_DEPTH};
pub use headless_driver::{
    standard_modes, BoundState, HeadlessDriver, HeadlessResource, HeadlessStats, VirtualDisplay,
};
pub use swap_chain_resources::{ResourceStage, SwapChainResources, DEPTH_STENCIL_FORMAT};

#[cfg(feature = "vulkan")]
pub use vulkan::VulkanDriver;
