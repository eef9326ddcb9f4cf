//! Unit tests for headless_driver.rs

use glam::Vec4;

use crate::error::Error;
use crate::graphics::display_mode::{CapabilityTier, DisplayMode, PixelFormat, RefreshRate};
use crate::graphics::driver::{
    ClearFlags, DepthStencilDesc, Driver, RasterizerDesc, SwapchainDesc, BACKGROUND_COLOR,
};
use crate::graphics::headless_driver::{
    standard_modes, HeadlessDriver, HeadlessResource, VirtualDisplay,
};

fn desc(width: u32, height: u32, fullscreen: bool) -> SwapchainDesc {
    SwapchainDesc {
        width,
        height,
        format: PixelFormat::R8G8B8A8Unorm,
        refresh_rate: RefreshRate::new(60, 1),
        buffer_count: 2,
        fullscreen,
        vsync: false,
    }
}

fn mode(width: u32, height: u32) -> DisplayMode {
    DisplayMode::new(width, height, RefreshRate::UNSPECIFIED, PixelFormat::R8G8B8A8Unorm)
}

fn driver_with_device(width: u32, height: u32) -> HeadlessDriver {
    let mut driver = HeadlessDriver::new(VirtualDisplay::default());
    driver
        .create_device_and_swapchain(&desc(width, height, false), &[CapabilityTier::new(1, 3)])
        .unwrap();
    driver
}

// ============================================================================
// VIRTUAL DISPLAY
// ============================================================================

#[test]
fn test_default_display() {
    let display = VirtualDisplay::default();
    assert!(display.adapter.is_some());
    assert_eq!(display.outputs.len(), 1);
    assert_eq!(display.outputs[0], standard_modes());
    assert_eq!(display.window_size, (1280, 720));
    assert!(display.supports(1920, 1080));
    assert!(!display.supports(2560, 1440));
}

#[test]
fn test_display_variants() {
    assert!(VirtualDisplay::without_outputs().outputs.is_empty());
    assert!(VirtualDisplay::without_adapter().adapter.is_none());
    assert!(!VirtualDisplay::without_outputs().supports(800, 600));

    let display = VirtualDisplay::with_resolutions(&[(1024, 768)]);
    assert!(display.supports(1024, 768));
    assert!(!display.supports(800, 600));
}

// ============================================================================
// QUERIES
// ============================================================================

#[test]
fn test_output_modes_filters_by_format() {
    let driver = HeadlessDriver::new(VirtualDisplay::default());
    assert_eq!(driver.output_modes(PixelFormat::R8G8B8A8Unorm).unwrap().len(), 8);
    assert!(driver.output_modes(PixelFormat::D24UnormS8Uint).unwrap().is_empty());
}

#[test]
fn test_queries_without_adapter_or_output() {
    let driver = HeadlessDriver::new(VirtualDisplay::without_adapter());
    assert!(matches!(driver.adapter_info(), Err(Error::AdapterQueryError(_))));
    assert!(matches!(
        driver.output_modes(PixelFormat::R8G8B8A8Unorm),
        Err(Error::AdapterQueryError(_))
    ));

    let driver = HeadlessDriver::new(VirtualDisplay::without_outputs());
    assert!(driver.adapter_info().is_ok());
    assert!(matches!(
        driver.output_modes(PixelFormat::R8G8B8A8Unorm),
        Err(Error::AdapterQueryError(_))
    ));
}

// ============================================================================
// DEVICE AND SWAP CHAIN
// ============================================================================

#[test]
fn test_create_device_picks_first_supported_tier() {
    let mut driver = HeadlessDriver::new(
        VirtualDisplay::default().with_capability_tiers(vec![CapabilityTier::new(1, 1)]),
    );
    let tiers = [CapabilityTier::new(1, 2), CapabilityTier::new(1, 1)];

    let tier = driver.create_device_and_swapchain(&desc(800, 600, false), &tiers).unwrap();

    assert_eq!(tier, CapabilityTier::new(1, 1));
    assert!(driver.has_device());
    assert!(driver.has_swapchain());
    assert_eq!(driver.buffer_count(), Some(2));
    assert_eq!(driver.window_size(), (800, 600));
}

#[test]
fn test_create_device_without_supported_tier() {
    let mut driver = HeadlessDriver::new(
        VirtualDisplay::default().with_capability_tiers(vec![CapabilityTier::new(1, 0)]),
    );
    let result =
        driver.create_device_and_swapchain(&desc(800, 600, false), &[CapabilityTier::new(1, 2)]);
    assert!(matches!(result, Err(Error::UnsupportedCapabilityError(_))));
    assert!(!driver.has_device());
}

#[test]
fn test_create_device_twice_fails() {
    let mut driver = driver_with_device(800, 600);
    let result =
        driver.create_device_and_swapchain(&desc(800, 600, false), &[CapabilityTier::new(1, 3)]);
    assert!(matches!(result, Err(Error::BackendError(_))));
}

#[test]
fn test_create_fullscreen_swapchain_needs_listed_mode() {
    let mut driver = HeadlessDriver::new(VirtualDisplay::default());
    let result =
        driver.create_device_and_swapchain(&desc(1366, 768, true), &[CapabilityTier::new(1, 3)]);
    assert!(result.is_err());
    assert!(!driver.has_swapchain());
}

#[test]
fn test_fullscreen_only_for_supported_mode() {
    let mut driver = driver_with_device(1024, 768);
    driver.set_fullscreen_state(true, &mode(1024, 768)).unwrap();
    assert!(driver.fullscreen_state().unwrap());
    assert_eq!(driver.stats().fullscreen_switches, 1);

    driver.set_fullscreen_state(false, &mode(1024, 768)).unwrap();
    driver.resize_target(&mode(1366, 768)).unwrap();
    assert!(driver.set_fullscreen_state(true, &mode(1366, 768)).is_err());
    assert!(!driver.fullscreen_state().unwrap());
}

#[test]
fn test_fullscreen_resize_target_needs_listed_mode() {
    let mut driver = driver_with_device(1024, 768);
    driver.set_fullscreen_state(true, &mode(1024, 768)).unwrap();

    assert!(driver.resize_target(&mode(1366, 768)).is_err());
    driver.resize_target(&mode(800, 600)).unwrap();
    assert_eq!(driver.target_size(), Some((800, 600)));
    // Exclusive fullscreen doesn't touch the window
    assert_eq!(driver.window_size(), (1024, 768));
}

#[test]
fn test_resize_buffers_refused_with_live_render_target_view() {
    let mut driver = driver_with_device(800, 600);
    let view = driver.create_render_target_view().unwrap();
    driver.resize_target(&mode(1024, 768)).unwrap();

    assert!(driver.resize_buffers().is_err());
    assert_eq!(driver.buffer_size(), Some((800, 600)));

    driver.release(view);
    driver.resize_buffers().unwrap();
    assert_eq!(driver.buffer_size(), Some((1024, 768)));
    assert_eq!(driver.stats().buffer_resizes, 1);
}

#[test]
fn test_fullscreen_state_without_swapchain() {
    let driver = HeadlessDriver::new(VirtualDisplay::default());
    assert!(driver.fullscreen_state().is_err());
}

// ============================================================================
// RESOURCES
// ============================================================================

#[test]
fn test_render_target_view_takes_buffer_size() {
    let mut driver = driver_with_device(1280, 720);
    let view = driver.create_render_target_view().unwrap();
    assert_eq!(
        driver.resource(view),
        Some(&HeadlessResource::RenderTargetView { width: 1280, height: 720 })
    );
}

#[test]
fn test_depth_stencil_buffer_rules() {
    let mut driver = driver_with_device(800, 600);
    assert!(driver
        .create_depth_stencil_buffer(800, 600, PixelFormat::R8G8B8A8Unorm)
        .is_err());
    assert!(driver
        .create_depth_stencil_buffer(0, 600, PixelFormat::D24UnormS8Uint)
        .is_err());
    assert!(driver
        .create_depth_stencil_buffer(800, 600, PixelFormat::D24UnormS8Uint)
        .is_ok());
}

#[test]
fn test_depth_stencil_view_needs_buffer() {
    let mut driver = driver_with_device(800, 600);
    let state = driver
        .create_depth_stencil_state(&DepthStencilDesc::default())
        .unwrap();
    assert!(driver.create_depth_stencil_view(state).is_err());

    let buffer = driver
        .create_depth_stencil_buffer(800, 600, PixelFormat::D24UnormS8Uint)
        .unwrap();
    let view = driver.create_depth_stencil_view(buffer).unwrap();
    assert_eq!(
        driver.resource(view),
        Some(&HeadlessResource::DepthStencilView { buffer })
    );

    driver.release(buffer);
    assert!(driver.create_depth_stencil_view(buffer).is_err());
}

#[test]
fn test_objects_need_device() {
    let mut driver = HeadlessDriver::new(VirtualDisplay::default());
    assert!(driver.create_render_target_view().is_err());
    assert!(driver
        .create_depth_stencil_state(&DepthStencilDesc::default())
        .is_err());
    assert!(driver
        .create_rasterizer_state(&RasterizerDesc::default())
        .is_err());
}

#[test]
fn test_destroy_device_drops_leaked_objects() {
    let mut driver = driver_with_device(800, 600);
    driver.create_render_target_view().unwrap();
    driver
        .create_rasterizer_state(&RasterizerDesc::default())
        .unwrap();
    assert_eq!(driver.live_resource_count(), 2);

    driver.destroy_swapchain();
    driver.destroy_device();

    assert_eq!(driver.live_resource_count(), 0);
    assert!(!driver.has_device());
    assert!(!driver.has_swapchain());
}

// ============================================================================
// FRAMES
// ============================================================================

#[test]
fn test_clear_and_present_update_stats() {
    let mut driver = driver_with_device(800, 600);
    let view = driver.create_render_target_view().unwrap();
    let buffer = driver
        .create_depth_stencil_buffer(800, 600, PixelFormat::D24UnormS8Uint)
        .unwrap();
    let dsv = driver.create_depth_stencil_view(buffer).unwrap();

    driver.begin_frame().unwrap();
    driver.clear_render_target(view, BACKGROUND_COLOR).unwrap();
    driver.clear_depth_stencil(dsv, ClearFlags::DEPTH, 1.0, 0).unwrap();
    driver.present(1).unwrap();

    let stats = driver.stats();
    assert_eq!(stats.frames_presented, 1);
    assert_eq!(stats.last_sync_interval, Some(1));
    assert_eq!(stats.last_clear_color, Some(Vec4::new(0.0, 0.0, 1.0, 1.0)));
}

#[test]
fn test_clear_rejects_stale_or_wrong_views() {
    let mut driver = driver_with_device(800, 600);
    let view = driver.create_render_target_view().unwrap();
    let buffer = driver
        .create_depth_stencil_buffer(800, 600, PixelFormat::D24UnormS8Uint)
        .unwrap();
    let dsv = driver.create_depth_stencil_view(buffer).unwrap();

    assert!(driver.clear_depth_stencil(view, ClearFlags::DEPTH, 1.0, 0).is_err());
    assert!(driver.clear_depth_stencil(dsv, ClearFlags::empty(), 1.0, 0).is_err());

    driver.release(view);
    assert!(driver.clear_render_target(view, BACKGROUND_COLOR).is_err());
}

#[test]
fn test_frames_need_swapchain() {
    let mut driver = HeadlessDriver::new(VirtualDisplay::default());
    assert!(driver.begin_frame().is_err());
    assert!(driver.present(0).is_err());
}

// ============================================================================
// OUTPUTS
// ============================================================================

#[test]
fn test_detach_and_attach_outputs() {
    let mut driver = driver_with_device(800, 600);
    driver.detach_outputs();
    assert!(!driver.display().supports(800, 600));
    assert!(driver.output_modes(PixelFormat::R8G8B8A8Unorm).is_err());

    driver.attach_output(standard_modes());
    assert!(driver.display().supports(800, 600));
    driver.set_fullscreen_state(true, &mode(800, 600)).unwrap();
}
