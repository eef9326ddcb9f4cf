//! Unit tests for frame_controller.rs

use crate::error::Error;
use crate::event::Event;
use crate::graphics::config::GraphicsConfig;
use crate::graphics::frame_controller::FrameController;
use crate::graphics::graphics_backend::{BackendKind, GraphicsBackendFactory, WindowTarget};
use crate::graphics::headless_driver::VirtualDisplay;

fn controller() -> FrameController {
    let backend = GraphicsBackendFactory::create(
        WindowTarget::Virtual(VirtualDisplay::default()),
        GraphicsConfig::default(),
        BackendKind::Headless,
    )
    .unwrap();
    FrameController::new(backend)
}

fn frames_presented(controller: &FrameController) -> u64 {
    controller
        .backend()
        .as_headless()
        .unwrap()
        .driver()
        .stats()
        .frames_presented
}

// ============================================================================
// FRAME PAIRING
// ============================================================================

#[test]
fn test_frame_pair_presents() {
    let mut controller = controller();

    controller.start_frame().unwrap();
    assert!(controller.is_in_frame());
    controller.end_frame().unwrap();

    assert!(!controller.is_in_frame());
    assert_eq!(controller.frames_presented(), 1);
    assert_eq!(frames_presented(&controller), 1);
}

#[test]
fn test_double_start_is_invalid() {
    let mut controller = controller();
    controller.start_frame().unwrap();

    assert!(matches!(controller.start_frame(), Err(Error::InvalidState(_))));
    // The open frame is still valid
    controller.end_frame().unwrap();
    assert_eq!(controller.frames_presented(), 1);
}

#[test]
fn test_end_without_start_is_invalid() {
    let mut controller = controller();
    assert!(matches!(controller.end_frame(), Err(Error::InvalidState(_))));
    assert_eq!(frames_presented(&controller), 0);
}

// ============================================================================
// COMMANDS BETWEEN FRAMES
// ============================================================================

#[test]
fn test_commands_rejected_mid_frame() {
    let mut controller = controller();
    controller.start_frame().unwrap();

    assert!(matches!(controller.toggle_fullscreen(), Err(Error::InvalidState(_))));
    assert!(matches!(controller.set_fullscreen(true), Err(Error::InvalidState(_))));
    assert!(matches!(controller.change_resolution(0), Err(Error::InvalidState(_))));
    assert!(controller.backend_mut().is_err());

    controller.end_frame().unwrap();
    controller.toggle_fullscreen().unwrap();
    assert!(controller.backend().is_fullscreen());
}

#[test]
fn test_change_resolution_between_frames() {
    let mut controller = controller();
    controller.change_resolution(1).unwrap();

    assert_eq!(controller.backend().selected_mode().resolution(), (800, 600));
    assert_eq!(controller.supported_resolutions().len(), 6);

    controller.start_frame().unwrap();
    controller.end_frame().unwrap();
    assert_eq!(controller.frames_presented(), 1);
}

// ============================================================================
// SKIPPED FRAMES
// ============================================================================

#[test]
fn test_frames_skipped_while_not_renderable() {
    let mut controller = controller();
    controller
        .backend_mut()
        .unwrap()
        .as_headless_mut()
        .unwrap()
        .simulate_output_loss();
    assert!(controller.set_fullscreen(true).is_err());

    controller.start_frame().unwrap();
    assert!(controller.is_in_frame());
    controller.end_frame().unwrap();

    assert_eq!(controller.frames_skipped(), 1);
    assert_eq!(controller.frames_presented(), 0);
    assert_eq!(frames_presented(&controller), 0);

    // Leaving fullscreen needs no output, so rendering resumes
    controller.set_fullscreen(false).unwrap();
    controller.start_frame().unwrap();
    controller.end_frame().unwrap();
    assert_eq!(controller.frames_presented(), 1);
}

#[test]
fn test_on_event_and_into_backend() {
    let mut controller = controller();
    controller.on_event(&Event::WindowResize { width: 640, height: 480 });

    let backend = controller.into_backend();
    assert!(backend.is_renderable());
}

// ============================================================================
// SWAP-CHAIN REFRESH
// ============================================================================

#[test]
fn test_window_resize_refreshes_before_next_frame() {
    let mut controller = controller();
    controller.on_event(&Event::WindowResize { width: 1000, height: 700 });
    assert!(controller.backend().needs_swap_chain_refresh());

    controller.start_frame().unwrap();
    controller.end_frame().unwrap();

    let device = controller.backend().as_headless().unwrap();
    assert!(!device.needs_swap_chain_refresh());
    assert_eq!(device.driver().buffer_size(), Some((1000, 700)));
    assert_eq!(device.driver().stats().buffer_resizes, 1);
    assert_eq!(device.resources().unwrap().size(), (1000, 700));
    // The catalog selection does not follow the window
    assert_eq!(device.selected_mode().resolution(), (1920, 1080));
    assert_eq!(controller.frames_presented(), 1);
    assert_eq!(controller.frames_skipped(), 0);
}

#[test]
fn test_fullscreen_buffers_keep_the_mode_size_on_resize() {
    let mut controller = controller();
    controller.set_fullscreen(true).unwrap();
    controller.on_event(&Event::WindowResize { width: 1000, height: 700 });

    controller.start_frame().unwrap();
    controller.end_frame().unwrap();

    let device = controller.backend().as_headless().unwrap();
    assert_eq!(device.driver().buffer_size(), Some((1920, 1080)));
    assert!(device.is_fullscreen());
    assert_eq!(controller.frames_presented(), 1);
}

#[test]
fn test_minimized_window_does_not_refresh() {
    let mut controller = controller();
    controller.on_event(&Event::WindowResize { width: 0, height: 0 });
    assert!(!controller.backend().needs_swap_chain_refresh());

    controller.start_frame().unwrap();
    controller.end_frame().unwrap();
    let stats = *controller.backend().as_headless().unwrap().driver().stats();
    assert_eq!(stats.buffer_resizes, 0);
    assert_eq!(stats.frames_presented, 1);
}
