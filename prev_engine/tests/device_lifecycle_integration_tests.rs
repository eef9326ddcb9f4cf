//! Integration tests for the device lifecycle on the headless backend
//!
//! Drives the public API the way an application loop does: factory, frame
//! controller, console commands and display-mode transitions.
//! No GPU required.
//!
//! Run with: cargo test --test device_lifecycle_integration_tests

use prev_engine::prev::console::CommandRegistry;
use prev_engine::prev::graphics::{
    BackendKind, DisplayState, Driver, FrameController, GraphicsBackend, GraphicsBackendFactory,
    GraphicsConfig, VirtualDisplay, WindowTarget,
};
use prev_engine::prev::timer::FrameTimer;
use prev_engine::prev::{Error, Event};
use std::sync::mpsc;

fn headless(config: GraphicsConfig) -> GraphicsBackend {
    GraphicsBackendFactory::create(
        WindowTarget::Virtual(VirtualDisplay::default()),
        config,
        BackendKind::Headless,
    )
    .expect("headless backend")
}

fn render(controller: &mut FrameController, frames: u32) {
    for _ in 0..frames {
        controller.start_frame().unwrap();
        controller.end_frame().unwrap();
    }
}

// ============================================================================
// LIFECYCLE TESTS
// ============================================================================

#[test]
fn test_integration_cycle_every_mode_windowed_and_fullscreen() {
    let mut controller = FrameController::new(headless(GraphicsConfig::default()));
    let resolutions = controller.supported_resolutions();
    assert_eq!(
        resolutions,
        vec![(640, 480), (800, 600), (1024, 768), (1280, 720), (1600, 900), (1920, 1080)]
    );

    for index in 0..resolutions.len() {
        controller.change_resolution(index as isize).unwrap();
        render(&mut controller, 2);
        controller.toggle_fullscreen().unwrap();
        render(&mut controller, 2);
        controller.toggle_fullscreen().unwrap();

        let backend = controller.backend();
        assert_eq!(backend.display_state(), DisplayState::Windowed(index));
        assert_eq!(backend.selected_mode().resolution(), resolutions[index]);
        assert_eq!(backend.live_resource_count(), 5);
    }
    assert_eq!(controller.frames_presented(), 24);
    assert_eq!(controller.frames_skipped(), 0);
}

#[test]
fn test_integration_resolution_keys_wrap_around() {
    let mut controller = FrameController::new(headless(GraphicsConfig::default()));
    let count = controller.supported_resolutions().len() as isize;

    // PageUp from the last entry
    let next = controller.backend().display_state().index() as isize + 1;
    controller.change_resolution(next).unwrap();
    assert_eq!(controller.backend().display_state().index(), 0);

    // PageDown from the first entry
    controller.change_resolution(-1).unwrap();
    assert_eq!(controller.backend().display_state().index() as isize, count - 1);
}

#[test]
fn test_integration_vsync_sets_sync_interval() {
    let mut controller = FrameController::new(headless(GraphicsConfig::default().with_vsync(true)));
    render(&mut controller, 1);

    let stats = *controller.backend().as_headless().unwrap().driver().stats();
    assert_eq!(stats.last_sync_interval, Some(1));
    assert_eq!(stats.frames_presented, 1);
}

#[test]
fn test_integration_output_loss_skips_frames_until_recovery() {
    let mut controller = FrameController::new(headless(GraphicsConfig::default()));
    controller
        .backend_mut()
        .unwrap()
        .as_headless_mut()
        .unwrap()
        .simulate_output_loss();

    let err = controller.toggle_fullscreen().unwrap_err();
    assert!(matches!(err, Error::TransitionError { .. }));
    render(&mut controller, 3);
    assert_eq!(controller.frames_skipped(), 3);

    controller
        .backend_mut()
        .unwrap()
        .as_headless_mut()
        .unwrap()
        .simulate_output_restore();
    controller.toggle_fullscreen().unwrap();
    render(&mut controller, 3);
    assert_eq!(controller.frames_presented(), 3);
    assert!(controller.backend().is_fullscreen());
}

#[test]
fn test_integration_console_commands_drive_transitions() {
    let mut controller = FrameController::new(headless(GraphicsConfig::default()));
    let (sender, receiver) = mpsc::channel::<(u32, u32)>();

    let mut registry = CommandRegistry::new();
    prev_engine::prev::console::register_window_commands(
        &mut registry,
        move |w, h| {
            let _ = sender.send((w, h));
        },
        || {},
    );

    registry.execute("window_size 1024 768");
    registry.execute("window_size 1024");

    let requests: Vec<(u32, u32)> = receiver.try_iter().collect();
    assert_eq!(requests, vec![(1024, 768)]);
    for (width, height) in requests {
        let index = controller
            .supported_resolutions()
            .iter()
            .position(|&r| r == (width, height))
            .unwrap();
        controller.change_resolution(index as isize).unwrap();
    }
    assert_eq!(controller.backend().selected_mode().resolution(), (1024, 768));
}

#[test]
fn test_integration_window_resize_rebuilds_between_frames() {
    let mut controller = FrameController::new(headless(GraphicsConfig::default()));
    render(&mut controller, 2);

    controller.on_event(&Event::WindowResize { width: 1024, height: 640 });
    render(&mut controller, 2);

    let device = controller.backend().as_headless().unwrap();
    assert_eq!(device.driver().window_size(), (1024, 640));
    assert_eq!(device.resources().unwrap().size(), (1024, 640));
    assert_eq!(device.driver().live_resource_count(), 5);
    assert_eq!(controller.frames_presented(), 4);

    // A later transition sizes the buffers from the catalog again
    controller.change_resolution(1).unwrap();
    let device = controller.backend().as_headless().unwrap();
    assert_eq!(device.resources().unwrap().size(), (800, 600));
}

#[test]
fn test_integration_timer_over_frames() {
    let mut controller = FrameController::new(headless(GraphicsConfig::default()));
    let mut timer = FrameTimer::new();

    for _ in 0..10 {
        timer.update();
        controller.start_frame().unwrap();
        controller.end_frame().unwrap();
    }
    assert!(timer.delta_time() >= 0.0);
    assert_eq!(controller.frames_presented(), 10);
}

#[test]
fn test_integration_teardown_and_drop_leave_nothing_alive() {
    let mut backend = headless(GraphicsConfig::default().with_fullscreen(true));
    assert!(backend.is_fullscreen());

    backend.teardown();
    let device = backend.as_headless().unwrap();
    assert!(!device.is_alive());
    assert!(!device.driver().has_swapchain());
    assert_eq!(device.driver().live_resource_count(), 0);
    assert!(matches!(backend.start_frame(), Err(Error::InvalidState(_))));

    // Dropping after an explicit teardown is fine
    drop(backend);

    // Dropping without teardown tears down too
    let backend = headless(GraphicsConfig::default());
    drop(backend);
}
