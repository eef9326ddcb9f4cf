//! Integration tests for the Vulkan backend
//!
//! These tests need a GPU, a Vulkan driver and a display, so they are marked
//! with #[ignore].
//!
//! Run with: cargo test --test vulkan_integration_tests -- --ignored

#![cfg(feature = "vulkan")]


use gpu_test_utils::create_test_window;
use prev_engine::prev::graphics::{
    BackendKind, DisplayState, FrameController, GraphicsBackendFactory, GraphicsConfig,
    WindowTarget,
};
use serial_test::serial;

// ============================================================================
// VULKAN LIFECYCLE TESTS
// ============================================================================

// One test per binary: ash-window may refuse a second surface on the same
// process, so every step runs on the same backend.
#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_vulkan_full_lifecycle() {
    // Step 1: Create the backend on a hidden window
    let (window, _event_loop) = create_test_window();
    let backend = GraphicsBackendFactory::create(
        WindowTarget::Winit(window),
        GraphicsConfig::default().with_vsync(true),
        BackendKind::Vulkan,
    )
    .expect("Vulkan backend creation should succeed");
    assert_eq!(backend.kind(), BackendKind::Vulkan);
    assert!(backend.is_renderable());
    assert!(!backend.supported_resolutions().is_empty());

    let mut controller = FrameController::new(backend);

    // Step 2: Render a few frames
    for _ in 0..3 {
        controller.start_frame().unwrap();
        controller.end_frame().unwrap();
    }
    assert_eq!(controller.frames_presented(), 3);

    // Step 3: Cycle windowed resolutions; every transition rebuilds
    let count = controller.supported_resolutions().len() as isize;
    for index in [0, count - 1, count] {
        controller.change_resolution(index).unwrap();
        controller.start_frame().unwrap();
        controller.end_frame().unwrap();
    }
    assert!(matches!(
        controller.backend().display_state(),
        DisplayState::Windowed(0)
    ));

    // Step 4: Same mode again still succeeds
    controller.change_resolution(0).unwrap();
    assert!(controller.backend().is_renderable());

    // Step 5: Teardown leaves nothing alive
    let mut backend = controller.into_backend();
    backend.teardown();
    assert_eq!(backend.live_resource_count(), 0);
    backend.teardown();
}
