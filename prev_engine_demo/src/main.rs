//! PrevEngine demo - clears the swap chain and switches display modes
//!
//! Keys: F11 toggles fullscreen, PageUp / PageDown step through the supported
//! resolutions, F1 prints them.
//! Console (stdin): `window_size <width> <height>`, `exit`.
//! Flags: `--headless`, `--vsync`, `--fullscreen`, `--validation`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::{env, io, thread};

use prev_engine::prev::console::{register_window_commands, CommandRegistry};
use prev_engine::prev::graphics::{
    BackendKind, FrameController, GraphicsBackendFactory, GraphicsConfig, WindowTarget,
};
use prev_engine::prev::layer::{Layer, LayerStack};
use prev_engine::prev::timer::FrameTimer;
use prev_engine::prev::Event;
use prev_engine::{engine_error, engine_info, engine_warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const SOURCE: &str = "prev::demo";
const TITLE: &str = "PrevEngine Demo";

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct Options {
    headless: bool,
    vsync: bool,
    fullscreen: bool,
    validation: bool,
}

impl Options {
    fn from_args(args: impl Iterator<Item = String>) -> Self {
        let mut options = Self::default();
        for arg in args {
            match arg.as_str() {
                "--headless" => options.headless = true,
                "--vsync" => options.vsync = true,
                "--fullscreen" => options.fullscreen = true,
                "--validation" => options.validation = true,
                other => engine_warn!(SOURCE, "Ignoring unknown argument '{}'", other),
            }
        }
        options
    }

    fn backend_kind(&self) -> BackendKind {
        if self.headless {
            BackendKind::Headless
        } else {
            BackendKind::Vulkan
        }
    }

    fn graphics_config(&self) -> GraphicsConfig {
        GraphicsConfig {
            app_name: TITLE.to_string(),
            ..GraphicsConfig::default()
        }
        .with_vsync(self.vsync)
        .with_fullscreen(self.fullscreen)
        .with_validation(self.validation || cfg!(debug_assertions))
    }
}

// ============================================================================
// Title overlay
// ============================================================================

/// Shows the timer's frame rate in the window title
struct TitleOverlay {
    window: Arc<Window>,
    fps: Rc<Cell<u32>>,
    shown: Option<u32>,
}

impl Layer for TitleOverlay {
    fn name(&self) -> &str {
        "title_overlay"
    }

    fn on_ui_update(&mut self) {
        let fps = self.fps.get();
        if self.shown != Some(fps) {
            self.window.set_title(&format!("{} - {} FPS", TITLE, fps));
            self.shown = Some(fps);
        }
    }
}

// ============================================================================
// Console
// ============================================================================

enum ConsoleAction {
    ResizeWindow(u32, u32),
    Exit,
}

/// Read stdin lines on a background thread
fn spawn_console() -> Receiver<String> {
    let (sender, receiver) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            for line in io::stdin().lines() {
                let Ok(line) = line else { break };
                if sender.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        engine_warn!(SOURCE, "Console unavailable: {}", e);
    }
    receiver
}

// ============================================================================
// Application
// ============================================================================

struct App {
    options: Options,
    window: Option<Arc<Window>>,
    controller: Option<FrameController>,
    timer: FrameTimer,
    /// Last complete-second FPS of `timer`, read by the title overlay
    fps: Rc<Cell<u32>>,
    layers: LayerStack,
    registry: CommandRegistry,
    actions: Rc<RefCell<Vec<ConsoleAction>>>,
    console: Receiver<String>,
}

impl App {
    fn new(options: Options) -> Self {
        let actions = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CommandRegistry::new();
        let (resize_queue, exit_queue) = (actions.clone(), actions.clone());
        register_window_commands(
            &mut registry,
            move |width, height| {
                resize_queue
                    .borrow_mut()
                    .push(ConsoleAction::ResizeWindow(width, height))
            },
            move || exit_queue.borrow_mut().push(ConsoleAction::Exit),
        );

        let mut timer = FrameTimer::new();
        timer.set_fps_logging(true);

        Self {
            options,
            window: None,
            controller: None,
            timer,
            fps: Rc::new(Cell::new(0)),
            layers: LayerStack::new(),
            registry,
            actions,
            console: spawn_console(),
        }
    }

    fn create_graphics(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(PhysicalSize::new(1280, 720));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                engine_error!(SOURCE, "Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let backend = GraphicsBackendFactory::create(
            WindowTarget::Winit(window.clone()),
            self.options.graphics_config(),
            self.options.backend_kind(),
        );
        match backend {
            Some(backend) => {
                engine_info!(
                    SOURCE,
                    "{} backend ready, {} resolutions",
                    backend.kind(),
                    backend.supported_resolutions().len()
                );
                self.controller = Some(FrameController::new(backend));
                self.layers.push_overlay(Box::new(TitleOverlay {
                    window: window.clone(),
                    fps: self.fps.clone(),
                    shown: None,
                }));
                self.window = Some(window);
            }
            None => event_loop.exit(),
        }
    }

    fn run_console(&mut self, event_loop: &ActiveEventLoop) {
        while let Ok(line) = self.console.try_recv() {
            if !self.registry.execute(&line) {
                for (name, description) in self.registry.commands() {
                    println!("  {:<12} {}", name, description);
                }
            }
        }

        let actions: Vec<ConsoleAction> = self.actions.borrow_mut().drain(..).collect();
        for action in actions {
            match action {
                ConsoleAction::ResizeWindow(width, height) => {
                    if let Some(window) = &self.window {
                        let _ = window.request_inner_size(PhysicalSize::new(width, height));
                    }
                }
                ConsoleAction::Exit => event_loop.exit(),
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        let current = controller.backend().display_state().index() as isize;
        let result = match key {
            KeyCode::F11 => controller.toggle_fullscreen(),
            KeyCode::PageUp => controller.change_resolution(current + 1),
            KeyCode::PageDown => controller.change_resolution(current - 1),
            KeyCode::F1 => {
                for (index, (width, height)) in
                    controller.supported_resolutions().into_iter().enumerate()
                {
                    let marker = if index as isize == current { '*' } else { ' ' };
                    println!("{} {:>2}: {}x{}", marker, index, width, height);
                }
                Ok(())
            }
            _ => Ok(()),
        };
        // The device already logged the failure; frames resume after the next transition
        if let Err(e) = result {
            engine_warn!(SOURCE, "{:?} ignored: {}", key, e);
        }
    }

    fn dispatch(&mut self, event: Event) {
        if let Some(controller) = self.controller.as_mut() {
            controller.on_event(&event);
        }
        if self.layers.on_event(&event) {
            return;
        }
        if let Event::KeyPressed { key, repeat: false } = event {
            self.handle_key(key);
        }
    }

    fn frame(&mut self) {
        self.timer.update();
        self.fps.set(self.timer.fps());
        let Some(controller) = self.controller.as_mut() else {
            return;
        };

        if let Err(e) = controller.start_frame() {
            engine_error!(SOURCE, "start_frame failed: {}", e);
            return;
        }
        self.layers.on_update(self.timer.delta_time());
        self.layers.on_ui_update();
        if let Err(e) = controller.end_frame() {
            engine_error!(SOURCE, "end_frame failed: {}", e);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.controller.is_none() {
            self.create_graphics(event_loop);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.dispatch(Event::WindowClose);
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.dispatch(Event::WindowResize {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => self.dispatch(Event::KeyPressed { key, repeat }),
                ElementState::Released => self.dispatch(Event::KeyReleased { key }),
            },
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.run_console(event_loop);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(controller) = self.controller.take() {
            engine_info!(
                SOURCE,
                "{} frames presented, {} skipped",
                controller.frames_presented(),
                controller.frames_skipped()
            );
            controller.into_backend().teardown();
        }
        self.window = None;
    }
}

fn main() {
    let options = Options::from_args(env::args().skip(1));

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            engine_error!(SOURCE, "Failed to create event loop: {}", e);
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(options);
    if let Err(e) = event_loop.run_app(&mut app) {
        engine_error!(SOURCE, "Event loop error: {}", e);
    }
}
