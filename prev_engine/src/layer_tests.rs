//! Unit tests for layer.rs

use crate::event::Event;
use crate::layer::{Layer, LayerStack};
use std::cell::RefCell;
use std::rc::Rc;
use winit::keyboard::KeyCode;

type Journal = Rc<RefCell<Vec<String>>>;

struct RecordingLayer {
    name: String,
    journal: Journal,
    handles_events: bool,
}

impl RecordingLayer {
    fn boxed(name: &str, journal: &Journal, handles_events: bool) -> Box<dyn Layer> {
        Box::new(Self {
            name: name.to_string(),
            journal: journal.clone(),
            handles_events,
        })
    }

    fn note(&self, what: &str) {
        self.journal.borrow_mut().push(format!("{} {}", what, self.name));
    }
}

impl Layer for RecordingLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_attach(&mut self) {
        self.note("attach");
    }

    fn on_detach(&mut self) {
        self.note("detach");
    }

    fn on_update(&mut self, _delta_time: f32) {
        self.note("update");
    }

    fn on_ui_update(&mut self) {
        self.note("ui");
    }

    fn on_event(&mut self, _event: &Event) -> bool {
        self.note("event");
        self.handles_events
    }
}

fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

fn take(journal: &Journal) -> Vec<String> {
    journal.borrow_mut().drain(..).collect()
}

#[test]
fn test_overlays_stay_above_layers() {
    let j = journal();
    let mut stack = LayerStack::new();
    stack.push_overlay(RecordingLayer::boxed("fps", &j, false));
    stack.push_layer(RecordingLayer::boxed("world", &j, false));
    stack.push_layer(RecordingLayer::boxed("hud", &j, false));

    assert_eq!(stack.names(), vec!["world", "hud", "fps"]);
    assert_eq!(take(&j), vec!["attach fps", "attach world", "attach hud"]);
}

#[test]
fn test_update_runs_bottom_up() {
    let j = journal();
    let mut stack = LayerStack::new();
    stack.push_layer(RecordingLayer::boxed("world", &j, false));
    stack.push_overlay(RecordingLayer::boxed("fps", &j, false));
    take(&j);

    stack.on_update(0.016);
    stack.on_ui_update();

    assert_eq!(take(&j), vec!["update world", "update fps", "ui world", "ui fps"]);
}

#[test]
fn test_event_stops_at_first_handler_from_top() {
    let j = journal();
    let mut stack = LayerStack::new();
    stack.push_layer(RecordingLayer::boxed("world", &j, false));
    stack.push_layer(RecordingLayer::boxed("menu", &j, true));
    stack.push_overlay(RecordingLayer::boxed("fps", &j, false));
    take(&j);

    let handled = stack.on_event(&Event::KeyPressed { key: KeyCode::F11, repeat: false });

    assert!(handled);
    assert_eq!(take(&j), vec!["event fps", "event menu"]);
}

#[test]
fn test_unhandled_event_reaches_every_layer() {
    let j = journal();
    let mut stack = LayerStack::new();
    stack.push_layer(RecordingLayer::boxed("world", &j, false));
    stack.push_overlay(RecordingLayer::boxed("fps", &j, false));
    take(&j);

    assert!(!stack.on_event(&Event::WindowClose));
    assert_eq!(take(&j).len(), 2);
}

#[test]
fn test_pop_layer_and_overlay() {
    let j = journal();
    let mut stack = LayerStack::new();
    stack.push_layer(RecordingLayer::boxed("world", &j, false));
    stack.push_overlay(RecordingLayer::boxed("fps", &j, false));
    take(&j);

    // Overlays aren't found by pop_layer, and the reverse
    assert!(stack.pop_layer("fps").is_none());
    assert!(stack.pop_overlay("world").is_none());

    assert!(stack.pop_overlay("fps").is_some());
    assert!(stack.pop_layer("world").is_some());
    assert!(stack.is_empty());
    assert_eq!(take(&j), vec!["detach fps", "detach world"]);

    stack.push_layer(RecordingLayer::boxed("again", &j, false));
    assert_eq!(stack.names(), vec!["again"]);
}

#[test]
fn test_get_layer() {
    let j = journal();
    let mut stack = LayerStack::new();
    stack.push_layer(RecordingLayer::boxed("world", &j, false));

    assert_eq!(stack.get_layer("world").map(|l| l.name()), Some("world"));
    assert!(stack.get_layer("missing").is_none());
    assert!(stack.get_layer_mut("world").is_some());
    assert_eq!(stack.len(), 1);
}

#[test]
fn test_drop_detaches_top_down() {
    let j = journal();
    {
        let mut stack = LayerStack::new();
        stack.push_layer(RecordingLayer::boxed("world", &j, false));
        stack.push_overlay(RecordingLayer::boxed("fps", &j, false));
        take(&j);
    }
    assert_eq!(take(&j), vec!["detach fps", "detach world"]);
}

#[test]
fn test_event_names() {
    assert_eq!(Event::WindowClose.name(), "WindowClose");
    assert!(Event::WindowResize { width: 1, height: 1 }.is_window_event());
    assert!(!Event::KeyReleased { key: KeyCode::F1 }.is_window_event());
}
