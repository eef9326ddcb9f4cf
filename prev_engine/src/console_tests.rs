//! Unit tests for console.rs

use crate::console::{parse_window_size, register_window_commands, CommandRegistry};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// ============================================================================
// PARSING
// ============================================================================

#[test]
fn test_parse_window_size_valid() {
    assert_eq!(parse_window_size(&["window_size", "1024", "768"]), Some((1024, 768)));
}

#[test]
fn test_parse_window_size_rejects_malformed_input() {
    let cases: [&[&str]; 7] = [
        &["window_size"],
        &["window_size", "1024"],
        &["window_size", "1024", "768", "32"],
        &["window_size", "wide", "768"],
        &["window_size", "-1", "768"],
        &["window_size", "0", "768"],
        &["window_size", "1024", "0"],
    ];
    for args in cases {
        assert_eq!(parse_window_size(args), None, "{:?}", args);
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

#[test]
fn test_handler_receives_all_tokens() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut registry = CommandRegistry::new();
    let sink = seen.clone();
    registry.register("echo", "echo <words> - print words", move |args| {
        sink.borrow_mut()
            .extend(args.iter().map(|a| a.to_string()));
    });

    assert!(registry.execute("  echo  hello   world "));
    assert_eq!(*seen.borrow(), vec!["echo", "hello", "world"]);
}

#[test]
fn test_unknown_and_empty_lines() {
    let mut registry = CommandRegistry::new();
    assert!(!registry.execute("teleport 1 2"));
    assert!(!registry.execute(""));
    assert!(!registry.execute("   "));
}

#[test]
fn test_register_replaces_previous_command() {
    let calls = Rc::new(Cell::new(0));
    let mut registry = CommandRegistry::new();
    registry.register("ping", "first", |_| {});
    let counter = calls.clone();
    registry.register("ping", "second", move |_| counter.set(counter.get() + 1));

    registry.execute("ping");

    assert_eq!(calls.get(), 1);
    assert_eq!(registry.commands(), vec![("ping", "second")]);
}

#[test]
fn test_unregister() {
    let mut registry = CommandRegistry::new();
    registry.register("ping", "ping", |_| {});
    assert!(registry.contains("ping"));
    assert!(registry.unregister("ping"));
    assert!(!registry.unregister("ping"));
    assert!(!registry.execute("ping"));
}

#[test]
fn test_window_commands() {
    let resized = Rc::new(RefCell::new(Vec::new()));
    let exited = Rc::new(Cell::new(false));
    let mut registry = CommandRegistry::new();
    let (r, e) = (resized.clone(), exited.clone());
    register_window_commands(
        &mut registry,
        move |w, h| r.borrow_mut().push((w, h)),
        move || e.set(true),
    );

    assert!(registry.execute("window_size 800 600"));
    // Malformed input is accepted as a command but ignored
    assert!(registry.execute("window_size 800"));
    assert!(registry.execute("window_size a b"));
    assert_eq!(*resized.borrow(), vec![(800, 600)]);

    assert!(!exited.get());
    registry.execute("exit");
    assert!(exited.get());

    let names: Vec<&str> = registry.commands().iter().map(|(n, _)| *n).collect();
    assert_eq!(names, vec!["exit", "window_size"]);
}
