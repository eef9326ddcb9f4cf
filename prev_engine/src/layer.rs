//! Layers and the layer stack
//!
//! Layers are updated bottom-up every frame. Events travel top-down
//! (overlays first) and stop at the first layer that handles them.

use crate::event::Event;
use crate::engine_debug;

const SOURCE: &str = "prev::LayerStack";

/// A unit of per-frame application logic
pub trait Layer {
    /// Name used to find and pop the layer
    fn name(&self) -> &str;

    fn on_attach(&mut self) {}

    fn on_detach(&mut self) {}

    /// Per-frame update with the frame delta in seconds
    fn on_update(&mut self, _delta_time: f32) {}

    /// Per-frame UI update, after every `on_update`
    fn on_ui_update(&mut self) {}

    /// Returns true when the event is handled and must not propagate further
    fn on_event(&mut self, _event: &Event) -> bool {
        false
    }
}

/// Ordered layers, with overlays always above regular layers
#[derive(Default)]
pub struct LayerStack {
    layers: Vec<Box<dyn Layer>>,
    overlay_start: usize,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert above every regular layer, below every overlay
    pub fn push_layer(&mut self, mut layer: Box<dyn Layer>) {
        engine_debug!(SOURCE, "Push layer '{}'", layer.name());
        layer.on_attach();
        self.layers.insert(self.overlay_start, layer);
        self.overlay_start += 1;
    }

    /// Insert on top of the stack
    pub fn push_overlay(&mut self, mut overlay: Box<dyn Layer>) {
        engine_debug!(SOURCE, "Push overlay '{}'", overlay.name());
        overlay.on_attach();
        self.layers.push(overlay);
    }

    /// Remove the regular layer named `name`
    pub fn pop_layer(&mut self, name: &str) -> Option<Box<dyn Layer>> {
        let index = self.layers[..self.overlay_start]
            .iter()
            .position(|l| l.name() == name)?;
        self.overlay_start -= 1;
        let mut layer = self.layers.remove(index);
        layer.on_detach();
        Some(layer)
    }

    /// Remove the overlay named `name`
    pub fn pop_overlay(&mut self, name: &str) -> Option<Box<dyn Layer>> {
        let offset = self.layers[self.overlay_start..]
            .iter()
            .position(|l| l.name() == name)?;
        let mut overlay = self.layers.remove(self.overlay_start + offset);
        overlay.on_detach();
        Some(overlay)
    }

    pub fn on_update(&mut self, delta_time: f32) {
        for layer in self.layers.iter_mut() {
            layer.on_update(delta_time);
        }
    }

    pub fn on_ui_update(&mut self) {
        for layer in self.layers.iter_mut() {
            layer.on_ui_update();
        }
    }

    /// Dispatch top-down; returns true if a layer handled the event
    pub fn on_event(&mut self, event: &Event) -> bool {
        self.layers.iter_mut().rev().any(|layer| layer.on_event(event))
    }

    pub fn get_layer(&self, name: &str) -> Option<&dyn Layer> {
        self.layers
            .iter()
            .find(|l| l.name() == name)
            .map(|l| l.as_ref())
    }

    pub fn get_layer_mut(&mut self, name: &str) -> Option<&mut Box<dyn Layer>> {
        self.layers.iter_mut().find(|l| l.name() == name)
    }

    /// Names bottom to top
    pub fn names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Drop for LayerStack {
    fn drop(&mut self) {
        for layer in self.layers.iter_mut().rev() {
            layer.on_detach();
        }
    }
}

#[cfg(test)]
#[path = "layer_tests.rs"]
mod tests;
