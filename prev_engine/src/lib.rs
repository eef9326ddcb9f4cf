/*!
# PrevEngine

Graphics device lifecycle for a real-time application.

This crate owns the GPU device, the swap chain and the per-resolution render
resources, and switches between windowed and fullscreen display modes without
leaking driver objects. GPU APIs plug in through the `Driver` trait; the set of
backends is closed (`BackendKind`).

## Architecture

- **DisplayModeCatalog**: deduplicated output modes with a cyclic cursor
- **GraphicsDevice**: device, swap chain, resource set, start/end frame
- **DisplayModeSwitcher**: fullscreen toggle and resolution change
- **FrameController**: frame entry points for the application loop
- **GraphicsBackendFactory**: builds one backend from a `BackendKind`

Around it: a logging hub (`Engine`), a frame timer, a layer stack and a
console command registry.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod console;
pub mod event;
pub mod graphics;
pub mod layer;
pub mod timer;

// Main prev namespace module
pub mod prev {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging hub
    pub use crate::engine::Engine;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    pub mod graphics {
        pub use crate::graphics::*;
    }

    pub mod timer {
        pub use crate::timer::*;
    }

    pub mod layer {
        pub use crate::layer::*;
    }

    pub mod console {
        pub use crate::console::*;
    }

    pub use crate::event::Event;
}

// Re-export math library at crate root
pub use glam;
