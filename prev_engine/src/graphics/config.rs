/// Graphics configuration supplied when a backend is created

/// Configuration for device creation
///
/// `fullscreen` is the requested initial state; once a device exists, its own
/// copy mirrors the live swap-chain state after every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicsConfig {
    /// Present with sync interval 1 instead of 0
    pub vsync: bool,

    /// Start in exclusive fullscreen
    pub fullscreen: bool,

    /// Enable API validation layers (Vulkan only)
    pub enable_validation: bool,

    /// Application name reported to the driver
    pub app_name: String,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            vsync: false,
            fullscreen: false,
            enable_validation: cfg!(debug_assertions),
            app_name: "PrevEngine Application".to_string(),
        }
    }
}

impl GraphicsConfig {
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn with_validation(mut self, enable_validation: bool) -> Self {
        self.enable_validation = enable_validation;
        self
    }

    /// Sync interval used by `present`
    pub fn sync_interval(&self) -> u32 {
        if self.vsync { 1 } else { 0 }
    }
}
