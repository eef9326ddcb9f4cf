/// Display mode, adapter and capability descriptions shared by every driver.

use std::fmt;

/// Pixel formats a swap chain or output can be queried with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8 bits per channel RGBA, normalized (the back-buffer format)
    R8G8B8A8Unorm,
    /// 24-bit depth + 8-bit stencil (depth-stencil buffers)
    D24UnormS8Uint,
}

impl PixelFormat {
    /// True for depth/stencil formats
    pub fn is_depth_stencil(self) -> bool {
        matches!(self, PixelFormat::D24UnormS8Uint)
    }
}

/// Refresh rate as a rational number of hertz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl RefreshRate {
    /// 0/0: let the driver pick its default rate
    pub const UNSPECIFIED: RefreshRate = RefreshRate { numerator: 0, denominator: 0 };

    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self { numerator, denominator }
    }

    /// Rate in hertz, `None` when unspecified
    pub fn hz(&self) -> Option<f64> {
        if self.denominator == 0 {
            None
        } else {
            Some(self.numerator as f64 / self.denominator as f64)
        }
    }

    pub fn is_unspecified(&self) -> bool {
        self.numerator == 0 || self.denominator == 0
    }
}

/// One mode reported by an output
///
/// Immutable once enumerated. The catalog compares modes by resolution only,
/// see [`DisplayMode::same_resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub refresh_rate: RefreshRate,
    pub pixel_format: PixelFormat,
}

impl DisplayMode {
    pub const fn new(width: u32, height: u32, refresh_rate: RefreshRate, pixel_format: PixelFormat) -> Self {
        Self { width, height, refresh_rate, pixel_format }
    }

    /// (width, height)
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Equality used for deduplication: refresh rate and format are ignored
    pub fn same_resolution(&self, other: &DisplayMode) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Copy of this mode with the refresh rate left to the driver
    pub fn with_unspecified_refresh(&self) -> DisplayMode {
        DisplayMode { refresh_rate: RefreshRate::UNSPECIFIED, ..*self }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.refresh_rate.hz() {
            Some(hz) => write!(f, "{}x{} @ {:.2} Hz", self.width, self.height, hz),
            None => write!(f, "{}x{}", self.width, self.height),
        }
    }
}

/// Description of the GPU adapter, captured once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    pub description: String,
    pub dedicated_memory_mb: u64,
}

impl AdapterInfo {
    /// Build from a byte count, converting to whole megabytes
    pub fn from_bytes(description: impl Into<String>, dedicated_memory_bytes: u64) -> Self {
        Self {
            description: description.into(),
            dedicated_memory_mb: dedicated_memory_bytes / (1024 * 1024),
        }
    }
}

/// Capability tier of a device (API/feature level), ordered by version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CapabilityTier {
    pub major: u32,
    pub minor: u32,
}

impl CapabilityTier {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Tiers requested at device creation, highest first
pub const REQUESTED_CAPABILITY_TIERS: [CapabilityTier; 3] = [
    CapabilityTier::new(1, 3),
    CapabilityTier::new(1, 2),
    CapabilityTier::new(1, 1),
];
