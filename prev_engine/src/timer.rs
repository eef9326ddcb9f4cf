//! Frame timing service
//!
//! [`FrameTimer`] is constructed and owned by the application loop, which
//! calls [`FrameTimer::update`] once per frame. [`ScopeTimer`] logs how long
//! a scope took when it is dropped.

use std::time::{Duration, Instant};

use crate::{engine_debug, engine_info};

const SOURCE: &str = "prev::Timer";

/// Delta time, elapsed time and frames-per-second counter
pub struct FrameTimer {
    start: Instant,
    last_frame: Instant,
    delta: Duration,
    frames_this_second: u32,
    last_second: u64,
    fps: u32,
    log_fps: bool,
}

impl FrameTimer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self::starting_at(now)
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            last_frame: now,
            delta: Duration::ZERO,
            frames_this_second: 0,
            last_second: 0,
            fps: 0,
            log_fps: false,
        }
    }

    /// Advance to a new frame
    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    fn update_at(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;

        let second = now.saturating_duration_since(self.start).as_secs();
        if second != self.last_second {
            self.fps = self.frames_this_second;
            self.frames_this_second = 0;
            self.last_second = second;
            if self.log_fps {
                engine_info!(SOURCE, "FPS: {}", self.fps);
            }
        }
        self.frames_this_second += 1;
    }

    /// Seconds between the last two updates
    pub fn delta_time(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Seconds since construction
    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Frames counted during the last complete second
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Log the FPS once per second at Info level
    pub fn set_fps_logging(&mut self, enabled: bool) {
        self.log_fps = enabled;
    }

    pub fn is_fps_logging(&self) -> bool {
        self.log_fps
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Unit used by [`ScopeTimer`] to report durations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
}

impl TimeUnit {
    /// Format `duration` in this unit
    pub fn format(self, duration: Duration) -> String {
        match self {
            TimeUnit::Milliseconds => format!("{:.3} ms", duration.as_secs_f64() * 1000.0),
            TimeUnit::Seconds => format!("{:.3} s", duration.as_secs_f64()),
        }
    }
}

/// Logs "<label> took <duration>" at Debug level when dropped
///
/// # Example
///
/// ```no_run
/// use prev_engine::prev::timer::{ScopeTimer, TimeUnit};
///
/// {
///     let _timer = ScopeTimer::new("Resource rebuild", TimeUnit::Milliseconds);
///     // ...
/// } // logs "Resource rebuild took 1.234 ms"
/// ```
pub struct ScopeTimer {
    label: String,
    unit: TimeUnit,
    start: Instant,
}

impl ScopeTimer {
    pub fn new(label: impl Into<String>, unit: TimeUnit) -> Self {
        Self {
            label: label.into(),
            unit,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScopeTimer {
    fn drop(&mut self) {
        engine_debug!(
            SOURCE,
            "{} took {}",
            self.label,
            self.unit.format(self.start.elapsed())
        );
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
