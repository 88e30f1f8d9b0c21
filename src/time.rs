//! Frame clock driving tweens and per-frame motion.
//!
//! The choreography runs on a single monotonic clock expressed in seconds.
//! [`FrameClock`] produces that clock either from wall time or, for headless
//! runs and tests, from a fixed step per frame.
//!
//! # Example
//!
//! ```
//! use plexus::time::FrameClock;
//!
//! let mut clock = FrameClock::fixed(0.5);
//! clock.tick();
//! clock.tick();
//! assert_eq!(clock.now(), 1.0);
//! assert_eq!(clock.frame(), 2);
//! ```

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
enum Source {
    Wall { start: Instant, last: Instant },
    Fixed { step: f32 },
}

/// Monotonic frame clock.
#[derive(Debug, Clone)]
pub struct FrameClock {
    source: Source,
    /// Seconds since the clock started.
    now: f32,
    /// Seconds between the last two ticks.
    delta: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_window: f32,
    paused: bool,
    /// Wall time spent paused, subtracted from `now`.
    pause_elapsed: Duration,
}

impl FrameClock {
    /// Clock following wall time from now on.
    pub fn new() -> Self {
        let now = Instant::now();
        Self::with_source(Source::Wall { start: now, last: now })
    }

    /// Clock advancing by exactly `step` seconds per tick.
    pub fn fixed(step: f32) -> Self {
        Self::with_source(Source::Fixed { step: step.max(0.0) })
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            now: 0.0,
            delta: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_window: 0.0,
            paused: false,
            pause_elapsed: Duration::ZERO,
        }
    }

    /// Advance one frame. Returns the new `now`.
    pub fn tick(&mut self) -> f32 {
        if self.paused {
            self.delta = 0.0;
            return self.now;
        }

        match &mut self.source {
            Source::Wall { start, last } => {
                let instant = Instant::now();
                self.delta = instant.duration_since(*last).as_secs_f32();
                *last = instant;
                self.now = (instant.duration_since(*start) - self.pause_elapsed).as_secs_f32();
            }
            Source::Fixed { step } => {
                self.delta = *step;
                self.now += *step;
            }
        }

        self.frame_count += 1;

        // Refresh the FPS estimate twice a second
        self.fps_window += self.delta;
        if self.fps_window >= 0.5 {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / self.fps_window;
            self.fps_frame_count = self.frame_count;
            self.fps_window = 0.0;
            log::trace!("{:.1} fps", self.fps);
        }

        self.now
    }

    /// Seconds since the clock started, excluding paused time.
    #[inline]
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Seconds between the last two ticks.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Ticks since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop the clock. Ticks report zero delta until [`resume`](Self::resume).
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        if let Source::Wall { last, .. } = &mut self.source {
            let instant = Instant::now();
            self.pause_elapsed += instant.duration_since(*last);
            *last = instant;
        }
        self.paused = false;
    }

    /// Restart from zero, keeping the source kind.
    pub fn reset(&mut self) {
        let source = match self.source {
            Source::Wall { .. } => {
                let now = Instant::now();
                Source::Wall { start: now, last: now }
            }
            fixed @ Source::Fixed { .. } => fixed,
        };
        *self = Self::with_source(source);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
