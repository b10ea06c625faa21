use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick (or the last reset), in seconds.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter, starting at 0 after a reset.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Deltas come from `Instant`, so they never go backwards. By default they are
/// raw wall-clock deltas; an upper clamp can be configured for hosts that would
/// rather skip time after a debugger pause than feed a huge step to the world.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_max: Option<Duration>,
}

impl FrameClock {
    /// Creates an unclamped clock whose baseline is now.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Creates an unclamped clock with an explicit baseline.
    pub fn starting_at(baseline: Instant) -> Self {
        Self {
            last: baseline,
            frame_index: 0,
            dt_max: None,
        }
    }

    /// Sets or removes the upper delta clamp.
    pub fn set_max_delta(&mut self, dt_max: Option<Duration>) {
        self.dt_max = dt_max;
    }

    /// Resets the baseline to now and restarts the frame counter.
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    /// Resets the baseline to `baseline` and restarts the frame counter.
    pub fn reset_at(&mut self, baseline: Instant) {
        self.last = baseline;
        self.frame_index = 0;
    }

    /// Advances the clock to now and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`.
    ///
    /// A `now` earlier than the previous tick yields a zero delta and leaves the
    /// baseline where it was.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let mut dt = now.saturating_duration_since(self.last);

        if let Some(max) = self.dt_max {
            dt = dt.min(max);
        }

        if now > self.last {
            self.last = now;
        }

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now: self.last,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
