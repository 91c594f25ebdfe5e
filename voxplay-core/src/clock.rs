/// Frame delta and elapsed time for the render loop
use std::time::Instant;

/// Timing of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous tick
    pub delta: f32,
    /// Seconds since the clock started, truncated to hundredths
    pub elapsed: f32,
}

#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
}

impl FrameClock {
    pub fn new(start: Instant) -> Self {
        Self { start, last: start }
    }

    pub fn tick(&mut self, now: Instant) -> FrameTime {
        let delta = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;

        let elapsed = now.saturating_duration_since(self.start).as_millis() / 10;
        FrameTime {
            delta,
            elapsed: elapsed as f32 / 100.0,
        }
    }
}
