use std::time::{Duration, Instant};

/// Monotonic clock driving the orchestration tick. The render loop owns it
/// and samples it once per frame; everything else reads the sampled value.
pub struct AnimationClock {
    start: Instant,
    last: Instant,
    pub delta: Duration,
}

impl AnimationClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now, delta: Duration::from_secs_f32(0.0) }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last;
        self.last = now;
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.last.duration_since(self.start).as_secs_f32()
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new()
    }
}
