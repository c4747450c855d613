//! Fixed-step accumulator.
//!
//! Render frames arrive with uneven deltas; the zone always advances in
//! whole fixed steps.

/// Converts variable frame times into fixed simulation steps.
#[derive(Debug)]
pub struct FixedStep {
    /// Fixed step in milliseconds
    step_ms: f32,
    /// Unconsumed frame time
    accumulator: f32,
    /// Cap on steps per frame to prevent spiral of death
    max_updates: u32,
}

impl FixedStep {
    /// Creates an accumulator with the given step.
    #[must_use]
    pub fn new(step_ms: f32) -> Self {
        Self {
            step_ms: step_ms.max(1.0), // Minimum 1ms
            accumulator: 0.0,
            max_updates: 10,
        }
    }

    /// Fixed step in milliseconds.
    #[must_use]
    pub fn step_ms(&self) -> f32 {
        self.step_ms
    }

    /// Adds a frame's worth of time and returns how many fixed steps to run.
    pub fn accumulate(&mut self, frame_ms: f32) -> u32 {
        self.accumulator += frame_ms.max(0.0);
        let mut count = 0;

        while self.accumulator >= self.step_ms && count < self.max_updates {
            self.accumulator -= self.step_ms;
            count += 1;
        }

        // Still behind after the cap: drop the backlog.
        if self.accumulator > self.step_ms * 2.0 {
            self.accumulator = 0.0;
        }

        count
    }
}

/// Deterministic stand-in for render frame times: jitter around the step
/// with an occasional long frame.
pub fn render_frame_ms(rng: &mut fastrand::Rng, step_ms: f32, frame: u64) -> f32 {
    if frame > 0 && frame % 97 == 0 {
        return step_ms * 6.0;
    }
    step_ms * (0.5 + rng.f32())
}
