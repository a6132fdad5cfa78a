//! Frame timing utilities

/// Fixed-cap frame clock for the simulation loop.
///
/// The host reports wall-clock elapsed time; the clock clamps it so a long
/// stall (debugger, window drag) never produces one giant simulation step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    max_step: f32,
    delta_time: f32,
    total_time: f64,
    frame_count: u64,
}

impl FrameClock {
    /// Create a new clock with the given maximum step in seconds
    pub fn new(max_step: f32) -> Self {
        Self {
            max_step: max_step.max(0.0),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance by the elapsed host time and return the clamped step
    pub fn tick(&mut self, elapsed_seconds: f32) -> f32 {
        self.delta_time = clamp_step(elapsed_seconds, self.max_step);
        self.total_time += f64::from(self.delta_time);
        self.frame_count += 1;
        self.delta_time
    }

    /// Step produced by the last tick
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Total simulated time in seconds
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Number of ticks so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Maximum step this clock will hand out
    pub fn max_step(&self) -> f32 {
        self.max_step
    }
}

/// Clamp a host-reported elapsed time into `[0, max_step]`.
///
/// Negative and NaN inputs become zero.
pub fn clamp_step(elapsed_seconds: f32, max_step: f32) -> f32 {
    if elapsed_seconds.is_nan() || elapsed_seconds <= 0.0 {
        0.0
    } else {
        elapsed_seconds.min(max_step)
    }
}
