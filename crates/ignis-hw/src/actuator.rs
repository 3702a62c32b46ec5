//! Single-channel simulated actuator with rate-limited response.

use std::time::Instant;

/// Simulated output channel.
///
/// `set` moves the target (clamped to the channel range); `read` slews the
/// current value toward the target at the rate implied by
/// `response_time`, the time to traverse the full range. The current
/// value never overshoots the target, so `|current - target|` is
/// non-increasing across reads while the target is held fixed.
#[derive(Debug)]
pub struct Actuator {
    name: String,
    min_value: f64,
    max_value: f64,
    /// Time to traverse the full range, in seconds. Zero means the
    /// channel snaps to the target instantaneously.
    response_time: f64,
    current_value: f64,
    target_value: f64,
    last_update: Instant,
}

impl Actuator {
    pub fn new(name: impl Into<String>, min_value: f64, max_value: f64, response_time: f64) -> Self {
        Self {
            name: name.into(),
            min_value,
            max_value,
            response_time,
            current_value: 0.0,
            target_value: 0.0,
            last_update: Instant::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The commanded target, after clamping.
    pub fn target(&self) -> f64 {
        self.target_value
    }

    /// Set the target value, clamped to the channel range. Out-of-range
    /// commands are never rejected, only clamped.
    pub fn set(&mut self, value: f64) {
        self.target_value = value.clamp(self.min_value, self.max_value);
    }

    /// Advance the channel to time `now` and return the current value.
    pub fn read(&mut self, now: Instant) -> f64 {
        let dt = now.saturating_duration_since(self.last_update).as_secs_f64();

        if self.response_time > 0.0 {
            let max_change = dt / self.response_time * (self.max_value - self.min_value);

            if self.current_value < self.target_value {
                self.current_value = (self.current_value + max_change).min(self.target_value);
            } else if self.current_value > self.target_value {
                self.current_value = (self.current_value - max_change).max(self.target_value);
            }
        } else {
            // Instant response
            self.current_value = self.target_value;
        }

        self.last_update = now;
        self.current_value
    }
}
