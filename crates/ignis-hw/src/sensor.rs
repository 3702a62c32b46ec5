//! Single-channel simulated sensor with bounded, refresh-periodic noise.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use std::time::{Duration, Instant};

/// Floor added to the noise standard deviation so a zero reading still
/// jitters slightly on refresh.
const NOISE_SIGMA_FLOOR: f64 = 1e-6;

/// Simulated measurement channel.
///
/// The noise model is a *refresh-periodic injector*, not a low-pass
/// filter: a fresh noise sample is drawn only when at least
/// `update_interval` has elapsed since the previous draw, and on all
/// other reads the raw true value is returned unmodified (not the
/// previous noisy reading). Downstream consumers depend on this exact
/// timing, so keep it; it conflates the sampling rate with the noise
/// draw rate and is flagged for clarification rather than silently
/// changed.
#[derive(Debug)]
pub struct Sensor {
    name: String,
    units: String,
    /// Noise standard deviation as a fraction of the reading.
    noise_level: f64,
    update_interval: Duration,
    value: f64,
    last_update: Instant,
    rng: SmallRng,
}

impl Sensor {
    /// Create a sensor refreshing noise at `update_rate_hz`.
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        noise_level: f64,
        update_rate_hz: f64,
    ) -> Self {
        Self {
            name: name.into(),
            units: units.into(),
            noise_level,
            update_interval: Duration::from_secs_f64(1.0 / update_rate_hz),
            value: 0.0,
            last_update: Instant::now(),
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Same as [`Sensor::new`] with a fixed RNG seed, for deterministic
    /// tests.
    pub fn with_seed(
        name: impl Into<String>,
        units: impl Into<String>,
        noise_level: f64,
        update_rate_hz: f64,
        seed: u64,
    ) -> Self {
        let mut sensor = Self::new(name, units, noise_level, update_rate_hz);
        sensor.rng = SmallRng::seed_from_u64(seed);
        sensor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    /// The ground-truth value, noise-free.
    pub fn true_value(&self) -> f64 {
        self.value
    }

    /// Overwrite the ground-truth value. Does not touch the noise timer.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    /// Read the channel at time `now`.
    ///
    /// Draws noise `~ Normal(0, noise_level·|value| + ε)` if the refresh
    /// interval has elapsed, otherwise returns the raw value. A sensor
    /// configured with `noise_level == 0` is exact on every read.
    pub fn read(&mut self, now: Instant) -> f64 {
        let mut noise = 0.0;

        if self.noise_level > 0.0
            && now.saturating_duration_since(self.last_update) >= self.update_interval
        {
            let sigma = self.noise_level * self.value.abs() + NOISE_SIGMA_FLOOR;
            if let Ok(dist) = Normal::new(0.0, sigma) {
                noise = self.rng.sample(dist);
            }
            self.last_update = now;
        }

        self.value * (1.0 + noise)
    }
}
