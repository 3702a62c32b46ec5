//! Discrete PID controller with sampled/digital semantics.
//!
//! The controller recomputes its output at most once per `sample_time`;
//! between samples the previous output is held (zero-order hold). Both
//! the integral accumulator and the output support optional clamping, and
//! the derivative can act on the measurement instead of the error to
//! suppress derivative kick on setpoint changes.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// Discrete PID controller.
///
/// Timestamps are `f64` seconds on an arbitrary monotonic origin; the
/// controller never reads a clock. One instance is strictly
/// single-threaded: concurrent `update` calls must be serialized by the
/// caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidController {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
    /// Target value for the controlled measurement.
    pub setpoint: f64,
    /// Optional (min, max) clamp applied to the output.
    pub output_limits: Option<(f64, f64)>,
    /// Optional (min, max) clamp applied to the integral accumulator.
    pub integral_limits: Option<(f64, f64)>,
    /// Differentiate the measurement rather than the error.
    pub derivative_on_measurement: bool,
    /// Minimum time between output recomputations (seconds).
    pub sample_time: f64,

    last_time: f64,
    last_error: f64,
    last_measurement: f64,
    integral: f64,
    output: f64,
}

impl PidController {
    /// Create a controller with the given gains.
    ///
    /// Defaults: setpoint 0, no output or integral limits, derivative on
    /// error, 10 ms sample time, time origin at 0.
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            setpoint: 0.0,
            output_limits: None,
            integral_limits: None,
            derivative_on_measurement: false,
            sample_time: 0.01,
            last_time: 0.0,
            last_error: 0.0,
            last_measurement: 0.0,
            integral: 0.0,
            output: 0.0,
        }
    }

    /// Set the controller setpoint (builder form).
    pub fn with_setpoint(mut self, setpoint: f64) -> Self {
        self.setpoint = setpoint;
        self
    }

    /// Clamp the output to `[min, max]`.
    pub fn with_output_limits(mut self, min: f64, max: f64) -> ControlResult<Self> {
        if min >= max {
            return Err(ControlError::InvalidArg {
                what: "output min must be less than max",
            });
        }
        self.output_limits = Some((min, max));
        Ok(self)
    }

    /// Clamp the integral accumulator to `[min, max]`.
    pub fn with_integral_limits(mut self, min: f64, max: f64) -> ControlResult<Self> {
        if min >= max {
            return Err(ControlError::InvalidArg {
                what: "integral min must be less than max",
            });
        }
        self.integral_limits = Some((min, max));
        Ok(self)
    }

    /// Set the minimum recomputation interval.
    pub fn with_sample_time(mut self, sample_time: f64) -> ControlResult<Self> {
        if !(sample_time >= 0.0) {
            return Err(ControlError::InvalidArg {
                what: "sample_time must be non-negative",
            });
        }
        self.sample_time = sample_time;
        Ok(self)
    }

    /// Differentiate the measurement instead of the error.
    pub fn with_derivative_on_measurement(mut self, enabled: bool) -> Self {
        self.derivative_on_measurement = enabled;
        self
    }

    /// Replace the controller gains. Accumulated state is kept.
    pub fn set_tunings(&mut self, kp: f64, ki: f64, kd: f64) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// Move the setpoint.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    /// The most recently computed (or held) output.
    pub fn output(&self) -> f64 {
        self.output
    }

    /// Clear all accumulated state and restamp the controller clock.
    pub fn reset(&mut self, now: f64) {
        self.last_error = 0.0;
        self.last_measurement = 0.0;
        self.integral = 0.0;
        self.output = 0.0;
        self.last_time = now;
    }

    /// Advance the controller with a new measurement at time `now`.
    ///
    /// If less than `sample_time` has elapsed since the last
    /// recomputation, the held output is returned unchanged.
    pub fn update(&mut self, measurement: f64, now: f64) -> f64 {
        let dt = now - self.last_time;

        // Rate-limited recomputation: hold between samples
        if dt < self.sample_time {
            return self.output;
        }

        let error = self.setpoint - measurement;

        let proportional = self.kp * error;

        self.integral += self.ki * error * dt;
        if let Some((min, max)) = self.integral_limits {
            self.integral = self.integral.clamp(min, max);
        }

        let derivative = if self.derivative_on_measurement {
            -self.kd * (measurement - self.last_measurement) / dt
        } else {
            self.kd * (error - self.last_error) / dt
        };

        let mut output = proportional + self.integral + derivative;
        if let Some((min, max)) = self.output_limits {
            output = output.clamp(min, max);
        }

        self.last_error = error;
        self.last_measurement = measurement;
        self.last_time = now;
        self.output = output;

        output
    }

    /// Overwrite the held output. Used by decorating controllers that
    /// post-process the PID output and must keep the hold consistent.
    pub(crate) fn set_held_output(&mut self, output: f64) {
        self.output = output;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ignis_core::{nearly_equal, Tolerances};

    #[test]
    fn proportional_only_matches_clamped_kp_error() {
        let mut pid = PidController::new(2.0, 0.0, 0.0)
            .with_setpoint(10.0)
            .with_output_limits(-5.0, 5.0)
            .unwrap();

        // error = 10 - 8 = 2, kp*error = 4, inside limits
        assert!((pid.update(8.0, 0.1) - 4.0).abs() < 1e-12);

        // error = 10 - 0 = 10, kp*error = 20, clamped to 5
        assert_eq!(pid.update(0.0, 0.2), 5.0);
    }

    #[test]
    fn holds_output_within_sample_time() {
        let mut pid = PidController::new(1.0, 0.0, 0.0)
            .with_setpoint(1.0)
            .with_sample_time(0.1)
            .unwrap();

        let first = pid.update(0.0, 0.2);
        assert!((first - 1.0).abs() < 1e-12);

        // 50 ms later: under the sample time, output held even though the
        // measurement moved
        let held = pid.update(0.9, 0.25);
        assert_eq!(held, first);

        // 100 ms later: recomputed
        let second = pid.update(0.9, 0.3);
        assert!((second - 0.1).abs() < 1e-12);
    }

    #[test]
    fn integral_accumulates_constant_error() {
        let mut pid = PidController::new(0.0, 1.0, 0.0).with_setpoint(1.0);

        let mut t = 0.0;
        let mut out = 0.0;
        for _ in 0..10 {
            t += 0.1;
            out = pid.update(0.0, t);
        }
        // integral of error 1.0 over 1.0 s
        assert!(nearly_equal(out, 1.0, Tolerances::default()));
    }

    #[test]
    fn integral_respects_limits() {
        let mut pid = PidController::new(0.0, 10.0, 0.0)
            .with_setpoint(1.0)
            .with_integral_limits(-0.5, 0.5)
            .unwrap();

        let mut t = 0.0;
        for _ in 0..100 {
            t += 0.1;
            pid.update(0.0, t);
        }
        assert!(pid.output() <= 0.5 + 1e-12);
    }

    #[test]
    fn derivative_on_measurement_suppresses_setpoint_kick() {
        let mut on_error = PidController::new(0.0, 0.0, 1.0);
        let mut on_meas = PidController::new(0.0, 0.0, 1.0).with_derivative_on_measurement(true);

        on_error.update(0.0, 0.1);
        on_meas.update(0.0, 0.1);

        // Step the setpoint with the measurement unchanged
        on_error.set_setpoint(10.0);
        on_meas.set_setpoint(10.0);

        let kicked = on_error.update(0.0, 0.2);
        let smooth = on_meas.update(0.0, 0.2);

        assert!(kicked > 50.0, "expected derivative kick, got {kicked}");
        assert_eq!(smooth, 0.0);
    }

    #[test]
    fn reset_clears_accumulated_state() {
        let mut pid = PidController::new(1.0, 1.0, 0.0).with_setpoint(1.0);
        for i in 1..=10 {
            pid.update(0.0, i as f64 * 0.1);
        }
        assert!(pid.output() > 0.0);

        pid.reset(2.0);
        assert_eq!(pid.output(), 0.0);

        // Next update uses the restamped clock, not the stale origin
        let out = pid.update(0.0, 2.1);
        let expected = 1.0 + 1.0 * 0.1; // P + I over 0.1 s
        assert!(nearly_equal(out, expected, Tolerances::default()));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn integral_never_exits_limits(
                errors in prop::collection::vec(-100.0_f64..100.0, 1..50),
                dt in 0.01_f64..1.0,
            ) {
                let mut pid = PidController::new(0.0, 5.0, 0.0)
                    .with_setpoint(0.0)
                    .with_integral_limits(-1.0, 1.0)
                    .unwrap();

                let mut t = 0.0;
                for e in errors {
                    t += dt;
                    // measurement = -error since setpoint is zero
                    let out = pid.update(-e, t);
                    prop_assert!(out >= -1.0 - 1e-9 && out <= 1.0 + 1e-9);
                }
            }
        }
    }
}
