//! Closed-form PID tuning rules.
//!
//! All three rules take a first-order-plus-dead-time process
//! characterization: steady-state gain, time constant, and dead time.

use crate::error::{ControlError, ControlResult};
use crate::pid::PidController;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Named closed-form tuning rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TuningRule {
    ZieglerNichols,
    CohenCoon,
    /// Chien–Hrones–Reswick, 0% overshoot variant.
    ChienHronesReswick,
}

impl TuningRule {
    /// All rules, in documentation order.
    pub const ALL: [TuningRule; 3] = [
        TuningRule::ZieglerNichols,
        TuningRule::CohenCoon,
        TuningRule::ChienHronesReswick,
    ];

    /// Canonical lowercase name of the rule.
    pub fn name(&self) -> &'static str {
        match self {
            TuningRule::ZieglerNichols => "ziegler-nichols",
            TuningRule::CohenCoon => "cohen-coon",
            TuningRule::ChienHronesReswick => "chien-hrones-reswick",
        }
    }
}

impl FromStr for TuningRule {
    type Err = ControlError;

    /// Parse a rule name. An unsupported name is a fatal configuration
    /// error, not something to fall back from.
    fn from_str(name: &str) -> ControlResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ziegler-nichols" => Ok(TuningRule::ZieglerNichols),
            "cohen-coon" => Ok(TuningRule::CohenCoon),
            "chien-hrones-reswick" => Ok(TuningRule::ChienHronesReswick),
            _ => Err(ControlError::UnknownRule {
                rule: name.to_string(),
            }),
        }
    }
}

/// Compute `(kp, ki, kd)` for a process with the given gain, time
/// constant, and dead time under the named rule.
pub fn compute_tunings(
    process_gain: f64,
    time_constant: f64,
    dead_time: f64,
    rule: TuningRule,
) -> ControlResult<(f64, f64, f64)> {
    if !(process_gain > 0.0) {
        return Err(ControlError::InvalidArg {
            what: "process_gain must be positive",
        });
    }
    if !(time_constant > 0.0) {
        return Err(ControlError::InvalidArg {
            what: "time_constant must be positive",
        });
    }
    if !(dead_time > 0.0) {
        return Err(ControlError::InvalidArg {
            what: "dead_time must be positive",
        });
    }

    let tunings = match rule {
        TuningRule::ZieglerNichols => {
            let kp = 1.2 / (process_gain * dead_time / time_constant);
            let ki = kp / (2.0 * dead_time);
            let kd = kp * 0.5 * dead_time;
            (kp, ki, kd)
        }
        TuningRule::CohenCoon => {
            let a = dead_time / (dead_time + time_constant);
            let kp = (1.35 / process_gain) * (1.0 + 0.18 * a / (1.0 - a));
            let ki = kp / (dead_time * (1.17 + 0.53 * a / (1.0 - a)));
            let kd = kp * dead_time * 0.37 * (1.0 - a) / (1.0 + 0.18 * a / (1.0 - a));
            (kp, ki, kd)
        }
        TuningRule::ChienHronesReswick => {
            let kp = 0.6 / (process_gain * dead_time / time_constant);
            let ki = kp / (4.0 * dead_time);
            let kd = kp * 0.5 * dead_time;
            (kp, ki, kd)
        }
    };

    Ok(tunings)
}

impl PidController {
    /// Retune from a process characterization, then reset at time `now`.
    ///
    /// Returns the applied `(kp, ki, kd)`.
    pub fn auto_tune(
        &mut self,
        process_gain: f64,
        time_constant: f64,
        dead_time: f64,
        rule: TuningRule,
        now: f64,
    ) -> ControlResult<(f64, f64, f64)> {
        let (kp, ki, kd) = compute_tunings(process_gain, time_constant, dead_time, rule)?;
        self.set_tunings(kp, ki, kd);
        self.reset(now);
        Ok((kp, ki, kd))
    }
}
