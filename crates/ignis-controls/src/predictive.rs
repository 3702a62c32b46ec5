//! Prediction-guided controller blending.
//!
//! Wraps a plain [`PidController`] together with an optional external
//! prediction service. When a service is attached, the controller asks it
//! for a short horizon of forecast engine outputs and blends a correction
//! derived from the first predicted chamber pressure into the PID output.
//! Without a service, or when the service fails, the wrapper behaves
//! exactly like the PID it owns.

use crate::error::ControlResult;
use crate::pid::PidController;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of horizon steps requested from the prediction service.
pub const PREDICTION_HORIZON: usize = 5;

/// Spacing between horizon steps (seconds).
pub const PREDICTION_DT: f64 = 0.1;

/// Fixed weight of the predicted correction in the blended output.
const BLEND_WEIGHT: f64 = 0.3;

/// Engine state vector handed to the prediction service, in the order the
/// external model was trained on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineStateVector {
    /// Oxidizer-to-fuel mass flow ratio (dimensionless)
    pub mixture_ratio: f64,
    /// Chamber pressure [Pa]
    pub chamber_pressure: f64,
    /// Chamber temperature [K]
    pub chamber_temperature: f64,
    /// Chamber volume [m³]
    pub chamber_volume: f64,
    /// Nozzle throat diameter [m]
    pub throat_diameter: f64,
    /// Nozzle exit diameter [m]
    pub exit_diameter: f64,
    /// Simulation time [s]
    pub time: f64,
    /// Fuel mass flow rate [kg/s]
    pub fuel_flow: f64,
}

impl EngineStateVector {
    /// Flatten to the 8-element layout the external model expects.
    pub fn to_array(&self) -> [f64; 8] {
        [
            self.mixture_ratio,
            self.chamber_pressure,
            self.chamber_temperature,
            self.chamber_volume,
            self.throat_diameter,
            self.exit_diameter,
            self.time,
            self.fuel_flow,
        ]
    }

    /// Copy of this state with the time field replaced.
    pub fn at_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }
}

/// One forecast point: the model's three output channels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictedState {
    /// Predicted chamber pressure [Pa]
    pub chamber_pressure: f64,
    /// Predicted exhaust exit velocity [m/s]
    pub exit_velocity: f64,
    /// Predicted thrust [N]
    pub thrust: f64,
}

/// External forecast model. Stateless and synchronous from the caller's
/// point of view; one call covers the whole horizon batch.
pub trait PredictionService {
    /// Predict engine outputs for each state in the batch, in order.
    fn predict(&self, batch: &[EngineStateVector]) -> ControlResult<Vec<PredictedState>>;
}

/// PID controller decorated with an optional prediction blend.
pub struct PredictiveController {
    pid: PidController,
    service: Option<Box<dyn PredictionService>>,
}

impl fmt::Debug for PredictiveController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictiveController")
            .field("pid", &self.pid)
            .field("service", &self.service.is_some())
            .finish()
    }
}

impl PredictiveController {
    /// Wrap a PID controller with no prediction service attached.
    pub fn new(pid: PidController) -> Self {
        Self { pid, service: None }
    }

    /// Attach a prediction service (builder form).
    pub fn with_service(mut self, service: Box<dyn PredictionService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Attach or replace the prediction service.
    pub fn set_service(&mut self, service: Box<dyn PredictionService>) {
        self.service = Some(service);
    }

    /// Detach the prediction service; subsequent updates are plain PID.
    pub fn clear_service(&mut self) {
        self.service = None;
    }

    /// Whether a prediction service is currently attached.
    pub fn has_service(&self) -> bool {
        self.service.is_some()
    }

    /// The wrapped PID controller.
    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    /// Mutable access to the wrapped PID controller.
    pub fn pid_mut(&mut self) -> &mut PidController {
        &mut self.pid
    }

    /// Plain PID update, ignoring any attached service.
    pub fn update(&mut self, measurement: f64, now: f64) -> f64 {
        self.pid.update(measurement, now)
    }

    /// Replicate `state` across the horizon, advancing only the time
    /// field by one step per entry.
    fn horizon_batch(state: &EngineStateVector) -> Vec<EngineStateVector> {
        (0..PREDICTION_HORIZON)
            .map(|i| state.at_time(state.time + (i + 1) as f64 * PREDICTION_DT))
            .collect()
    }

    /// Update with both the current measurement and the model forecast.
    ///
    /// Computes the plain PID output first, then, if a service is
    /// attached and answers, blends in a proportional correction toward
    /// the first predicted chamber pressure:
    ///
    /// `blended = pid·(1−w) + kp·(setpoint − predicted)·w`, `w = 0.3`,
    /// clamped to the PID's output limits. Any service failure or empty
    /// forecast falls back to the plain PID output.
    pub fn update_with_predictions(
        &mut self,
        measurement: f64,
        state: &EngineStateVector,
        now: f64,
    ) -> f64 {
        let pid_output = self.pid.update(measurement, now);

        let Some(service) = self.service.as_ref() else {
            return pid_output;
        };

        let batch = Self::horizon_batch(state);
        let predictions = match service.predict(&batch) {
            Ok(predictions) => predictions,
            // Degrade to plain PID; predictive-path failures are never fatal
            Err(_) => return pid_output,
        };
        let Some(first) = predictions.first() else {
            return pid_output;
        };

        let predicted_error = self.pid.setpoint - first.chamber_pressure;
        let correction = self.pid.kp * predicted_error * BLEND_WEIGHT;

        let mut blended = pid_output * (1.0 - BLEND_WEIGHT) + correction;
        if let Some((min, max)) = self.pid.output_limits {
            blended = blended.clamp(min, max);
        }

        self.pid.set_held_output(blended);
        blended
    }
}
