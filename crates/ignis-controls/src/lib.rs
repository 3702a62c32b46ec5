//! Feedback control for the ignis engine simulation.
//!
//! This crate provides the scalar control domain that runs alongside the
//! hardware simulation: a discrete PID controller with sampled/digital
//! semantics, closed-form tuning rules, and a prediction-guided blend that
//! decorates the PID with an external model's short-horizon forecasts.
//!
//! # Design Principles
//!
//! - **Clock-free**: controllers take explicit `now` timestamps (seconds on
//!   an arbitrary monotonic origin) and never read a wall clock
//! - **Composition over inheritance**: the predictive controller owns a
//!   plain PID plus an optional service object, rather than extending it
//! - **Graceful degradation**: a missing or failing prediction service
//!   falls back to the plain PID output, never to an error

pub mod error;
pub mod pid;
pub mod predictive;
pub mod tuning;

pub use error::{ControlError, ControlResult};
pub use pid::PidController;
pub use predictive::{
    EngineStateVector, PredictedState, PredictionService, PredictiveController,
    PREDICTION_DT, PREDICTION_HORIZON,
};
pub use tuning::{compute_tunings, TuningRule};
