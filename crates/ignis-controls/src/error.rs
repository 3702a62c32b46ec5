//! Error types for control operations.

use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Tuning rule name that none of the closed-form rules match.
    /// Fatal to the call: a misconfigured rule is never retried.
    #[error("Unknown tuning rule: {rule}")]
    UnknownRule { rule: String },

    /// Prediction service failure. The predictive controller absorbs
    /// these and degrades to the plain PID output.
    #[error("Prediction service error: {what}")]
    Prediction { what: String },
}
