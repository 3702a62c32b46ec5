//! Error types for hardware simulation.
//!
//! Deliberately small: per the interface contract, unknown device names
//! are sentinel returns (`Option`/`bool`), not errors, and serial resource
//! failures are logged and reported as `bool`. What remains is parameter
//! validation.

use thiserror::Error;

/// Result type for hardware simulation operations.
pub type HwResult<T> = Result<T, HwError>;

/// Errors that can occur constructing hardware simulation state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HwError {
    /// A configuration field failed validation.
    #[error("Invalid parameter: {what}")]
    InvalidParam { what: &'static str },
}
