//! ignis-hw: virtual engine hardware and its simulation engine.
//!
//! This crate owns everything with state, timing, or I/O in the control
//! core:
//! - single-channel sensor and actuator models
//! - typed, validated engine parameters
//! - the hardware simulation engine: a fixed-rate loop on a dedicated
//!   thread that advances the simplified chamber model, runs the ignition
//!   state machine, and publishes snapshots into a bounded lossy queue
//! - the line-oriented serial link for the hardware variant
//!
//! # Concurrency model
//!
//! The simulation thread exclusively owns the physics state. Sensors and
//! actuators each sit behind their own `Mutex` in maps that are fixed at
//! construction, so caller-thread reads and setpoint writes are guarded
//! word-for-word. The bounded snapshot channel is the only other
//! inter-thread handoff; it drops on overflow and never blocks the loop.

pub mod actuator;
pub mod config;
pub mod engine;
pub mod error;
pub mod sensor;
pub mod serial;
pub mod snapshot;

pub use actuator::Actuator;
pub use config::EngineParams;
pub use engine::{chamber_state, channels, mixture_ratio, ChamberState, VirtualEngine};
pub use error::{HwError, HwResult};
pub use sensor::Sensor;
pub use serial::{encode_command, parse_telemetry_line, SerialLink, SerialTransport, TelemetryFrame};
pub use snapshot::DataSnapshot;
