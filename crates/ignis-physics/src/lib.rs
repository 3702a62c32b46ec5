//! ignis-physics: closed-form rocket engine performance kernel.
//!
//! Pure, deterministic functions over f64 SI scalars. No state, no I/O,
//! no failure paths: every function is total over its documented domain.
//!
//! Contents:
//! - nozzle (area–Mach relation, isentropic ratios, exit velocity)
//! - combustion (propellant-pair property lookup)
//! - performance (thrust, Isp, choked mass flow, c*, chamber filling)

pub mod combustion;
pub mod nozzle;
pub mod performance;

pub use combustion::{CombustionProperties, PropellantPair, combustion_properties};
pub use nozzle::{
    area_ratio_for_mach, circle_area, exit_mach, exit_velocity, optimal_expansion_ratio,
    pressure_ratio, temperature_ratio,
};
pub use performance::{
    chamber_pressure_rate, characteristic_velocity, mass_flow_rate, specific_impulse, thrust,
};
