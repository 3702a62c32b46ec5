//! Typed engine simulation parameters.
//!
//! Replaces an untyped parameter map with named, validated fields.
//! Dimensioned fields carry uom SI quantities; serde serializes their
//! base-unit values, so a YAML file holds plain numbers (Pa, K, m, s).

use crate::error::{HwError, HwResult};
use ignis_core::units::{
    k, kgpm3, kgps, m, m3, pa, s, Area, Density, Length, MassRate, Pressure, Temperature, Time,
    Volume,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::time::Duration;

/// Immutable configuration of the simulated engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    /// Combustion chamber volume
    pub chamber_volume: Volume,
    /// Nozzle throat diameter
    pub throat_diameter: Length,
    /// Nozzle exit diameter
    pub exit_diameter: Length,
    /// Fuel density (methane)
    pub fuel_density: Density,
    /// Oxidizer density (nitrous oxide)
    pub oxidizer_density: Density,
    /// Target O/F mixture ratio
    pub mixture_ratio_target: f64,
    /// Chamber pressure ceiling
    pub chamber_pressure_max: Pressure,
    /// Ambient pressure
    pub ambient_pressure: Pressure,
    /// Ambient temperature
    pub ambient_temperature: Temperature,
    /// Adiabatic combustion temperature
    pub combustion_temperature: Temperature,
    /// Simulation loop rate [Hz]
    pub simulation_rate_hz: f64,
    /// Sustained-condition time before ignition
    pub ignition_delay: Time,
    /// Chamber pressure per unit total flow [Pa/(kg/s)]
    pub pressure_factor: f64,
    /// Fuel flow at a fully open fuel valve
    pub fuel_max_flow: MassRate,
    /// Oxidizer flow at a fully open oxidizer valve
    pub oxidizer_max_flow: MassRate,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            chamber_volume: m3(0.001),
            throat_diameter: m(0.03),
            exit_diameter: m(0.09),
            fuel_density: kgpm3(420.0),
            oxidizer_density: kgpm3(1230.0),
            mixture_ratio_target: 2.5,
            chamber_pressure_max: pa(5e6),
            ambient_pressure: pa(101_325.0),
            ambient_temperature: k(290.0),
            combustion_temperature: k(3000.0),
            simulation_rate_hz: 20.0,
            ignition_delay: s(0.5),
            pressure_factor: 5e6,
            fuel_max_flow: kgps(0.3),
            oxidizer_max_flow: kgps(0.7),
        }
    }
}

impl EngineParams {
    /// Validate field ranges. Called by the engine constructor.
    pub fn validate(&self) -> HwResult<()> {
        if !(self.chamber_volume.value > 0.0) {
            return Err(HwError::InvalidParam {
                what: "chamber_volume must be positive",
            });
        }
        if !(self.throat_diameter.value > 0.0) {
            return Err(HwError::InvalidParam {
                what: "throat_diameter must be positive",
            });
        }
        if self.exit_diameter.value < self.throat_diameter.value {
            return Err(HwError::InvalidParam {
                what: "exit_diameter must not be smaller than throat_diameter",
            });
        }
        if !(self.simulation_rate_hz > 0.0) {
            return Err(HwError::InvalidParam {
                what: "simulation_rate_hz must be positive",
            });
        }
        if !(self.ignition_delay.value >= 0.0) {
            return Err(HwError::InvalidParam {
                what: "ignition_delay must be non-negative",
            });
        }
        if self.chamber_pressure_max.value < self.ambient_pressure.value {
            return Err(HwError::InvalidParam {
                what: "chamber_pressure_max must not be below ambient_pressure",
            });
        }
        if !(self.pressure_factor > 0.0) {
            return Err(HwError::InvalidParam {
                what: "pressure_factor must be positive",
            });
        }
        if !(self.fuel_max_flow.value > 0.0) || !(self.oxidizer_max_flow.value > 0.0) {
            return Err(HwError::InvalidParam {
                what: "valve max flows must be positive",
            });
        }
        Ok(())
    }

    /// Nozzle throat cross-sectional area.
    pub fn throat_area(&self) -> Area {
        self.throat_diameter * self.throat_diameter * (PI / 4.0)
    }

    /// Exit-to-throat area expansion ratio.
    pub fn expansion_ratio(&self) -> f64 {
        (self.exit_diameter.value / self.throat_diameter.value).powi(2)
    }

    /// Simulation tick period.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.simulation_rate_hz)
    }
}
