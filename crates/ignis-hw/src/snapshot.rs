//! Immutable per-tick data snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One simulation tick's published state: noisy sensor readings, actuator
/// positions, and the ignition flag. Published once per tick into a
/// bounded queue and never mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataSnapshot {
    pub timestamp: DateTime<Utc>,
    pub sensors: HashMap<String, f64>,
    pub actuators: HashMap<String, f64>,
    pub ignited: bool,
}

impl DataSnapshot {
    /// Sensor reading by channel name.
    pub fn sensor(&self, name: &str) -> Option<f64> {
        self.sensors.get(name).copied()
    }

    /// Actuator position by channel name.
    pub fn actuator(&self, name: &str) -> Option<f64> {
        self.actuators.get(name).copied()
    }
}
