//! Hardware simulation engine.
//!
//! Owns the named sensor/actuator banks and runs a fixed-rate simulation
//! loop on a dedicated thread: read valve positions, derive propellant
//! flows, advance the ignition state machine, evaluate the simplified
//! chamber model, refresh the sensors, and publish a snapshot.

use crate::actuator::Actuator;
use crate::config::EngineParams;
use crate::sensor::Sensor;
use crate::snapshot::DataSnapshot;
use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Capacity of the lossy snapshot queue.
const SNAPSHOT_QUEUE_CAPACITY: usize = 100;

/// Bounded wait for the simulation thread when stopping.
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Igniter actuator position above which ignition is commanded.
const IGNITER_THRESHOLD: f64 = 0.7;

/// Minimum propellant flow [kg/s] on each channel for ignition.
const MIN_IGNITION_FLOW: f64 = 0.05;

/// Fuel flow below this is treated as zero when forming the mixture ratio.
const FUEL_FLOW_EPSILON: f64 = 1e-6;

/// Nozzle thrust coefficient of the simplified thrust model.
const THRUST_COEFFICIENT: f64 = 1.4;

/// Canonical channel names of the default device suite.
pub mod channels {
    pub const CHAMBER_PRESSURE: &str = "chamber_pressure";
    pub const CHAMBER_TEMPERATURE: &str = "chamber_temperature";
    pub const FUEL_FLOW_RATE: &str = "fuel_flow_rate";
    pub const OXIDIZER_FLOW_RATE: &str = "oxidizer_flow_rate";
    pub const THRUST: &str = "thrust";

    pub const FUEL_VALVE: &str = "fuel_valve";
    pub const OXIDIZER_VALVE: &str = "oxidizer_valve";
    pub const IGNITER: &str = "igniter";
}

/// Lock a device mutex, recovering the inner value if a panicking reader
/// poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// O/F mass flow ratio with a zero-fuel guard: a dead fuel channel yields
/// 0.0 rather than a division blowup.
pub fn mixture_ratio(fuel_flow: f64, oxidizer_flow: f64) -> f64 {
    if fuel_flow > FUEL_FLOW_EPSILON {
        oxidizer_flow / fuel_flow
    } else {
        0.0
    }
}

/// Chamber quantities derived from the current flows and ignition flag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChamberState {
    pub mixture_ratio: f64,
    /// Chamber pressure [Pa]
    pub chamber_pressure: f64,
    /// Chamber temperature [K]
    pub chamber_temperature: f64,
    /// Thrust [N]
    pub thrust: f64,
}

/// Evaluate the simplified chamber model for one tick.
///
/// Ignited: pressure follows total flow times the pressure factor, clamped
/// to [ambient, max]; temperature is the combustion temperature derated to
/// 90% inside the good mixture band (1.5 < r < 4.0) and 70% outside it;
/// thrust is `CF·A_t·p_c`. Unignited: ambient pressure and temperature,
/// zero thrust. Flow sensors mirror the valve-derived flows in both cases.
pub fn chamber_state(
    params: &EngineParams,
    fuel_flow: f64,
    oxidizer_flow: f64,
    ignited: bool,
) -> ChamberState {
    if !ignited {
        return ChamberState {
            mixture_ratio: 0.0,
            chamber_pressure: params.ambient_pressure.value,
            chamber_temperature: params.ambient_temperature.value,
            thrust: 0.0,
        };
    }

    let ratio = mixture_ratio(fuel_flow, oxidizer_flow);

    let total_flow = fuel_flow + oxidizer_flow;
    let chamber_pressure = (total_flow * params.pressure_factor)
        .clamp(params.ambient_pressure.value, params.chamber_pressure_max.value);

    let temperature_factor = if ratio > 1.5 && ratio < 4.0 { 0.9 } else { 0.7 };
    let chamber_temperature = params.combustion_temperature.value * temperature_factor;

    let thrust = THRUST_COEFFICIENT * params.throat_area().value * chamber_pressure;

    ChamberState {
        mixture_ratio: ratio,
        chamber_pressure,
        chamber_temperature,
        thrust,
    }
}

/// Device banks and flags shared between the engine handle and the
/// simulation thread. The maps are fixed at construction; only the values
/// behind the per-device mutexes change.
struct DeviceBank {
    sensors: HashMap<String, Mutex<Sensor>>,
    actuators: HashMap<String, Mutex<Actuator>>,
    running: AtomicBool,
    ignited: AtomicBool,
}

impl DeviceBank {
    fn actuator_position(&self, name: &str, now: Instant) -> f64 {
        self.actuators
            .get(name)
            .map(|actuator| lock(actuator).read(now))
            .unwrap_or(0.0)
    }

    fn set_sensor_value(&self, name: &str, value: f64) {
        if let Some(sensor) = self.sensors.get(name) {
            lock(sensor).set_value(value);
        }
    }

    /// Reset every channel: sensor truths to zero, actuator targets to
    /// zero (positions slew from wherever they are, as real valves would).
    fn reset_devices(&self) {
        for sensor in self.sensors.values() {
            lock(sensor).set_value(0.0);
        }
        for actuator in self.actuators.values() {
            lock(actuator).set(0.0);
        }
    }

    /// Read every channel and assemble a snapshot. Sensor reads go through
    /// the noise model, matching what external callers observe.
    fn snapshot(&self, now: Instant, ignited: bool) -> DataSnapshot {
        let sensors = self
            .sensors
            .iter()
            .map(|(name, sensor)| (name.clone(), lock(sensor).read(now)))
            .collect();
        let actuators = self
            .actuators
            .iter()
            .map(|(name, actuator)| (name.clone(), lock(actuator).read(now)))
            .collect();

        DataSnapshot {
            timestamp: Utc::now(),
            sensors,
            actuators,
            ignited,
        }
    }
}

/// Virtual engine hardware: the public handle.
///
/// The simulation thread exists only between `start()` and `stop()`.
/// Accessors are safe to call from any thread at any time.
pub struct VirtualEngine {
    params: EngineParams,
    bank: Arc<DeviceBank>,
    snapshot_tx: Sender<DataSnapshot>,
    snapshot_rx: Receiver<DataSnapshot>,
    sim_thread: Option<JoinHandle<()>>,
}

impl VirtualEngine {
    /// Build an engine with the default sensor/actuator suite.
    pub fn new(params: EngineParams) -> crate::error::HwResult<Self> {
        params.validate()?;

        let sensors = HashMap::from([
            (
                channels::CHAMBER_PRESSURE.to_string(),
                Mutex::new(Sensor::new("Chamber Pressure", "Pa", 0.03, 10.0)),
            ),
            (
                channels::CHAMBER_TEMPERATURE.to_string(),
                Mutex::new(Sensor::new("Chamber Temperature", "K", 0.02, 10.0)),
            ),
            (
                channels::FUEL_FLOW_RATE.to_string(),
                Mutex::new(Sensor::new("Fuel Flow Rate", "kg/s", 0.04, 10.0)),
            ),
            (
                channels::OXIDIZER_FLOW_RATE.to_string(),
                Mutex::new(Sensor::new("Oxidizer Flow Rate", "kg/s", 0.04, 10.0)),
            ),
            (
                channels::THRUST.to_string(),
                Mutex::new(Sensor::new("Thrust", "N", 0.05, 10.0)),
            ),
        ]);

        let actuators = HashMap::from([
            (
                channels::FUEL_VALVE.to_string(),
                Mutex::new(Actuator::new("Fuel Valve", 0.0, 1.0, 0.2)),
            ),
            (
                channels::OXIDIZER_VALVE.to_string(),
                Mutex::new(Actuator::new("Oxidizer Valve", 0.0, 1.0, 0.2)),
            ),
            (
                channels::IGNITER.to_string(),
                Mutex::new(Actuator::new("Igniter", 0.0, 1.0, 0.05)),
            ),
        ]);

        let (snapshot_tx, snapshot_rx) = bounded(SNAPSHOT_QUEUE_CAPACITY);

        Ok(Self {
            params,
            bank: Arc::new(DeviceBank {
                sensors,
                actuators,
                running: AtomicBool::new(false),
                ignited: AtomicBool::new(false),
            }),
            snapshot_tx,
            snapshot_rx,
            sim_thread: None,
        })
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Start the simulation thread. Returns `false` (with a warning) if
    /// the simulation is already running.
    pub fn start(&mut self) -> bool {
        if self.bank.running.load(Ordering::Acquire) {
            warn!("hardware simulation already running");
            return false;
        }

        self.bank.reset_devices();
        self.bank.ignited.store(false, Ordering::Release);
        self.bank.running.store(true, Ordering::Release);

        let params = self.params.clone();
        let bank = Arc::clone(&self.bank);
        let tx = self.snapshot_tx.clone();

        match thread::Builder::new()
            .name("ignis-sim".to_string())
            .spawn(move || simulation_loop(params, bank, tx))
        {
            Ok(handle) => {
                self.sim_thread = Some(handle);
                info!("virtual hardware simulation started");
                true
            }
            Err(e) => {
                self.bank.running.store(false, Ordering::Release);
                error!(error = %e, "failed to spawn simulation thread");
                false
            }
        }
    }

    /// Stop the simulation thread and zero the hardware. Cancellation is
    /// cooperative; the join waits at most [`JOIN_TIMEOUT`] and then
    /// detaches so shutdown can never hang. Returns `false` (with a
    /// warning) if the simulation is not running.
    pub fn stop(&mut self) -> bool {
        if !self.bank.running.load(Ordering::Acquire) {
            warn!("hardware simulation not running");
            return false;
        }

        self.bank.running.store(false, Ordering::Release);

        if let Some(handle) = self.sim_thread.take() {
            let deadline = Instant::now() + JOIN_TIMEOUT;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                warn!("simulation thread did not exit within {JOIN_TIMEOUT:?}; detaching");
            }
        }

        self.bank.ignited.store(false, Ordering::Release);
        self.bank.reset_devices();

        info!("virtual hardware simulation stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.bank.running.load(Ordering::Acquire)
    }

    pub fn is_ignited(&self) -> bool {
        self.bank.ignited.load(Ordering::Acquire)
    }

    /// Read a sensor through its noise model. `None` for unknown names.
    pub fn read_sensor(&self, name: &str) -> Option<f64> {
        self.bank
            .sensors
            .get(name)
            .map(|sensor| lock(sensor).read(Instant::now()))
    }

    /// Command an actuator target (clamped internally, never rejected for
    /// range). `false` for unknown names.
    pub fn set_actuator(&self, name: &str, value: f64) -> bool {
        match self.bank.actuators.get(name) {
            Some(actuator) => {
                lock(actuator).set(value);
                true
            }
            None => false,
        }
    }

    /// Pop the oldest queued snapshot, if any. Never blocks.
    pub fn get_latest_data(&self) -> Option<DataSnapshot> {
        self.snapshot_rx.try_recv().ok()
    }
}

impl Drop for VirtualEngine {
    fn drop(&mut self) {
        if self.bank.running.load(Ordering::Acquire) {
            self.stop();
        }
    }
}

/// The simulation loop body. Runs on the dedicated thread until the
/// running flag clears; the flag is checked once per tick.
fn simulation_loop(params: EngineParams, bank: Arc<DeviceBank>, tx: Sender<DataSnapshot>) {
    let period = params.tick_period();
    let ignition_delay = Duration::from_secs_f64(params.ignition_delay.value);
    let fuel_max_flow = params.fuel_max_flow.value;
    let oxidizer_max_flow = params.oxidizer_max_flow.value;

    // Deliberately never cleared once set: a lapse in the ignition
    // condition before the delay elapses does not restart the timer.
    let mut ignition_start: Option<Instant> = None;

    info!(rate_hz = params.simulation_rate_hz, "simulation loop running");

    while bank.running.load(Ordering::Acquire) {
        let tick_start = Instant::now();

        let fuel_valve = bank.actuator_position(channels::FUEL_VALVE, tick_start);
        let oxidizer_valve = bank.actuator_position(channels::OXIDIZER_VALVE, tick_start);
        let igniter = bank.actuator_position(channels::IGNITER, tick_start);

        let fuel_flow = fuel_valve * fuel_max_flow;
        let oxidizer_flow = oxidizer_valve * oxidizer_max_flow;

        if !bank.ignited.load(Ordering::Acquire)
            && igniter > IGNITER_THRESHOLD
            && fuel_flow > MIN_IGNITION_FLOW
            && oxidizer_flow > MIN_IGNITION_FLOW
        {
            let started = *ignition_start.get_or_insert(tick_start);
            if tick_start.saturating_duration_since(started) >= ignition_delay {
                bank.ignited.store(true, Ordering::Release);
                info!("engine ignited");
            }
        }

        let ignited = bank.ignited.load(Ordering::Acquire);
        let state = chamber_state(&params, fuel_flow, oxidizer_flow, ignited);

        bank.set_sensor_value(channels::CHAMBER_PRESSURE, state.chamber_pressure);
        bank.set_sensor_value(channels::CHAMBER_TEMPERATURE, state.chamber_temperature);
        bank.set_sensor_value(channels::FUEL_FLOW_RATE, fuel_flow);
        bank.set_sensor_value(channels::OXIDIZER_FLOW_RATE, oxidizer_flow);
        bank.set_sensor_value(channels::THRUST, state.thrust);

        let snapshot = bank.snapshot(Instant::now(), ignited);
        if let Err(TrySendError::Full(_)) = tx.try_send(snapshot) {
            // Queue full: drop this snapshot rather than block the loop
        }

        let elapsed = tick_start.elapsed();
        if elapsed < period {
            thread::sleep(period - elapsed);
        }
    }

    info!("simulation loop exited");
}
