//! Integration tests: full engine lifecycle against the real simulation
//! thread. Parameters are sped up (100 Hz tick, 0.2 s ignition delay) so
//! each scenario settles within a couple of seconds of wall time.

use ignis_core::units::s;
use ignis_hw::{channels, EngineParams, VirtualEngine};
use std::time::{Duration, Instant};

fn fast_params() -> EngineParams {
    EngineParams {
        simulation_rate_hz: 100.0,
        ignition_delay: s(0.2),
        ..EngineParams::default()
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    condition()
}

/// Drive the standard startup sequence: valves half open, igniter full on.
fn command_ignition(engine: &VirtualEngine) {
    assert!(engine.set_actuator(channels::FUEL_VALVE, 0.5));
    assert!(engine.set_actuator(channels::OXIDIZER_VALVE, 0.5));
    assert!(engine.set_actuator(channels::IGNITER, 1.0));
}

#[test]
fn lifecycle_start_stop_flags() {
    let mut engine = VirtualEngine::new(fast_params()).unwrap();

    assert!(!engine.is_running());
    assert!(engine.start());
    assert!(engine.is_running());

    // Starting twice is refused
    assert!(!engine.start());

    assert!(wait_until(Duration::from_secs(1), || {
        engine.get_latest_data().is_some()
    }));

    assert!(engine.stop());
    assert!(!engine.is_running());

    // Stopping twice is refused
    assert!(!engine.stop());
}

#[test]
fn ignition_happens_only_after_sustained_delay() {
    let mut engine = VirtualEngine::new(fast_params()).unwrap();
    assert!(engine.start());

    command_ignition(&engine);
    // Valves and igniter have physical response times on top of the
    // 200 ms ignition delay: nothing can be ignited yet
    assert!(!engine.is_ignited());

    assert!(
        wait_until(Duration::from_secs(3), || engine.is_ignited()),
        "engine failed to ignite"
    );

    engine.stop();
}

#[test]
fn no_ignition_without_fuel_flow() {
    let mut engine = VirtualEngine::new(fast_params()).unwrap();
    assert!(engine.start());

    // Oxidizer and igniter only: the fuel-flow condition never holds
    assert!(engine.set_actuator(channels::OXIDIZER_VALVE, 0.8));
    assert!(engine.set_actuator(channels::IGNITER, 1.0));

    std::thread::sleep(Duration::from_secs(1));
    assert!(!engine.is_ignited());

    // Flow sensors still mirror the valve positions while unignited
    let fuel_flow = engine.read_sensor(channels::FUEL_FLOW_RATE).unwrap();
    assert_eq!(fuel_flow, 0.0);
    let oxidizer_flow = engine.read_sensor(channels::OXIDIZER_FLOW_RATE).unwrap();
    assert!(
        (oxidizer_flow - 0.8 * 0.7).abs() < 0.2,
        "oxidizer flow should track the valve: {oxidizer_flow}"
    );

    engine.stop();
}

#[test]
fn pre_ignition_sensors_reflect_positions_at_ambient_pressure() {
    let mut engine = VirtualEngine::new(fast_params()).unwrap();
    assert!(engine.start());

    assert!(engine.set_actuator(channels::FUEL_VALVE, 0.5));
    std::thread::sleep(Duration::from_millis(800));

    // Flow tracks position * max flow, within the sensor noise band
    let fuel_flow = engine.read_sensor(channels::FUEL_FLOW_RATE).unwrap();
    assert!(
        (fuel_flow - 0.15).abs() < 0.05,
        "expected ~0.15 kg/s, got {fuel_flow}"
    );

    // No combustion: ambient pressure, exactly zero thrust (a zero true
    // value is immune to multiplicative noise)
    let pressure = engine.read_sensor(channels::CHAMBER_PRESSURE).unwrap();
    assert!(
        (pressure - 101_325.0).abs() < 0.3 * 101_325.0,
        "expected ambient pressure, got {pressure}"
    );
    assert_eq!(engine.read_sensor(channels::THRUST), Some(0.0));

    engine.stop();
}

#[test]
fn chamber_pressure_clamps_at_configured_ceiling() {
    let params = EngineParams {
        pressure_factor: 8e6,
        ..fast_params()
    };
    let mut engine = VirtualEngine::new(params).unwrap();
    assert!(engine.start());

    // Full flow: 1.0 kg/s * 8e6 = 8 MPa demanded, ceiling is 5 MPa
    assert!(engine.set_actuator(channels::FUEL_VALVE, 1.0));
    assert!(engine.set_actuator(channels::OXIDIZER_VALVE, 1.0));
    assert!(engine.set_actuator(channels::IGNITER, 1.0));

    assert!(
        wait_until(Duration::from_secs(3), || engine.is_ignited()),
        "engine failed to ignite"
    );
    std::thread::sleep(Duration::from_millis(300));

    let pressure = engine.read_sensor(channels::CHAMBER_PRESSURE).unwrap();
    assert!(
        (pressure - 5e6).abs() < 0.25 * 5e6,
        "expected clamped 5 MPa reading, got {pressure}"
    );

    engine.stop();
}

#[test]
fn snapshots_carry_the_ignition_flag() {
    let mut engine = VirtualEngine::new(fast_params()).unwrap();
    assert!(engine.start());
    command_ignition(&engine);

    assert!(wait_until(Duration::from_secs(3), || engine.is_ignited()));

    // Drain the backlog of pre-ignition snapshots until a post-ignition
    // one arrives; the inner loop empties faster than the 100 Hz producer
    let deadline = Instant::now() + Duration::from_secs(2);
    let mut saw_ignited = false;
    'wait: while Instant::now() < deadline {
        while let Some(snapshot) = engine.get_latest_data() {
            if snapshot.ignited {
                saw_ignited = true;
                break 'wait;
            }
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(saw_ignited, "no snapshot with ignited=true observed");

    engine.stop();
}

#[test]
fn stop_clears_ignition_and_zeroes_sensors() {
    let mut engine = VirtualEngine::new(fast_params()).unwrap();
    assert!(engine.start());
    command_ignition(&engine);
    assert!(wait_until(Duration::from_secs(3), || engine.is_ignited()));

    assert!(engine.stop());
    assert!(!engine.is_ignited());

    // Sensor truths were zeroed; a zero reading is exact
    assert_eq!(engine.read_sensor(channels::CHAMBER_PRESSURE), Some(0.0));
    assert_eq!(engine.read_sensor(channels::THRUST), Some(0.0));
}

#[test]
fn cutting_fuel_after_ignition_does_not_fault() {
    let mut engine = VirtualEngine::new(fast_params()).unwrap();
    assert!(engine.start());
    command_ignition(&engine);
    assert!(wait_until(Duration::from_secs(3), || engine.is_ignited()));

    // Slam the fuel valve shut: mixture ratio hits its zero-fuel guard
    assert!(engine.set_actuator(channels::FUEL_VALVE, 0.0));
    std::thread::sleep(Duration::from_millis(500));

    // The loop is still alive and publishing
    assert!(engine.is_running());
    assert!(wait_until(Duration::from_secs(1), || {
        engine.get_latest_data().is_some()
    }));

    engine.stop();
}
