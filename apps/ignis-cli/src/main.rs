use clap::{Parser, Subcommand};
use ignis_controls::{compute_tunings, PidController, TuningRule};
use ignis_hw::{channels, EngineParams, HwError, VirtualEngine};
use ignis_physics::{
    combustion_properties, exit_mach, exit_velocity, specific_impulse, thrust, PropellantPair,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "ignis-cli")]
#[command(about = "Ignis CLI - rocket engine control simulation driver", long_about = None)]
struct Cli {
    /// Engine parameter YAML file; built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted open-loop firing sequence and print telemetry
    Demo {
        /// Burn duration after ignition, seconds
        #[arg(long, default_value_t = 5.0)]
        duration: f64,
    },
    /// Hold a chamber-pressure setpoint with a PID driving both valves
    ClosedLoop {
        /// Chamber pressure setpoint, MPa
        #[arg(long, default_value_t = 3.0)]
        setpoint_mpa: f64,
        /// Run duration after ignition, seconds
        #[arg(long, default_value_t = 10.0)]
        duration: f64,
    },
    /// Compute PID gains for a process characterization
    Tune {
        /// Process steady-state gain
        process_gain: f64,
        /// Process time constant, seconds
        time_constant: f64,
        /// Process dead time, seconds
        dead_time: f64,
        /// ziegler-nichols | cohen-coon | chien-hrones-reswick
        #[arg(long, default_value = "ziegler-nichols")]
        rule: String,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error("hardware error: {0}")]
    Hw(#[from] HwError),
    #[error("control error: {0}")]
    Control(#[from] ignis_controls::ControlError),
    #[error("{0}")]
    Sequence(String),
}

fn main() -> Result<(), CliError> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let params = load_params(cli.config.as_deref())?;

    match cli.command {
        Commands::Demo { duration } => cmd_demo(params, duration),
        Commands::ClosedLoop {
            setpoint_mpa,
            duration,
        } => cmd_closed_loop(params, setpoint_mpa * 1e6, duration),
        Commands::Tune {
            process_gain,
            time_constant,
            dead_time,
            rule,
        } => cmd_tune(process_gain, time_constant, dead_time, &rule),
    }
}

fn load_params(path: Option<&Path>) -> Result<EngineParams, CliError> {
    let params = match path {
        Some(path) => serde_yaml::from_str(&std::fs::read_to_string(path)?)?,
        None => EngineParams::default(),
    };
    params.validate()?;
    Ok(params)
}

/// Bring the engine from cold to ignited, or fail with a message.
fn ignite(engine: &VirtualEngine, fuel_valve: f64, oxidizer_valve: f64) -> Result<(), CliError> {
    engine.set_actuator(channels::FUEL_VALVE, fuel_valve);
    engine.set_actuator(channels::OXIDIZER_VALVE, oxidizer_valve);

    // Let the valves open before commanding the igniter
    std::thread::sleep(Duration::from_secs(1));
    engine.set_actuator(channels::IGNITER, 1.0);

    let timeout = Duration::from_secs_f64(engine.params().ignition_delay.value + 3.0);
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if engine.is_ignited() {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    Err(CliError::Sequence(
        "engine failed to ignite within the expected window".to_string(),
    ))
}

/// Close everything and stop the simulation.
fn shutdown(engine: &mut VirtualEngine) {
    engine.set_actuator(channels::IGNITER, 0.0);
    engine.set_actuator(channels::FUEL_VALVE, 0.0);
    engine.set_actuator(channels::OXIDIZER_VALVE, 0.0);
    std::thread::sleep(Duration::from_secs(1));
    engine.stop();
}

fn print_telemetry(engine: &VirtualEngine, t: f64) {
    let pressure = engine.read_sensor(channels::CHAMBER_PRESSURE).unwrap_or(0.0);
    let temperature = engine
        .read_sensor(channels::CHAMBER_TEMPERATURE)
        .unwrap_or(0.0);
    let thrust_reading = engine.read_sensor(channels::THRUST).unwrap_or(0.0);

    println!(
        "  t={t:5.1}s  p_c={:6.2} MPa  T_c={:7.1} K  F={:8.1} N",
        pressure / 1e6,
        temperature,
        thrust_reading
    );
}

fn cmd_demo(params: EngineParams, duration: f64) -> Result<(), CliError> {
    print_nozzle_summary(&params);

    let mut engine = VirtualEngine::new(params)?;
    if !engine.start() {
        return Err(CliError::Sequence("failed to start simulation".to_string()));
    }

    println!("Opening valves and igniting...");
    ignite(&engine, 0.3, 0.6)?;
    println!("Engine ignited.");

    let steps = duration.ceil() as u64;
    for i in 0..steps {
        std::thread::sleep(Duration::from_secs(1));
        print_telemetry(&engine, (i + 1) as f64);
    }

    println!("Shutting down.");
    shutdown(&mut engine);
    Ok(())
}

fn cmd_closed_loop(params: EngineParams, setpoint: f64, duration: f64) -> Result<(), CliError> {
    // Plant: p_c ≈ valve_position * (fuel_max + ox_max) * pressure_factor,
    // so normalize the loop gain by that slope
    let plant_gain =
        (params.fuel_max_flow.value + params.oxidizer_max_flow.value) * params.pressure_factor;
    let mut pid = PidController::new(1.0 / plant_gain, 0.5 / plant_gain, 0.0)
        .with_setpoint(setpoint)
        .with_output_limits(0.05, 1.0)?
        .with_sample_time(0.05)?;

    let mut engine = VirtualEngine::new(params)?;
    if !engine.start() {
        return Err(CliError::Sequence("failed to start simulation".to_string()));
    }

    println!("Igniting before closing the loop...");
    ignite(&engine, 0.5, 0.5)?;
    println!(
        "Holding {:.2} MPa for {duration:.0} s:",
        setpoint / 1e6
    );

    let t0 = Instant::now();
    let mut last_print = 0u64;
    pid.reset(0.0);
    while t0.elapsed().as_secs_f64() < duration {
        let t = t0.elapsed().as_secs_f64();
        if let Some(measurement) = engine.read_sensor(channels::CHAMBER_PRESSURE) {
            let command = pid.update(measurement, t);
            engine.set_actuator(channels::FUEL_VALVE, command);
            engine.set_actuator(channels::OXIDIZER_VALVE, command);
        }

        let second = t as u64;
        if second > last_print {
            last_print = second;
            print_telemetry(&engine, t);
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    println!("Shutting down.");
    shutdown(&mut engine);
    Ok(())
}

fn cmd_tune(
    process_gain: f64,
    time_constant: f64,
    dead_time: f64,
    rule: &str,
) -> Result<(), CliError> {
    let rule: TuningRule = rule.parse()?;
    let (kp, ki, kd) = compute_tunings(process_gain, time_constant, dead_time, rule)?;

    println!("Rule: {}", rule.name());
    println!("  kp = {kp:.6}");
    println!("  ki = {ki:.6}");
    println!("  kd = {kd:.6}");
    Ok(())
}

/// Steady-state nozzle performance estimate from the closed-form kernel,
/// at the target mixture ratio and maximum chamber pressure.
fn print_nozzle_summary(params: &EngineParams) {
    let props = combustion_properties(
        PropellantPair::MethaneNitrousOxide,
        params.mixture_ratio_target,
    );
    let expansion_ratio = params.expansion_ratio();
    let mach = exit_mach(expansion_ratio, props.gamma);
    let velocity = exit_velocity(
        props.combustion_temperature,
        mach,
        props.gamma,
        props.molecular_weight,
    );
    let mass_flow = ignis_physics::mass_flow_rate(
        params.chamber_pressure_max.value,
        params.throat_area().value,
        props.combustion_temperature,
        props.gamma,
        props.molecular_weight,
    );
    let ideal_thrust = thrust(
        mass_flow,
        velocity,
        params.ambient_pressure.value,
        params.ambient_pressure.value,
        0.0,
    );
    let isp = specific_impulse(ideal_thrust, mass_flow);

    println!("Nozzle performance at {:.1} MPa chamber pressure:", params.chamber_pressure_max.value / 1e6);
    println!("  expansion ratio: {expansion_ratio:.1}");
    println!("  exit Mach:       {mach:.2}");
    println!("  exit velocity:   {velocity:.0} m/s");
    println!("  mass flow:       {mass_flow:.2} kg/s");
    println!("  ideal Isp:       {isp:.0} s");
}
