//! stewart-teleop: drive the robot head from an operator input device
//!
//! Powers up the motors, moves to the startup vector, then maps input
//! snapshots to actuator commands until interrupted.
//!
//! Usage:
//!   stewart-teleop --serialport /dev/ttyACM0 [OPTIONS]
//!   stewart-teleop --nomotor < session.jsonl
//!   stewart-teleop --commands [OPTIONS]

mod commands;
mod stdin_input;

#[cfg(feature = "gamepad")]
mod gamepad;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use stewart_core::hardware::{MOTOR_IDS, MOTOR_NAMES, NUM_LEGS};
use stewart_core::{
    power_up, CurrentProfile, Error, HardwareBackend, InputSource, MotorBackend, SerialConfig,
    SimulatedBackend, StartupConfig, StewartIk, StopSignal, TeleopConfig, TeleopLoop,
};

use stdin_input::StdinInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputKind {
    /// JSON-lines snapshots on stdin
    Stdin,
    /// First connected gamepad (needs the `gamepad` feature)
    Gamepad,
}

/// Teleoperation for the Stewart-platform robot head.
#[derive(Parser, Debug)]
#[command(name = "stewart-teleop", version)]
#[command(about = "Joystick teleoperation for the Stewart-platform robot head")]
struct Args {
    /// Serial port of the servo bus.
    #[arg(long, default_value = "/dev/ttyACM0")]
    serialport: String,

    /// Dry run: record commands instead of driving motors.
    #[arg(long)]
    nomotor: bool,

    /// Leg goal current while moving to the startup vector.
    #[arg(long, default_value_t = 30)]
    initial_current: i32,

    /// Leg goal current once settled.
    #[arg(long, default_value_t = 30)]
    operating_current: i32,

    /// Per-leg scale for the operating current (six values).
    #[arg(long, num_args = NUM_LEGS, default_values_t = [1.0; NUM_LEGS])]
    current_ratios: Vec<f64>,

    /// Where operator input comes from.
    #[arg(long, value_enum, default_value_t = InputKind::Stdin)]
    input: InputKind,

    /// Read present positions after every dispatch.
    #[arg(long)]
    read_feedback: bool,

    /// Print present positions once and exit.
    #[arg(long, conflicts_with = "nomotor")]
    status: bool,

    /// Read typed motor commands from stdin instead of teleop input.
    #[arg(long, conflicts_with = "status")]
    commands: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn connect_backend(args: &Args) -> Result<Arc<dyn MotorBackend>> {
    if args.nomotor {
        tracing::info!("Dry run: using simulated motors");
        return Ok(Arc::new(SimulatedBackend::new()));
    }
    let backend = HardwareBackend::connect(SerialConfig::new(&args.serialport))
        .with_context(|| format!("Failed to open servo bus on {}", args.serialport))?;
    Ok(Arc::new(backend))
}

fn current_profile(args: &Args) -> Result<CurrentProfile> {
    let ratios: [f64; NUM_LEGS] = args.current_ratios.as_slice().try_into().map_err(|_| {
        anyhow!(
            "--current-ratios needs {} values, got {}",
            NUM_LEGS,
            args.current_ratios.len()
        )
    })?;
    let profile =
        CurrentProfile::new(args.initial_current, args.operating_current).with_ratios(ratios);
    profile.validate().context("Invalid current profile")?;
    Ok(profile)
}

fn open_input(kind: InputKind) -> Result<Box<dyn InputSource>> {
    match kind {
        InputKind::Stdin => Ok(Box::new(
            StdinInput::spawn().context("Failed to start stdin reader")?,
        )),
        #[cfg(feature = "gamepad")]
        InputKind::Gamepad => Ok(Box::new(
            gamepad::GamepadInput::open().context("Failed to open gamepad")?,
        )),
        #[cfg(not(feature = "gamepad"))]
        InputKind::Gamepad => Err(anyhow!(
            "gamepad input needs a build with `--features gamepad`"
        )),
    }
}

fn print_status(backend: &dyn MotorBackend) -> Result<()> {
    let positions = backend
        .read_all_positions()
        .context("Failed to read motor positions")?;
    println!("{:<10} {:>4} {:>9}", "motor", "id", "degrees");
    for ((name, id), angle) in MOTOR_NAMES.iter().zip(MOTOR_IDS).zip(positions) {
        println!("{:<10} {:>4} {:>9.1}", name, id, angle.to_degrees());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_json);

    tracing::info!("stewart-teleop {} starting", stewart_core::VERSION);

    let profile = current_profile(&args)?;
    let backend = connect_backend(&args)?;

    if args.status {
        return print_status(backend.as_ref());
    }

    let stop = StopSignal::new();
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            tracing::info!("Interrupt received, stopping");
            stop.stop();
        })
        .context("Failed to install interrupt handler")?;
    }

    let startup = StartupConfig::default();
    let mut state = startup.initial_state(StewartIk::default());
    match power_up(backend.as_ref(), &state, &profile, &startup, &stop) {
        Ok(()) => {}
        Err(Error::Interrupted(reason)) => {
            tracing::info!("Power-up aborted: {}", reason);
            return Ok(());
        }
        Err(e) => return Err(e).context("Power-up failed"),
    }

    if args.commands {
        let lines = stdin_input::spawn_line_reader().context("Failed to start stdin reader")?;
        commands::run_commands(backend.as_ref(), &mut state, &startup, &lines, &stop);
        println!("Torque left enabled at the last commanded position.");
        return Ok(());
    }

    let mut source = open_input(args.input)?;
    let config = TeleopConfig::default().with_read_feedback(args.read_feedback);
    let mut teleop = TeleopLoop::new(backend, state, config);

    let stats = teleop.run(source.as_mut(), &stop)?;
    tracing::info!(
        ticks = stats.ticks,
        dispatches = stats.dispatches,
        write_failures = stats.write_failures,
        feedback_failures = stats.feedback_failures,
        max_dispatch_us = stats.max_dispatch_time.as_micros() as u64,
        "Session finished"
    );
    println!("Torque left enabled at the last commanded position.");
    Ok(())
}
