//! Hardware motor backend over a serial servo bus
//!
//! # Example
//!
//! ```no_run
//! use stewart_core::hardware::{HardwareBackend, MotorBackend, SerialConfig};
//!
//! let backend = HardwareBackend::connect(SerialConfig::new("/dev/ttyACM0"))?;
//! backend.enable_torque()?;
//! let positions = backend.read_all_positions()?;
//! println!("Positions: {:?}", positions);
//! # Ok::<(), stewart_core::Error>(())
//! ```

mod bus;
mod config;
#[cfg(test)]
mod virtual_bus;

pub use bus::{radians_to_raw, raw_to_radians, registers, ServoBus, BROADCAST_ID};
pub use config::SerialConfig;

use std::io::{Read, Write};
use std::time::Duration;

use parking_lot::Mutex;
use serialport::SerialPort;

use crate::{Error, Result};

use super::traits::{ActuatorVector, LegCurrents, MotorBackend};
use super::{slot, MOTOR_IDS, NUM_LEGS, NUM_MOTORS};

/// Longest single blocking read on the port
const PORT_READ_SLICE: Duration = Duration::from_millis(1);

/// Bus IDs of the six legs
const LEG_IDS: [u8; NUM_LEGS] = [
    MOTOR_IDS[slot::FIRST_LEG],
    MOTOR_IDS[slot::FIRST_LEG + 1],
    MOTOR_IDS[slot::FIRST_LEG + 2],
    MOTOR_IDS[slot::FIRST_LEG + 3],
    MOTOR_IDS[slot::FIRST_LEG + 4],
    MOTOR_IDS[slot::FIRST_LEG + 5],
];

/// Motor backend that forwards to physical servos
///
/// Every bus exchange is bounded by the configured timeout, so a dead
/// servo costs at most one timeout per call and never blocks the loop.
pub struct HardwareBackend<S = Box<dyn SerialPort>> {
    /// Protocol handler (protected by mutex for exclusive access)
    bus: Mutex<ServoBus<S>>,
    name: String,
}

impl HardwareBackend {
    /// Open the serial port and ping every motor
    ///
    /// Failing to open the port is fatal; a motor that does not answer
    /// is only logged.
    pub fn connect(config: SerialConfig) -> Result<Self> {
        tracing::info!(
            "Opening servo bus on {} at {} baud",
            config.port,
            config.baudrate
        );

        // Short port-level reads; the bus enforces the per-packet deadline
        let port = serialport::new(&config.port, config.baudrate)
            .timeout(PORT_READ_SLICE)
            .open()
            .map_err(|e| {
                Error::Connection(format!("Failed to open port {}: {}", config.port, e))
            })?;

        let backend = Self::from_bus(ServoBus::new(port, config.timeout), config.port);
        backend.ping_all();
        tracing::info!("Servo bus ready");
        Ok(backend)
    }
}

impl<S> HardwareBackend<S>
where
    S: Read + Write + Send,
{
    /// Wrap an already-open bus
    pub fn from_bus(bus: ServoBus<S>, name: impl Into<String>) -> Self {
        Self {
            bus: Mutex::new(bus),
            name: name.into(),
        }
    }

    /// Ping every motor and report the ones that stay silent
    ///
    /// Returns the number of motors that answered.
    pub fn ping_all(&self) -> usize {
        let mut bus = self.bus.lock();
        let mut alive = 0;
        for (&id, name) in MOTOR_IDS.iter().zip(super::MOTOR_NAMES) {
            match bus.ping(id) {
                Ok(true) => alive += 1,
                Ok(false) => tracing::warn!("Motor {} ({}) did not respond to ping", id, name),
                Err(e) => tracing::warn!("Motor {} ({}) ping failed: {}", id, name, e),
            }
        }
        alive
    }
}

impl<S> MotorBackend for HardwareBackend<S>
where
    S: Read + Write + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn enable_torque(&self) -> Result<()> {
        self.bus.lock().set_torque_all(&MOTOR_IDS, true)
    }

    fn set_leg_goal_currents(&self, currents: LegCurrents) -> Result<()> {
        let raw = currents.map(|c| c.clamp(0, u16::MAX as i32) as u16);
        self.bus.lock().sync_write_goal_currents(&LEG_IDS, &raw)
    }

    fn set_goal_positions(&self, positions: ActuatorVector) -> Result<()> {
        let raw = positions.map(radians_to_raw);
        self.bus.lock().sync_write_positions(&MOTOR_IDS, &raw)
    }

    fn read_all_positions(&self) -> Result<ActuatorVector> {
        let mut bus = self.bus.lock();
        let mut positions = [0.0; NUM_MOTORS];
        for (position, &id) in positions.iter_mut().zip(MOTOR_IDS.iter()) {
            *position = raw_to_radians(bus.read_position(id)?);
        }
        Ok(positions)
    }
}
