//! Half-duplex servo bus protocol
//!
//! Packet format: [0xFF, 0xFF, ID, Length, Instruction, Params..., Checksum]
//! where Length counts the instruction (or error byte), params and checksum.
//! Status replies carry an error byte in place of the instruction.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use arrayvec::ArrayVec;

use crate::{Error, Result};

/// Instruction codes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Ping = 0x01,
    Read = 0x02,
    Write = 0x03,
    SyncWrite = 0x83,
}

impl Instruction {
    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Ping),
            0x02 => Some(Self::Read),
            0x03 => Some(Self::Write),
            0x83 => Some(Self::SyncWrite),
            _ => None,
        }
    }
}

/// Register addresses
pub mod registers {
    /// Torque enable (1 byte, read-write)
    pub const TORQUE_ENABLE: u8 = 0x28;
    /// Goal position (2 bytes, read-write)
    pub const GOAL_POSITION: u8 = 0x2A;
    /// Torque limit, used as the goal current (2 bytes, read-write)
    pub const TORQUE_LIMIT: u8 = 0x30;
    /// Present position (2 bytes, read-only)
    pub const PRESENT_POSITION: u8 = 0x38;
}

/// Broadcast ID for sync commands; broadcasts get no reply
pub const BROADCAST_ID: u8 = 0xFE;

const HEADER: [u8; 2] = [0xFF, 0xFF];
const MAX_PACKET: usize = 128;

/// Serial protocol handler for the servo bus
pub struct ServoBus<S> {
    serial: S,
    timeout: Duration,
    rx_buffer: [u8; MAX_PACKET],
}

impl<S> ServoBus<S>
where
    S: Read + Write,
{
    /// Create a new protocol handler
    ///
    /// `timeout` bounds every reply wait.
    pub fn new(serial: S, timeout: Duration) -> Self {
        Self {
            serial,
            timeout,
            rx_buffer: [0u8; MAX_PACKET],
        }
    }

    /// Get mutable reference to underlying serial port
    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    /// Calculate checksum for a packet
    pub(crate) fn checksum(id: u8, length: u8, code: u8, params: &[u8]) -> u8 {
        !params
            .iter()
            .fold(id.wrapping_add(length).wrapping_add(code), |acc, &p| {
                acc.wrapping_add(p)
            })
    }

    /// Build a packet
    pub(crate) fn build_packet(
        id: u8,
        code: u8,
        params: &[u8],
    ) -> Result<ArrayVec<u8, MAX_PACKET>> {
        if params.len() + 6 > MAX_PACKET {
            return Err(Error::Hardware(format!(
                "packet params too long: {} bytes",
                params.len()
            )));
        }
        let length = (params.len() + 2) as u8; // code + params + checksum
        let mut packet = ArrayVec::<u8, MAX_PACKET>::new();
        packet.extend(HEADER);
        packet.push(id);
        packet.push(length);
        packet.push(code);
        packet.extend(params.iter().copied());
        packet.push(Self::checksum(id, length, code, params));
        Ok(packet)
    }

    /// Send an instruction and wait for the status reply
    ///
    /// Returns the reply payload length in `rx_buffer` (error byte first,
    /// checksum excluded).
    fn transact(&mut self, id: u8, instruction: Instruction, params: &[u8]) -> Result<usize> {
        let packet = Self::build_packet(id, instruction as u8, params)?;

        // Clear any pending data
        self.flush_input();

        self.serial
            .write_all(&packet)
            .map_err(|e| Error::Communication(format!("Failed to write packet: {}", e)))?;

        let mut header = [0u8; 4];
        self.read_exact(&mut header)?;

        if header[..2] != HEADER {
            return Err(Error::Hardware("Invalid response header".into()));
        }
        if header[2] != id {
            return Err(Error::Hardware(format!(
                "Response from servo {} while talking to {}",
                header[2], id
            )));
        }

        let length = header[3] as usize;
        if length < 2 || length > MAX_PACKET {
            return Err(Error::Hardware(format!("Invalid response length {}", length)));
        }

        let mut body = [0u8; MAX_PACKET];
        self.read_exact(&mut body[..length])?;

        let payload = &body[..length - 1];
        let expected = Self::checksum(header[2], header[3], payload[0], &payload[1..]);
        if body[length - 1] != expected {
            return Err(Error::Hardware(format!(
                "Checksum mismatch from servo {}",
                id
            )));
        }

        let error = payload[0];
        if error != 0 {
            return Err(Error::Hardware(format!(
                "Servo {} error: 0x{:02X}",
                id, error
            )));
        }

        self.rx_buffer[..payload.len()].copy_from_slice(payload);
        Ok(payload.len())
    }

    /// Read exact number of bytes with timeout handling
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut total_read = 0;
        let start = Instant::now();

        while total_read < buf.len() {
            if start.elapsed() > self.timeout {
                return Err(Error::Timeout(format!(
                    "Read timeout: got {} of {} bytes",
                    total_read,
                    buf.len()
                )));
            }

            match self.serial.read(&mut buf[total_read..]) {
                Ok(0) => {
                    std::thread::sleep(Duration::from_micros(100));
                }
                Ok(n) => total_read += n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    continue;
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_micros(100));
                }
                Err(e) => {
                    return Err(Error::Communication(format!("Read error: {}", e)));
                }
            }
        }

        Ok(())
    }

    /// Drop stale bytes left over from a previous exchange
    fn flush_input(&mut self) {
        let mut scratch = [0u8; MAX_PACKET];
        while self.serial.read(&mut scratch).is_ok_and(|n| n > 0) {}
    }

    /// Ping a servo to check if it's alive
    pub fn ping(&mut self, id: u8) -> Result<bool> {
        match self.transact(id, Instruction::Ping, &[]) {
            Ok(_) => Ok(true),
            Err(Error::Timeout(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read a register value
    pub fn read_register(&mut self, id: u8, address: u8, length: u8) -> Result<ArrayVec<u8, 16>> {
        let resp_len = self.transact(id, Instruction::Read, &[address, length])?;

        // rx_buffer holds [error, data...]
        let data = &self.rx_buffer[1..resp_len];
        if data.len() != length as usize {
            return Err(Error::Hardware(format!(
                "Servo {} returned {} bytes, expected {}",
                id,
                data.len(),
                length
            )));
        }

        let mut result = ArrayVec::<u8, 16>::new();
        result
            .try_extend_from_slice(data)
            .map_err(|_| Error::Hardware("register data exceeds 16 bytes".into()))?;
        Ok(result)
    }

    /// Write a register value
    pub fn write_register(&mut self, id: u8, address: u8, data: &[u8]) -> Result<()> {
        let mut params = ArrayVec::<u8, 16>::new();
        params.push(address);
        params
            .try_extend_from_slice(data)
            .map_err(|_| Error::Hardware("register data exceeds 15 bytes".into()))?;

        self.transact(id, Instruction::Write, &params)?;
        Ok(())
    }

    /// Read position from a single servo
    pub fn read_position(&mut self, id: u8) -> Result<u16> {
        let data = self.read_register(id, registers::PRESENT_POSITION, 2)?;
        Ok(u16::from_le_bytes([data[0], data[1]]))
    }

    /// Sync write one 2-byte register on several servos
    ///
    /// Broadcast; no reply is expected.
    pub fn sync_write_u16(&mut self, address: u8, ids: &[u8], values: &[u16]) -> Result<()> {
        if ids.len() != values.len() {
            return Err(Error::Hardware("ID and value count mismatch".into()));
        }

        // Format: [address, data_length, id1, data1..., id2, data2..., ...]
        let mut params = ArrayVec::<u8, 64>::new();
        params.push(address);
        params.push(2);
        for (&id, value) in ids.iter().zip(values) {
            let [lo, hi] = value.to_le_bytes();
            params
                .try_extend_from_slice(&[id, lo, hi])
                .map_err(|_| Error::Hardware("too many servos for one sync write".into()))?;
        }

        self.broadcast(Instruction::SyncWrite, &params)
    }

    /// Sync write goal positions to multiple servos
    pub fn sync_write_positions(&mut self, ids: &[u8], positions: &[u16]) -> Result<()> {
        self.sync_write_u16(registers::GOAL_POSITION, ids, positions)
    }

    /// Sync write goal currents to multiple servos
    pub fn sync_write_goal_currents(&mut self, ids: &[u8], currents: &[u16]) -> Result<()> {
        self.sync_write_u16(registers::TORQUE_LIMIT, ids, currents)
    }

    /// Enable or disable torque for all servos
    pub fn set_torque_all(&mut self, ids: &[u8], enabled: bool) -> Result<()> {
        let value = u8::from(enabled);
        let mut params = ArrayVec::<u8, 32>::new();
        params.push(registers::TORQUE_ENABLE);
        params.push(1);
        for &id in ids {
            params
                .try_extend_from_slice(&[id, value])
                .map_err(|_| Error::Hardware("too many servos for one sync write".into()))?;
        }

        self.broadcast(Instruction::SyncWrite, &params)
    }

    fn broadcast(&mut self, instruction: Instruction, params: &[u8]) -> Result<()> {
        let packet = Self::build_packet(BROADCAST_ID, instruction as u8, params)?;
        self.serial
            .write_all(&packet)
            .map_err(|e| Error::Communication(format!("Failed to broadcast: {}", e)))
    }
}

/// Raw position of the zero angle
const RAW_CENTER: f64 = 2048.0;
/// Highest raw position
const RAW_MAX: f64 = 4095.0;
/// 4096 steps per full turn
const STEPS_PER_RADIAN: f64 = 4096.0 / (2.0 * std::f64::consts::PI);

/// Convert raw servo position to radians
///
/// Center position (2048) = 0 radians.
pub fn raw_to_radians(raw: u16) -> f64 {
    (raw as f64 - RAW_CENTER) / STEPS_PER_RADIAN
}

/// Convert radians to raw servo position, saturating at the encoder range
pub fn radians_to_raw(radians: f64) -> u16 {
    (radians * STEPS_PER_RADIAN + RAW_CENTER)
        .round()
        .clamp(0.0, RAW_MAX) as u16
}
