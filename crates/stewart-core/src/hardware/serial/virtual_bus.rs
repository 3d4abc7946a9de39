//! In-memory servo bus for driver tests
//!
//! Emulates servos behind a serial line: parses instruction packets written
//! to it and queues status replies for reading.

use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use super::bus::{Instruction, ServoBus, BROADCAST_ID};

const REGISTER_SPACE: usize = 64;

#[derive(Default)]
struct Servos {
    registers: HashMap<u8, [u8; REGISTER_SPACE]>,
    error_flags: HashMap<u8, u8>,
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl Servos {
    fn reply(&mut self, id: u8, params: &[u8]) {
        let error = self.error_flags.get(&id).copied().unwrap_or(0);
        let packet = ServoBus::<VirtualBus>::build_packet(id, error, params)
            .expect("reply fits in a packet");
        self.rx.extend(packet);
    }

    fn handle(&mut self, id: u8, code: u8, params: &[u8]) {
        let Some(instruction) = Instruction::from_u8(code) else {
            return;
        };

        if id == BROADCAST_ID {
            if instruction == Instruction::SyncWrite {
                let address = params[0] as usize;
                let width = params[1] as usize;
                for chunk in params[2..].chunks(width + 1) {
                    if let Some(registers) = self.registers.get_mut(&chunk[0]) {
                        registers[address..address + width].copy_from_slice(&chunk[1..]);
                    }
                }
            }
            return;
        }

        let Some(registers) = self.registers.get_mut(&id) else {
            // Absent servos stay silent
            return;
        };

        match instruction {
            Instruction::Ping => self.reply(id, &[]),
            Instruction::Read => {
                let address = params[0] as usize;
                let length = params[1] as usize;
                let data = registers[address..address + length].to_vec();
                self.reply(id, &data);
            }
            Instruction::Write => {
                let address = params[0] as usize;
                let data = &params[1..];
                registers[address..address + data.len()].copy_from_slice(data);
                self.reply(id, &[]);
            }
            Instruction::SyncWrite => {}
        }
    }

    fn drain_packets(&mut self) {
        loop {
            if self.tx.len() < 4 {
                return;
            }
            let total = 4 + self.tx[3] as usize;
            if self.tx.len() < total {
                return;
            }
            let packet: Vec<u8> = self.tx.drain(..total).collect();
            let id = packet[2];
            let code = packet[4];
            let params = &packet[5..total - 1];
            self.handle(id, code, params);
        }
    }
}

/// Cloneable handle to a set of emulated servos
#[derive(Clone, Default)]
pub(crate) struct VirtualBus {
    servos: Arc<Mutex<Servos>>,
}

impl VirtualBus {
    pub fn with_servos(ids: &[u8]) -> Self {
        let bus = Self::default();
        {
            let mut servos = bus.servos.lock();
            for &id in ids {
                servos.registers.insert(id, [0u8; REGISTER_SPACE]);
            }
        }
        bus
    }

    pub fn register_u8(&self, id: u8, address: u8) -> u8 {
        self.servos.lock().registers[&id][address as usize]
    }

    pub fn register_u16(&self, id: u8, address: u8) -> u16 {
        let servos = self.servos.lock();
        let registers = &servos.registers[&id];
        u16::from_le_bytes([
            registers[address as usize],
            registers[address as usize + 1],
        ])
    }

    pub fn set_register_u16(&self, id: u8, address: u8, value: u16) {
        let mut servos = self.servos.lock();
        if let Some(registers) = servos.registers.get_mut(&id) {
            registers[address as usize..address as usize + 2].copy_from_slice(&value.to_le_bytes());
        }
    }

    pub fn set_error_flag(&self, id: u8, flag: u8) {
        self.servos.lock().error_flags.insert(id, flag);
    }
}

impl Read for VirtualBus {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut servos = self.servos.lock();
        let n = buf.len().min(servos.rx.len());
        for (slot, byte) in buf.iter_mut().zip(servos.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for VirtualBus {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut servos = self.servos.lock();
        servos.tx.extend_from_slice(buf);
        servos.drain_packets();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
