//! Simulated HM5065 for integration tests: a 64 KiB register file behind the embedded-hal I2C
//! traits, with scripted reads, fault injection and a write log.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Read, Write};
use hm5065_rs::hm5065::regs::Register;
use hm5065_rs::{Config, Hm5065};

pub const ADDR: u8 = 0x1F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

#[derive(Default)]
struct Inner {
    regs: HashMap<u16, u8>,
    pointer: u16,
    /// Values returned by the next reads of a register, ahead of the register file.
    scripted: HashMap<u16, VecDeque<u8>>,
    /// Register value returned once the script runs out.
    sticky: HashMap<u16, u8>,
    /// Fail this many upcoming write transactions.
    write_faults: u32,
    /// Fail this many upcoming reads of the data byte.
    read_faults: u32,
    /// Fail every write to this register.
    broken_register: Option<u16>,
    write_attempts: u32,
    read_attempts: u32,
    writes: Vec<(u16, u8)>,
    reads: HashMap<u16, u32>,
}

/// Cloneable handle: give one clone to the driver and inspect the other.
#[derive(Clone, Default)]
pub struct FakeSensor {
    inner: Rc<RefCell<Inner>>,
}

impl FakeSensor {
    /// A sensor that identifies as an HM5065.
    pub fn new() -> Self {
        let sensor = FakeSensor::default();
        sensor.set(Register::CHIP_ID_MSB, 0x03);
        sensor.set(0x0001, 0x9E);
        sensor
    }

    pub fn set(&self, reg: u16, val: u8) {
        self.inner.borrow_mut().regs.insert(reg, val);
    }

    pub fn get(&self, reg: u16) -> u8 {
        *self.inner.borrow().regs.get(&reg).unwrap_or(&0)
    }

    /// Queue values for the next reads of `reg`.
    pub fn script(&self, reg: u16, values: &[u8]) {
        self.inner
            .borrow_mut()
            .scripted
            .entry(reg)
            .or_default()
            .extend(values.iter().copied());
    }

    /// Make every read of `reg` return `val`, no matter what was written.
    pub fn stick(&self, reg: u16, val: u8) {
        self.inner.borrow_mut().sticky.insert(reg, val);
    }

    pub fn fail_writes(&self, count: u32) {
        self.inner.borrow_mut().write_faults = count;
    }

    pub fn fail_reads(&self, count: u32) {
        self.inner.borrow_mut().read_faults = count;
    }

    pub fn break_register(&self, reg: u16) {
        self.inner.borrow_mut().broken_register = Some(reg);
    }

    /// Successful register writes in order. Burst writes show up one entry per byte.
    pub fn writes(&self) -> Vec<(u16, u8)> {
        self.inner.borrow().writes.clone()
    }

    pub fn clear_log(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.writes.clear();
        inner.reads.clear();
        inner.write_attempts = 0;
        inner.read_attempts = 0;
    }

    /// Completed reads of `reg`.
    pub fn reads_of(&self, reg: u16) -> u32 {
        *self.inner.borrow().reads.get(&reg).unwrap_or(&0)
    }

    pub fn write_attempts(&self) -> u32 {
        self.inner.borrow().write_attempts
    }

    pub fn read_attempts(&self) -> u32 {
        self.inner.borrow().read_attempts
    }

    /// Bus transactions of any kind since the last `clear_log`.
    pub fn traffic(&self) -> u32 {
        self.write_attempts() + self.read_attempts()
    }
}

impl Write for FakeSensor {
    type Error = BusFault;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusFault> {
        assert_eq!(address, ADDR);
        let mut inner = self.inner.borrow_mut();
        inner.write_attempts += 1;

        let reg = u16::from_be_bytes([bytes[0], bytes[1]]);
        if inner.write_faults > 0 {
            inner.write_faults -= 1;
            return Err(BusFault);
        }
        if bytes.len() > 2 && inner.broken_register == Some(reg) {
            return Err(BusFault);
        }

        inner.pointer = reg;
        for (offset, &val) in bytes[2..].iter().enumerate() {
            let at = reg.wrapping_add(offset as u16);
            inner.regs.insert(at, val);
            inner.writes.push((at, val));
        }
        Ok(())
    }
}

impl Read for FakeSensor {
    type Error = BusFault;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), BusFault> {
        assert_eq!(address, ADDR);
        let mut inner = self.inner.borrow_mut();
        inner.read_attempts += 1;
        if inner.read_faults > 0 {
            inner.read_faults -= 1;
            return Err(BusFault);
        }

        let reg = inner.pointer;
        let scripted = inner.scripted.get_mut(&reg).and_then(VecDeque::pop_front);
        let val = scripted
            .or_else(|| inner.sticky.get(&reg).copied())
            .unwrap_or_else(|| *inner.regs.get(&reg).unwrap_or(&0));
        buffer[0] = val;
        *inner.reads.entry(reg).or_default() += 1;
        Ok(())
    }
}

/// Delay that only adds up the requested time.
#[derive(Clone, Default)]
pub struct FakeDelay {
    total: Rc<RefCell<u64>>,
}

impl FakeDelay {
    pub fn total_ms(&self) -> u64 {
        *self.total.borrow()
    }
}

impl DelayMs<u32> for FakeDelay {
    fn delay_ms(&mut self, ms: u32) {
        *self.total.borrow_mut() += u64::from(ms);
    }
}

/// Session over a fresh simulated sensor, plus handles to inspect it.
pub fn session() -> (Hm5065<FakeSensor, FakeDelay>, FakeSensor, FakeDelay) {
    session_with(Config::default())
}

pub fn session_with(config: Config) -> (Hm5065<FakeSensor, FakeDelay>, FakeSensor, FakeDelay) {
    let sensor = FakeSensor::new();
    let delay = FakeDelay::default();
    let camera = Hm5065::new(sensor.clone(), delay.clone(), config);
    (camera, sensor, delay)
}

/// Session that already went through `init`, with the logs cleared.
pub fn initialized() -> (Hm5065<FakeSensor, FakeDelay>, FakeSensor, FakeDelay) {
    let (mut camera, sensor, delay) = session();
    camera.init().unwrap();
    sensor.clear_log();
    (camera, sensor, delay)
}
