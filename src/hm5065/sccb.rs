//! Register access for the HM5065 over its two-wire control bus. Works with any I2C peripheral
//! implementing the embedded-hal blocking `Read` and `Write` traits.
//!
//! Registers use 16-bit addresses and 8-bit values. Every transaction is retried a fixed number
//! of times before the failure is reported; retries are only visible in the log.

use embedded_hal::blocking::{delay::DelayMs, i2c};
use log::debug;

use super::regs::{Register, RegisterOp, CHIP_ID_MSB};

/// Retries after a failed register read (five attempts in total).
pub const READ_RETRIES: u8 = 4;

/// Retries after a failed register write (three attempts in total).
pub const WRITE_RETRIES: u8 = 2;

/// Largest number of data bytes sent in one burst transaction.
pub const BURST_CHUNK: usize = 32;

/// SCCB driver.
pub struct Sccb<I2C> {
    /// I2C peripheral, owned for the lifetime of the session.
    i2c: I2C,
    /// Device I2C address (7-bit).
    address: u8,
}

/// Bus transaction errors.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum BusError<E> {
    /// A single attempt failed; the transaction layer retries these.
    #[error("transient bus error: {0:?}")]
    Transient(E),
    /// Every attempt failed.
    #[error("register 0x{register:04X} unreachable after {attempts} attempts: {error:?}")]
    Unrecoverable { register: u16, attempts: u8, error: E },
}

/// Chip identification errors.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum DetectError<E> {
    #[error("chip id read failed: {0}")]
    Bus(BusError<E>),
    /// Something answered, but it is not an HM5065.
    #[error("unexpected chip id 0x{0:02X}")]
    UnknownChip(u8),
}

impl<E> From<BusError<E>> for DetectError<E> {
    fn from(error: BusError<E>) -> Self {
        DetectError::Bus(error)
    }
}

impl<I2C, E> Sccb<I2C>
where
    I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
{
    /// Creates a new SCCB driver owning an I2C peripheral.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Sccb { i2c, address }
    }

    /// Give the I2C peripheral back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// One register read attempt, must be two seperate transactions and we can't use `WriteRead`.
    fn read_once(&mut self, reg: u16) -> Result<u8, BusError<E>> {
        // Write the address
        self.i2c
            .write(self.address, &reg.to_be_bytes())
            .map_err(BusError::Transient)?;

        // Read the value
        let mut buf = [0x00];
        self.i2c
            .read(self.address, &mut buf)
            .map_err(BusError::Transient)?;

        Ok(buf[0])
    }

    /// One register write attempt.
    fn write_once(&mut self, bytes: &[u8]) -> Result<(), BusError<E>> {
        self.i2c
            .write(self.address, bytes)
            .map_err(BusError::Transient)
    }

    /// Read a register, retrying up to [`READ_RETRIES`] times.
    pub fn read_register(&mut self, reg: u16) -> Result<u8, BusError<E>> {
        let mut retries = 0;
        loop {
            match self.read_once(reg) {
                Ok(val) => return Ok(val),
                Err(BusError::Transient(error)) if retries == READ_RETRIES => {
                    return Err(BusError::Unrecoverable {
                        register: reg,
                        attempts: retries + 1,
                        error,
                    })
                }
                Err(BusError::Transient(_)) => {
                    retries += 1;
                    debug!("sensor read 0x{:04X} retry={}", reg, retries);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Write a register, retrying up to [`WRITE_RETRIES`] times.
    pub fn write_register(&mut self, reg: u16, val: u8) -> Result<(), BusError<E>> {
        let [msb, lsb] = reg.to_be_bytes();
        self.write_retrying(reg, &[msb, lsb, val])
    }

    /// Write `bytes` in as few transactions as possible starting at register `start`, relying
    /// on the sensor's address auto-increment. Each chunk is retried like a single write.
    pub fn write_burst(&mut self, start: u16, bytes: &[u8]) -> Result<(), BusError<E>> {
        let mut buf = [0u8; 2 + BURST_CHUNK];
        let mut reg = start;
        for chunk in bytes.chunks(BURST_CHUNK) {
            buf[..2].copy_from_slice(&reg.to_be_bytes());
            buf[2..2 + chunk.len()].copy_from_slice(chunk);
            self.write_retrying(reg, &buf[..2 + chunk.len()])?;
            // chunk.len() <= BURST_CHUNK
            reg = reg.wrapping_add(chunk.len() as u16);
        }
        Ok(())
    }

    fn write_retrying(&mut self, reg: u16, bytes: &[u8]) -> Result<(), BusError<E>> {
        let mut retries = 0;
        loop {
            match self.write_once(bytes) {
                Ok(()) => return Ok(()),
                Err(BusError::Transient(error)) if retries == WRITE_RETRIES => {
                    return Err(BusError::Unrecoverable {
                        register: reg,
                        attempts: retries + 1,
                        error,
                    })
                }
                Err(BusError::Transient(_)) => {
                    retries += 1;
                    debug!("sensor write 0x{:04X} retry={}", reg, retries);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Check the device ID matches the expected value.
    pub fn check_id(&mut self) -> Result<(), DetectError<E>> {
        let id = self.read_register(Register::CHIP_ID_MSB)?;
        if id != CHIP_ID_MSB {
            return Err(DetectError::UnknownChip(id));
        }
        Ok(())
    }

    /// Apply a register-list program in order. Stops at the first failed write, leaving the
    /// already written prefix in place.
    pub fn apply_program<D>(
        &mut self,
        delay: &mut D,
        program: &[RegisterOp],
    ) -> Result<(), BusError<E>>
    where
        D: DelayMs<u32>,
    {
        for op in program {
            match *op {
                RegisterOp::Delay(ms) => delay.delay_ms(u32::from(ms)),
                RegisterOp::Write { address, value } => self.write_register(address, value)?,
            }
        }

        Ok(())
    }
}
