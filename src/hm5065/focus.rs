//! Autofocus state machine for the HM5065's on-sensor focus microcontroller.
//!
//! The microcontroller runs either a single-shot search or a continuous search, never both. The
//! driver tracks which one it asked for in [`FocusState`] and refuses commands that would overlap
//! with a single-shot search still in flight.

use embedded_hal::blocking::{delay::DelayMs, i2c};
use log::{debug, info, warn};

use super::regs::{self, Register, RegisterOp};
use super::sccb::{BusError, Sccb};

/// Interval between firmware status polls.
pub const FW_POLL_INTERVAL_MS: u32 = 5;

/// Firmware status polls before giving up (one second in total).
pub const FW_POLL_LIMIT: u16 = 200;

/// [`Register::AF_FW_STATUS`] value once the firmware is running.
pub const FW_READY: u8 = 0x70;

/// [`Register::AF_STATUS`] value once a single-shot search has finished.
pub const FOCUS_DONE: u8 = 0x01;

/// Status reads while holding the lens for a still capture.
pub const CAPTURE_POLL_LIMIT: u8 = 20;

/// Settle time around lens moves in manual mode.
const LENS_SETTLE_MS: u8 = 200;

/// What the driver last asked the focus microcontroller to do.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FocusState {
    /// Nothing requested, or the last request was released.
    Idle,
    /// Single-shot search in flight.
    Busy,
    /// Continuous search running.
    ContinuousActive,
}

/// Result of polling the focus microcontroller.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FocusStatus {
    /// No search requested.
    Idle,
    /// The requested focus was reached.
    Reached,
    /// Still searching or gave up.
    Failed,
}

/// Raw lens actuator position.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LensPosition(pub u16);

/// Autofocus errors.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum FocusError<E> {
    #[error("autofocus command not allowed while {state:?}")]
    InvalidState { state: FocusState },
    #[error("autofocus firmware not ready after {polls} polls")]
    Timeout { polls: u16 },
    #[error("autofocus bus failure: {0}")]
    Bus(BusError<E>),
}

impl<E> From<BusError<E>> for FocusError<E> {
    fn from(error: BusError<E>) -> Self {
        FocusError::Bus(error)
    }
}

/// Focus state for one sensor.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Autofocus {
    state: FocusState,
    firmware_loaded: bool,
}

impl Default for Autofocus {
    fn default() -> Self {
        Self::new()
    }
}

impl Autofocus {
    /// Idle, with no firmware loaded.
    pub const fn new() -> Self {
        Autofocus {
            state: FocusState::Idle,
            firmware_loaded: false,
        }
    }

    /// What the driver last asked the focus microcontroller to do.
    pub fn state(&self) -> FocusState {
        self.state
    }

    /// Whether the focus firmware is running.
    pub fn firmware_loaded(&self) -> bool {
        self.firmware_loaded
    }

    /// Download `firmware` to the focus microcontroller, start it and wait for it to report
    /// ready. Does nothing when the firmware is already running.
    pub fn init_firmware<I2C, E, D>(
        &mut self,
        sccb: &mut Sccb<I2C>,
        delay: &mut D,
        firmware: &[u8],
    ) -> Result<(), FocusError<E>>
    where
        I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
        D: DelayMs<u32>,
    {
        if self.firmware_loaded {
            debug!("AF firmware already loaded");
            return Ok(());
        }

        sccb.apply_program(delay, &regs::AF_FW_RESET_REGS)?;
        sccb.write_burst(Register::AF_FW_BASE, firmware)?;
        sccb.apply_program(delay, &regs::AF_FW_START_REGS)?;

        for _ in 0..FW_POLL_LIMIT {
            delay.delay_ms(FW_POLL_INTERVAL_MS);
            if sccb.read_register(Register::AF_FW_STATUS)? == FW_READY {
                info!("AF firmware ready ({} bytes)", firmware.len());
                self.firmware_loaded = true;
                return Ok(());
            }
        }

        warn!("AF firmware not ready after {} polls", FW_POLL_LIMIT);
        Err(FocusError::Timeout {
            polls: FW_POLL_LIMIT,
        })
    }

    /// Start one focus search. Allowed while idle or in continuous mode, which it replaces.
    pub fn start_single_shot<I2C, E, D>(
        &mut self,
        sccb: &mut Sccb<I2C>,
        delay: &mut D,
    ) -> Result<(), FocusError<E>>
    where
        I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
        D: DelayMs<u32>,
    {
        self.reject_busy()?;
        sccb.apply_program(delay, &regs::AF_SINGLE_SHOT_REGS)?;
        self.state = FocusState::Busy;
        debug!("AF single shot started");
        Ok(())
    }

    /// Report how the requested search is going. Never changes the state; the caller decides
    /// whether to release or pause afterwards.
    pub fn poll_status<I2C, E>(&self, sccb: &mut Sccb<I2C>) -> Result<FocusStatus, FocusError<E>>
    where
        I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
    {
        let status = match self.state {
            FocusState::Idle => return Ok(FocusStatus::Idle),
            FocusState::Busy => sccb.read_register(Register::AF_STATUS)? == FOCUS_DONE,
            // Any non-zero value means the continuous search is holding focus
            FocusState::ContinuousActive => sccb.read_register(Register::AF_STATUS)? != 0,
        };

        Ok(if status {
            FocusStatus::Reached
        } else {
            FocusStatus::Failed
        })
    }

    /// Switch the microcontroller to continuous search.
    pub fn enable_continuous<I2C, E, D>(
        &mut self,
        sccb: &mut Sccb<I2C>,
        delay: &mut D,
    ) -> Result<(), FocusError<E>>
    where
        I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
        D: DelayMs<u32>,
    {
        self.reject_busy()?;
        sccb.apply_program(delay, &regs::AF_CONTINUOUS_REGS)?;
        self.state = FocusState::ContinuousActive;
        debug!("AF continuous enabled");
        Ok(())
    }

    /// Hold the lens where it is. The logical state is left alone.
    pub fn pause<I2C, E, D>(
        &mut self,
        sccb: &mut Sccb<I2C>,
        delay: &mut D,
    ) -> Result<(), FocusError<E>>
    where
        I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
        D: DelayMs<u32>,
    {
        sccb.apply_program(delay, &regs::AF_PAUSE_REGS)?;
        Ok(())
    }

    /// Stop any search and go back to idle.
    pub fn release<I2C, E, D>(
        &mut self,
        sccb: &mut Sccb<I2C>,
        delay: &mut D,
    ) -> Result<(), FocusError<E>>
    where
        I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
        D: DelayMs<u32>,
    {
        sccb.apply_program(delay, &regs::AF_RELEASE_REGS)?;
        self.state = FocusState::Idle;
        debug!("AF released");
        Ok(())
    }

    /// Run one focus pass ahead of a still capture and return where the lens ended up, so it
    /// can be put back with [`Autofocus::restore_lens`] after the mode switch.
    pub fn capture_hold<I2C, E, D>(
        &mut self,
        sccb: &mut Sccb<I2C>,
        delay: &mut D,
    ) -> Result<LensPosition, FocusError<E>>
    where
        I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
        D: DelayMs<u32>,
    {
        sccb.apply_program(delay, &regs::AF_CAPTURE_PREPARE_REGS)?;

        let mut focused = false;
        for _ in 0..CAPTURE_POLL_LIMIT {
            if sccb.read_register(Register::AF_STATUS)? == FOCUS_DONE {
                focused = true;
                break;
            }
        }
        if !focused {
            debug!("AF capture pass did not converge, keeping lens as is");
        }

        let msb = sccb.read_register(Register::AF_LENS_POS_MSB)?;
        let lsb = sccb.read_register(Register::AF_LENS_POS_LSB)?;
        Ok(LensPosition(u16::from_be_bytes([msb, lsb])))
    }

    /// Drive the lens to `position` in manual mode. Leaves the state machine idle.
    pub fn restore_lens<I2C, E, D>(
        &mut self,
        sccb: &mut Sccb<I2C>,
        delay: &mut D,
        position: LensPosition,
    ) -> Result<(), FocusError<E>>
    where
        I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
        D: DelayMs<u32>,
    {
        let [msb, lsb] = position.0.to_be_bytes();
        let program = [
            RegisterOp::w(Register::AF_MODE, 0x00),
            RegisterOp::w(Register::AF_MANUAL_POS_MSB, msb),
            RegisterOp::w(Register::AF_MANUAL_POS_LSB, lsb),
            RegisterOp::w(Register::AF_LENS_COMMAND, 0x00),
            RegisterOp::Delay(LENS_SETTLE_MS),
            RegisterOp::w(Register::AF_LENS_COMMAND, 0x05),
            RegisterOp::Delay(LENS_SETTLE_MS),
        ];

        sccb.apply_program(delay, &program)?;
        self.state = FocusState::Idle;
        Ok(())
    }

    fn reject_busy<E>(&self) -> Result<(), FocusError<E>> {
        if self.state == FocusState::Busy {
            return Err(FocusError::InvalidState { state: self.state });
        }
        Ok(())
    }
}
