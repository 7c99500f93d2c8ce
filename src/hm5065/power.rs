//! Power and reset sequencing. The driver core only needs the sensor to be [`PowerState::On`]
//! before talking to it; how that happens is up to the board.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use log::debug;

/// Sensor power states.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PowerState {
    /// Unpowered, registers are lost.
    Off,
    /// Powered but parked, registers retained.
    Standby,
    /// Running and reachable on the bus.
    On,
    /// Pulse the reset line and come back up.
    Reset,
}

/// Moves the sensor between power states.
pub trait PowerSequencer {
    /// Error of the underlying pins or regulators.
    type Error;

    /// Drive the sensor into `state`.
    fn power<D: DelayMs<u32>>(&mut self, delay: &mut D, state: PowerState)
        -> Result<(), Self::Error>;
}

/// Sequencer driving the PWDN and RESET# lines directly. Rails and the master clock are assumed to
/// be always on.
pub struct GpioSequencer<PWDN, RST> {
    pwdn: PWDN,
    reset: RST,
    state: PowerState,
}

impl<PWDN, RST, E> GpioSequencer<PWDN, RST>
where
    PWDN: OutputPin<Error = E>,
    RST: OutputPin<Error = E>,
{
    /// Take the pins, the sensor is assumed to be off.
    pub fn new(pwdn: PWDN, reset: RST) -> Self {
        GpioSequencer {
            pwdn,
            reset,
            state: PowerState::Off,
        }
    }

    /// Last state the sensor was driven into.
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Give the pins back.
    pub fn release(self) -> (PWDN, RST) {
        (self.pwdn, self.reset)
    }

    fn cold_on<D: DelayMs<u32>>(&mut self, delay: &mut D) -> Result<(), E> {
        self.pwdn.set_high()?;
        self.reset.set_low()?;
        delay.delay_ms(1);
        delay.delay_ms(10);
        self.pwdn.set_low()?;
        delay.delay_ms(10);
        self.reset.set_high()?;
        delay.delay_ms(30);
        Ok(())
    }

    fn wake<D: DelayMs<u32>>(&mut self, delay: &mut D) -> Result<(), E> {
        delay.delay_ms(10);
        self.pwdn.set_low()?;
        delay.delay_ms(10);
        self.reset.set_high()?;
        delay.delay_ms(10);
        self.reset.set_low()?;
        delay.delay_ms(10);
        self.reset.set_high()?;
        delay.delay_ms(10);
        Ok(())
    }
}

impl<PWDN, RST, E> PowerSequencer for GpioSequencer<PWDN, RST>
where
    PWDN: OutputPin<Error = E>,
    RST: OutputPin<Error = E>,
{
    type Error = E;

    fn power<D: DelayMs<u32>>(&mut self, delay: &mut D, state: PowerState) -> Result<(), E> {
        match state {
            PowerState::On if self.state == PowerState::Standby => self.wake(delay)?,
            PowerState::On => self.cold_on(delay)?,
            PowerState::Standby => self.pwdn.set_high()?,
            PowerState::Off => {
                delay.delay_ms(10);
                self.pwdn.set_low()?;
                self.reset.set_low()?;
            }
            PowerState::Reset => {
                self.reset.set_low()?;
                delay.delay_ms(10);
                self.reset.set_high()?;
                delay.delay_ms(10);
            }
        }

        debug!("sensor power {:?} -> {:?}", self.state, state);
        // A reset pulse leaves the sensor running
        self.state = match state {
            PowerState::Reset => PowerState::On,
            other => other,
        };
        Ok(())
    }
}
