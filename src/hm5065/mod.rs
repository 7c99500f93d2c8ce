//! HM5065 device driver.
//!
//! [`Hm5065`] is the session object for one physical sensor. It owns the control bus and a delay
//! provider and keeps the [`DeviceState`] the sensor cannot report back: negotiated mode, cached
//! control values, stream parameters and the autofocus state.
//!
//! Typical bring-up:
//! * Power the sensor on (see [`power`]).
//! * [`Hm5065::init`] to detect the chip and load the default register program.
//! * [`Hm5065::set_format`] to pick an output resolution and pixel order.
//! * [`Hm5065::init_autofocus`] once, then drive focus through the autofocus methods or controls.
//!
//! Nothing here is thread safe; the caller must not share a session between threads.

pub mod config;
pub mod controls;
pub mod focus;
pub mod modes;
pub mod power;
pub mod regs;
pub mod sccb;

use embedded_hal::blocking::{delay::DelayMs, i2c};
use log::{debug, info, warn};

use config::Config;
use controls::{ControlCache, ControlError, ControlId, ControlInfo, Dispatch, LockStatus, Value};
use focus::{Autofocus, FocusError, FocusState, FocusStatus};
use modes::{FormatDescriptor, Mode, NegotiatedSize, PixelLayout};
use regs::Register;
use sccb::{BusError, DetectError, Sccb};

/// Frame rate the sensor runs at without a divider.
pub const SENSOR_FRAME_RATE: u32 = 30;

/// Largest supported frame rate divider.
pub const MAX_FRAME_DIVIDER: u32 = 15;

/// Exposure unit of the shutter register, per second.
const SHUTTER_UNITS_PER_SECOND: u32 = 16000;

/// What the stream is used for. Decides the focus handling around a format change.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CaptureMode {
    /// Single full resolution capture, the lens is held across the mode switch.
    Still,
    /// Plain streaming, focus is left alone.
    Video,
    /// Viewfinder streaming with continuous autofocus.
    Preview,
}

/// Time between frames, in seconds.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FrameInterval {
    pub numerator: u32,
    pub denominator: u32,
}

impl FrameInterval {
    /// One frame per sensor frame period.
    pub const FULL_RATE: FrameInterval = FrameInterval {
        numerator: 1,
        denominator: SENSOR_FRAME_RATE,
    };
}

/// Streaming parameters as last accepted.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct StreamParams {
    pub capture_mode: CaptureMode,
    /// Always a whole multiple of the sensor frame period.
    pub frame_interval: FrameInterval,
    /// Running below the sensor's full frame rate.
    pub low_speed: bool,
}

/// Capture metadata derived from the current exposure.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Exif {
    /// f-number times 100.
    pub fnumber: u32,
    /// Focal length in 1/100 mm.
    pub focal_length: u32,
    /// APEX brightness times 100.
    pub brightness: u32,
    /// The module has no flash, always false.
    pub flash_fired: bool,
    /// ISO equivalent of the global gain.
    pub iso_speed: u32,
    /// Exposure time in seconds, as a fraction.
    pub exposure_time_num: u32,
    pub exposure_time_den: u32,
}

/// Everything the driver remembers about one sensor.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DeviceState {
    /// Negotiated mode, `None` until a format has been applied.
    pub mode: Option<&'static Mode>,
    /// Current output format.
    pub format: &'static FormatDescriptor,
    /// Last control values written to the sensor.
    pub controls: ControlCache,
    pub stream: StreamParams,
    pub focus: Autofocus,
}

impl Default for DeviceState {
    fn default() -> Self {
        DeviceState {
            mode: None,
            format: modes::format(PixelLayout::Yuyv),
            controls: ControlCache::default(),
            stream: StreamParams {
                capture_mode: CaptureMode::Video,
                frame_interval: FrameInterval::FULL_RATE,
                low_speed: false,
            },
            focus: Autofocus::new(),
        }
    }
}

/// Session level errors.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum Error<E> {
    #[error("{0}")]
    Bus(BusError<E>),
    #[error("{0}")]
    Control(ControlError<E>),
    #[error("{0}")]
    Focus(FocusError<E>),
    #[error("unexpected chip id 0x{0:02X}")]
    UnknownChip(u8),
    #[error("unsupported frame interval")]
    InvalidStreamParameters,
}

impl<E> From<BusError<E>> for Error<E> {
    fn from(error: BusError<E>) -> Self {
        Error::Bus(error)
    }
}

impl<E> From<ControlError<E>> for Error<E> {
    fn from(error: ControlError<E>) -> Self {
        Error::Control(error)
    }
}

impl<E> From<FocusError<E>> for Error<E> {
    fn from(error: FocusError<E>) -> Self {
        Error::Focus(error)
    }
}

impl<E> From<DetectError<E>> for Error<E> {
    fn from(error: DetectError<E>) -> Self {
        match error {
            DetectError::Bus(error) => Error::Bus(error),
            DetectError::UnknownChip(id) => Error::UnknownChip(id),
        }
    }
}

/// HM5065 session.
pub struct Hm5065<I2C, D> {
    sccb: Sccb<I2C>,
    delay: D,
    config: Config,
    state: DeviceState,
    /// Set after the first complete `init`.
    initialized: bool,
}

impl<I2C, E, D> Hm5065<I2C, D>
where
    I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
    D: DelayMs<u32>,
{
    /// Create a session. No bus traffic until [`Hm5065::detect`] or [`Hm5065::init`].
    pub fn new(i2c: I2C, delay: D, config: Config) -> Self {
        Hm5065 {
            sccb: Sccb::new(i2c, config.address),
            delay,
            config,
            state: DeviceState::default(),
            initialized: false,
        }
    }

    /// End the session and give the bus and delay back.
    pub fn release(self) -> (I2C, D) {
        (self.sccb.release(), self.delay)
    }

    /// Session state as seen by the driver.
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Configuration the session was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check that an HM5065 answers on the bus.
    pub fn detect(&mut self) -> Result<(), Error<E>> {
        self.sccb.check_id()?;
        info!("HM5065 detected at 0x{:02X}", self.config.address);
        Ok(())
    }

    /// Detect the sensor, reset the cached state to defaults and load the default program.
    ///
    /// When the board parks the sensor in a register-retaining standby, only the first call
    /// programs the sensor; later calls just check the chip is still there.
    pub fn init(&mut self) -> Result<(), Error<E>> {
        self.detect()?;

        if self.initialized && self.config.standby.retains_registers() {
            info!("HM5065 resumed from {:?} standby", self.config.standby);
            return Ok(());
        }

        self.state = DeviceState::default();
        self.sccb
            .apply_program(&mut self.delay, self.config.default_program)?;
        self.dispatch()
            .set(ControlId::BandFilter, Value::BandFilter(controls::BandFilter::Hz50))?;

        self.initialized = true;
        info!("HM5065 initialized");
        Ok(())
    }

    /// Negotiate a size for `layout` without touching the sensor.
    pub fn try_format(
        &self,
        layout: PixelLayout,
        width: u32,
        height: u32,
    ) -> (NegotiatedSize, &'static FormatDescriptor) {
        let (size, _) = modes::negotiate(width, height);
        (size, modes::format(layout))
    }

    /// Negotiate and apply an output format. Returns the size actually granted, which may be
    /// smaller than requested.
    ///
    /// In still capture mode the lens position is captured before the mode switch and restored
    /// afterwards; in preview mode continuous autofocus is requested first.
    pub fn set_format(
        &mut self,
        layout: PixelLayout,
        width: u32,
        height: u32,
    ) -> Result<NegotiatedSize, Error<E>> {
        let (size, mode) = modes::negotiate(width, height);
        let format = modes::format(layout);

        let lens = match self.state.stream.capture_mode {
            CaptureMode::Still => Some(
                self.state
                    .focus
                    .capture_hold(&mut self.sccb, &mut self.delay)?,
            ),
            CaptureMode::Preview => {
                match self
                    .state
                    .focus
                    .enable_continuous(&mut self.sccb, &mut self.delay)
                {
                    Err(FocusError::InvalidState { state }) => {
                        warn!("continuous AF not enabled for preview while {:?}", state)
                    }
                    other => other?,
                }
                None
            }
            CaptureMode::Video => None,
        };

        self.sccb.apply_program(&mut self.delay, format.program)?;
        self.sccb.apply_program(&mut self.delay, mode.program)?;

        if let Some(position) = lens {
            self.state
                .focus
                .restore_lens(&mut self.sccb, &mut self.delay, position)?;
        }

        self.state.mode = Some(mode);
        self.state.format = format;
        info!(
            "format {} {}x{} (requested {}x{})",
            format.description, size.width, size.height, width, height
        );
        Ok(size)
    }

    /// Set the capture mode and frame interval. Still capture ignores the interval.
    ///
    /// The sensor only divides its 30 fps base rate by 1 to 15; a zero interval resets to the
    /// full rate.
    pub fn set_stream_params(
        &mut self,
        capture_mode: CaptureMode,
        interval: FrameInterval,
    ) -> Result<(), Error<E>> {
        self.state.stream.capture_mode = capture_mode;
        if capture_mode == CaptureMode::Still {
            debug!("still capture, frame interval unchanged");
            return Ok(());
        }

        let interval = if interval.numerator == 0 || interval.denominator == 0 {
            FrameInterval::FULL_RATE
        } else {
            interval
        };

        let rate = interval.denominator / interval.numerator;
        if rate == 0 {
            return Err(Error::InvalidStreamParameters);
        }
        let divider = SENSOR_FRAME_RATE / rate;
        if divider == 0 || divider > MAX_FRAME_DIVIDER {
            return Err(Error::InvalidStreamParameters);
        }

        self.state.stream.frame_interval = FrameInterval {
            numerator: divider,
            denominator: SENSOR_FRAME_RATE,
        };
        self.state.stream.low_speed = SENSOR_FRAME_RATE / divider < SENSOR_FRAME_RATE;
        debug!("frame rate {} fps (divider {})", SENSOR_FRAME_RATE / divider, divider);
        Ok(())
    }

    /// Current capture mode and frame interval.
    pub fn stream_params(&self) -> StreamParams {
        self.state.stream
    }

    /// Describe a control.
    pub fn query_control(&self, id: ControlId) -> &'static ControlInfo {
        controls::query(id)
    }

    /// Read a control. Flips are read back from the sensor, other values come from the cache.
    pub fn get_control(&mut self, id: ControlId) -> Result<Value, ControlError<E>> {
        self.dispatch().get(id)
    }

    /// Validate and apply a control value. Invalid values are rejected before any bus traffic
    /// and leave the cached value alone.
    pub fn set_control(&mut self, id: ControlId, value: Value) -> Result<(), ControlError<E>> {
        self.dispatch().set(id, value)
    }

    /// Which of focus, white balance and exposure are held.
    pub fn lock_status(&self) -> LockStatus {
        controls::lock_status(&self.state.controls, &self.state.focus)
    }

    /// Hold or release the 3A algorithms. Only focus can be held on this sensor.
    pub fn set_lock(&mut self, lock: LockStatus) -> Result<(), ControlError<E>> {
        self.dispatch().set_lock(lock)
    }

    /// What the focus microcontroller was last asked to do.
    pub fn focus_state(&self) -> FocusState {
        self.state.focus.state()
    }

    /// Download the configured firmware to the focus microcontroller.
    pub fn init_autofocus(&mut self) -> Result<(), FocusError<E>> {
        let firmware = self.config.af_firmware;
        self.state
            .focus
            .init_firmware(&mut self.sccb, &mut self.delay, firmware)
    }

    /// Start one focus search. Fails while a search is already running.
    pub fn start_single_shot(&mut self) -> Result<(), FocusError<E>> {
        self.state
            .focus
            .start_single_shot(&mut self.sccb, &mut self.delay)
    }

    /// Check whether the last focus request has converged.
    pub fn poll_focus(&mut self) -> Result<FocusStatus, FocusError<E>> {
        self.state.focus.poll_status(&mut self.sccb)
    }

    /// Switch to continuous autofocus.
    pub fn enable_continuous_focus(&mut self) -> Result<(), FocusError<E>> {
        self.state
            .focus
            .enable_continuous(&mut self.sccb, &mut self.delay)
    }

    /// Hold the lens where it is.
    pub fn pause_focus(&mut self) -> Result<(), FocusError<E>> {
        self.state.focus.pause(&mut self.sccb, &mut self.delay)
    }

    /// Stop any focus activity and go idle.
    pub fn release_focus(&mut self) -> Result<(), FocusError<E>> {
        self.state.focus.release(&mut self.sccb, &mut self.delay)
    }

    /// Read back the current exposure as capture metadata.
    pub fn exif(&mut self) -> Result<Exif, BusError<E>> {
        self.sccb.write_register(Register::PAGE_SELECT, 0x00)?;
        let shutter = u32::from(u16::from_be_bytes([
            self.sccb.read_register(Register::SHUTTER_MSB)?,
            self.sccb.read_register(Register::SHUTTER_LSB)?,
        ]));
        let gain = u32::from(self.sccb.read_register(Register::GLOBAL_GAIN)?);

        // Guard the divisions the sensor's raw values can break
        let exposure_time_den = match shutter {
            0 => SHUTTER_UNITS_PER_SECOND,
            shutter => (SHUTTER_UNITS_PER_SECOND / shutter).max(1),
        };

        Ok(Exif {
            fnumber: 280,
            focal_length: 425,
            brightness: 125,
            flash_fired: false,
            iso_speed: 50 * gain / 16,
            exposure_time_num: 1,
            exposure_time_den,
        })
    }

    fn dispatch(&mut self) -> Dispatch<'_, I2C, D> {
        Dispatch {
            sccb: &mut self.sccb,
            delay: &mut self.delay,
            cache: &mut self.state.controls,
            focus: &mut self.state.focus,
            af_firmware: self.config.af_firmware,
        }
    }
}
