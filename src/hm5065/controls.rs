//! Camera controls: identifiers, typed values and the handler table that maps each control onto
//! a register program, a flip bit or the autofocus state machine.

use embedded_hal::blocking::{delay::DelayMs, i2c};
use log::debug;

use super::focus::{Autofocus, FocusError, FocusState, FocusStatus};
use super::regs::{self, Program, Register};
use super::sccb::{BusError, Sccb};

/// Smallest and largest value of the level controls.
pub const LEVEL_MIN: i8 = -4;
pub const LEVEL_MAX: i8 = 4;

/// Settle time after most control programs.
const CONTROL_SETTLE_MS: u32 = 10;

/// Settle time when relaunching focus after a 3A unlock.
const RELAUNCH_SETTLE_MS: u32 = 5;

/// Controls the driver exposes.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ControlId {
    Brightness,
    Contrast,
    Saturation,
    ExposureBias,
    WhiteBalance,
    AutoWhiteBalance,
    ColorEffect,
    BandFilter,
    HorizontalFlip,
    VerticalFlip,
    /// Continuous autofocus on or off.
    FocusAuto,
    /// Download and start the focus firmware.
    AutoFocusInit,
    /// Single-shot search.
    AutoFocusStart,
    /// Hold the lens.
    AutoFocusStop,
    AutoFocusRelease,
    AutoFocusStatus,
    Lock3A,
}

impl ControlId {
    /// Every control, in table order.
    pub const ALL: [ControlId; 17] = [
        ControlId::Brightness,
        ControlId::Contrast,
        ControlId::Saturation,
        ControlId::ExposureBias,
        ControlId::WhiteBalance,
        ControlId::AutoWhiteBalance,
        ControlId::ColorEffect,
        ControlId::BandFilter,
        ControlId::HorizontalFlip,
        ControlId::VerticalFlip,
        ControlId::FocusAuto,
        ControlId::AutoFocusInit,
        ControlId::AutoFocusStart,
        ControlId::AutoFocusStop,
        ControlId::AutoFocusRelease,
        ControlId::AutoFocusStatus,
        ControlId::Lock3A,
    ];
}

/// White balance presets.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum WhiteBalance {
    Auto,
    Cloudy,
    Daylight,
    Incandescent,
    Fluorescent,
}

/// Color effects.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ColorEffect {
    None,
    BlackWhite,
    Sepia,
    Negative,
    SkyBlue,
    GrassGreen,
    SkinWhiten,
    Vivid,
}

/// Mains flicker suppression.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BandFilter {
    Disabled,
    Hz50,
    Hz60,
    Auto,
}

/// Which of focus, white balance and exposure are currently held.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct LockStatus {
    /// The lens is not moving on its own.
    pub focus: bool,
    /// Auto white balance is off.
    pub white_balance: bool,
    /// Never held, exposure runs free.
    pub exposure: bool,
}

/// Control value. Each control accepts exactly one variant.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Value {
    Level(i8),
    Flag(bool),
    WhiteBalance(WhiteBalance),
    ColorEffect(ColorEffect),
    BandFilter(BandFilter),
    FocusStatus(FocusStatus),
    Lock(LockStatus),
    /// Write-only command controls take no argument.
    Trigger,
}

/// Valid values of a control.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Range {
    Level { min: i8, max: i8, step: u8 },
    Flag,
    Menu(&'static [&'static str]),
    /// Write-only command.
    Button,
    /// Read-only status.
    Status,
    Lock,
}

/// How a control reaches the hardware.
#[derive(Clone, Copy)]
pub(crate) enum Handler {
    /// Look up a register program for the value, `None` if the value is not accepted.
    Program {
        program: fn(Value) -> Option<Program>,
        settle_ms: u32,
    },
    /// Read-modify-write of bit 0 of a register.
    Flip { register: u16 },
    Focus,
    Lock,
}

/// Static description of one control.
#[derive(Clone, Copy)]
pub struct ControlInfo {
    pub id: ControlId,
    /// Human readable name.
    pub name: &'static str,
    pub range: Range,
    /// Value after `init`, `None` for commands and status.
    pub default: Option<Value>,
    pub(crate) handler: Handler,
}

impl core::fmt::Debug for ControlInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControlInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("range", &self.range)
            .field("default", &self.default)
            .finish()
    }
}

/// Control dispatch errors.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum ControlError<E> {
    #[error("invalid control value")]
    InvalidArgument,
    #[error("control bus failure: {0}")]
    Bus(BusError<E>),
    #[error("control focus failure: {0}")]
    Focus(FocusError<E>),
}

impl<E> From<BusError<E>> for ControlError<E> {
    fn from(error: BusError<E>) -> Self {
        ControlError::Bus(error)
    }
}

impl<E> From<FocusError<E>> for ControlError<E> {
    fn from(error: FocusError<E>) -> Self {
        ControlError::Focus(error)
    }
}

const LEVEL: Range = Range::Level {
    min: LEVEL_MIN,
    max: LEVEL_MAX,
    step: 1,
};

/// Indexed by `ControlId as usize`.
static CONTROLS: [ControlInfo; 17] = [
    ControlInfo {
        id: ControlId::Brightness,
        name: "Brightness",
        range: LEVEL,
        default: Some(Value::Level(0)),
        handler: Handler::Program {
            program: untuned_level,
            settle_ms: CONTROL_SETTLE_MS,
        },
    },
    ControlInfo {
        id: ControlId::Contrast,
        name: "Contrast",
        range: LEVEL,
        default: Some(Value::Level(0)),
        handler: Handler::Program {
            program: untuned_level,
            settle_ms: CONTROL_SETTLE_MS,
        },
    },
    ControlInfo {
        id: ControlId::Saturation,
        name: "Saturation",
        range: LEVEL,
        default: Some(Value::Level(0)),
        handler: Handler::Program {
            program: untuned_level,
            settle_ms: CONTROL_SETTLE_MS,
        },
    },
    ControlInfo {
        id: ControlId::ExposureBias,
        name: "Exposure Bias",
        range: LEVEL,
        default: Some(Value::Level(0)),
        handler: Handler::Program {
            program: exposure_bias,
            settle_ms: CONTROL_SETTLE_MS,
        },
    },
    ControlInfo {
        id: ControlId::WhiteBalance,
        name: "White Balance Preset",
        range: Range::Menu(&["Auto", "Cloudy", "Daylight", "Incandescent", "Fluorescent"]),
        default: Some(Value::WhiteBalance(WhiteBalance::Auto)),
        handler: Handler::Program {
            program: white_balance,
            settle_ms: CONTROL_SETTLE_MS,
        },
    },
    ControlInfo {
        id: ControlId::AutoWhiteBalance,
        name: "Auto White Balance",
        range: Range::Flag,
        default: Some(Value::Flag(true)),
        handler: Handler::Program {
            program: auto_white_balance,
            settle_ms: CONTROL_SETTLE_MS,
        },
    },
    ControlInfo {
        id: ControlId::ColorEffect,
        name: "Color Effect",
        range: Range::Menu(&[
            "None",
            "Black & White",
            "Sepia",
            "Negative",
            "Sky Blue",
            "Grass Green",
            "Skin Whiten",
            "Vivid",
        ]),
        default: Some(Value::ColorEffect(ColorEffect::None)),
        handler: Handler::Program {
            program: color_effect,
            settle_ms: 0,
        },
    },
    ControlInfo {
        id: ControlId::BandFilter,
        name: "Power Line Frequency",
        range: Range::Menu(&["Disabled", "50 Hz", "60 Hz", "Auto"]),
        default: Some(Value::BandFilter(BandFilter::Hz50)),
        handler: Handler::Program {
            program: band_filter,
            settle_ms: CONTROL_SETTLE_MS,
        },
    },
    ControlInfo {
        id: ControlId::HorizontalFlip,
        name: "Horizontal Flip",
        range: Range::Flag,
        default: Some(Value::Flag(false)),
        handler: Handler::Flip {
            register: Register::HORIZONTAL_MIRROR,
        },
    },
    ControlInfo {
        id: ControlId::VerticalFlip,
        name: "Vertical Flip",
        range: Range::Flag,
        default: Some(Value::Flag(false)),
        handler: Handler::Flip {
            register: Register::VERTICAL_FLIP,
        },
    },
    ControlInfo {
        id: ControlId::FocusAuto,
        name: "Continuous Autofocus",
        range: Range::Flag,
        default: Some(Value::Flag(false)),
        handler: Handler::Focus,
    },
    ControlInfo {
        id: ControlId::AutoFocusInit,
        name: "Autofocus Init",
        range: Range::Button,
        default: None,
        handler: Handler::Focus,
    },
    ControlInfo {
        id: ControlId::AutoFocusStart,
        name: "Autofocus Start",
        range: Range::Button,
        default: None,
        handler: Handler::Focus,
    },
    ControlInfo {
        id: ControlId::AutoFocusStop,
        name: "Autofocus Stop",
        range: Range::Button,
        default: None,
        handler: Handler::Focus,
    },
    ControlInfo {
        id: ControlId::AutoFocusRelease,
        name: "Autofocus Release",
        range: Range::Button,
        default: None,
        handler: Handler::Focus,
    },
    ControlInfo {
        id: ControlId::AutoFocusStatus,
        name: "Autofocus Status",
        range: Range::Status,
        default: Some(Value::FocusStatus(FocusStatus::Idle)),
        handler: Handler::Focus,
    },
    ControlInfo {
        id: ControlId::Lock3A,
        name: "3A Lock",
        range: Range::Lock,
        default: None,
        handler: Handler::Lock,
    },
];

/// Describe a control: its range or menu and its default.
pub fn query(id: ControlId) -> &'static ControlInfo {
    &CONTROLS[id as usize]
}

fn level(value: Value) -> Option<i8> {
    match value {
        Value::Level(level) if (LEVEL_MIN..=LEVEL_MAX).contains(&level) => Some(level),
        _ => None,
    }
}

fn untuned_level(value: Value) -> Option<Program> {
    level(value).map(|_| &regs::UNTUNED_LEVEL_REGS[..])
}

fn exposure_bias(value: Value) -> Option<Program> {
    // Range checked, so the index is 0..=8
    level(value).map(|level| &regs::EV_REGS[(level - LEVEL_MIN) as usize][..])
}

fn white_balance(value: Value) -> Option<Program> {
    let Value::WhiteBalance(preset) = value else {
        return None;
    };
    Some(match preset {
        WhiteBalance::Auto => &regs::WB_AUTO_REGS,
        WhiteBalance::Cloudy => &regs::WB_CLOUDY_REGS,
        WhiteBalance::Daylight => &regs::WB_DAYLIGHT_REGS,
        WhiteBalance::Incandescent => &regs::WB_INCANDESCENT_REGS,
        WhiteBalance::Fluorescent => &regs::WB_FLUORESCENT_REGS,
    })
}

fn auto_white_balance(value: Value) -> Option<Program> {
    match value {
        Value::Flag(true) => Some(&regs::WB_AUTO_REGS),
        // Turning it off only clears the flag, the sensor keeps its current gains
        Value::Flag(false) => Some(&[]),
        _ => None,
    }
}

fn color_effect(value: Value) -> Option<Program> {
    let Value::ColorEffect(effect) = value else {
        return None;
    };
    Some(match effect {
        ColorEffect::None => &regs::COLORFX_NONE_REGS,
        ColorEffect::BlackWhite => &regs::COLORFX_BW_REGS,
        ColorEffect::Sepia => &regs::COLORFX_SEPIA_REGS,
        ColorEffect::Negative => &regs::COLORFX_NEGATIVE_REGS,
        ColorEffect::SkyBlue => &regs::COLORFX_SKY_BLUE_REGS,
        ColorEffect::GrassGreen => &regs::COLORFX_GRASS_GREEN_REGS,
        ColorEffect::SkinWhiten | ColorEffect::Vivid => &regs::COLORFX_UNTUNED_REGS,
    })
}

fn band_filter(value: Value) -> Option<Program> {
    let Value::BandFilter(filter) = value else {
        return None;
    };
    Some(match filter {
        BandFilter::Disabled => &regs::BAND_FILTER_DISABLED_REGS,
        BandFilter::Hz50 => &regs::BAND_FILTER_50HZ_REGS,
        BandFilter::Hz60 => &regs::BAND_FILTER_60HZ_REGS,
        BandFilter::Auto => &regs::BAND_FILTER_AUTO_REGS,
    })
}

/// Last values successfully written to the sensor.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ControlCache {
    pub brightness: i8,
    pub contrast: i8,
    pub saturation: i8,
    pub exposure_bias: i8,
    pub white_balance: WhiteBalance,
    pub auto_white_balance: bool,
    pub color_effect: ColorEffect,
    pub band_filter: BandFilter,
    pub horizontal_flip: bool,
    pub vertical_flip: bool,
}

impl Default for ControlCache {
    fn default() -> Self {
        ControlCache {
            brightness: 0,
            contrast: 0,
            saturation: 0,
            exposure_bias: 0,
            white_balance: WhiteBalance::Auto,
            auto_white_balance: true,
            color_effect: ColorEffect::None,
            band_filter: BandFilter::Hz50,
            horizontal_flip: false,
            vertical_flip: false,
        }
    }
}

impl ControlCache {
    /// Cached value of a program or flip control.
    fn load(&self, id: ControlId) -> Option<Value> {
        Some(match id {
            ControlId::Brightness => Value::Level(self.brightness),
            ControlId::Contrast => Value::Level(self.contrast),
            ControlId::Saturation => Value::Level(self.saturation),
            ControlId::ExposureBias => Value::Level(self.exposure_bias),
            ControlId::WhiteBalance => Value::WhiteBalance(self.white_balance),
            ControlId::AutoWhiteBalance => Value::Flag(self.auto_white_balance),
            ControlId::ColorEffect => Value::ColorEffect(self.color_effect),
            ControlId::BandFilter => Value::BandFilter(self.band_filter),
            ControlId::HorizontalFlip => Value::Flag(self.horizontal_flip),
            ControlId::VerticalFlip => Value::Flag(self.vertical_flip),
            _ => return None,
        })
    }

    /// Record a value that was just written. `value` has already been validated for `id`.
    fn store(&mut self, id: ControlId, value: Value) {
        match (id, value) {
            (ControlId::Brightness, Value::Level(level)) => self.brightness = level,
            (ControlId::Contrast, Value::Level(level)) => self.contrast = level,
            (ControlId::Saturation, Value::Level(level)) => self.saturation = level,
            (ControlId::ExposureBias, Value::Level(level)) => self.exposure_bias = level,
            (ControlId::WhiteBalance, Value::WhiteBalance(preset)) => {
                self.white_balance = preset;
                self.auto_white_balance = preset == WhiteBalance::Auto;
            }
            (ControlId::AutoWhiteBalance, Value::Flag(on)) => {
                self.auto_white_balance = on;
                if on {
                    self.white_balance = WhiteBalance::Auto;
                }
            }
            (ControlId::ColorEffect, Value::ColorEffect(effect)) => self.color_effect = effect,
            (ControlId::BandFilter, Value::BandFilter(filter)) => self.band_filter = filter,
            (ControlId::HorizontalFlip, Value::Flag(on)) => self.horizontal_flip = on,
            (ControlId::VerticalFlip, Value::Flag(on)) => self.vertical_flip = on,
            _ => {}
        }
    }
}

/// 3A lock as derived from the focus state and the white balance mode. Exposure is never held by
/// this driver.
pub fn lock_status(cache: &ControlCache, focus: &Autofocus) -> LockStatus {
    LockStatus {
        focus: focus.state() != FocusState::ContinuousActive,
        white_balance: !cache.auto_white_balance,
        exposure: false,
    }
}

/// Borrowed view of a session, enough to run one control request.
pub(crate) struct Dispatch<'a, I2C, D> {
    pub sccb: &'a mut Sccb<I2C>,
    pub delay: &'a mut D,
    pub cache: &'a mut ControlCache,
    pub focus: &'a mut Autofocus,
    pub af_firmware: &'static [u8],
}

impl<'a, I2C, E, D> Dispatch<'a, I2C, D>
where
    I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
    D: DelayMs<u32>,
{
    pub fn get(self, id: ControlId) -> Result<Value, ControlError<E>> {
        match query(id).handler {
            Handler::Program { .. } => self.cache.load(id).ok_or(ControlError::InvalidArgument),
            Handler::Flip { register } => {
                let on = self.sccb.read_register(register)? & 0x01 != 0;
                self.cache.store(id, Value::Flag(on));
                Ok(Value::Flag(on))
            }
            Handler::Focus => match id {
                ControlId::FocusAuto => Ok(Value::Flag(
                    self.focus.state() == FocusState::ContinuousActive,
                )),
                ControlId::AutoFocusStatus => {
                    Ok(Value::FocusStatus(self.focus.poll_status(self.sccb)?))
                }
                // Commands have nothing to read back
                _ => Err(ControlError::InvalidArgument),
            },
            Handler::Lock => Ok(Value::Lock(lock_status(self.cache, self.focus))),
        }
    }

    pub fn set(self, id: ControlId, value: Value) -> Result<(), ControlError<E>> {
        match query(id).handler {
            Handler::Program { program, settle_ms } => {
                let program = program(value).ok_or(ControlError::InvalidArgument)?;
                self.sccb.apply_program(self.delay, program)?;
                if settle_ms > 0 {
                    self.delay.delay_ms(settle_ms);
                }
                self.cache.store(id, value);
                debug!("control {:?} = {:?}", id, value);
                Ok(())
            }
            Handler::Flip { register } => {
                let Value::Flag(on) = value else {
                    return Err(ControlError::InvalidArgument);
                };
                if self.cache.load(id) == Some(value) {
                    return Ok(());
                }
                let current = self.sccb.read_register(register)?;
                let next = if on { current | 0x01 } else { current & !0x01 };
                self.sccb.write_register(register, next)?;
                self.delay.delay_ms(CONTROL_SETTLE_MS);
                self.cache.store(id, value);
                debug!("control {:?} = {}", id, on);
                Ok(())
            }
            Handler::Focus => self.set_focus(id, value),
            Handler::Lock => {
                let Value::Lock(lock) = value else {
                    return Err(ControlError::InvalidArgument);
                };
                self.set_lock(lock)
            }
        }
    }

    fn set_focus(self, id: ControlId, value: Value) -> Result<(), ControlError<E>> {
        let Dispatch {
            sccb,
            delay,
            focus,
            af_firmware,
            ..
        } = self;
        match (id, value) {
            (ControlId::FocusAuto, Value::Flag(true)) => focus.enable_continuous(sccb, delay)?,
            (ControlId::FocusAuto, Value::Flag(false)) => {
                if focus.state() == FocusState::ContinuousActive {
                    focus.release(sccb, delay)?;
                }
            }
            (ControlId::AutoFocusInit, Value::Trigger) => {
                focus.init_firmware(sccb, delay, af_firmware)?
            }
            (ControlId::AutoFocusStart, Value::Trigger) => focus.start_single_shot(sccb, delay)?,
            (ControlId::AutoFocusStop, Value::Trigger) => focus.pause(sccb, delay)?,
            (ControlId::AutoFocusRelease, Value::Trigger) => focus.release(sccb, delay)?,
            _ => return Err(ControlError::InvalidArgument),
        }
        Ok(())
    }

    /// Only the focus part of a lock request has an effect.
    pub fn set_lock(self, lock: LockStatus) -> Result<(), ControlError<E>> {
        if lock.focus {
            self.focus.pause(self.sccb, self.delay)?;
        } else {
            self.delay.delay_ms(RELAUNCH_SETTLE_MS);
        }
        debug!("3A lock focus={}", lock.focus);
        Ok(())
    }
}
