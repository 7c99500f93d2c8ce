//! Register addresses and register-list programs for the HM5065.
//!
//! Programs are ordered lists of [`RegisterOp`]s applied by [`Sccb::apply_program`]. The values
//! below are the vendor's tuning for this module; they are data, not logic.
//!
//! [`Sccb::apply_program`]: super::sccb::Sccb::apply_program

/// One step of a register-list program.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RegisterOp {
    /// Write `value` to the 16-bit register `address`.
    Write { address: u16, value: u8 },
    /// Sleep for the given number of milliseconds, no bus I/O.
    Delay(u8),
}

impl RegisterOp {
    /// Shorthand for a register write, keeps the tables below readable.
    pub const fn w(address: u16, value: u8) -> Self {
        RegisterOp::Write { address, value }
    }
}

use RegisterOp::Delay;

/// A statically allocated register-list program.
pub type Program = &'static [RegisterOp];

/// Device register addresses.
pub struct Register;

impl Register {
    // Identification
    pub const CHIP_ID_MSB: u16 = 0x0000;

    // Exif readback, page 0
    pub const PAGE_SELECT: u16 = 0x00FE;
    pub const SHUTTER_MSB: u16 = 0x0003;
    pub const SHUTTER_LSB: u16 = 0x0004;
    pub const GLOBAL_GAIN: u16 = 0x00B1;

    // Image orientation, bit 0 of each
    pub const HORIZONTAL_MIRROR: u16 = 0x0083;
    pub const VERTICAL_FLIP: u16 = 0x0084;

    // Output pixel order
    pub const YUV_ORDER: u16 = 0x0085;

    // Autofocus host interface
    pub const AF_MODE: u16 = 0x070A;
    pub const AF_TRIGGER: u16 = 0x070B;
    pub const AF_LENS_COMMAND: u16 = 0x070C;
    pub const AF_MANUAL_POS_MSB: u16 = 0x0734;
    pub const AF_MANUAL_POS_LSB: u16 = 0x0735;
    pub const AF_RELEASE: u16 = 0x0751;
    pub const AF_LENS_POS_MSB: u16 = 0x06F0;
    pub const AF_LENS_POS_LSB: u16 = 0x06F1;
    pub const AF_STATUS: u16 = 0x07AE;

    // Autofocus microcontroller
    pub const MCU_RESET: u16 = 0x3000;
    pub const AF_FW_STATUS: u16 = 0x3029;
    pub const AF_FW_BASE: u16 = 0x8000;
}

/// Expected value of [`Register::CHIP_ID_MSB`].
pub const CHIP_ID_MSB: u8 = 0x03;

/// Trailing stream-enable part of the vendor default program, used when the integrator does not
/// supply the full calibration blob through [`Config`](super::config::Config).
pub static DEFAULT_REGS: [RegisterOp; 10] = [
    RegisterOp::w(0x0085, 0x02),
    RegisterOp::w(0x7000, 0x08),
    RegisterOp::w(0x5200, 0x09),
    RegisterOp::w(0x00B5, 0x01),
    RegisterOp::w(0x0030, 0x14),
    RegisterOp::w(0x0040, 0x01),
    RegisterOp::w(0x0041, 0x04),
    RegisterOp::w(0x00B4, 0x01),
    RegisterOp::w(0x0010, 0x01),
    Delay(100),
];

// White balance. Only the R/G/B channel gains are tuned here.

pub static WB_AUTO_REGS: [RegisterOp; 1] = [RegisterOp::w(0x01A0, 0x01)];

pub static WB_CLOUDY_REGS: [RegisterOp; 4] = [
    RegisterOp::w(0x01A0, 0x03),
    RegisterOp::w(0x01A1, 0x62),
    RegisterOp::w(0x01A2, 0x08),
    RegisterOp::w(0x01A3, 0x00),
];

pub static WB_DAYLIGHT_REGS: [RegisterOp; 4] = [
    RegisterOp::w(0x01A0, 0x03),
    RegisterOp::w(0x01A1, 0x4F),
    RegisterOp::w(0x01A2, 0x00),
    RegisterOp::w(0x01A3, 0x01),
];

pub static WB_INCANDESCENT_REGS: [RegisterOp; 4] = [
    RegisterOp::w(0x01A0, 0x03),
    RegisterOp::w(0x01A1, 0x10),
    RegisterOp::w(0x01A2, 0x00),
    RegisterOp::w(0x01A3, 0x52),
];

pub static WB_FLUORESCENT_REGS: [RegisterOp; 4] = [
    RegisterOp::w(0x01A0, 0x03),
    RegisterOp::w(0x01A1, 0x39),
    RegisterOp::w(0x01A2, 0x00),
    RegisterOp::w(0x01A3, 0x59),
];

// Color effects

const fn colorfx(negative: u8, effect: u8) -> [RegisterOp; 4] {
    [
        RegisterOp::w(0x0380, negative),
        RegisterOp::w(0x0381, 0x00),
        RegisterOp::w(0x0382, 0x00),
        RegisterOp::w(0x0384, effect),
    ]
}

pub static COLORFX_NONE_REGS: [RegisterOp; 4] = colorfx(0x00, 0x00);
pub static COLORFX_BW_REGS: [RegisterOp; 4] = colorfx(0x00, 0x05);
pub static COLORFX_SEPIA_REGS: [RegisterOp; 4] = colorfx(0x00, 0x06);
pub static COLORFX_NEGATIVE_REGS: [RegisterOp; 4] = colorfx(0x01, 0x00);
pub static COLORFX_SKY_BLUE_REGS: [RegisterOp; 4] = colorfx(0x00, 0x04);
pub static COLORFX_GRASS_GREEN_REGS: [RegisterOp; 4] = colorfx(0x00, 0x03);

/// Skin whiten and vivid have no tuning on this module, selecting them only updates the cache.
pub static COLORFX_UNTUNED_REGS: [RegisterOp; 0] = [];

/// Exposure bias from -4 to +4 (roughly -1.3 EV to +1.3 EV), indexed by `level + 4`.
pub static EV_REGS: [[RegisterOp; 1]; 9] = [
    [RegisterOp::w(0x0130, 0xF6)],
    [RegisterOp::w(0x0130, 0xF7)],
    [RegisterOp::w(0x0130, 0xF8)],
    [RegisterOp::w(0x0130, 0xF9)],
    [RegisterOp::w(0x0130, 0xFD)],
    [RegisterOp::w(0x0130, 0x03)],
    [RegisterOp::w(0x0130, 0x05)],
    [RegisterOp::w(0x0130, 0x06)],
    [RegisterOp::w(0x0130, 0x07)],
];

/// Brightness, contrast and saturation are not tuned on this module: every level maps to an
/// empty program and the value is only cached.
pub static UNTUNED_LEVEL_REGS: [RegisterOp; 0] = [];

// Band filter

pub static BAND_FILTER_DISABLED_REGS: [RegisterOp; 1] = [RegisterOp::w(0x0190, 0x00)];

pub static BAND_FILTER_50HZ_REGS: [RegisterOp; 3] = [
    RegisterOp::w(0x019C, 0x4B),
    RegisterOp::w(0x019D, 0x20),
    RegisterOp::w(0x0190, 0x00),
];

pub static BAND_FILTER_60HZ_REGS: [RegisterOp; 3] = [
    RegisterOp::w(0x019C, 0x4B),
    RegisterOp::w(0x019D, 0xC0),
    RegisterOp::w(0x0190, 0x00),
];

/// Automatic flicker detection is the sensor's power-on behavior.
pub static BAND_FILTER_AUTO_REGS: [RegisterOp; 0] = [];

// Output pixel order

pub static FMT_YUYV_REGS: [RegisterOp; 1] = [RegisterOp::w(Register::YUV_ORDER, 0x02)];
pub static FMT_YVYU_REGS: [RegisterOp; 1] = [RegisterOp::w(Register::YUV_ORDER, 0x03)];
pub static FMT_UYVY_REGS: [RegisterOp; 1] = [RegisterOp::w(Register::YUV_ORDER, 0x00)];
pub static FMT_VYUY_REGS: [RegisterOp; 1] = [RegisterOp::w(Register::YUV_ORDER, 0x01)];

// Autofocus

/// Hold the microcontroller in reset before downloading firmware.
pub static AF_FW_RESET_REGS: [RegisterOp; 1] = [RegisterOp::w(Register::MCU_RESET, 0x20)];

/// Clear the command mailbox and let the microcontroller run the downloaded firmware.
pub static AF_FW_START_REGS: [RegisterOp; 10] = [
    RegisterOp::w(0x3022, 0x00),
    RegisterOp::w(0x3023, 0x00),
    RegisterOp::w(0x3024, 0x00),
    RegisterOp::w(0x3025, 0x00),
    RegisterOp::w(0x3026, 0x00),
    RegisterOp::w(0x3027, 0x00),
    RegisterOp::w(0x3028, 0x00),
    RegisterOp::w(Register::AF_FW_STATUS, 0x7F),
    RegisterOp::w(Register::MCU_RESET, 0x00),
    Delay(10),
];

/// Single-shot trigger. The firmware needs ~200 ms around arming the trigger.
pub static AF_SINGLE_SHOT_REGS: [RegisterOp; 7] = [
    RegisterOp::w(Register::AF_RELEASE, 0x00),
    RegisterOp::w(Register::AF_MODE, 0x03),
    Delay(200),
    RegisterOp::w(Register::AF_TRIGGER, 0x01),
    Delay(200),
    RegisterOp::w(Register::AF_TRIGGER, 0x02),
    Delay(200),
];

pub static AF_CONTINUOUS_REGS: [RegisterOp; 1] = [RegisterOp::w(Register::AF_MODE, 0x01)];

/// Manual mode keeps the lens where it is.
pub static AF_PAUSE_REGS: [RegisterOp; 2] = [RegisterOp::w(Register::AF_MODE, 0x00), Delay(5)];

pub static AF_RELEASE_REGS: [RegisterOp; 1] = [RegisterOp::w(Register::AF_RELEASE, 0x01)];

/// First half of the still-capture lens hold: run one focus pass before switching modes.
pub static AF_CAPTURE_PREPARE_REGS: [RegisterOp; 4] = [
    RegisterOp::w(Register::AF_TRIGGER, 0x01),
    RegisterOp::w(Register::AF_MODE, 0x03),
    Delay(200),
    RegisterOp::w(Register::AF_TRIGGER, 0x02),
];
