//! Driver configuration, fixed at build time by the integrator.

use super::regs::{self, Program};

/// Default 7-bit bus address of the HM5065.
pub const DEFAULT_ADDRESS: u8 = 0x1F;

/// How the board parks the sensor between sessions.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StandbyMode {
    /// The sensor is powered off between sessions and loses its registers.
    None,
    /// PWDN pin standby, registers are retained.
    Hardware,
    /// Register controlled standby, registers are retained.
    Software,
}

impl StandbyMode {
    /// Whether register contents survive a standby cycle.
    pub fn retains_registers(self) -> bool {
        !matches!(self, StandbyMode::None)
    }
}

/// Per-board driver settings.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// 7-bit I2C address.
    pub address: u8,
    /// Vendor calibration program applied by `init`.
    pub default_program: Program,
    /// Autofocus microcontroller firmware image, downloaded to 0x8000.
    pub af_firmware: &'static [u8],
    /// How the board parks the sensor, decides whether `init` reprograms it.
    pub standby: StandbyMode,
}

impl Config {
    /// Default address and program, no AF firmware and no standby.
    pub const DEFAULT: Config = Config {
        address: DEFAULT_ADDRESS,
        default_program: &regs::DEFAULT_REGS,
        af_firmware: &[],
        standby: StandbyMode::None,
    };

    /// Replace the program applied by `init`, typically with the full vendor calibration.
    pub const fn with_default_program(mut self, program: Program) -> Self {
        self.default_program = program;
        self
    }

    /// Set the autofocus firmware image.
    pub const fn with_af_firmware(mut self, image: &'static [u8]) -> Self {
        self.af_firmware = image;
        self
    }

    pub const fn with_standby(mut self, standby: StandbyMode) -> Self {
        self.standby = standby;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::DEFAULT
    }
}
