//! HM5065 bring-up firmware for the STM32F746G Discovery board.

#![no_main]
#![no_std]

use hm5065_rs::hm5065::power::{GpioSequencer, PowerSequencer, PowerState};
use hm5065_rs::pins::pin_config_stm32f746g_disco;
use hm5065_rs::{Config, Hm5065, PixelLayout};

use core::convert::Infallible;
use core::panic::PanicInfo;
use cortex_m_rt::entry;
use embedded_hal::digital::v2::OutputPin;
use log::{error, info, LevelFilter, Log, Metadata, Record};
use rtt_target::{rprintln, rtt_init, set_print_channel};
use stm32f7xx_hal::{
    delay::Delay,
    i2c::{BlockingI2c, Mode},
    pac,
    prelude::*,
    rcc::{HSEClock, HSEClockMode},
};

/// Forwards log records to the RTT terminal.
struct RttLogger;

impl Log for RttLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        rprintln!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: RttLogger = RttLogger;

/// The camera connector has no reset line, the module resets itself on power up.
struct NoResetLine;

impl OutputPin for NoResetLine {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[entry]
fn main() -> ! {
    // Setup RTT for logging
    let channels = rtt_init! {
        up: {
            0: {
                size: 4096
                mode: BlockIfFull
                name: "Terminal"
            }
        }
    };
    set_print_channel(channels.up.0);
    log::set_logger(&LOGGER).ok();
    log::set_max_level(LevelFilter::Debug);

    // Get peripherals
    let pac_periph = pac::Peripherals::take().unwrap();
    let cm_periph = cortex_m::Peripherals::take().unwrap();

    // Clock configuration, the 25 MHz external oscillator on the board (X2) is the HSE source
    let mut rcc = pac_periph.RCC.constrain();
    let hse_cfg = HSEClock::new(25.mhz(), HSEClockMode::Oscillator);
    let clocks = rcc.cfgr.hse(hse_cfg).sysclk(216.mhz()).freeze();
    let mut delay = Delay::new(cm_periph.SYST, clocks);

    // Pin configuration
    let (scl, sda, pwdn) = pin_config_stm32f746g_disco();

    // Power the sensor up before any bus traffic
    let mut power = GpioSequencer::new(pwdn, NoResetLine);
    power.power(&mut delay, PowerState::On).ok();

    // I2C1 configuration (HM5065 control bus)
    let i2c = BlockingI2c::i2c1(
        pac_periph.I2C1,
        (scl, sda),
        Mode::standard(100.khz()),
        clocks,
        &mut rcc.apb1,
        10000,
    );

    let mut camera = Hm5065::new(i2c, delay, Config::default());

    if let Err(e) = camera.init() {
        error!("HM5065 init failed: {}", e);
        halt();
    }

    match camera.set_format(PixelLayout::Yuyv, 640, 480) {
        Ok(size) => info!("streaming {}x{}", size.width, size.height),
        Err(e) => {
            error!("set format failed: {}", e);
            halt();
        }
    }

    // Autofocus is optional, keep streaming without it
    match camera.init_autofocus() {
        Ok(()) => {
            if let Err(e) = camera.enable_continuous_focus() {
                error!("continuous AF failed: {}", e);
            }
        }
        Err(e) => error!("AF firmware failed: {}", e),
    }

    match camera.exif() {
        Ok(exif) => info!(
            "exposure 1/{} s, ISO {}",
            exif.exposure_time_den, exif.iso_speed
        ),
        Err(e) => error!("exif read failed: {}", e),
    }

    halt();
}

fn halt() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}

#[inline(never)]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    rprintln!("Panicked!");
    rprintln!("{:?}", info);
    loop {}
}
