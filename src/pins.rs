//! Pin configuration for the HM5065 on the STM32F746G Discovery board.

use stm32f7xx_hal::{
    gpio::{self, Alternate, GpioExt, Output, PushPull, AF4},
    pac,
};

/// Configure the camera connector (P1) control pins.
/// * Returns the I2C pins for the I2C driver and the power-down pin for the power sequencer.
/// * Peripherals are stolen, so this should only be done during init!
///
/// Pin configuration:
///
///     I2C1 SCL:   PB8  --> HM5065 SCL
///     I2C1 SDA:   PB9 <--> HM5065 SDA
///     DCMI_PWR_EN PH13 --> HM5065 PWDN
pub fn pin_config_stm32f746g_disco() -> (
    gpio::gpiob::PB8<Alternate<AF4>>,
    gpio::gpiob::PB9<Alternate<AF4>>,
    gpio::gpioh::PH13<Output<PushPull>>,
) {
    let pac_periph = unsafe { pac::Peripherals::steal() };
    let gpiob = pac_periph.GPIOB.split();
    let gpioh = pac_periph.GPIOH.split();

    // Configure I2C1 for the sensor control bus
    let scl = gpiob
        .pb8
        .into_alternate_af4()
        .internal_pull_up(true)
        .set_open_drain();
    let sda = gpiob
        .pb9
        .into_alternate_af4()
        .internal_pull_up(true)
        .set_open_drain();

    let pwdn = gpioh.ph13.into_push_pull_output();

    (scl, sda, pwdn)
}
