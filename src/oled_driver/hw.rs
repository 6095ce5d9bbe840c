//! Board plumbing: the I2C character device for the panel and the rppal GPIO
//! line for its reset pin.

use crate::{Error, Result};

#[cfg(target_os = "linux")]
use std::{thread, time::Duration};

#[cfg(target_os = "linux")]
pub type PanelBus = linux_embedded_hal::I2cdev;

#[cfg(target_os = "linux")]
fn map_gpio_err(err: rppal::gpio::Error) -> Error {
    Error::DisplayTransport(format!("gpio: {err}"))
}

/// Open `/dev/i2c-<bus>`.
#[cfg(target_os = "linux")]
pub fn open_bus(bus: u8) -> Result<PanelBus> {
    let path = format!("/dev/i2c-{bus}");
    linux_embedded_hal::I2cdev::new(&path)
        .map_err(|err| Error::DisplayTransport(format!("i2c: {path}: {err}")))
}

/// Pulse the panel's active-low reset line, leaving it released (high).
#[cfg(target_os = "linux")]
pub fn pulse_reset(pin: u8) -> Result<()> {
    let gpio = rppal::gpio::Gpio::new().map_err(map_gpio_err)?;
    let mut line = gpio.get(pin).map_err(map_gpio_err)?.into_output_high();
    line.set_reset_on_drop(false);
    thread::sleep(Duration::from_millis(1));
    line.set_low();
    thread::sleep(Duration::from_millis(10));
    line.set_high();
    thread::sleep(Duration::from_millis(10));
    Ok(())
}

/// Non-Linux stand-in so dev hosts build; every transfer fails.
#[cfg(not(target_os = "linux"))]
pub struct PanelBus;

#[cfg(not(target_os = "linux"))]
impl embedded_hal_1::i2c::ErrorType for PanelBus {
    type Error = embedded_hal_1::i2c::ErrorKind;
}

#[cfg(not(target_os = "linux"))]
impl embedded_hal_1::i2c::I2c for PanelBus {
    fn transaction(
        &mut self,
        _address: u8,
        _operations: &mut [embedded_hal_1::i2c::Operation<'_>],
    ) -> std::result::Result<(), Self::Error> {
        Err(embedded_hal_1::i2c::ErrorKind::Other)
    }
}

#[cfg(not(target_os = "linux"))]
pub fn open_bus(_bus: u8) -> Result<PanelBus> {
    Err(Error::DisplayTransport(
        "I2C is only available on Linux targets".into(),
    ))
}

#[cfg(not(target_os = "linux"))]
pub fn pulse_reset(_pin: u8) -> Result<()> {
    Err(Error::DisplayTransport(
        "GPIO is only available on Linux targets".into(),
    ))
}
