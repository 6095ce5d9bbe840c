//! SSD1306 panels driven through the `ssd1306` crate in buffered graphics mode.
//! Composed frames are copied into the driver buffer and flushed whole.

use embedded_hal_1::i2c::I2c;
use ssd1306::{
    mode::BufferedGraphicsMode,
    prelude::{
        DisplayConfig as _, DisplayRotation, DisplaySize, DisplaySize128x32,
        DisplaySize128x64, I2CInterface, WriteOnlyDataCommand,
    },
    I2CDisplayInterface, Ssd1306,
};

use crate::{config::DisplayConfig, display::Frame, Error, Result};

pub mod hw;

type Buffered<DI, SIZE> = Ssd1306<DI, SIZE, BufferedGraphicsMode<SIZE>>;

/// The ssd1306 crate fixes geometry in the type, so each supported glass size
/// gets its own variant.
pub enum Panel<I> {
    Tall(Buffered<I2CInterface<I>, DisplaySize128x64>),
    Short(Buffered<I2CInterface<I>, DisplaySize128x32>),
}

impl<I: I2c> Panel<I> {
    /// Initialize the controller at the configured address and blank it.
    pub fn new(i2c: I, config: &DisplayConfig) -> Result<Self> {
        let interface = I2CDisplayInterface::new_custom_address(i2c, config.i2c_address);
        let rotation = if config.flipped() {
            DisplayRotation::Rotate180
        } else {
            DisplayRotation::Rotate0
        };
        let mut panel = match (config.width, config.height) {
            (128, 64) => Panel::Tall(
                Ssd1306::new(interface, DisplaySize128x64, rotation).into_buffered_graphics_mode(),
            ),
            (128, 32) => Panel::Short(
                Ssd1306::new(interface, DisplaySize128x32, rotation).into_buffered_graphics_mode(),
            ),
            (width, height) => {
                return Err(Error::Config(format!(
                    "no SSD1306 panel profile for {width}x{height} (use 128x64 or 128x32)"
                )))
            }
        };
        match &mut panel {
            Panel::Tall(display) => init(display)?,
            Panel::Short(display) => init(display)?,
        }
        Ok(panel)
    }

    pub fn draw(&mut self, frame: &Frame) -> Result<()> {
        match self {
            Panel::Tall(display) => push(display, frame),
            Panel::Short(display) => push(display, frame),
        }
    }
}

fn init<DI, SIZE>(display: &mut Buffered<DI, SIZE>) -> Result<()>
where
    DI: WriteOnlyDataCommand,
    SIZE: DisplaySize,
{
    display.init().map_err(map_display_err)?;
    display.clear_buffer();
    display.flush().map_err(map_display_err)
}

fn push<DI, SIZE>(display: &mut Buffered<DI, SIZE>, frame: &Frame) -> Result<()>
where
    DI: WriteOnlyDataCommand,
    SIZE: DisplaySize,
{
    let (width, height) = (u32::from(SIZE::WIDTH), u32::from(SIZE::HEIGHT));
    if (frame.width(), frame.height()) != (width, height) {
        return Err(Error::DisplayTransport(format!(
            "frame is {}x{}, panel is {width}x{height}",
            frame.width(),
            frame.height()
        )));
    }
    for y in 0..height {
        for x in 0..width {
            display.set_pixel(x, y, frame.pixel(x, y));
        }
    }
    display.flush().map_err(map_display_err)
}

fn map_display_err(err: impl std::fmt::Debug) -> Error {
    Error::DisplayTransport(format!("ssd1306: {err:?}"))
}
