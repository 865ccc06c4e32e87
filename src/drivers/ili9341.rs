// PulseMon — ILI9341 TFT Driver
//
// Minimal SPI driver exposing the panel as an embedded-graphics
// `DrawTarget<Color = Rgb565>`.  Portrait, 240 × 320, 16-bit colour.
// Rectangle fills stream a repeated colour; everything else goes pixel by
// pixel, which is plenty for text and outlines.

use std::thread;
use std::time::Duration;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::Rectangle,
};
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver};
use esp_idf_sys::EspError;

use pulsemon::config::*;

pub type SharedSpi = &'static SpiDriver<'static>;

// ILI9341 commands
const CMD_SWRESET: u8 = 0x01;
const CMD_SLPOUT: u8 = 0x11;
const CMD_DISPON: u8 = 0x29;
const CMD_CASET: u8 = 0x2A;
const CMD_PASET: u8 = 0x2B;
const CMD_RAMWR: u8 = 0x2C;
const CMD_MADCTL: u8 = 0x36;
const CMD_COLMOD: u8 = 0x3A;

const MADCTL_MX_BGR: u8 = 0x48; // portrait, BGR panel
const COLMOD_16BIT: u8 = 0x55;

const FILL_CHUNK_PIXELS: usize = 64;

pub struct Ili9341 {
    spi: SpiDeviceDriver<'static, SharedSpi>,
    dc: PinDriver<'static, AnyOutputPin, Output>,
    rst: PinDriver<'static, AnyOutputPin, Output>,
}

impl Ili9341 {
    pub fn new(
        spi: SpiDeviceDriver<'static, SharedSpi>,
        dc: PinDriver<'static, AnyOutputPin, Output>,
        rst: PinDriver<'static, AnyOutputPin, Output>,
    ) -> Self {
        Self { spi, dc, rst }
    }

    /// Hardware reset followed by the power-up command sequence.
    pub fn init(&mut self) -> anyhow::Result<()> {
        self.rst.set_low()?;
        thread::sleep(Duration::from_millis(10));
        self.rst.set_high()?;
        thread::sleep(Duration::from_millis(120));

        self.command(CMD_SWRESET, &[])?;
        thread::sleep(Duration::from_millis(150));
        self.command(CMD_SLPOUT, &[])?;
        thread::sleep(Duration::from_millis(120));

        self.command(CMD_COLMOD, &[COLMOD_16BIT])?;
        self.command(CMD_MADCTL, &[MADCTL_MX_BGR])?;
        self.command(CMD_DISPON, &[])?;

        log::info!("ILI9341 (0x{:04X}) initialised, {}x{}", DISPLAY_ID_ILI9341, SCREEN_WIDTH, SCREEN_HEIGHT);
        Ok(())
    }

    fn command(&mut self, cmd: u8, params: &[u8]) -> Result<(), EspError> {
        self.dc.set_low()?;
        self.spi.write(&[cmd])?;
        if !params.is_empty() {
            self.dc.set_high()?;
            self.spi.write(params)?;
        }
        Ok(())
    }

    /// Select the inclusive window `(x0, y0)..=(x1, y1)` and start a RAM write.
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), EspError> {
        let [x0h, x0l] = x0.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        let [y0h, y0l] = y0.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        self.command(CMD_CASET, &[x0h, x0l, x1h, x1l])?;
        self.command(CMD_PASET, &[y0h, y0l, y1h, y1l])?;
        self.command(CMD_RAMWR, &[])?;
        self.dc.set_high()
    }
}

impl OriginDimensions for Ili9341 {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for Ili9341 {
    type Color = Rgb565;
    type Error = EspError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if !bounds.contains(point) {
                continue;
            }
            let (x, y) = (point.x as u16, point.y as u16);
            self.set_window(x, y, x, y)?;
            self.spi.write(&color.into_storage().to_be_bytes())?;
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };

        self.set_window(
            area.top_left.x as u16,
            area.top_left.y as u16,
            bottom_right.x as u16,
            bottom_right.y as u16,
        )?;

        let [hi, lo] = color.into_storage().to_be_bytes();
        let mut chunk = [0u8; FILL_CHUNK_PIXELS * 2];
        for px in chunk.chunks_exact_mut(2) {
            px[0] = hi;
            px[1] = lo;
        }

        let mut remaining = area.size.width as usize * area.size.height as usize;
        while remaining > 0 {
            let n = remaining.min(FILL_CHUNK_PIXELS);
            self.spi.write(&chunk[..n * 2])?;
            remaining -= n;
        }
        Ok(())
    }
}
