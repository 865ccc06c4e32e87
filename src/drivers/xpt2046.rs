// PulseMon — XPT2046 Resistive Touch Driver
//
// 12-bit differential conversions over the SPI bus shared with the TFT.
// Pressure is estimated from Z1/Z2; X/Y are returned raw and mapped to
// screen space by the monitor.

use esp_idf_hal::spi::SpiDeviceDriver;
use esp_idf_sys::EspError;

use pulsemon::config::*;
use pulsemon::hal::RawPoint;

use super::ili9341::SharedSpi;

const CMD_X: u8 = 0xD0;
const CMD_Y: u8 = 0x90;
const CMD_Z1: u8 = 0xB0;
const CMD_Z2: u8 = 0xC0;
const ADC_MAX: u16 = 4095;

pub struct Xpt2046 {
    spi: SpiDeviceDriver<'static, SharedSpi>,
}

impl Xpt2046 {
    pub fn new(spi: SpiDeviceDriver<'static, SharedSpi>) -> Self {
        Self { spi }
    }

    /// Run one conversion to confirm the controller answers on the bus.
    pub fn begin(&mut self) -> anyhow::Result<()> {
        let z1 = self.read(CMD_Z1)?;
        log::info!("XPT2046 ready (idle Z1 = {})", z1);
        Ok(())
    }

    fn read(&mut self, cmd: u8) -> Result<u16, EspError> {
        let mut rx = [0u8; 3];
        self.spi.transfer(&mut rx, &[cmd, 0, 0])?;
        Ok((u16::from_be_bytes([rx[1], rx[2]]) >> 3) & ADC_MAX)
    }

    fn pressure(&mut self) -> Result<u16, EspError> {
        let z1 = self.read(CMD_Z1)?;
        let z2 = self.read(CMD_Z2)?;
        Ok((z1 + ADC_MAX).saturating_sub(z2))
    }

    /// `Some(raw point)` while the panel is pressed.
    pub fn poll(&mut self) -> Option<RawPoint> {
        let reading = self.pressure().and_then(|z| {
            if z < TOUCH_PRESSURE_THRESHOLD {
                return Ok(None);
            }
            let x = self.read(CMD_X)?;
            let y = self.read(CMD_Y)?;
            Ok(Some(RawPoint { x, y }))
        });

        match reading {
            Ok(point) => point,
            Err(e) => {
                log::warn!("Touch read error: {}", e);
                None
            }
        }
    }
}
