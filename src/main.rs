// PulseMon — Firmware Entry Point
//
// Boot sequence:
//   1. Silence the buzzer.
//   2. Bring up the TFT and touch controller (failure → permanent halt).
//   3. Show the splash screen for 1 second.
//   4. Initialise the MAX30102 (failure → error screen for 5 s, then run
//      without a sensor).
//   5. Draw the main screen and enter the cooperative monitoring loop.
//
// Everything runs on the main task; there are no other threads.

#[cfg(target_os = "espidf")]
mod drivers;

#[cfg(target_os = "espidf")]
mod firmware {
    use std::thread;
    use std::time::Duration;

    use esp_idf_hal::gpio::{AnyOutputPin, OutputPin, PinDriver};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_hal::spi::{config::Config as SpiConfig, SpiDeviceDriver, SpiDriver, SpiDriverConfig};

    use pulsemon::config::*;
    use pulsemon::estimator::DefaultEstimator;
    use pulsemon::Monitor;

    use crate::drivers::battery::BatteryGauge;
    use crate::drivers::board::EspBoard;
    use crate::drivers::buzzer::Buzzer;
    use crate::drivers::ili9341::{Ili9341, SharedSpi};
    use crate::drivers::max30102::Max30102;
    use crate::drivers::xpt2046::Xpt2046;

    // -----------------------------------------------------------------------
    // Utility: milliseconds since boot (wraps at ~49 days — callers use
    // wrapping arithmetic)
    // -----------------------------------------------------------------------
    pub fn now_ms() -> u32 {
        unsafe { (esp_idf_sys::esp_timer_get_time() / 1000) as u32 }
    }

    pub fn run() -> anyhow::Result<()> {
        // Link esp-idf-sys runtime patches and initialise logging.
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
        log::info!("PulseMon firmware starting…");
        log::debug!(
            "Pins: buzzer GPIO{} | TFT cs/dc/rst GPIO{}/{}/{} | touch cs GPIO{} | SPI sck/mosi/miso GPIO{}/{}/{} | I2C sda/scl GPIO{}/{} | battery ADC1_CH{}",
            PIN_BUZZER, PIN_TFT_CS, PIN_TFT_DC, PIN_TFT_RST, PIN_TOUCH_CS,
            PIN_SPI_SCK, PIN_SPI_MOSI, PIN_SPI_MISO, PIN_I2C_SDA, PIN_I2C_SCL, PIN_BATTERY_ADC
        );

        // ---- Peripherals --------------------------------------------------
        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;

        let buzzer = Buzzer::new(PinDriver::output(pins.gpio3.downgrade_output())?);
        let battery = BatteryGauge::new()?;

        // ---- SPI bus (shared between TFT and touch) -----------------------
        let spi = SpiDriver::new(
            peripherals.spi2,
            pins.gpio8,                          // SCK
            pins.gpio10,                         // MOSI
            Some(pins.gpio9),                    // MISO
            &SpiDriverConfig::new(),
        )?;
        // The bus lives for the entire programme (embedded firmware never
        // exits); both SPI devices borrow it.
        let spi: SharedSpi = Box::leak(Box::new(spi));

        let panel = init_panel(
            spi,
            pins.gpio5.downgrade_output(),
            pins.gpio4.downgrade_output(),
            pins.gpio21.downgrade_output(),
            pins.gpio20.downgrade_output(),
        );
        let (display, touch) = match panel {
            Ok((display, touch)) => (Ok(display), Some(touch)),
            Err(e) => (Err(e), None),
        };

        // ---- I2C bus (MAX30102) -------------------------------------------
        let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
        let i2c = I2cDriver::new(
            peripherals.i2c0,
            pins.gpio6, // SDA
            pins.gpio7, // SCL
            &i2c_config,
        )?;
        let sensor = Max30102::new(i2c);

        // ---- Boot + monitoring loop ---------------------------------------
        let board = EspBoard::new(buzzer, battery, touch);
        let mut monitor = match Monitor::boot(board, display, sensor, DefaultEstimator::default()) {
            Ok(monitor) => monitor,
            Err(e) => {
                log::error!("Boot failed: {:#}", e);
                pulsemon::halt(|ms| thread::sleep(Duration::from_millis(u64::from(ms))));
            }
        };

        monitor.run()
    }

    /// TFT + touch controller.  Either one failing is fatal.
    fn init_panel(
        spi: SharedSpi,
        tft_cs: AnyOutputPin,
        tft_dc: AnyOutputPin,
        tft_rst: AnyOutputPin,
        touch_cs: AnyOutputPin,
    ) -> anyhow::Result<(Ili9341, Xpt2046)> {
        let tft_spi = SpiDeviceDriver::new(
            spi,
            Some(tft_cs),
            &SpiConfig::new().baudrate(TFT_SPI_MHZ.MHz().into()),
        )?;
        let mut display = Ili9341::new(tft_spi, PinDriver::output(tft_dc)?, PinDriver::output(tft_rst)?);
        display.init()?;

        let touch_spi = SpiDeviceDriver::new(
            spi,
            Some(touch_cs),
            &SpiConfig::new().baudrate(TOUCH_SPI_MHZ.MHz().into()),
        )?;
        let mut touch = Xpt2046::new(touch_spi);
        touch.begin()?;

        Ok((display, touch))
    }
}

#[cfg(target_os = "espidf")]
pub use firmware::now_ms;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("pulsemon is ESP-IDF firmware; build for an espidf target (host builds only carry the library tests)");
}
