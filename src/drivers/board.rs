// PulseMon — ESP-IDF Board
//
// Binds the on-board peripherals (buzzer, battery ADC, touch panel) and the
// system timer/heap to the monitor's `Board` capability.

use std::thread;
use std::time::Duration;

use pulsemon::hal::{Board, RawPoint};

use super::battery::BatteryGauge;
use super::buzzer::Buzzer;
use super::xpt2046::Xpt2046;

pub struct EspBoard {
    buzzer: Buzzer<'static>,
    battery: BatteryGauge,
    touch: Option<Xpt2046>,
}

impl EspBoard {
    pub fn new(buzzer: Buzzer<'static>, battery: BatteryGauge, touch: Option<Xpt2046>) -> Self {
        Self { buzzer, battery, touch }
    }
}

impl Board for EspBoard {
    fn now_ms(&self) -> u32 {
        crate::now_ms()
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }

    fn set_buzzer(&mut self, on: bool) {
        self.buzzer.set(on);
    }

    fn battery_raw(&mut self) -> u16 {
        self.battery.read_raw()
    }

    fn poll_touch(&mut self) -> Option<RawPoint> {
        self.touch.as_mut()?.poll()
    }

    fn free_memory(&self) -> usize {
        // SAFETY: read-only query of the heap allocator.
        unsafe { esp_idf_sys::esp_get_free_heap_size() as usize }
    }
}
