// PulseMon — Buzzer Driver
//
// Piezo buzzer on a plain GPIO (active HIGH).  Pulse timing lives in the
// alert engine; this only switches the pin.

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

pub struct Buzzer<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> Buzzer<'d> {
    pub fn new(mut pin: PinDriver<'d, AnyOutputPin, Output>) -> Self {
        let _ = pin.set_low();
        Self { pin }
    }

    pub fn set(&mut self, on: bool) {
        let res = if on { self.pin.set_high() } else { self.pin.set_low() };
        if let Err(e) = res {
            log::warn!("Buzzer GPIO error: {}", e);
        }
    }
}
