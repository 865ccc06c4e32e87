// PulseMon — Vital Signs State

use crate::config::*;

/// Latest readings shown on screen and checked by the alert engine.
/// `0` means "unknown" for both heart rate and SpO2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VitalSigns {
    pub heart_rate: u8,
    pub spo2: u8,
    pub battery: u8,
    pub finger: bool,
    pub updated_ms: u32,
}

impl VitalSigns {
    /// Heart rate if a finger is on the sensor and a reading exists.
    pub fn known_heart_rate(&self) -> Option<u8> {
        (self.finger && self.heart_rate > 0).then_some(self.heart_rate)
    }

    /// SpO2 if a finger is on the sensor and a reading exists.
    pub fn known_spo2(&self) -> Option<u8> {
        (self.finger && self.spo2 > 0).then_some(self.spo2)
    }
}

/// Convert a raw ADC reading to a 0–100 % charge level.
pub fn battery_percent(raw: u16) -> u8 {
    let voltage = f32::from(raw) / BATTERY_ADC_MAX * BATTERY_ADC_VREF * BATTERY_DIVIDER;
    let level = (voltage - BATTERY_EMPTY_V) / BATTERY_SPAN_V * 100.0;
    level.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battery_zero_raw_clamps_to_empty() {
        assert_eq!(battery_percent(0), 0);
    }

    #[test]
    fn battery_full_scale_clamps_to_full() {
        assert_eq!(battery_percent(4095), 100);
        assert_eq!(battery_percent(u16::MAX), 100);
    }

    #[test]
    fn battery_midpoint_is_linear() {
        // 3.6 V at the cell → 1.8 V at the pin → raw ≈ 2234
        let raw = (1.8 / BATTERY_ADC_VREF * BATTERY_ADC_MAX) as u16;
        let pct = battery_percent(raw);
        assert!((49..=50).contains(&pct), "got {pct}");
    }

    #[test]
    fn unknown_values_hidden_without_finger() {
        let v = VitalSigns { heart_rate: 72, spo2: 98, finger: false, ..Default::default() };
        assert_eq!(v.known_heart_rate(), None);
        assert_eq!(v.known_spo2(), None);

        let v = VitalSigns { finger: true, ..v };
        assert_eq!(v.known_heart_rate(), Some(72));
        assert_eq!(v.known_spo2(), Some(98));
    }
}
