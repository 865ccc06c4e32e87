// PulseMon — Battery Gauge
//
// One-shot ADC reads of the battery divider via raw ESP-IDF calls.
// GPIO2 / ADC1_CHANNEL_2 with 11 dB attenuation (0–3.3 V range).

use pulsemon::config::*;

pub struct BatteryGauge {
    handle: esp_idf_sys::adc_oneshot_unit_handle_t,
    channel: esp_idf_sys::adc_channel_t,
    last: u16,
}

impl BatteryGauge {
    pub fn new() -> anyhow::Result<Self> {
        let channel = PIN_BATTERY_ADC as esp_idf_sys::adc_channel_t; // GPIO2 → ADC1_CH2

        // SAFETY: plain FFI calls with valid, initialised config structs; the
        // handle is owned by this gauge for the lifetime of the firmware.
        unsafe {
            let mut handle: esp_idf_sys::adc_oneshot_unit_handle_t = core::ptr::null_mut();
            let unit_cfg = esp_idf_sys::adc_oneshot_unit_init_cfg_t {
                unit_id: esp_idf_sys::adc_unit_t_ADC_UNIT_1,
                ulp_mode: esp_idf_sys::adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
                ..core::mem::zeroed()
            };
            esp_idf_sys::esp!(esp_idf_sys::adc_oneshot_new_unit(&unit_cfg, &mut handle))?;

            let chan_cfg = esp_idf_sys::adc_oneshot_chan_cfg_t {
                atten: esp_idf_sys::adc_atten_t_ADC_ATTEN_DB_11,
                bitwidth: esp_idf_sys::adc_bitwidth_t_ADC_BITWIDTH_12,
            };
            esp_idf_sys::esp!(esp_idf_sys::adc_oneshot_config_channel(handle, channel, &chan_cfg))?;

            Ok(Self { handle, channel, last: BATTERY_ADC_MAX as u16 })
        }
    }

    /// Raw 12-bit reading; the previous reading if the conversion fails.
    pub fn read_raw(&mut self) -> u16 {
        let mut raw: i32 = 0;
        // SAFETY: `handle` was created in `new` and is never freed.
        let ret = unsafe { esp_idf_sys::adc_oneshot_read(self.handle, self.channel, &mut raw) };
        if ret != esp_idf_sys::ESP_OK {
            log::warn!("Battery ADC read failed ({})", ret);
            return self.last;
        }
        self.last = raw.clamp(0, BATTERY_ADC_MAX as i32) as u16;
        self.last
    }
}
