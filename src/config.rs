// PulseMon — Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V) + ILI9341/XPT2046 TFT + MAX30102

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
pub const PIN_BATTERY_ADC: u32 = 2; // D0/A0 — Battery voltage (ADC1 channel 2)
pub const PIN_BUZZER: i32 = 3;      // D1    — Piezo buzzer (active HIGH)
pub const PIN_TFT_DC: i32 = 4;      // D2    — TFT data/command
pub const PIN_TFT_CS: i32 = 5;      // D3    — TFT chip select
pub const PIN_I2C_SDA: i32 = 6;     // D4    — I2C data line (MAX30102)
pub const PIN_I2C_SCL: i32 = 7;     // D5    — I2C clock line (MAX30102)
pub const PIN_SPI_SCK: i32 = 8;     // D8    — Shared SPI clock
pub const PIN_SPI_MISO: i32 = 9;    // D9    — Shared SPI MISO
pub const PIN_SPI_MOSI: i32 = 10;   // D10   — Shared SPI MOSI
pub const PIN_TOUCH_CS: i32 = 20;   // D7    — XPT2046 chip select
pub const PIN_TFT_RST: i32 = 21;    // D6    — TFT reset

// ---------------------------------------------------------------------------
// Buses
// ---------------------------------------------------------------------------
pub const I2C_ADDR_MAX30102: u8 = 0x57;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks
pub const I2C_BAUDRATE_KHZ: u32 = 400;
pub const TFT_SPI_MHZ: u32 = 26;
pub const TOUCH_SPI_MHZ: u32 = 2;

// ---------------------------------------------------------------------------
// Display (ILI9341, portrait)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 240;
pub const SCREEN_HEIGHT: u32 = 320;
pub const DISPLAY_ID_ILI9341: u16 = 0x9341;

// ---------------------------------------------------------------------------
// Touch (XPT2046 raw range → screen pixels)
// ---------------------------------------------------------------------------
pub const TOUCH_RAW_X_MIN: i32 = 200;
pub const TOUCH_RAW_X_MAX: i32 = 3700;
pub const TOUCH_RAW_Y_MIN: i32 = 240;
pub const TOUCH_RAW_Y_MAX: i32 = 3800;
pub const TOUCH_PRESSURE_THRESHOLD: u16 = 400;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const SENSOR_INTERVAL_MS: u32 = 100;        // 10 Hz FIFO drain
pub const DISPLAY_INTERVAL_MS: u32 = 100;       // 10 Hz redraw
pub const ALERT_INTERVAL_MS: u32 = 1000;        // 1 Hz threshold check
pub const MEMORY_CHECK_INTERVAL_MS: u32 = 30_000;
pub const LOOP_IDLE_MS: u32 = 10;
pub const TOUCH_DEBOUNCE_MS: u32 = 200;
pub const SPLASH_DISPLAY_MS: u32 = 1000;
pub const SENSOR_ERROR_DISPLAY_MS: u32 = 5000;
pub const HALT_POLL_MS: u32 = 1000;

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------
pub const MAX_ACTIVE_ALERTS: usize = 3;
pub const MAX_ALERT_LOG: usize = 3;
pub const ALERT_MESSAGE_LEN: usize = 19;        // 20-byte slot minus terminator
pub const ALERT_COOLDOWN_MS: u32 = 5000;
pub const ALERT_EXPIRY_MS: u32 = 30_000;
pub const BANNER_TIMEOUT_MS: u32 = 5000;

pub const HR_LOW_WARN: u8 = 60;
pub const HR_HIGH_WARN: u8 = 100;
pub const HR_LOW_CRIT: u8 = 50;
pub const HR_HIGH_CRIT: u8 = 120;
pub const SPO2_WARN: u8 = 95;
pub const SPO2_CRIT: u8 = 90;
pub const BATTERY_WARN: u8 = 20;
pub const BATTERY_CRIT: u8 = 10;

// ---------------------------------------------------------------------------
// Memory pressure
// ---------------------------------------------------------------------------
pub const LOW_MEMORY_BYTES: usize = 4096;

// ---------------------------------------------------------------------------
// PPG Sampling
// ---------------------------------------------------------------------------
pub const SAMPLE_WINDOW: usize = 25;
pub const FINGER_THRESHOLD: u32 = 50_000;
pub const HR_MAX_ACCEPTED: i32 = 200;           // exclusive
pub const SPO2_MAX_ACCEPTED: i32 = 100;         // inclusive

// ---------------------------------------------------------------------------
// MAX30102 Acquisition Settings
// ---------------------------------------------------------------------------
pub const SENSOR_LED_AMPLITUDE: u8 = 0x1F;
pub const SENSOR_RED_AMPLITUDE: u8 = 0x0A;
pub const SENSOR_SAMPLE_AVERAGE: u8 = 4;
pub const SENSOR_SAMPLE_RATE_HZ: u16 = 100;
pub const SENSOR_PULSE_WIDTH_US: u16 = 411;
pub const SENSOR_ADC_RANGE_NA: u16 = 4096;
pub const SENSOR_FIFO_DEPTH: usize = 32;
/// Rate at which averaged samples leave the chip: 100 Hz / 4 = 25 Hz.
pub const WINDOW_SAMPLE_RATE_HZ: f32 = SENSOR_SAMPLE_RATE_HZ as f32 / SENSOR_SAMPLE_AVERAGE as f32;
/// Backlog consumed per sensor tick; a 100 ms tick normally finds 2 or 3.
pub const MAX_SAMPLES_PER_TICK: usize = SENSOR_FIFO_DEPTH;

// ---------------------------------------------------------------------------
// Battery (1:2 divider before the ADC pin, LiPo 3.0 V – 4.2 V)
// ---------------------------------------------------------------------------
pub const BATTERY_ADC_MAX: f32 = 4095.0;
pub const BATTERY_ADC_VREF: f32 = 3.3;
pub const BATTERY_DIVIDER: f32 = 2.0;
pub const BATTERY_EMPTY_V: f32 = 3.0;
pub const BATTERY_SPAN_V: f32 = 1.2;
