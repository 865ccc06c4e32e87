// PulseMon — Board Capabilities
//
// The monitoring core only talks to hardware through these traits.  The
// firmware binary implements them on top of ESP-IDF; the unit tests use
// in-memory doubles.

/// Raw touch-controller coordinates (12-bit ADC space).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPoint {
    pub x: u16,
    pub y: u16,
}

/// Clock, buzzer, battery ADC, touch polling and free-heap query.
pub trait Board {
    /// Milliseconds since boot.  Wraps at `u32::MAX` (~49 days); callers
    /// compare with `wrapping_sub`.
    fn now_ms(&self) -> u32;

    /// Block the calling (and only) thread.
    fn delay_ms(&mut self, ms: u32);

    fn set_buzzer(&mut self, on: bool);

    /// Raw battery ADC reading, `0..=BATTERY_ADC_MAX`.
    fn battery_raw(&mut self) -> u16;

    /// `Some(point)` when a touch is pending.
    fn poll_touch(&mut self) -> Option<RawPoint>;

    /// Estimate of free memory in bytes.
    fn free_memory(&self) -> usize;
}

/// Optical pulse sensor (red + infrared channels).
pub trait PulseSensor {
    /// Apply the fixed acquisition settings.  Failure leaves the monitor
    /// running without a sensor.
    fn init(&mut self) -> anyhow::Result<()>;

    /// `true` when a new sample is ready to be read.
    fn available(&mut self) -> bool;

    fn red(&self) -> u32;

    fn ir(&self) -> u32;

    /// Drop the current sample and move to the next one.
    fn next_sample(&mut self);

    /// `true` once after samples were lost (hardware FIFO overrun).  The
    /// samples that follow are not contiguous with the ones before.
    fn take_overflow(&mut self) -> bool {
        false
    }
}
