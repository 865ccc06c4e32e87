// Test doubles for the board, sensor and display.

use std::cell::Cell;
use std::collections::VecDeque;
use std::convert::Infallible;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{PointsIter, Rectangle},
};

use crate::config::*;
use crate::buffer::Window;
use crate::estimator::{Estimate, Spo2Estimator};
use crate::hal::{Board, PulseSensor, RawPoint};

/// Simulated clock and on-board peripherals.  `delay_ms` advances time.
pub struct FakeBoard {
    now: Cell<u32>,
    pub buzzer_on: bool,
    pub buzzer_pulses: u32,
    pub battery_raw: u16,
    pub touches: VecDeque<RawPoint>,
    pub free_memory: usize,
    pub delayed_ms: u64,
}

impl FakeBoard {
    pub fn new() -> Self {
        Self {
            now: Cell::new(0),
            buzzer_on: false,
            buzzer_pulses: 0,
            battery_raw: 4095,
            touches: VecDeque::new(),
            free_memory: 64 * 1024,
            delayed_ms: 0,
        }
    }

    pub fn set_now(&self, ms: u32) {
        self.now.set(ms);
    }
}

impl Board for FakeBoard {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
        self.delayed_ms += u64::from(ms);
    }

    fn set_buzzer(&mut self, on: bool) {
        if on && !self.buzzer_on {
            self.buzzer_pulses += 1;
        }
        self.buzzer_on = on;
    }

    fn battery_raw(&mut self) -> u16 {
        self.battery_raw
    }

    fn poll_touch(&mut self) -> Option<RawPoint> {
        self.touches.pop_front()
    }

    fn free_memory(&self) -> usize {
        self.free_memory
    }
}

/// Scripted (ir, red) samples.
pub struct FakeSensor {
    pub init_ok: bool,
    pub samples: VecDeque<(u32, u32)>,
    pub overflow: bool,
}

impl FakeSensor {
    pub fn new() -> Self {
        Self { init_ok: true, samples: VecDeque::new(), overflow: false }
    }

    pub fn failing() -> Self {
        Self { init_ok: false, samples: VecDeque::new(), overflow: false }
    }

    pub fn feed(&mut self, ir: u32, red: u32, count: usize) {
        for _ in 0..count {
            self.samples.push_back((ir, red));
        }
    }
}

impl PulseSensor for FakeSensor {
    fn init(&mut self) -> anyhow::Result<()> {
        if self.init_ok {
            Ok(())
        } else {
            anyhow::bail!("no ACK from pulse sensor")
        }
    }

    fn available(&mut self) -> bool {
        !self.samples.is_empty()
    }

    fn red(&self) -> u32 {
        self.samples.front().map_or(0, |s| s.1)
    }

    fn ir(&self) -> u32 {
        self.samples.front().map_or(0, |s| s.0)
    }

    fn next_sample(&mut self) {
        self.samples.pop_front();
    }

    fn take_overflow(&mut self) -> bool {
        std::mem::take(&mut self.overflow)
    }
}

/// In-memory 240 × 320 RGB565 screen.
pub struct Framebuffer {
    pixels: Vec<Rgb565>,
    pub writes: usize,
}

impl Framebuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![Rgb565::BLACK; (SCREEN_WIDTH * SCREEN_HEIGHT) as usize],
            writes: 0,
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Rgb565 {
        self.pixels[(y as u32 * SCREEN_WIDTH + x as u32) as usize]
    }

    pub fn count_in(&self, area: Rectangle, color: Rgb565) -> usize {
        area.points().filter(|p| self.pixel(p.x, p.y) == color).count()
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < SCREEN_WIDTH && (p.y as u32) < SCREEN_HEIGHT {
                self.pixels[(p.y as u32 * SCREEN_WIDTH + p.x as u32) as usize] = color;
                self.writes += 1;
            }
        }
        Ok(())
    }
}

/// Always returns the same estimate; counts how often it ran.
pub struct FixedEstimator {
    pub estimate: Estimate,
    pub calls: usize,
}

impl FixedEstimator {
    pub fn new(heart_rate: i32, spo2: i32) -> Self {
        Self {
            estimate: Estimate { spo2, spo2_valid: true, heart_rate, heart_rate_valid: true },
            calls: 0,
        }
    }
}

impl Spo2Estimator for FixedEstimator {
    fn estimate(&mut self, _ir: &Window, _red: &Window) -> Estimate {
        self.calls += 1;
        self.estimate
    }
}
