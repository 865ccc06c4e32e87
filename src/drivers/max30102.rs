// PulseMon — MAX30102 Pulse Oximeter Driver
//
// Register-level driver over I2C, same approach as the other on-board
// drivers: no external sensor crate, so nothing fights esp-idf-hal over
// embedded-hal versions.
//
// Every availability check drains the chip FIFO into a small local queue, so
// the 25 Hz stream stays continuous while the monitor takes its backlog each
// sensor tick.  Lost samples (chip overrun or local queue full) are reported
// once through `take_overflow`.

use esp_idf_hal::i2c::I2cDriver;
use heapless::Deque;

use pulsemon::config::*;
use pulsemon::hal::PulseSensor;

// MAX30102 register addresses
const REG_FIFO_WR_PTR: u8 = 0x04;
const REG_OVF_COUNTER: u8 = 0x05;
const REG_FIFO_RD_PTR: u8 = 0x06;
const REG_FIFO_DATA: u8 = 0x07;
const REG_FIFO_CONFIG: u8 = 0x08;
const REG_MODE_CONFIG: u8 = 0x09;
const REG_SPO2_CONFIG: u8 = 0x0A;
const REG_LED1_PA: u8 = 0x0C; // red
const REG_LED2_PA: u8 = 0x0D; // IR
const REG_LED3_PA: u8 = 0x0E; // green (MAX30105 only; ignored on MAX30102)
const REG_PART_ID: u8 = 0xFF;
const PART_ID_EXPECTED: u8 = 0x15;

const MODE_RESET: u8 = 0x40;
const MODE_SPO2: u8 = 0x03; // red + IR
const FIFO_ROLLOVER: u8 = 0x10;
const FIFO_DEPTH: usize = SENSOR_FIFO_DEPTH;
const BYTES_PER_SAMPLE: usize = 6; // 3 bytes red, 3 bytes IR
const SAMPLE_MASK: u32 = 0x3_FFFF; // 18-bit ADC

#[derive(Debug, Clone, Copy)]
struct Sample {
    red: u32,
    ir: u32,
}

pub struct Max30102 {
    bus: I2cDriver<'static>,
    queue: Deque<Sample, FIFO_DEPTH>,
    overflowed: bool,
}

impl Max30102 {
    pub fn new(bus: I2cDriver<'static>) -> Self {
        Self { bus, queue: Deque::new(), overflowed: false }
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> anyhow::Result<()> {
        self.bus.write(I2C_ADDR_MAX30102, &[reg, value], I2C_TIMEOUT_TICKS)?;
        Ok(())
    }

    fn read_reg(&mut self, reg: u8) -> anyhow::Result<u8> {
        let mut buf = [0u8; 1];
        self.bus
            .write_read(I2C_ADDR_MAX30102, &[reg], &mut buf, I2C_TIMEOUT_TICKS)?;
        Ok(buf[0])
    }

    /// Move every sample waiting in the chip FIFO into the local queue.
    /// When the queue is full the oldest samples make room.
    fn drain_fifo(&mut self) -> anyhow::Result<usize> {
        let rd = self.read_reg(REG_FIFO_RD_PTR)?;
        let wr = self.read_reg(REG_FIFO_WR_PTR)?;
        let lost = self.read_reg(REG_OVF_COUNTER)?;
        let mut pending = usize::from(wr.wrapping_sub(rd) & 0x1F);
        if lost > 0 {
            log::warn!("MAX30102 FIFO overrun ({} samples lost)", lost);
            self.overflowed = true;
            // Equal pointers with a non-zero counter mean a full FIFO.
            if pending == 0 {
                pending = FIFO_DEPTH;
            }
        }
        if pending == 0 {
            return Ok(0);
        }

        let mut raw = [0u8; FIFO_DEPTH * BYTES_PER_SAMPLE];
        let raw = &mut raw[..pending * BYTES_PER_SAMPLE];
        self.bus
            .write_read(I2C_ADDR_MAX30102, &[REG_FIFO_DATA], raw, I2C_TIMEOUT_TICKS)?;

        for chunk in raw.chunks_exact(BYTES_PER_SAMPLE) {
            let red = u32::from_be_bytes([0, chunk[0], chunk[1], chunk[2]]) & SAMPLE_MASK;
            let ir = u32::from_be_bytes([0, chunk[3], chunk[4], chunk[5]]) & SAMPLE_MASK;
            if self.queue.is_full() {
                self.queue.pop_front();
                self.overflowed = true;
            }
            let _ = self.queue.push_back(Sample { red, ir });
        }
        Ok(pending)
    }
}

impl PulseSensor for Max30102 {
    /// Reset, then LED 0x1F, average 4, red + IR, 100 Hz, 411 µs, 4096 nA,
    /// red amplitude 0x0A, green off.
    fn init(&mut self) -> anyhow::Result<()> {
        let part = self.read_reg(REG_PART_ID)?;
        if part != PART_ID_EXPECTED {
            anyhow::bail!("unexpected MAX30102 part id 0x{:02X}", part);
        }

        self.write_reg(REG_MODE_CONFIG, MODE_RESET)?;
        std::thread::sleep(std::time::Duration::from_millis(10));

        self.write_reg(REG_FIFO_CONFIG, sample_average_bits(SENSOR_SAMPLE_AVERAGE) | FIFO_ROLLOVER)?;
        self.write_reg(REG_MODE_CONFIG, MODE_SPO2)?;
        self.write_reg(
            REG_SPO2_CONFIG,
            adc_range_bits(SENSOR_ADC_RANGE_NA)
                | sample_rate_bits(SENSOR_SAMPLE_RATE_HZ)
                | pulse_width_bits(SENSOR_PULSE_WIDTH_US),
        )?;
        self.write_reg(REG_LED1_PA, SENSOR_RED_AMPLITUDE)?;
        self.write_reg(REG_LED2_PA, SENSOR_LED_AMPLITUDE)?;
        self.write_reg(REG_LED3_PA, 0)?;

        // Start from an empty FIFO.
        self.write_reg(REG_FIFO_WR_PTR, 0)?;
        self.write_reg(REG_OVF_COUNTER, 0)?;
        self.write_reg(REG_FIFO_RD_PTR, 0)?;
        self.queue.clear();
        self.overflowed = false;

        log::info!(
            "MAX30102 initialised (avg {}, {} Hz, {} us, {} nA)",
            SENSOR_SAMPLE_AVERAGE,
            SENSOR_SAMPLE_RATE_HZ,
            SENSOR_PULSE_WIDTH_US,
            SENSOR_ADC_RANGE_NA
        );
        Ok(())
    }

    fn available(&mut self) -> bool {
        if let Err(e) = self.drain_fifo() {
            log::warn!("MAX30102 FIFO read error: {}", e);
        }
        !self.queue.is_empty()
    }

    fn red(&self) -> u32 {
        self.queue.front().map_or(0, |s| s.red)
    }

    fn ir(&self) -> u32 {
        self.queue.front().map_or(0, |s| s.ir)
    }

    fn next_sample(&mut self) {
        self.queue.pop_front();
    }

    fn take_overflow(&mut self) -> bool {
        core::mem::take(&mut self.overflowed)
    }
}

fn sample_average_bits(avg: u8) -> u8 {
    let code = match avg {
        1 => 0,
        2 => 1,
        4 => 2,
        8 => 3,
        16 => 4,
        _ => 5, // 32
    };
    code << 5
}

fn adc_range_bits(range_na: u16) -> u8 {
    let code = match range_na {
        2048 => 0,
        4096 => 1,
        8192 => 2,
        _ => 3, // 16384
    };
    code << 5
}

fn sample_rate_bits(hz: u16) -> u8 {
    let code = match hz {
        50 => 0,
        100 => 1,
        200 => 2,
        400 => 3,
        800 => 4,
        1000 => 5,
        1600 => 6,
        _ => 7, // 3200
    };
    code << 2
}

fn pulse_width_bits(us: u16) -> u8 {
    match us {
        69 => 0,
        118 => 1,
        215 => 2,
        _ => 3, // 411
    }
}
