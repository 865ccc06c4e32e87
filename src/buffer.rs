// PulseMon — PPG Sample Window
//
// Two parallel 25-slot arrays (IR, red).  Every 25th sample hands the whole
// backing arrays to the estimator; the next fill overwrites them in place.

use crate::config::*;

pub type Window = [u32; SAMPLE_WINDOW];

/// Result of recording one sample pair.
#[derive(Debug, PartialEq, Eq)]
pub enum Fill<'a> {
    Partial,
    Full { ir: &'a Window, red: &'a Window },
}

#[derive(Debug)]
pub struct SampleBuffer {
    ir: Window,
    red: Window,
    cursor: usize,
}

impl SampleBuffer {
    pub const fn new() -> Self {
        Self {
            ir: [0; SAMPLE_WINDOW],
            red: [0; SAMPLE_WINDOW],
            cursor: 0,
        }
    }

    /// Store a sample pair at the cursor.  Returns `Fill::Full` when the
    /// cursor wraps back to slot 0.
    pub fn record(&mut self, ir: u32, red: u32) -> Fill<'_> {
        self.ir[self.cursor] = ir;
        self.red[self.cursor] = red;
        self.cursor = (self.cursor + 1) % SAMPLE_WINDOW;

        if self.cursor == 0 {
            Fill::Full { ir: &self.ir, red: &self.red }
        } else {
            Fill::Partial
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Drop the partial window after a gap in the sample stream.
    pub fn restart(&mut self) {
        self.cursor = 0;
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Finger-on-sensor heuristic applied to every IR sample.
pub fn finger_present(ir: u32) -> bool {
    ir > FINGER_THRESHOLD
}
