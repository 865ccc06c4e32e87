// PulseMon — Heart-Rate / SpO2 Estimation
//
// Two back-ends behind one trait:
//   1. Built-in back-end (default) — a small ratio-of-ratios estimator so the
//      firmware runs end-to-end without vendor code.
//   2. FFI back-end — enable the `maxim-spo2` feature to link the Maxim
//      reference algorithm compiled by build.rs.
//
// Either way the monitor only sees `Spo2Estimator::estimate` and applies its
// own acceptance policy in `apply_window`.

use crate::buffer::Window;
use crate::config::*;
use crate::vitals::VitalSigns;

// ---------------------------------------------------------------------------
// Public interface
// ---------------------------------------------------------------------------

/// Raw estimator output over one 25-sample window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Estimate {
    pub spo2: i32,
    pub spo2_valid: bool,
    pub heart_rate: i32,
    pub heart_rate_valid: bool,
}

pub trait Spo2Estimator {
    fn estimate(&mut self, ir: &Window, red: &Window) -> Estimate;
}

#[cfg(not(feature = "maxim-spo2"))]
pub type DefaultEstimator = RatioEstimator;

#[cfg(feature = "maxim-spo2")]
pub type DefaultEstimator = MaximEstimator;

/// Merge one completed window into `vitals`.
///
/// No finger → both readings reset to unknown and the estimator is skipped.
/// Otherwise each reading is only replaced when the estimator marks it valid
/// and it lies in range; a bad window keeps the last good value.
pub fn apply_window<E: Spo2Estimator>(
    vitals: &mut VitalSigns,
    estimator: &mut E,
    ir: &Window,
    red: &Window,
) {
    if !vitals.finger {
        vitals.heart_rate = 0;
        vitals.spo2 = 0;
        return;
    }

    let est = estimator.estimate(ir, red);

    if est.heart_rate_valid && est.heart_rate > 0 && est.heart_rate < HR_MAX_ACCEPTED {
        vitals.heart_rate = est.heart_rate as u8;
    } else {
        log::debug!("HR rejected ({}, valid={})", est.heart_rate, est.heart_rate_valid);
    }

    if est.spo2_valid && est.spo2 > 0 && est.spo2 <= SPO2_MAX_ACCEPTED {
        vitals.spo2 = est.spo2 as u8;
    } else {
        log::debug!("SpO2 rejected ({}, valid={})", est.spo2, est.spo2_valid);
    }
}

// ---------------------------------------------------------------------------
// Built-in back-end
// ---------------------------------------------------------------------------

/// Heart rate from the zero crossings of the DC-removed IR signal, SpO2
/// from the empirical `110 - 25·R` calibration.
///
/// A window is one second at the chip output rate, barely more than one
/// beat, so both crossing directions are used: each pair of adjacent
/// crossings is half a period.
#[derive(Debug, Default)]
pub struct RatioEstimator;

impl Spo2Estimator for RatioEstimator {
    fn estimate(&mut self, ir: &Window, red: &Window) -> Estimate {
        let (ir_dc, ir_ac) = dc_ac(ir);
        let (red_dc, red_ac) = dc_ac(red);

        let mut est = Estimate::default();
        if ir_dc < 1.0 || red_dc < 1.0 || ir_ac < 1e-3 || red_ac < 1e-3 {
            return est;
        }

        if let Some(bpm) = crossing_rate_bpm(ir, ir_dc) {
            est.heart_rate = bpm.round() as i32;
            est.heart_rate_valid = true;
        }

        let r = (red_ac / red_dc) / (ir_ac / ir_dc);
        let spo2 = 110.0 - 25.0 * r;
        if spo2 > 0.0 && spo2 <= 100.0 {
            est.spo2 = spo2.round() as i32;
            est.spo2_valid = true;
        }

        log::debug!("estimate: R={:.3} -> {:?}", r, est);
        est
    }
}

/// Mean and standard deviation of a window.
fn dc_ac(window: &Window) -> (f32, f32) {
    let n = window.len() as f32;
    let mean = window.iter().map(|&v| v as f32).sum::<f32>() / n;
    let var = window
        .iter()
        .map(|&v| {
            let d = v as f32 - mean;
            d * d
        })
        .sum::<f32>()
        / n;
    (mean, var.sqrt())
}

fn crossing_rate_bpm(window: &Window, mean: f32) -> Option<f32> {
    let mut first = None;
    let mut last = 0.0f32;
    let mut count = 0u32;

    for i in 1..window.len() {
        let prev = window[i - 1] as f32 - mean;
        let cur = window[i] as f32 - mean;
        if (prev < 0.0) != (cur < 0.0) {
            // Sub-sample position of the crossing.
            let at = (i - 1) as f32 + prev / (prev - cur);
            first.get_or_insert(at);
            last = at;
            count += 1;
        }
    }

    let first = first?;
    if count < 2 || last <= first {
        return None;
    }
    let half_periods = (count - 1) as f32;
    let seconds = (last - first) / WINDOW_SAMPLE_RATE_HZ;
    Some(half_periods * 30.0 / seconds)
}

// ---------------------------------------------------------------------------
// FFI back-end — Maxim reference algorithm compiled by build.rs
// ---------------------------------------------------------------------------
#[cfg(feature = "maxim-spo2")]
mod ffi {
    extern "C" {
        pub fn maxim_heart_rate_and_oxygen_saturation(
            ir_buffer: *mut u32,
            ir_buffer_length: i32,
            red_buffer: *mut u32,
            spo2: *mut i32,
            spo2_valid: *mut i8,
            heart_rate: *mut i32,
            heart_rate_valid: *mut i8,
        );
    }
}

#[cfg(feature = "maxim-spo2")]
#[derive(Debug, Default)]
pub struct MaximEstimator;

#[cfg(feature = "maxim-spo2")]
impl Spo2Estimator for MaximEstimator {
    fn estimate(&mut self, ir: &Window, red: &Window) -> Estimate {
        // The C signature takes mutable buffers; hand it scratch copies.
        let mut ir = *ir;
        let mut red = *red;
        let (mut spo2, mut hr) = (0i32, 0i32);
        let (mut spo2_valid, mut hr_valid) = (0i8, 0i8);

        // SAFETY: all pointers refer to live locals of the stated length, and
        // the routine keeps no references past the call.
        unsafe {
            ffi::maxim_heart_rate_and_oxygen_saturation(
                ir.as_mut_ptr(),
                SAMPLE_WINDOW as i32,
                red.as_mut_ptr(),
                &mut spo2,
                &mut spo2_valid,
                &mut hr,
                &mut hr_valid,
            );
        }

        Estimate {
            spo2,
            spo2_valid: spo2_valid != 0,
            heart_rate: hr,
            heart_rate_valid: hr_valid != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    /// Returns a canned estimate and counts calls.
    struct Canned {
        est: Estimate,
        calls: usize,
    }

    impl Spo2Estimator for Canned {
        fn estimate(&mut self, _ir: &Window, _red: &Window) -> Estimate {
            self.calls += 1;
            self.est
        }
    }

    fn canned(heart_rate: i32, heart_rate_valid: bool, spo2: i32, spo2_valid: bool) -> Canned {
        Canned {
            est: Estimate { spo2, spo2_valid, heart_rate, heart_rate_valid },
            calls: 0,
        }
    }

    fn with_finger(heart_rate: u8, spo2: u8) -> VitalSigns {
        VitalSigns { heart_rate, spo2, finger: true, ..Default::default() }
    }

    const FLAT: Window = [60_000; SAMPLE_WINDOW];

    #[test]
    fn accepts_valid_in_range_values() {
        let mut v = with_finger(0, 0);
        apply_window(&mut v, &mut canned(72, true, 97, true), &FLAT, &FLAT);
        assert_eq!((v.heart_rate, v.spo2), (72, 97));
    }

    #[test]
    fn out_of_range_heart_rate_keeps_previous() {
        let mut v = with_finger(80, 96);
        apply_window(&mut v, &mut canned(205, true, 97, true), &FLAT, &FLAT);
        assert_eq!(v.heart_rate, 80);
        assert_eq!(v.spo2, 97);

        apply_window(&mut v, &mut canned(200, true, 97, true), &FLAT, &FLAT);
        assert_eq!(v.heart_rate, 80);
        apply_window(&mut v, &mut canned(0, true, 97, true), &FLAT, &FLAT);
        assert_eq!(v.heart_rate, 80);
    }

    #[test]
    fn spo2_bounds_and_validity_flags() {
        let mut v = with_finger(70, 95);
        apply_window(&mut v, &mut canned(70, true, 101, true), &FLAT, &FLAT);
        assert_eq!(v.spo2, 95);
        apply_window(&mut v, &mut canned(70, true, 100, true), &FLAT, &FLAT);
        assert_eq!(v.spo2, 100);
        apply_window(&mut v, &mut canned(90, false, 92, false), &FLAT, &FLAT);
        assert_eq!((v.heart_rate, v.spo2), (70, 100));
    }

    #[test]
    fn no_finger_resets_and_skips_estimator() {
        let mut v = VitalSigns { heart_rate: 75, spo2: 98, finger: false, ..Default::default() };
        let mut est = canned(72, true, 97, true);
        apply_window(&mut v, &mut est, &FLAT, &FLAT);
        assert_eq!((v.heart_rate, v.spo2), (0, 0));
        assert_eq!(est.calls, 0);
    }

    /// Pulse sampled the way the MAX30102 delivers it: 100 Hz averaged by 4.
    fn synthetic(dc: f32, amplitude: f32, hz: f32, phase: f32) -> Window {
        let fs = f32::from(SENSOR_SAMPLE_RATE_HZ) / f32::from(SENSOR_SAMPLE_AVERAGE);
        let mut w = [0u32; SAMPLE_WINDOW];
        for (i, slot) in w.iter_mut().enumerate() {
            let t = i as f32 / fs;
            *slot = (dc + amplitude * (TAU * hz * t + phase).sin()) as u32;
        }
        w
    }

    #[test]
    fn window_rate_matches_chip_output() {
        assert_eq!(WINDOW_SAMPLE_RATE_HZ, 25.0);
    }

    #[test]
    fn ratio_estimator_tracks_synthetic_pulse() {
        let ir = synthetic(100_000.0, 2000.0, 1.2, 0.0);
        let red = synthetic(80_000.0, 800.0, 1.2, 0.0);
        let est = RatioEstimator.estimate(&ir, &red);

        assert!(est.heart_rate_valid);
        assert!((65..=80).contains(&est.heart_rate), "hr {}", est.heart_rate);
        assert!(est.spo2_valid);
        assert!((96..=99).contains(&est.spo2), "spo2 {}", est.spo2);
    }

    #[test]
    fn heart_rate_holds_across_pulse_phase() {
        for (bpm, lo, hi) in [(72.0f32, 62, 80), (90.0, 85, 95), (120.0, 112, 128)] {
            for step in 0..12 {
                let phase = step as f32 * 0.5;
                let ir = synthetic(100_000.0, 2000.0, bpm / 60.0, phase);
                let red = synthetic(80_000.0, 800.0, bpm / 60.0, phase);
                let est = RatioEstimator.estimate(&ir, &red);
                assert!(est.heart_rate_valid, "{bpm} bpm, phase {phase}");
                assert!(
                    (lo..=hi).contains(&est.heart_rate),
                    "{bpm} bpm, phase {phase}: hr {}",
                    est.heart_rate
                );
            }
        }
    }

    #[test]
    fn ratio_estimator_rejects_flat_signal() {
        let est = RatioEstimator.estimate(&FLAT, &FLAT);
        assert!(!est.heart_rate_valid);
        assert!(!est.spo2_valid);
    }
}
