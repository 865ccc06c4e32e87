// PulseMon — Alert Engine
//
// Threshold checks for heart rate, SpO2 and battery run once per alert tick.
// A single cooldown gates all three: a violation within 5 s of the previous
// trigger is dropped outright (not queued, not logged).
//
// Two bounded collections:
//   - Active alerts (3): live until acknowledged or 30 s old.  A 4th
//     concurrent alert is silently not admitted.
//   - Alert log (3): arrival order, the oldest entry is evicted to make room.

use core::fmt::{self, Write};

use heapless::{Deque, String, Vec};

use crate::config::*;
use crate::hal::Board;
use crate::vitals::VitalSigns;

// ---------------------------------------------------------------------------
// Alert records
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

pub type AlertMessage = String<ALERT_MESSAGE_LEN>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub severity: Severity,
    pub message: AlertMessage,
    pub created_ms: u32,
    pub acknowledged: bool,
}

impl Alert {
    pub fn new(severity: Severity, message: &str, created_ms: u32) -> Self {
        Self {
            severity,
            message: bounded_message(format_args!("{message}")),
            created_ms,
            acknowledged: false,
        }
    }

    pub fn age_ms(&self, now: u32) -> u32 {
        now.wrapping_sub(self.created_ms)
    }
}

/// Format into an `AlertMessage`, dropping whatever does not fit.
pub fn bounded_message(args: fmt::Arguments<'_>) -> AlertMessage {
    struct Truncate(AlertMessage);

    impl Write for Truncate {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for c in s.chars() {
                if self.0.push(c).is_err() {
                    break;
                }
            }
            Ok(())
        }
    }

    let mut out = Truncate(String::new());
    let _ = out.write_fmt(args);
    out.0
}

// ---------------------------------------------------------------------------
// Active alerts
// ---------------------------------------------------------------------------
#[derive(Debug, Default)]
pub struct ActiveAlerts {
    alerts: Vec<Alert, MAX_ACTIVE_ALERTS>,
}

impl ActiveAlerts {
    pub const fn new() -> Self {
        Self { alerts: Vec::new() }
    }

    /// Admit `alert` unless already at capacity.  Returns whether it was kept.
    pub fn insert(&mut self, alert: Alert) -> bool {
        self.alerts.push(alert).is_ok()
    }

    pub fn acknowledge(&mut self, index: usize) -> bool {
        match self.alerts.get_mut(index) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    pub fn acknowledge_all(&mut self) {
        for alert in self.alerts.iter_mut() {
            alert.acknowledged = true;
        }
    }

    /// Drop acknowledged and expired entries, keeping the rest in order.
    pub fn sweep(&mut self, now: u32) {
        self.alerts
            .retain(|a| !a.acknowledged && a.age_ms(now) <= ALERT_EXPIRY_MS);
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }
}

// ---------------------------------------------------------------------------
// Alert log
// ---------------------------------------------------------------------------
#[derive(Debug, Default)]
pub struct AlertLog {
    entries: Deque<Alert, MAX_ALERT_LOG>,
}

impl AlertLog {
    pub const fn new() -> Self {
        Self { entries: Deque::new() }
    }

    /// Append, evicting the oldest entry when full.
    pub fn push(&mut self, alert: Alert) {
        if self.entries.is_full() {
            self.entries.pop_front();
        }
        let _ = self.entries.push_back(alert);
    }

    /// Memory-pressure trim: drop the oldest entry but never the last one.
    pub fn trim_oldest(&mut self) -> Option<Alert> {
        if self.entries.len() > 1 {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// Receives every alert that makes it past the cooldown.
pub trait Notifier {
    fn notify(&mut self, alert: &Alert);
}

/// Buzzer on/off timing for a severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuzzerPattern {
    pub pulses: u8,
    pub on_ms: u32,
    pub gap_ms: u32,
}

impl BuzzerPattern {
    pub const fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Critical => Self { pulses: 3, on_ms: 100, gap_ms: 100 },
            Severity::Warning => Self { pulses: 2, on_ms: 200, gap_ms: 100 },
            Severity::Info => Self { pulses: 1, on_ms: 200, gap_ms: 100 },
        }
    }

    /// Total time the loop is stalled while the pattern plays.
    pub const fn duration_ms(&self) -> u32 {
        self.pulses as u32 * self.on_ms + (self.pulses as u32).saturating_sub(1) * self.gap_ms
    }

    /// Play the pattern.  Blocks the calling thread for `duration_ms()`.
    pub fn play<B: Board>(&self, board: &mut B) {
        for i in 0..self.pulses {
            board.set_buzzer(true);
            board.delay_ms(self.on_ms);
            board.set_buzzer(false);
            if i + 1 < self.pulses {
                board.delay_ms(self.gap_ms);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------
#[derive(Debug, Default)]
pub struct AlertEngine {
    pub active: ActiveAlerts,
    pub log: AlertLog,
    last_trigger_ms: u32,
}

impl AlertEngine {
    pub const fn new() -> Self {
        Self {
            active: ActiveAlerts::new(),
            log: AlertLog::new(),
            last_trigger_ms: 0,
        }
    }

    /// Run all threshold checks, then sweep expired active alerts.
    pub fn evaluate<N: Notifier>(&mut self, vitals: &VitalSigns, now: u32, notifier: &mut N) {
        if let Some((severity, hr)) = heart_rate_violation(vitals) {
            self.trigger(severity, bounded_message(format_args!("HR:{hr}")), now, notifier);
        }
        if let Some((severity, spo2)) = spo2_violation(vitals) {
            self.trigger(severity, bounded_message(format_args!("SpO2:{spo2}")), now, notifier);
        }
        if let Some(severity) = battery_violation(vitals.battery) {
            let msg = bounded_message(format_args!("Bat:{}", vitals.battery));
            self.trigger(severity, msg, now, notifier);
        }
        self.active.sweep(now);
    }

    /// Raise an alert unless the shared cooldown is still running.
    /// Returns `true` if the alert was triggered.
    pub fn trigger<N: Notifier>(
        &mut self,
        severity: Severity,
        message: AlertMessage,
        now: u32,
        notifier: &mut N,
    ) -> bool {
        if now.wrapping_sub(self.last_trigger_ms) < ALERT_COOLDOWN_MS {
            log::debug!("Alert '{}' suppressed by cooldown", message);
            return false;
        }

        let alert = Alert {
            severity,
            message,
            created_ms: now,
            acknowledged: false,
        };

        if !self.active.insert(alert.clone()) {
            log::debug!("Active alerts full — '{}' not tracked", alert.message);
        }
        self.log.push(alert.clone());
        self.last_trigger_ms = now;

        match severity {
            Severity::Critical => log::warn!("CRITICAL alert: {}", alert.message),
            _ => log::info!("{:?} alert: {}", severity, alert.message),
        }

        notifier.notify(&alert);
        true
    }
}

pub fn heart_rate_violation(vitals: &VitalSigns) -> Option<(Severity, u8)> {
    let hr = vitals.known_heart_rate()?;
    if (HR_LOW_WARN..=HR_HIGH_WARN).contains(&hr) {
        return None;
    }
    let severity = if hr < HR_LOW_CRIT || hr > HR_HIGH_CRIT {
        Severity::Critical
    } else {
        Severity::Warning
    };
    Some((severity, hr))
}

pub fn spo2_violation(vitals: &VitalSigns) -> Option<(Severity, u8)> {
    let spo2 = vitals.known_spo2()?;
    if spo2 >= SPO2_WARN {
        return None;
    }
    let severity = if spo2 < SPO2_CRIT {
        Severity::Critical
    } else {
        Severity::Warning
    };
    Some((severity, spo2))
}

pub fn battery_violation(battery: u8) -> Option<Severity> {
    if battery >= BATTERY_WARN {
        None
    } else if battery < BATTERY_CRIT {
        Some(Severity::Critical)
    } else {
        Some(Severity::Warning)
    }
}
