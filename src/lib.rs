// PulseMon — Pulse Oximeter Monitoring Core
//
// Hardware-independent part of the firmware: sample windowing, estimation
// policy, alerting, screen rendering and the cooperative main loop.  The
// binary wires these to ESP-IDF drivers; the unit tests run on the host.

pub mod alerts;
pub mod buffer;
pub mod config;
pub mod display;
pub mod estimator;
pub mod hal;
pub mod monitor;
pub mod touch;
pub mod vitals;

#[cfg(test)]
mod testutil;

pub use monitor::{halt, Monitor};
