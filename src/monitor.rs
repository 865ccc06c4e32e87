// PulseMon — Cooperative Monitoring Loop
//
// One thread, no preemption.  Each iteration:
//   1. poll touch (every iteration, 200 ms stall on a touch)
//   2. sensor update   every 100 ms (drains every sample the sensor holds)
//   3. display update  every 100 ms
//   4. alert check     every 1000 ms (a triggered alert stalls for its buzzer
//                      pattern, up to 500 ms)
//   5. memory check    every 30 s
//   6. idle 10 ms
//
// The blocking buzzer and touch debounce delay everything else.  Samples
// wait in the sensor FIFO (32 deep, 1.28 s at 25 Hz) meanwhile, so a stall
// delays a window but does not tear it.

use core::fmt::Debug;

use anyhow::Context;
use embedded_graphics::{pixelcolor::Rgb565, prelude::DrawTarget};

use crate::alerts::{Alert, AlertEngine, BuzzerPattern, Notifier};
use crate::buffer::{finger_present, Fill, SampleBuffer};
use crate::config::*;
use crate::display::Renderer;
use crate::estimator::{apply_window, Spo2Estimator};
use crate::hal::{Board, PulseSensor};
use crate::touch;
use crate::vitals::{battery_percent, VitalSigns};

/// Last fire time of each periodic job.
#[derive(Debug, Default, Clone, Copy)]
pub struct Timers {
    pub sensor: u32,
    pub display: u32,
    pub alert: u32,
    pub memory: u32,
}

/// `true` once `interval` ms have passed since `last` (wrap-safe).
pub fn due(now: u32, last: u32, interval: u32) -> bool {
    now.wrapping_sub(last) >= interval
}

/// Everything the tick handlers mutate.
#[derive(Debug, Default)]
pub struct AppState {
    pub vitals: VitalSigns,
    pub buffer: SampleBuffer,
    pub alerts: AlertEngine,
    pub timers: Timers,
}

/// Buzzer + banner for alerts that pass the cooldown.
struct Annunciator<'a, B, D> {
    board: &'a mut B,
    renderer: &'a mut Renderer<D>,
}

impl<B, D> Notifier for Annunciator<'_, B, D>
where
    B: Board,
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
{
    fn notify(&mut self, alert: &Alert) {
        BuzzerPattern::for_severity(alert.severity).play(&mut *self.board);
        let now = self.board.now_ms();
        report(self.renderer.banner(alert, now), "alert banner");
    }
}

fn report<E: Debug>(result: Result<(), E>, what: &str) {
    if let Err(e) = result {
        log::error!("Display error ({}): {:?}", what, e);
    }
}

pub struct Monitor<B, D, S, E> {
    board: B,
    renderer: Renderer<D>,
    sensor: Option<S>,
    estimator: E,
    state: AppState,
}

impl<B, D, S, E> Monitor<B, D, S, E>
where
    B: Board,
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
    S: PulseSensor,
    E: Spo2Estimator,
{
    /// Boot sequence: buzzer off, display (fatal on failure), splash, sensor
    /// (degraded on failure), main screen.
    pub fn boot(mut board: B, display: anyhow::Result<D>, mut sensor: S, estimator: E) -> anyhow::Result<Self> {
        board.set_buzzer(false);

        let display = display.context("display initialisation failed")?;
        let mut renderer = Renderer::new(display);

        report(renderer.splash(), "splash");
        board.delay_ms(SPLASH_DISPLAY_MS);

        let sensor = match sensor.init() {
            Ok(()) => {
                log::info!("Pulse sensor ready");
                Some(sensor)
            }
            Err(e) => {
                log::error!("Pulse sensor init failed: {:#} — continuing without it", e);
                report(renderer.error_screen("Err", "Sensor Fail"), "error screen");
                board.delay_ms(SENSOR_ERROR_DISPLAY_MS);
                None
            }
        };

        let state = AppState::default();
        report(renderer.main_screen(&state.vitals), "main screen");
        log::info!("Boot complete — entering monitoring loop");

        Ok(Self {
            board,
            renderer,
            sensor,
            estimator,
            state,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn renderer(&self) -> &Renderer<D> {
        &self.renderer
    }

    pub fn sensor_present(&self) -> bool {
        self.sensor.is_some()
    }

    /// Mark every live alert acknowledged; the next sweep removes them.
    pub fn acknowledge_alerts(&mut self) {
        self.state.alerts.active.acknowledge_all();
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.tick();
        }
    }

    /// One pass of the main loop.
    pub fn tick(&mut self) {
        let now = self.board.now_ms();

        touch::poll(&mut self.board);

        if due(now, self.state.timers.sensor, SENSOR_INTERVAL_MS) {
            self.state.timers.sensor = now;
            self.update_sensors();
        }

        if due(now, self.state.timers.display, DISPLAY_INTERVAL_MS) {
            self.state.timers.display = now;
            self.update_display();
        }

        if due(now, self.state.timers.alert, ALERT_INTERVAL_MS) {
            self.state.timers.alert = now;
            self.check_alerts();
        }

        self.check_memory();
        self.board.delay_ms(LOOP_IDLE_MS);
    }

    fn update_sensors(&mut self) {
        self.state.vitals.battery = battery_percent(self.board.battery_raw());
        self.state.vitals.updated_ms = self.board.now_ms();

        // The chip produces 2-3 samples per tick; take the whole backlog so
        // each window holds consecutive samples.
        for _ in 0..MAX_SAMPLES_PER_TICK {
            if !self.process_sample() {
                break;
            }
        }
    }

    /// Feed one pending sample through finger detection and the window.
    /// `false` when the sensor had nothing ready.
    fn process_sample(&mut self) -> bool {
        let Some(sensor) = self.sensor.as_mut() else {
            return false;
        };
        if !sensor.available() {
            return false;
        }
        if sensor.take_overflow() {
            log::warn!("Pulse sensor FIFO overrun, restarting window at slot {}", self.state.buffer.cursor());
            self.state.buffer.restart();
        }

        let red = sensor.red();
        let ir = sensor.ir();
        let vitals = &mut self.state.vitals;
        vitals.finger = finger_present(ir);

        if let Fill::Full { ir, red } = self.state.buffer.record(ir, red) {
            apply_window(vitals, &mut self.estimator, ir, red);
            log::debug!(
                "Window complete: finger={} hr={} spo2={}",
                vitals.finger,
                vitals.heart_rate,
                vitals.spo2
            );
        }

        sensor.next_sample();
        true
    }

    fn update_display(&mut self) {
        let vitals = self.state.vitals;
        report(self.renderer.vitals(&vitals), "vitals");
        report(self.renderer.battery(vitals.battery), "battery");

        let now = self.board.now_ms();
        if let Err(e) = self.renderer.expire_banner(now) {
            log::error!("Display error (banner clear): {:?}", e);
        }
    }

    fn check_alerts(&mut self) {
        let now = self.board.now_ms();
        let mut annunciator = Annunciator {
            board: &mut self.board,
            renderer: &mut self.renderer,
        };
        self.state
            .alerts
            .evaluate(&self.state.vitals, now, &mut annunciator);
    }

    /// Under memory pressure, give back the oldest log entry.
    fn check_memory(&mut self) {
        let now = self.board.now_ms();
        if now.wrapping_sub(self.state.timers.memory) <= MEMORY_CHECK_INTERVAL_MS {
            return;
        }
        self.state.timers.memory = now;

        let free = self.board.free_memory();
        if free < LOW_MEMORY_BYTES {
            if let Some(dropped) = self.state.alerts.log.trim_oldest() {
                log::warn!("Low memory ({} B free) — dropped log entry '{}'", free, dropped.message);
            }
        }
    }
}

/// Permanent idle after a fatal boot error.  Nothing else ever runs; `delay`
/// only keeps the idle task fed.
pub fn halt(mut delay: impl FnMut(u32)) -> ! {
    log::error!("Fatal error — halting");
    loop {
        delay(HALT_POLL_MS);
    }
}
