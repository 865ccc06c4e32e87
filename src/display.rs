// PulseMon — Screen Renderer
//
// Layout (240 × 320, portrait):
//
//   y   0 ┌──────────────── header (blue) ─────────── 87% ┐
//   y  20 ├──────────────── alert banner ─────────────────┤
//   y  30 │ ┌ HR ─────────┐      ┌ SpO2 ───────┐          │
//         │ │     72      │      │     98      │          │
//   y  90 │ └─────────────┘      └─────────────┘          │
//   y  95 │ OK / Finger                                    │
//
// Every redraw clears only the region it owns, so the main screen is drawn
// once and then patched at the display rate.

use core::fmt::Write;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use heapless::String;

use crate::alerts::{Alert, Severity};
use crate::config::*;
use crate::vitals::VitalSigns;

// ---------------------------------------------------------------------------
// Palette & fonts
// ---------------------------------------------------------------------------
pub const ORANGE: Rgb565 = Rgb565::new(31, 41, 0);
pub const HEADER_BG: Rgb565 = Rgb565::BLUE;

const SMALL: &MonoFont<'static> = &FONT_6X10;
const LARGE: &MonoFont<'static> = &FONT_10X20;

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------
pub const HEADER: Rectangle = rect(0, 0, SCREEN_WIDTH, 20);
pub const BANNER: Rectangle = rect(0, 20, SCREEN_WIDTH, 10);
pub const HR_BOX: Rectangle = rect(10, 30, 100, 60);
pub const SPO2_BOX: Rectangle = rect(130, 30, 100, 60);
pub const HR_VALUE: Rectangle = rect(15, 50, 90, 30);
pub const SPO2_VALUE: Rectangle = rect(135, 50, 90, 30);
pub const FINGER_STATUS: Rectangle = rect(15, 95, 100, 10);
pub const BATTERY: Rectangle = rect(200, 10, 40, 10);

const fn rect(x: i32, y: i32, w: u32, h: u32) -> Rectangle {
    Rectangle::new(Point::new(x, y), Size::new(w, h))
}

/// Banner colour for a severity.
pub fn severity_color(severity: Severity) -> Rgb565 {
    match severity {
        Severity::Critical => Rgb565::RED,
        Severity::Warning => ORANGE,
        Severity::Info => Rgb565::YELLOW,
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------
pub struct Renderer<D> {
    display: D,
    banner_drawn_ms: Option<u32>,
}

impl<D> Renderer<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(display: D) -> Self {
        Self { display, banner_drawn_ms: None }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Boot splash: centred product name plus the usage disclaimer.
    pub fn splash(&mut self) -> Result<(), D::Error> {
        self.display.clear(Rgb565::BLACK)?;
        self.centered("Monitor", 60, Rgb565::WHITE)?;
        self.text("Med Use", Point::new(10, 200), SMALL, Rgb565::WHITE)
    }

    /// Full-screen error with a red centred title.
    pub fn error_screen(&mut self, title: &str, message: &str) -> Result<(), D::Error> {
        self.display.clear(Rgb565::BLACK)?;
        self.centered(title, 60, Rgb565::RED)?;
        self.text(message, Point::new(10, 100), SMALL, Rgb565::WHITE)
    }

    /// Static chrome of the main screen followed by a full vitals redraw.
    pub fn main_screen(&mut self, vitals: &VitalSigns) -> Result<(), D::Error> {
        self.banner_drawn_ms = None;
        self.display.clear(Rgb565::BLACK)?;
        self.fill(HEADER, HEADER_BG)?;
        self.text("Monitor", Point::new(10, 5), SMALL, Rgb565::WHITE)?;

        let outline = PrimitiveStyle::with_stroke(Rgb565::WHITE, 1);
        HR_BOX.into_styled(outline).draw(&mut self.display)?;
        self.text("HR", Point::new(15, 35), SMALL, Rgb565::WHITE)?;
        SPO2_BOX.into_styled(outline).draw(&mut self.display)?;
        self.text("SpO2", Point::new(135, 35), SMALL, Rgb565::WHITE)?;

        self.vitals(vitals)?;
        self.battery(vitals.battery)
    }

    /// Heart rate, SpO2 and finger status.  `--` stands in for unknown values.
    pub fn vitals(&mut self, vitals: &VitalSigns) -> Result<(), D::Error> {
        self.fill(HR_VALUE, Rgb565::BLACK)?;
        let hr = value_text(vitals.known_heart_rate());
        self.text(&hr, Point::new(20, 55), LARGE, Rgb565::RED)?;

        self.fill(SPO2_VALUE, Rgb565::BLACK)?;
        let spo2 = value_text(vitals.known_spo2());
        self.text(&spo2, Point::new(140, 55), LARGE, Rgb565::BLUE)?;

        self.fill(FINGER_STATUS, Rgb565::BLACK)?;
        let (label, color) = if vitals.finger {
            ("OK", Rgb565::GREEN)
        } else {
            ("Finger", Rgb565::RED)
        };
        self.text(label, FINGER_STATUS.top_left, SMALL, color)
    }

    /// Battery percentage in the header, red at or below the warning level.
    pub fn battery(&mut self, percent: u8) -> Result<(), D::Error> {
        let mut buf: String<8> = String::new();
        let _ = write!(buf, "{percent}%");
        let color = if percent > BATTERY_WARN {
            Rgb565::GREEN
        } else {
            Rgb565::RED
        };
        self.fill(BATTERY, HEADER_BG)?;
        self.text(&buf, BATTERY.top_left, SMALL, color)
    }

    /// Coloured alert strip under the header.  Restarts the banner timer.
    pub fn banner(&mut self, alert: &Alert, now: u32) -> Result<(), D::Error> {
        self.fill(BANNER, severity_color(alert.severity))?;
        self.text(&alert.message, Point::new(5, 20), SMALL, Rgb565::BLACK)?;
        self.banner_drawn_ms = Some(now);
        Ok(())
    }

    /// Clear the banner once it has been up for `BANNER_TIMEOUT_MS` without
    /// being redrawn.  Returns whether it was cleared.
    pub fn expire_banner(&mut self, now: u32) -> Result<bool, D::Error> {
        match self.banner_drawn_ms {
            Some(drawn) if now.wrapping_sub(drawn) >= BANNER_TIMEOUT_MS => {
                self.fill(BANNER, Rgb565::BLACK)?;
                self.banner_drawn_ms = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn banner_visible(&self) -> bool {
        self.banner_drawn_ms.is_some()
    }

    // -----------------------------------------------------------------------
    // Primitives
    // -----------------------------------------------------------------------

    fn fill(&mut self, area: Rectangle, color: Rgb565) -> Result<(), D::Error> {
        self.display.fill_solid(&area, color)
    }

    fn text(
        &mut self,
        s: &str,
        at: Point,
        font: &MonoFont<'_>,
        color: Rgb565,
    ) -> Result<(), D::Error> {
        Text::with_baseline(s, at, MonoTextStyle::new(font, color), Baseline::Top)
            .draw(&mut self.display)?;
        Ok(())
    }

    /// Draw `s` horizontally centred on the screen at row `y`.
    fn centered(&mut self, s: &str, y: i32, color: Rgb565) -> Result<(), D::Error> {
        let style = MonoTextStyle::new(SMALL, color);
        let width = Text::with_baseline(s, Point::zero(), style, Baseline::Top)
            .bounding_box()
            .size
            .width;
        let x = (SCREEN_WIDTH.saturating_sub(width) / 2) as i32;
        self.text(s, Point::new(x, y), SMALL, color)
    }
}

fn value_text(value: Option<u8>) -> String<8> {
    let mut buf = String::new();
    match value {
        Some(v) => {
            let _ = write!(buf, "{v}");
        }
        None => {
            let _ = buf.push_str("--");
        }
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Framebuffer;

    fn renderer() -> Renderer<Framebuffer> {
        Renderer::new(Framebuffer::new())
    }

    #[test]
    fn main_screen_draws_chrome() {
        let mut r = renderer();
        r.main_screen(&VitalSigns::default()).unwrap();
        let fb = r.display();
        assert_eq!(fb.pixel(1, 1), HEADER_BG);
        // Box outlines.
        assert_eq!(fb.pixel(10, 30), Rgb565::WHITE);
        assert_eq!(fb.pixel(229, 89), Rgb565::WHITE);
    }

    #[test]
    fn unknown_values_show_placeholder() {
        let mut r = renderer();
        let v = VitalSigns { heart_rate: 72, spo2: 0, finger: true, ..Default::default() };
        r.vitals(&v).unwrap();
        let fb = r.display();
        assert!(fb.count_in(HR_VALUE, Rgb565::RED) > 0);
        assert!(fb.count_in(SPO2_VALUE, Rgb565::BLUE) > 0);
        assert!(fb.count_in(FINGER_STATUS, Rgb565::GREEN) > 0);

        assert_eq!(value_text(None).as_str(), "--");
        assert_eq!(value_text(Some(72)).as_str(), "72");
    }

    #[test]
    fn finger_absent_is_red() {
        let mut r = renderer();
        r.vitals(&VitalSigns::default()).unwrap();
        let fb = r.display();
        assert!(fb.count_in(FINGER_STATUS, Rgb565::RED) > 0);
        assert_eq!(fb.count_in(FINGER_STATUS, Rgb565::GREEN), 0);
    }

    #[test]
    fn battery_color_threshold() {
        let mut r = renderer();
        r.battery(21).unwrap();
        assert!(r.display().count_in(BATTERY, Rgb565::GREEN) > 0);

        r.battery(20).unwrap();
        assert_eq!(r.display().count_in(BATTERY, Rgb565::GREEN), 0);
        assert!(r.display().count_in(BATTERY, Rgb565::RED) > 0);
    }

    #[test]
    fn battery_sits_in_lower_half_of_header() {
        let mut r = renderer();
        r.main_screen(&VitalSigns { battery: 88, ..Default::default() }).unwrap();
        let fb = r.display();
        assert_eq!(BATTERY.top_left, Point::new(200, 10));
        assert_eq!(fb.count_in(rect(200, 0, 40, 10), HEADER_BG), 400);
        assert!(fb.count_in(BATTERY, Rgb565::GREEN) > 0);
        assert_eq!(fb.count_in(BANNER, Rgb565::GREEN), 0);
    }

    #[test]
    fn vitals_redraw_touches_only_value_regions() {
        let mut r = renderer();
        r.main_screen(&VitalSigns::default()).unwrap();
        let full = r.display().writes;

        let before = r.display().writes;
        r.vitals(&VitalSigns { heart_rate: 72, spo2: 98, finger: true, ..Default::default() })
            .unwrap();
        let written = r.display().writes - before;

        let regions: usize = [HR_VALUE, SPO2_VALUE, FINGER_STATUS]
            .iter()
            .map(|a| (a.size.width * a.size.height) as usize)
            .sum();
        // Region fills plus glyph pixels, nothing else.
        assert!(written > regions);
        assert!(written < 2 * regions);
        assert!(written * 10 < full);
        // Box chrome survives.
        assert_eq!(r.display().pixel(10, 30), Rgb565::WHITE);
        assert_eq!(r.display().pixel(1, 1), HEADER_BG);
    }

    #[test]
    fn banner_clears_after_timeout() {
        let mut r = renderer();
        let alert = Alert::new(Severity::Warning, "SpO2:93", 1000);
        r.banner(&alert, 1000).unwrap();
        assert_eq!(r.display().pixel(200, 25), ORANGE);

        assert!(!r.expire_banner(5999).unwrap());
        assert!(r.banner_visible());

        // A newer alert restarts the timer.
        let newer = Alert::new(Severity::Critical, "HR:130", 4000);
        r.banner(&newer, 4000).unwrap();
        assert!(!r.expire_banner(8999).unwrap());
        assert_eq!(r.display().pixel(200, 25), Rgb565::RED);

        assert!(r.expire_banner(9000).unwrap());
        assert_eq!(r.display().pixel(200, 25), Rgb565::BLACK);
        assert!(!r.banner_visible());
    }

    #[test]
    fn error_screen_title_is_centred() {
        let mut r = renderer();
        r.error_screen("Err", "Sensor Fail").unwrap();
        let fb = r.display();
        let row = rect(0, 60, SCREEN_WIDTH, 10);
        let red = fb.count_in(row, Rgb565::RED);
        assert!(red > 0);
        // Three 6-px glyphs centred: nothing red near the left edge.
        assert_eq!(fb.count_in(rect(0, 60, 100, 10), Rgb565::RED), 0);
    }
}
