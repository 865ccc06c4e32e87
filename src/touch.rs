// PulseMon — Touch Input
//
// Detection only: a touch is mapped into screen space and logged, then the
// loop is held for the debounce period.  Nothing on screen reacts to touch
// yet, so the 200 ms stall buys nothing beyond debouncing.

use embedded_graphics::prelude::Point;

use crate::config::*;
use crate::hal::{Board, RawPoint};

/// Integer linear re-map of `value` from one range to another (unclamped).
pub fn map_range(value: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Raw controller coordinates → screen pixels.
pub fn to_screen(raw: RawPoint) -> Point {
    Point::new(
        map_range(i32::from(raw.x), TOUCH_RAW_X_MIN, TOUCH_RAW_X_MAX, 0, SCREEN_WIDTH as i32),
        map_range(i32::from(raw.y), TOUCH_RAW_Y_MIN, TOUCH_RAW_Y_MAX, 0, SCREEN_HEIGHT as i32),
    )
}

/// Poll once.  On a touch, map it, then block for `TOUCH_DEBOUNCE_MS`.
pub fn poll<B: Board>(board: &mut B) -> Option<Point> {
    let raw = board.poll_touch()?;
    let point = to_screen(raw);
    log::debug!("Touch raw=({}, {}) screen=({}, {})", raw.x, raw.y, point.x, point.y);
    board.delay_ms(TOUCH_DEBOUNCE_MS);
    Some(point)
}
