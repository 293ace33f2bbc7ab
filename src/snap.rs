//! Sticky-snap for clock-speed sliders
//!
//! Runs on raw slider input before anything reaches the calculator.

use crate::constants::{MAX_CLOCK_SPEED, MIN_CLOCK_SPEED, SnapSettings};

/// Snap to the nearest sticky value within the threshold, then clamp to 0-250%
pub fn sticky_snap(raw: f64, settings: &SnapSettings) -> f64 {
    if raw.is_nan() {
        return MIN_CLOCK_SPEED;
    }

    let mut nearest: Option<(f64, f64)> = None;
    for &sticky in &settings.sticky_values {
        let distance = (raw - sticky).abs();
        if distance > settings.threshold {
            continue;
        }
        // Ties keep the earlier value
        if nearest.is_none_or(|(_, best)| distance < best) {
            nearest = Some((sticky, distance));
        }
    }

    let snapped = nearest.map_or(raw, |(sticky, _)| sticky);
    snapped.clamp(MIN_CLOCK_SPEED, MAX_CLOCK_SPEED)
}
