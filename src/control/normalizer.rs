//! Pure stick-to-command math
//!
//! Converts raw 2-axis input into either a polar heading+speed pair for the
//! stabilized drive mode or a left/right differential power pair for FPV
//! mode. Deterministic, stateless, and the most heavily tested code in the
//! crate.

/// Converts stick x/y into `(distance, angle)` with 0° pointing "up".
///
/// Returns `(0.0, None)` for a neutral stick; a `None` angle means "keep the
/// last commanded heading". The swapped-argument `atan2(x, y)` is what makes
/// (0, 1) map to 0° and positive x rotate clockwise. This axis convention
/// defines "forward" and must not change.
pub fn to_polar(x: f32, y: f32) -> (f32, Option<f32>) {
    let distance = (x * x + y * y).sqrt();
    if distance == 0.0 {
        return (0.0, None);
    }

    let angle_deg = x.atan2(y).to_degrees().rem_euclid(360.0);
    (distance, Some(angle_deg))
}

/// Standard differential-drive mix: left = y+x, right = y-x, each clamped to
/// [-1, 1] and scaled by `speed_scale`, truncated toward zero.
///
/// Each call is an independent snapshot; no smoothing or ramping is applied.
pub fn to_differential(x: f32, y: f32, speed_scale: u8) -> (i16, i16) {
    let scale = speed_scale as f32;
    let left = ((y + x).clamp(-1.0, 1.0) * scale) as i16;
    let right = ((y - x).clamp(-1.0, 1.0) * scale) as i16;
    (left, right)
}

/// Suppresses analog noise around neutral: |value| below `deadzone` becomes
/// exactly 0.0, everything else passes through unchanged.
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        value
    }
}
