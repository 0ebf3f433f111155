//! Pixel/time conversion, FPS-grid quantisation, and ruler formatting.
//!
//! All timeline times are seconds (f64), all view positions are pixels.
//! The conversion constant is `pixels_per_second = tick_pixels / scale`
//! where `scale` is seconds-per-tick. Every function here is total:
//! non-finite input is replaced by a fallback at the boundary so NaN
//! never reaches a stored position or a scene offset.

use crate::types::Rational;

/// Canvas widths are clamped to this to stay under renderer limits.
pub const MAX_CANVAS_WIDTH: f64 = 32_767.0;

/// Replace a non-finite value with a fallback.
///
/// Host input and intermediate math are untrusted; this is the single
/// boundary through which every external numeric passes.
pub fn to_finite(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Pixels per second for a given tick width and scale (seconds per tick).
/// Returns 0.0 for degenerate scales; callers treat 0.0 as "no geometry".
pub fn pixels_per_second(tick_pixels: f64, scale: f64) -> f64 {
    if !(scale.is_finite() && scale > 0.0) || !tick_pixels.is_finite() {
        return 0.0;
    }
    tick_pixels / scale
}

/// Convert a pixel offset to seconds.
pub fn pixel_to_time(px: f64, pps: f64) -> f64 {
    if !(pps.is_finite() && pps > 0.0) {
        return 0.0;
    }
    to_finite(px / pps, 0.0)
}

/// Convert seconds to a pixel offset.
pub fn time_to_pixel(seconds: f64, pps: f64) -> f64 {
    to_finite(seconds * pps, 0.0)
}

/// Round a time to the nearest whole frame on the FPS grid.
pub fn snap_to_fps_grid(seconds: f64, fps: Rational) -> f64 {
    if !fps.is_valid() || !seconds.is_finite() {
        return to_finite(seconds, 0.0);
    }
    let frames = (seconds * fps.num as f64 / fps.den as f64).round();
    frames * fps.den as f64 / fps.num as f64
}

/// 1-based preview frame for a time: `round(t·F) + 1`, never below 1.
pub fn preview_frame(seconds: f64, fps: Rational) -> i64 {
    let f = fps.as_f64();
    if f <= 0.0 || !seconds.is_finite() {
        return 1;
    }
    ((seconds * f).round() as i64 + 1).max(1)
}

/// Seconds corresponding to a 1-based frame number.
pub fn time_from_frame(frame: i64, fps: Rational) -> f64 {
    let f = fps.as_f64();
    if f <= 0.0 {
        return 0.0;
    }
    (frame - 1) as f64 / f
}

/// Format a time as `HH:MM:SS,frame` for the ruler readout.
///
/// The frame component is `round(t·F) mod F` (with F rounded for the
/// modulus on fractional rates such as 29.97).
pub fn format_ruler_time(seconds: f64, fps: Rational) -> String {
    let t = to_finite(seconds, 0.0).max(0.0);
    let f = fps.as_f64().max(1.0);
    let fps_int = (f.round() as i64).max(1);
    let frame = (t * f).round() as i64 % fps_int;
    let total = t as i64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{mins:02}:{secs:02},{frame}")
}

/// Clamp a canvas width to the renderer-safe maximum.
pub fn clamp_canvas_width(px: f64) -> f64 {
    to_finite(px, 0.0).clamp(0.0, MAX_CANVAS_WIDTH)
}
