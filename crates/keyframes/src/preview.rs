//! Live keyframe preview during trim/retime gestures.
//!
//! While a clip is being resized, its keyframe icons are repositioned
//! every frame by mapping their source-slice seconds through the active
//! [`KeyframePreview`]. Trims keep project-time positions and only move
//! the visible window; retimes stretch the original window into the
//! display window while the in-point stays pinned.

use cutline_common::Rational;
use cutline_project::{KeyframePreview, PreviewMode};

/// Base tolerance for the inside-window test; the effective tolerance is
/// `max(PREVIEW_EPSILON, 0.5 / F)` (half a frame).
pub const PREVIEW_EPSILON: f64 = 1e-6;

/// Start a trim preview for a slice `[start, end]` (source seconds).
pub fn trim_preview(start: f64, end: f64, pixels_per_second: f64) -> KeyframePreview {
    KeyframePreview {
        mode: PreviewMode::Trim,
        original_start: start,
        original_end: end,
        display_start: start,
        display_end: end,
        projected_start: start,
        projected_end: end,
        pixels_per_second,
    }
}

/// Start a retime preview: the original window is projected into the
/// (initially identical) display window as the user stretches the clip.
pub fn retime_preview(start: f64, end: f64, pixels_per_second: f64) -> KeyframePreview {
    KeyframePreview {
        mode: PreviewMode::Retime,
        ..trim_preview(start, end, pixels_per_second)
    }
}

/// Move the preview's display window to the live slice.
pub fn update_window(preview: &mut KeyframePreview, display_start: f64, display_end: f64) {
    preview.display_start = display_start;
    preview.display_end = display_end.max(display_start);
}

/// Map a keyframe's source-slice seconds through the preview transform.
pub fn mapped_seconds(preview: &KeyframePreview, original_seconds: f64) -> f64 {
    match preview.mode {
        PreviewMode::Trim => original_seconds,
        PreviewMode::Retime => {
            let projected = preview.projected_end - preview.projected_start;
            let display = preview.display_end - preview.display_start;
            if projected <= 0.0 || display <= 0.0 {
                return preview.display_start;
            }
            preview.display_start
                + ((original_seconds - preview.projected_start) / projected) * display
        }
    }
}

/// Whether a mapped position falls inside the display window, with a
/// half-frame tolerance.
pub fn inside_window(preview: &KeyframePreview, mapped: f64, fps: Rational) -> bool {
    let f = fps.as_f64();
    let tolerance = if f > 0.0 {
        PREVIEW_EPSILON.max(0.5 / f)
    } else {
        PREVIEW_EPSILON
    };
    mapped >= preview.display_start - tolerance && mapped <= preview.display_end + tolerance
}

/// Pixel offset of a keyframe icon inside its entity element.
pub fn icon_left_px(preview: &KeyframePreview, mapped: f64) -> i64 {
    ((mapped - preview.display_start) * preview.pixels_per_second).round() as i64
}

/// Admission control for preview repaints: at most one frame may be
/// scheduled at a time. The host's render clock drives `complete()`.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: bool,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a repaint. Returns `true` when the caller should actually
    /// schedule one; `false` means a frame is already in flight.
    pub fn request(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    /// Mark the in-flight frame as rendered.
    pub fn complete(&mut self) {
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
