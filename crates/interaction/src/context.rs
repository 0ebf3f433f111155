//! Per-gesture interaction state.
//!
//! The drag bounding box, pointer offsets, and transaction id live in
//! one context whose lifetime is exactly one gesture. Only one
//! directive may hold the context at a time, enforced by the `dragging`
//! flag the selection machine also consults.

use crate::bounding_box::BoundingBox;
use cutline_common::TransactionId;

/// Transient state shared by the drag/resize/keyframe directives.
#[derive(Clone, Debug, Default)]
pub struct InteractionContext {
    /// True while any gesture owns the pointer. Selection calls arriving
    /// while set are dropped.
    pub dragging: bool,
    /// Transaction id shared by every host call of the gesture.
    pub transaction: Option<TransactionId>,
    /// Group-move geometry (present for drags and manual moves).
    pub bounding_box: Option<BoundingBox>,
    /// Pointer position at press (pixels).
    pub press: (f64, f64),
    /// Pointer offset from press to the bounding box origin.
    pub grab_offset: (f64, f64),
    /// Last pointer position seen.
    pub previous: (f64, f64),
    /// Whether the pointer has travelled past the drag threshold.
    pub threshold_met: bool,
    /// Whether the gesture actually changed anything.
    pub moved: bool,
}

impl InteractionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the context for a new gesture starting at `press`.
    pub fn begin(&mut self, press: (f64, f64)) {
        *self = Self {
            dragging: true,
            transaction: Some(TransactionId::new()),
            press,
            previous: press,
            ..Self::default()
        };
    }

    /// The gesture's transaction id (allocated at `begin`).
    pub fn transaction(&self) -> Option<&TransactionId> {
        self.transaction.as_ref()
    }

    /// Check (and latch) the drag threshold: a press only becomes a drag
    /// once the pointer travels `threshold_px` in Manhattan distance.
    pub fn meets_threshold(&mut self, pointer: (f64, f64), threshold_px: f64) -> bool {
        if self.threshold_met {
            return true;
        }
        let travel = (pointer.0 - self.press.0).abs() + (pointer.1 - self.press.1).abs();
        if travel >= threshold_px {
            self.threshold_met = true;
        }
        self.threshold_met
    }

    /// Tear down after a gesture; the context is reusable afterwards.
    pub fn end(&mut self) {
        *self = Self::default();
    }
}
