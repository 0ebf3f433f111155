//! Keyframe drag gesture.
//!
//! Dragging a keyframe icon proposes a new time from the pointer, snaps
//! it to the FPS grid, and clamps it to the owning slice so the last
//! valid frame is `floor(end·F)` (the right edge is exclusive). The
//! commit (frame remapping across every property tree) happens at
//! drag-stop; during the drag only the pending frame and a preview seek
//! are reported.

use cutline_common::{time, ItemKind, Rational};

/// Result of one pointer move during a keyframe drag.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KeyframeDragUpdate {
    /// FPS-snapped 1-based frame the keyframe would land on.
    pub frame: i64,
    /// Absolute timeline frame to preview (`SeekToKeyframe`).
    pub seek_frame: i64,
    /// True the first time the pending frame leaves the original: the
    /// caller must announce the transaction (`StartKeyframeDrag`).
    pub needs_transaction: bool,
}

/// An in-flight keyframe drag.
#[derive(Clone, Debug)]
pub struct KeyframeDrag {
    /// Entity addressed by the commit (`Clip` or `Transition`).
    pub target_kind: ItemKind,
    pub target_id: String,
    /// Entity owning the dragged points (clip, effect, or transition).
    pub owner_kind: ItemKind,
    pub owner_id: String,
    pub original_frame: i64,
    pub pending_frame: i64,
    /// Source slice of the owner (`[start, end)` seconds).
    pub slice_start: f64,
    pub slice_end: f64,
    /// Timeline position of the owner's left edge.
    pub base_position: f64,
    /// Whether `StartKeyframeDrag` has been issued.
    pub started: bool,
    pub moved: bool,
}

impl KeyframeDrag {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        target_kind: ItemKind,
        target_id: impl Into<String>,
        owner_kind: ItemKind,
        owner_id: impl Into<String>,
        frame: i64,
        slice_start: f64,
        slice_end: f64,
        base_position: f64,
    ) -> Self {
        Self {
            target_kind,
            target_id: target_id.into(),
            owner_kind,
            owner_id: owner_id.into(),
            original_frame: frame,
            pending_frame: frame,
            slice_start,
            slice_end: slice_end.max(slice_start),
            base_position,
            started: false,
            moved: false,
        }
    }

    /// Propose a new frame from the pointer's timeline position
    /// (already corrected by any feature snapping).
    pub fn propose(&mut self, cursor_timeline_seconds: f64, fps: Rational) -> KeyframeDragUpdate {
        // Into source-slice seconds under the owner's left edge.
        let raw = time::to_finite(cursor_timeline_seconds, self.base_position) - self.base_position
            + self.slice_start;
        let clamped = self.clamp_seconds(raw, fps);
        let snapped = self.clamp_seconds(time::snap_to_fps_grid(clamped, fps), fps);
        let frame = time::preview_frame(snapped, fps);

        let needs_transaction = !self.started && frame != self.original_frame;
        if frame != self.pending_frame {
            self.moved = true;
        }
        self.pending_frame = frame;

        KeyframeDragUpdate {
            frame,
            seek_frame: self.seek_frame(frame, fps),
            needs_transaction,
        }
    }

    /// Clamp into `[start, end − 1/F]` (exclusive right edge).
    fn clamp_seconds(&self, seconds: f64, fps: Rational) -> f64 {
        let f = fps.as_f64();
        let max = if f > 0.0 {
            (self.slice_end - 1.0 / f).max(self.slice_start)
        } else {
            self.slice_end
        };
        seconds.clamp(self.slice_start, max)
    }

    /// Absolute timeline frame for previewing a slice-local frame.
    pub fn seek_frame(&self, frame: i64, fps: Rational) -> i64 {
        let f = fps.as_f64().max(1.0);
        let absolute = (self.base_position * f).round() as i64 + frame
            - (self.slice_start * f).round() as i64;
        absolute.max(1)
    }

    /// Whether the pending frame differs from the original.
    pub fn changed(&self) -> bool {
        self.pending_frame != self.original_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FPS: Rational = Rational::FPS_24;

    fn make_drag() -> KeyframeDrag {
        // Clip at position 3.0 with slice [0, 4).
        KeyframeDrag::new(
            ItemKind::Clip,
            "c1",
            ItemKind::Clip,
            "c1",
            25,
            0.0,
            4.0,
            3.0,
        )
    }

    #[test]
    fn drag_to_two_seconds_lands_on_frame_49() {
        // Pointer at timeline 5.0 = 2.0s into the slice: frame 49 at 24fps.
        let mut drag = make_drag();
        let update = drag.propose(5.0, FPS);
        assert_eq!(update.frame, 49);
        assert!(update.needs_transaction);
        assert!(drag.changed());
    }

    #[test]
    fn frame_clamps_to_slice() {
        let mut drag = make_drag();
        // Far left of the clip: clamps to the in-point (frame 1).
        assert_eq!(drag.propose(-10.0, FPS).frame, 1);
        // Far right: exclusive right edge keeps the last valid frame,
        // floor(4.0 * 24) = 96.
        assert_eq!(drag.propose(100.0, FPS).frame, 96);
    }

    #[test]
    fn transaction_announced_once() {
        let mut drag = make_drag();
        let first = drag.propose(5.0, FPS);
        assert!(first.needs_transaction);
        drag.started = true;
        let second = drag.propose(5.1, FPS);
        assert!(!second.needs_transaction);
    }

    #[test]
    fn returning_to_original_frame_is_not_a_transaction() {
        let mut drag = make_drag();
        // Original frame 25 sits at 1.0s into the slice = timeline 4.0.
        let update = drag.propose(4.0, FPS);
        assert_eq!(update.frame, 25);
        assert!(!update.needs_transaction);
        assert!(!drag.changed());
    }

    #[test]
    fn seek_frame_is_absolute_and_positive() {
        let drag = make_drag();
        // position 3.0 at 24fps = frame 72; slice start 0.
        assert_eq!(drag.seek_frame(49, FPS), 72 + 49);

        let near_zero = KeyframeDrag::new(
            ItemKind::Clip,
            "c1",
            ItemKind::Clip,
            "c1",
            1,
            2.0,
            4.0,
            0.0,
        );
        // position 0, slice start 2.0 (frame 48): absolute = 1 - 48 -> min 1.
        assert_eq!(near_zero.seek_frame(1, FPS), 1);
    }

    #[test]
    fn trimmed_slice_offsets_cursor_mapping() {
        // Slice [1.0, 5.0) at position 3.0: timeline 5.0 = 3.0s source.
        let mut drag = KeyframeDrag::new(
            ItemKind::Transition,
            "t1",
            ItemKind::Transition,
            "t1",
            10,
            1.0,
            5.0,
            3.0,
        );
        let update = drag.propose(5.0, FPS);
        assert_eq!(update.frame, 73); // 3.0s * 24 + 1
    }
}
