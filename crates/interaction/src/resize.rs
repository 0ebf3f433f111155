//! Resize / trim / retime gesture for clips and transitions.
//!
//! Two handles per item. A left-handle drag moves the in-point (and the
//! timeline position with it); a right-handle drag moves the out-point,
//! clamped to the media's natural duration unless timing mode or a
//! `time` curve lifts the limit. In timing mode the gesture becomes a
//! retime: the source start stays pinned and the host rewrites the
//! `time` curve from the committed duration.
//!
//! `update` receives cursor seconds already corrected by the snap
//! engine; it applies only the slice constraints.

use cutline_common::{time, ItemKind, Rational};
use cutline_project::{Clip, PreviewMode, Transition};

/// Which handle is being dragged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
}

/// A clip/transition slice: source window plus timeline position.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SliceState {
    pub start: f64,
    pub end: f64,
    pub position: f64,
}

impl SliceState {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// What to commit when the gesture stops.
#[derive(Clone, Debug, PartialEq)]
pub enum ResizeCommit {
    /// FPS-snapped slice to echo through `update_*_data`.
    Trim { slice: SliceState },
    /// Start preserved; the host recomputes the `time` curve
    /// (`RetimeClip(id, end, position)`).
    Retime {
        end: f64,
        position: f64,
        original_duration: f64,
        new_duration: f64,
    },
}

/// An in-flight resize gesture.
#[derive(Clone, Debug)]
pub struct ResizeGesture {
    pub kind: ItemKind,
    pub id: String,
    pub edge: Edge,
    pub original: SliceState,
    pub live: SliceState,
    /// Natural source duration limit (seconds), `None` = unlimited.
    pub max_duration: Option<f64>,
    pub single_image: bool,
    pub timing_mode: bool,
    pub moved: bool,
}

impl ResizeGesture {
    /// Capture a clip's slice and limits at gesture start.
    pub fn begin_clip(clip: &Clip, edge: Edge, timing_mode: bool, fps: Rational) -> Self {
        let original = SliceState {
            start: clip.start,
            end: clip.end,
            position: clip.position,
        };
        let max_duration = if timing_mode {
            None
        } else {
            let mut limit = clip
                .time_track_duration(fps)
                .or_else(|| clip.reader_duration_seconds());
            // Never clamp below the current slice (host data may disagree).
            if let Some(m) = limit {
                if original.duration() > m {
                    limit = Some(original.duration());
                }
            }
            limit
        };
        Self {
            kind: ItemKind::Clip,
            id: clip.id.clone(),
            edge,
            original,
            live: original,
            max_duration,
            single_image: clip.is_single_image(),
            timing_mode,
            moved: false,
        }
    }

    /// Capture a transition's extent at gesture start.
    pub fn begin_transition(transition: &Transition, edge: Edge) -> Self {
        let original = SliceState {
            start: 0.0,
            end: transition.duration(),
            position: transition.position,
        };
        Self {
            kind: ItemKind::Transition,
            id: transition.id.clone(),
            edge,
            original,
            live: original,
            max_duration: None,
            single_image: false,
            timing_mode: false,
            moved: false,
        }
    }

    /// The keyframe-preview mode this gesture drives.
    pub fn preview_mode(&self) -> PreviewMode {
        if self.timing_mode {
            PreviewMode::Retime
        } else {
            PreviewMode::Trim
        }
    }

    /// Apply the constraints to a (snap-corrected) cursor position and
    /// return the live slice.
    pub fn update(&mut self, cursor_seconds: f64, fps: Rational) -> SliceState {
        let cursor = time::to_finite(cursor_seconds, self.original.position);
        self.live = match self.kind {
            ItemKind::Clip => self.compute_clip(cursor, fps),
            _ => self.compute_transition(cursor, fps),
        };
        if (self.live.start - self.original.start).abs() > 1e-9
            || (self.live.end - self.original.end).abs() > 1e-9
            || (self.live.position - self.original.position).abs() > 1e-9
        {
            self.moved = true;
        }
        self.live
    }

    fn compute_clip(&self, cursor: f64, fps: Rational) -> SliceState {
        let min_len = min_frame_len(fps);
        let o = self.original;
        let overflow_extends = self.single_image || self.timing_mode;

        match self.edge {
            Edge::Left => {
                // Positive delta extends the clip to the left.
                let delta = o.position - cursor;
                let requested_position = cursor;
                let mut position = requested_position.max(0.0);
                let position_overflow = position - requested_position;
                let mut start = (o.start - delta).max(0.0);
                let mut end = o.end;
                if !overflow_extends {
                    // The un-absorbed travel past position 0 comes out of
                    // the slice instead.
                    end = o.end - position_overflow;
                }
                // The left edge cannot cross the right edge.
                let max_start = end - min_len;
                if start > max_start {
                    start = max_start.max(0.0);
                    position = (o.position + (start - o.start)).max(0.0);
                }
                SliceState {
                    start,
                    end,
                    position,
                }
            }
            Edge::Right => {
                let timeline_right = o.position + o.duration();
                let delta = cursor - timeline_right;
                let mut end = o.end + delta;
                let min_end = o.start + min_len;
                if end < min_end {
                    end = min_end;
                }
                if !self.timing_mode {
                    if let Some(max) = self.max_duration {
                        let max_end = o.start + max;
                        if end > max_end {
                            end = max_end;
                        }
                    }
                }
                SliceState {
                    start: o.start,
                    end,
                    position: o.position,
                }
            }
        }
    }

    fn compute_transition(&self, cursor: f64, fps: Rational) -> SliceState {
        let min_len = min_frame_len(fps);
        let o = self.original;
        let width = o.end;

        match self.edge {
            Edge::Left => {
                let delta = (cursor - o.position).min(width - min_len);
                let mut position = o.position + delta;
                let mut end = width - delta;
                if position < 0.0 {
                    position = 0.0;
                    end = o.position + width;
                }
                SliceState {
                    start: 0.0,
                    end,
                    position,
                }
            }
            Edge::Right => {
                let delta = (cursor - (o.position + width)).max(-(width - min_len));
                SliceState {
                    start: 0.0,
                    end: width + delta,
                    position: o.position,
                }
            }
        }
    }

    /// FPS-quantised commit for the gesture.
    pub fn finish(&self, fps: Rational) -> ResizeCommit {
        if self.timing_mode && self.kind == ItemKind::Clip {
            // Start pinned; the committed duration is whole frames.
            let f = fps.as_f64().max(1.0);
            let frames = ((self.live.duration() * f).round()).max(1.0);
            let new_duration = frames / f;
            return ResizeCommit::Retime {
                end: self.original.start + new_duration,
                position: time::snap_to_fps_grid(self.live.position, fps).max(0.0),
                original_duration: self.original.duration(),
                new_duration,
            };
        }

        let mut start = time::snap_to_fps_grid(self.live.start, fps).max(0.0);
        let mut end = time::snap_to_fps_grid(self.live.end, fps);
        let position = time::snap_to_fps_grid(self.live.position, fps).max(0.0);
        if self.kind == ItemKind::Transition {
            start = 0.0;
        }
        // Quantisation can invert a slice shrunk to the minimum.
        if end < start + min_frame_len(fps) {
            end = start + min_frame_len(fps);
        }
        ResizeCommit::Trim {
            slice: SliceState {
                start,
                end,
                position,
            },
        }
    }
}

fn min_frame_len(fps: Rational) -> f64 {
    let f = fps.as_f64();
    if f > 0.0 {
        1.0 / f
    } else {
        1.0 / 30.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FPS: Rational = Rational::FPS_24;

    fn make_clip(position: f64, start: f64, end: f64) -> Clip {
        let mut clip = Clip {
            id: "c1".into(),
            position,
            start,
            end,
            ..Clip::default()
        };
        clip.reader.duration = 10.0;
        clip
    }

    #[test]
    fn left_trim_hits_zero_normal_clip() {
        // {position=2, start=1, end=5}, drag left by 3s: position and
        // start clamp at 0 and the un-absorbed second comes out of `end`.
        let clip = make_clip(2.0, 1.0, 5.0);
        let mut gesture = ResizeGesture::begin_clip(&clip, Edge::Left, false, FPS);
        let live = gesture.update(-1.0, FPS);
        assert!((live.position - 0.0).abs() < 1e-9);
        assert!((live.start - 0.0).abs() < 1e-9);
        assert!((live.end - 4.0).abs() < 1e-9);
    }

    #[test]
    fn left_trim_hits_zero_single_image() {
        let mut clip = make_clip(2.0, 1.0, 5.0);
        clip.reader.has_single_image = true;
        let mut gesture = ResizeGesture::begin_clip(&clip, Edge::Left, false, FPS);
        let live = gesture.update(-1.0, FPS);
        assert!((live.position - 0.0).abs() < 1e-9);
        assert!((live.start - 0.0).abs() < 1e-9);
        assert!((live.end - 5.0).abs() < 1e-9, "overflow extends duration");
    }

    #[test]
    fn left_trim_without_overflow_is_plain() {
        let clip = make_clip(2.0, 1.0, 5.0);
        let mut gesture = ResizeGesture::begin_clip(&clip, Edge::Left, false, FPS);
        let live = gesture.update(1.5, FPS);
        assert!((live.position - 1.5).abs() < 1e-9);
        assert!((live.start - 0.5).abs() < 1e-9);
        assert!((live.end - 5.0).abs() < 1e-9);
    }

    #[test]
    fn left_edge_cannot_cross_right_edge() {
        let clip = make_clip(2.0, 1.0, 5.0);
        let mut gesture = ResizeGesture::begin_clip(&clip, Edge::Left, false, FPS);
        let live = gesture.update(50.0, FPS);
        assert!(live.start <= live.end - 1.0 / 24.0 + 1e-9);
        assert!(live.duration() >= 1.0 / 24.0 - 1e-9);
    }

    #[test]
    fn right_trim_clamps_to_media_duration() {
        // reader.duration=6, start=1, end=4, drag +10s: end clamps to
        // start + 6 = 7.
        let mut clip = make_clip(0.0, 1.0, 4.0);
        clip.reader.duration = 6.0;
        let mut gesture = ResizeGesture::begin_clip(&clip, Edge::Right, false, FPS);
        let live = gesture.update(0.0 + 3.0 + 10.0, FPS);
        assert!((live.end - 7.0).abs() < 1e-9);
        assert!((live.start - 1.0).abs() < 1e-9);
        assert!((live.position - 0.0).abs() < 1e-9);
    }

    #[test]
    fn right_trim_unlimited_in_timing_mode() {
        let mut clip = make_clip(0.0, 1.0, 4.0);
        clip.reader.duration = 6.0;
        let mut gesture = ResizeGesture::begin_clip(&clip, Edge::Right, true, FPS);
        // Cursor at 30s puts the right edge 27s past its old spot.
        let live = gesture.update(30.0, FPS);
        assert!((live.end - 31.0).abs() < 1e-9, "no media clamp while retiming");
    }

    #[test]
    fn right_trim_uses_time_track_span_when_present() {
        use cutline_project::{Coord, Interpolation, KeyframeTrack, Point, Property};
        let mut clip = make_clip(0.0, 0.0, 2.0);
        clip.reader.duration = 2.0;
        // Time curve spanning frames 1..=96 -> retimed natural duration 4s.
        clip.properties.insert(
            "time".into(),
            Property::Keyframes(KeyframeTrack {
                points: [1.0, 96.0]
                    .iter()
                    .map(|&x| Point {
                        co: Coord { x, y: x },
                        interpolation: Interpolation::Linear,
                        handle_left: None,
                        handle_right: None,
                    })
                    .collect(),
            }),
        );
        let mut gesture = ResizeGesture::begin_clip(&clip, Edge::Right, false, FPS);
        let live = gesture.update(10.0, FPS);
        assert!((live.end - 4.0).abs() < 1e-9);
    }

    #[test]
    fn right_trim_cannot_collapse_below_one_frame() {
        let clip = make_clip(2.0, 1.0, 5.0);
        let mut gesture = ResizeGesture::begin_clip(&clip, Edge::Right, false, FPS);
        let live = gesture.update(-100.0, FPS);
        assert!((live.end - (1.0 + 1.0 / 24.0)).abs() < 1e-9);
    }

    #[test]
    fn trim_commit_snaps_to_frame_grid() {
        let clip = make_clip(2.0, 1.0, 5.0);
        let mut gesture = ResizeGesture::begin_clip(&clip, Edge::Left, false, FPS);
        gesture.update(1.513, FPS);
        let ResizeCommit::Trim { slice } = gesture.finish(FPS) else {
            panic!("expected trim commit");
        };
        // All values land on the 24fps grid.
        for value in [slice.start, slice.end, slice.position] {
            let snapped = time::snap_to_fps_grid(value, FPS);
            assert!((value - snapped).abs() < 1e-9);
        }
        assert!(slice.end >= slice.start + 1.0 / 24.0 - 1e-9);
    }

    #[test]
    fn retime_commit_pins_start_and_reports_durations() {
        let clip = make_clip(2.0, 1.0, 5.0);
        let mut gesture = ResizeGesture::begin_clip(&clip, Edge::Right, true, FPS);
        gesture.update(2.0 + 4.0 + 4.0, FPS); // stretch 4s -> 8s
        let commit = gesture.finish(FPS);
        match commit {
            ResizeCommit::Retime {
                end,
                position,
                original_duration,
                new_duration,
            } => {
                assert!((end - 9.0).abs() < 1e-9, "end = pinned start + new duration");
                assert!((position - 2.0).abs() < 1e-9);
                assert!((original_duration - 4.0).abs() < 1e-9);
                assert!((new_duration - 8.0).abs() < 1e-9);
            }
            other => panic!("expected retime commit, got {other:?}"),
        }
    }

    #[test]
    fn transition_left_resize_clamps_at_zero() {
        let tran = Transition {
            id: "t1".into(),
            position: 1.0,
            start: 0.0,
            end: 3.0,
            ..Transition::default()
        };
        let mut gesture = ResizeGesture::begin_transition(&tran, Edge::Left);
        let live = gesture.update(-2.0, FPS);
        assert!((live.position - 0.0).abs() < 1e-9);
        assert!((live.end - 4.0).abs() < 1e-9, "duration grows to the old right edge");

        let live = gesture.update(3.8, FPS);
        assert!(live.end >= 1.0 / 24.0 - 1e-9, "keeps at least one frame");
    }

    #[test]
    fn transition_right_resize() {
        let tran = Transition {
            id: "t1".into(),
            position: 1.0,
            start: 0.0,
            end: 3.0,
            ..Transition::default()
        };
        let mut gesture = ResizeGesture::begin_transition(&tran, Edge::Right);
        let live = gesture.update(6.0, FPS);
        assert!((live.end - 5.0).abs() < 1e-9);
        assert!((live.position - 1.0).abs() < 1e-9);

        let live = gesture.update(0.0, FPS);
        assert!((live.end - 1.0 / 24.0).abs() < 1e-9);
    }

    #[test]
    fn moved_flag_tracks_changes() {
        let clip = make_clip(2.0, 1.0, 5.0);
        let mut gesture = ResizeGesture::begin_clip(&clip, Edge::Left, false, FPS);
        gesture.update(2.0, FPS);
        assert!(!gesture.moved);
        gesture.update(1.0, FPS);
        assert!(gesture.moved);
    }
}
