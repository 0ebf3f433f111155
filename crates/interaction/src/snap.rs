//! Horizontal snap engine.
//!
//! Given candidate pixel positions (typically the left and right edges
//! of the drag bounding box, or a single trimmed edge), the engine finds
//! the nearest interesting feature within a pixel threshold: clip edges,
//! transition edges, markers, the playhead, the timeline end, and —
//! during trims — the visible keyframes of the dragged entity.
//!
//! The engine is sticky per gesture label: once a target has locked, it
//! is preferred over a nearer newcomer while the candidate stays inside
//! that target's tolerance, so edges do not flicker between two close
//! features mid-drag. `reset` must be called on every drag start/stop.

use cutline_project::Project;
use std::collections::{HashMap, HashSet};

/// Classes of snap target, in match-priority order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SnapTargetKind {
    ClipEdge,
    TransitionEdge,
    Marker,
    Playhead,
    TimelineEnd,
    Keyframe,
}

/// One snappable feature.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SnapTarget {
    pub px: f64,
    pub kind: SnapTargetKind,
    /// Per-target tolerance override (keyframes use a tighter radius).
    pub tolerance_px: Option<f64>,
}

/// A snap match: apply `offset_px` to the proposed move and draw the
/// snap line at `target_px`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SnapHit {
    pub candidate_index: usize,
    pub target_px: f64,
    pub offset_px: f64,
    pub kind: SnapTargetKind,
}

/// A keyframe snap feature in timeline seconds, with an optional
/// tolerance override in seconds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KeyframeSnapTarget {
    pub seconds: f64,
    pub tolerance: Option<f64>,
}

/// Collect every snappable pixel position of the project, skipping the
/// entity ids being dragged.
pub fn collect_targets(
    project: &Project,
    ignore: &HashSet<String>,
    keyframes: &[KeyframeSnapTarget],
) -> Vec<SnapTarget> {
    let pps = project.pixels_per_second();
    if pps <= 0.0 {
        return Vec::new();
    }
    let mut targets = Vec::new();

    for clip in &project.clips {
        if ignore.contains(&clip.id) {
            continue;
        }
        targets.push(SnapTarget {
            px: clip.position * pps,
            kind: SnapTargetKind::ClipEdge,
            tolerance_px: None,
        });
        targets.push(SnapTarget {
            px: clip.right() * pps,
            kind: SnapTargetKind::ClipEdge,
            tolerance_px: None,
        });
    }
    for tran in &project.effects {
        if ignore.contains(&tran.id) {
            continue;
        }
        targets.push(SnapTarget {
            px: tran.position * pps,
            kind: SnapTargetKind::TransitionEdge,
            tolerance_px: None,
        });
        targets.push(SnapTarget {
            px: tran.right() * pps,
            kind: SnapTargetKind::TransitionEdge,
            tolerance_px: None,
        });
    }
    for marker in &project.markers {
        targets.push(SnapTarget {
            px: marker.position * pps,
            kind: SnapTargetKind::Marker,
            tolerance_px: None,
        });
    }
    targets.push(SnapTarget {
        px: project.playhead_position * pps,
        kind: SnapTargetKind::Playhead,
        tolerance_px: None,
    });
    if project.duration > 0.0 {
        targets.push(SnapTarget {
            px: project.duration * pps,
            kind: SnapTargetKind::TimelineEnd,
            tolerance_px: None,
        });
    }
    for kf in keyframes {
        targets.push(SnapTarget {
            px: kf.seconds * pps,
            kind: SnapTargetKind::Keyframe,
            tolerance_px: kf.tolerance.map(|sec| (sec * pps).abs()),
        });
    }

    targets.retain(|t| t.px.is_finite());
    targets
}

/// Keyframe snap radius in pixels: at least one frame, never wider than
/// the generic threshold.
pub fn keyframe_tolerance_px(fps_float: f64, pps: f64, threshold_px: f64) -> f64 {
    if pps <= 0.0 {
        return threshold_px;
    }
    let frame_sec = if fps_float > 0.0 { 1.0 / fps_float } else { 0.0 };
    let base_sec = frame_sec.max(0.02).min(threshold_px / pps);
    (base_sec * pps).clamp(1.0, threshold_px)
}

#[derive(Copy, Clone, Debug)]
struct ActiveTarget {
    px: f64,
    tolerance_px: f64,
    kind: SnapTargetKind,
}

/// The stateful matcher, owning the per-label sticky targets.
#[derive(Clone, Debug, Default)]
pub struct SnapEngine {
    active: HashMap<String, ActiveTarget>,
}

impl SnapEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every sticky target (gesture start/stop).
    pub fn reset(&mut self) {
        self.active.clear();
    }

    /// Clear the sticky target for one gesture label.
    pub fn reset_label(&mut self, label: &str) {
        self.active.remove(label);
    }

    /// Find the best snap for a set of candidate pixel positions.
    ///
    /// Re-locks to the label's previous target while any candidate stays
    /// within its tolerance; otherwise chooses the smallest absolute
    /// offset (ties go to the earlier target in collection order).
    pub fn best(
        &mut self,
        label: &str,
        candidates: &[f64],
        threshold_px: f64,
        targets: &[SnapTarget],
    ) -> Option<SnapHit> {
        if targets.is_empty() || candidates.is_empty() {
            self.reset_label(label);
            return None;
        }

        // Sticky re-lock.
        if let Some(&active) = self.active.get(label) {
            let best_reuse = candidates
                .iter()
                .enumerate()
                .filter(|(_, &c)| c.is_finite() && (active.px - c).abs() <= active.tolerance_px)
                .min_by(|(_, a), (_, b)| {
                    (active.px - **a).abs().total_cmp(&(active.px - **b).abs())
                });
            if let Some((index, &candidate)) = best_reuse {
                return Some(SnapHit {
                    candidate_index: index,
                    target_px: active.px,
                    offset_px: active.px - candidate,
                    kind: active.kind,
                });
            }
        }

        let mut best: Option<SnapHit> = None;
        let mut best_tolerance = threshold_px;
        for target in targets {
            let tolerance = target.tolerance_px.unwrap_or(threshold_px).abs();
            for (index, &candidate) in candidates.iter().enumerate() {
                if !candidate.is_finite() {
                    continue;
                }
                let diff = target.px - candidate;
                if diff.abs() > tolerance {
                    continue;
                }
                let better = match &best {
                    None => true,
                    Some(hit) => diff.abs() < hit.offset_px.abs(),
                };
                if better {
                    best = Some(SnapHit {
                        candidate_index: index,
                        target_px: target.px,
                        offset_px: diff,
                        kind: target.kind,
                    });
                    best_tolerance = tolerance;
                }
            }
        }

        match best {
            Some(hit) => {
                self.active.insert(
                    label.to_string(),
                    ActiveTarget {
                        px: hit.target_px,
                        tolerance_px: best_tolerance,
                        kind: hit.kind,
                    },
                );
                Some(hit)
            }
            None => {
                self.reset_label(label);
                None
            }
        }
    }
}
