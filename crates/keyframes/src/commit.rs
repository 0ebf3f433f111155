//! Keyframe frame rewriting for drag commits and time-curve edits.
//!
//! A keyframe drag ends by rewriting `co.X = old_frame` to `new_frame`
//! across every property tree of the target entity — scalar tracks,
//! all three colour channels, and (for clips) every nested effect —
//! so multi-property keyframes move as one column.

use cutline_project::{Clip, KeyframeTrack, Property, Transition};
use std::collections::BTreeMap;

/// Rewrite `old_frame` to `new_frame` across a property map.
/// Returns the number of points rewritten.
pub fn remap_properties(
    properties: &mut BTreeMap<String, Property>,
    old_frame: i64,
    new_frame: i64,
) -> usize {
    let mut moved = 0;
    for property in properties.values_mut() {
        for track in property.tracks_mut() {
            moved += remap_track(track, old_frame, new_frame);
        }
    }
    moved
}

fn remap_track(track: &mut KeyframeTrack, old_frame: i64, new_frame: i64) -> usize {
    let mut moved = 0;
    for point in &mut track.points {
        if point.frame() == old_frame {
            point.co.x = new_frame as f64;
            moved += 1;
        }
    }
    moved
}

/// Rewrite a frame across a clip's own tracks and all of its effects.
pub fn remap_clip_frames(clip: &mut Clip, old_frame: i64, new_frame: i64) -> usize {
    let mut moved = remap_properties(&mut clip.properties, old_frame, new_frame);
    for effect in &mut clip.effects {
        moved += remap_properties(&mut effect.properties, old_frame, new_frame);
    }
    if moved > 0 {
        tracing::debug!(
            clip_id = %clip.id,
            old_frame,
            new_frame,
            points = moved,
            "Remapped clip keyframes"
        );
    }
    moved
}

/// Rewrite a frame on a single effect of a clip.
pub fn remap_effect_frames(
    clip: &mut Clip,
    effect_id: &str,
    old_frame: i64,
    new_frame: i64,
) -> usize {
    let Some(effect) = clip.effects.iter_mut().find(|e| e.id == effect_id) else {
        return 0;
    };
    remap_properties(&mut effect.properties, old_frame, new_frame)
}

/// Rewrite a frame across a transition's tracks.
pub fn remap_transition_frames(
    transition: &mut Transition,
    old_frame: i64,
    new_frame: i64,
) -> usize {
    let moved = remap_properties(&mut transition.properties, old_frame, new_frame);
    if moved > 0 {
        tracing::debug!(
            transition_id = %transition.id,
            old_frame,
            new_frame,
            points = moved,
            "Remapped transition keyframes"
        );
    }
    moved
}

/// Stretch every point at or past `anchor_frame` by `scale`, clamped to
/// `[anchor_frame, end_frame]`. Used when a Time-curve edit changes a
/// clip's retimed duration and the remaining animation must follow.
pub fn stretch_properties(
    properties: &mut BTreeMap<String, Property>,
    anchor_frame: i64,
    end_frame: i64,
    scale: f64,
) {
    if scale <= 0.0 {
        return;
    }
    for property in properties.values_mut() {
        for track in property.tracks_mut() {
            for point in &mut track.points {
                let x = point.co.x;
                if x < anchor_frame as f64 {
                    continue;
                }
                let stretched = anchor_frame as f64 + (x - anchor_frame as f64) * scale;
                point.co.x = stretched.round().clamp(anchor_frame as f64, end_frame as f64);
            }
        }
    }
}
