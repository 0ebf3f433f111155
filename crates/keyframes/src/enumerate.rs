//! Visible-keyframe enumeration.
//!
//! `clip_keyframes` / `transition_keyframes` walk an entity's animatable
//! property trees and return one mark per frame, ready for the scene
//! builder. Rules:
//!
//! - a clip contributes only while it is selected, one of its effects is
//!   selected, or a trim/retime preview is active; a transition while
//!   selected;
//! - a property contributes only with more than one point; colour
//!   properties contribute through their `red` channel;
//! - an optional case-insensitive substring filter restricts by
//!   property name;
//! - when two entries collide on the same frame, the selected one wins;
//! - during a preview, marks outside the display window are kept but
//!   flagged `inside_preview = false` so the view can dim them.

use crate::icons::{EffectPalette, IconSet};
use crate::preview;
use cutline_common::{time, ItemKind, Rational};
use cutline_project::{Clip, Interpolation, KeyframePreview, Property, Transition};
use std::collections::BTreeMap;

/// One visible keyframe of an entity.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeMark {
    /// 1-based frame number (`co.X`).
    pub frame: i64,
    pub interpolation: Interpolation,
    /// Whether this mark's owner is selected.
    pub selected: bool,
    /// Selected through the clip itself rather than one of its effects.
    pub base_selected: bool,
    /// Kind of the owning entity (clip, effect, or transition).
    pub kind: ItemKind,
    /// Id of the entity owning the points (effect id for effect marks).
    pub owner_id: String,
    /// Id of the top-level entity to address in `update_*_data` calls.
    pub target_id: String,
    /// False only while a preview is active and the mark falls outside
    /// the display window.
    pub inside_preview: bool,
    /// Seconds from the entity's displayed left edge.
    pub local_seconds: f64,
    /// Colourised icon data-URL for effect marks (None falls back to the
    /// default glyph).
    pub icon: Option<String>,
}

/// Enumerate the visible keyframes of a clip (its own tracks plus every
/// effect's tracks), keyed by frame.
pub fn clip_keyframes(
    clip: &Clip,
    fps: Rational,
    filter: Option<&str>,
    palette: &mut EffectPalette,
    icons: &mut IconSet,
) -> BTreeMap<i64, KeyframeMark> {
    let mut marks = BTreeMap::new();

    let any_effect_selected = clip.effects.iter().any(|e| e.selected);
    if !clip.selected && !any_effect_selected && !clip.preview_active() {
        return marks;
    }
    let base_selected = clip.selected && !any_effect_selected;

    let window = Window::for_clip(clip);
    collect(
        &mut marks,
        clip.properties.iter(),
        fps,
        filter,
        &window,
        MarkContext {
            kind: ItemKind::Clip,
            owner_id: &clip.id,
            target_id: &clip.id,
            selected: base_selected,
            base_selected,
            icon_color: None,
        },
        icons,
    );

    for effect in &clip.effects {
        let color = palette.color_for(&effect.id);
        collect(
            &mut marks,
            effect.properties.iter(),
            fps,
            filter,
            &window,
            MarkContext {
                kind: ItemKind::Effect,
                owner_id: &effect.id,
                target_id: &clip.id,
                selected: effect.selected,
                base_selected: false,
                icon_color: Some(&color),
            },
            icons,
        );
    }

    marks
}

/// Enumerate the visible keyframes of a transition, keyed by frame.
/// Transitions contribute all of their keyframes while selected.
pub fn transition_keyframes(
    transition: &Transition,
    fps: Rational,
    filter: Option<&str>,
    icons: &mut IconSet,
) -> BTreeMap<i64, KeyframeMark> {
    let mut marks = BTreeMap::new();
    if !transition.selected {
        return marks;
    }
    let window = Window {
        start: transition.start,
        end: transition.end.max(transition.start),
        preview: transition.ui.keyframe_preview.clone(),
    };
    collect(
        &mut marks,
        transition.properties.iter(),
        fps,
        filter,
        &window,
        MarkContext {
            kind: ItemKind::Transition,
            owner_id: &transition.id,
            target_id: &transition.id,
            selected: true,
            base_selected: true,
            icon_color: None,
        },
        icons,
    );
    marks
}

/// The source-slice window keyframes are tested against, plus the
/// active preview if any.
struct Window {
    start: f64,
    end: f64,
    preview: Option<KeyframePreview>,
}

impl Window {
    fn for_clip(clip: &Clip) -> Self {
        let preview = clip.ui.keyframe_preview.clone();
        let (start, end) = match &preview {
            Some(p) => (p.display_start, p.display_end),
            None => (clip.start, clip.end.max(clip.start)),
        };
        Self {
            start,
            end,
            preview,
        }
    }

    /// Place a keyframe's absolute source seconds into this window.
    /// Returns `(local_seconds, inside)`, or `None` when the mark is
    /// outside and no preview keeps it around for dimming.
    fn place(&self, abs_seconds: f64, fps: Rational) -> Option<(f64, bool)> {
        match &self.preview {
            Some(p) => {
                let mapped = preview::mapped_seconds(p, abs_seconds);
                let inside = preview::inside_window(p, mapped, fps);
                Some((mapped - p.display_start, inside))
            }
            None => {
                let local = abs_seconds - self.start;
                let span = self.end - self.start;
                if local < -preview::PREVIEW_EPSILON || local > span + preview::PREVIEW_EPSILON {
                    return None;
                }
                Some((local, true))
            }
        }
    }
}

struct MarkContext<'a> {
    kind: ItemKind,
    owner_id: &'a str,
    target_id: &'a str,
    selected: bool,
    base_selected: bool,
    icon_color: Option<&'a str>,
}

fn collect<'a>(
    marks: &mut BTreeMap<i64, KeyframeMark>,
    properties: impl Iterator<Item = (&'a String, &'a Property)>,
    fps: Rational,
    filter: Option<&str>,
    window: &Window,
    ctx: MarkContext<'_>,
    icons: &mut IconSet,
) {
    let filter_lower = filter
        .filter(|f| !f.is_empty())
        .map(|f| f.to_ascii_lowercase());

    for (name, property) in properties {
        if let Some(needle) = &filter_lower {
            if !name.to_ascii_lowercase().contains(needle.as_str()) {
                continue;
            }
        }
        if !property.is_animated() {
            continue;
        }
        let points = property.display_points().unwrap_or(&[]);
        for point in points {
            let frame = point.frame();
            let abs_seconds = time::time_from_frame(frame, fps);
            let Some((local_seconds, inside)) = window.place(abs_seconds, fps) else {
                continue;
            };
            let icon = ctx
                .icon_color
                .and_then(|color| icons.data_url(point.interpolation, color));
            let mark = KeyframeMark {
                frame,
                interpolation: point.interpolation,
                selected: ctx.selected,
                base_selected: ctx.base_selected,
                kind: ctx.kind,
                owner_id: ctx.owner_id.to_string(),
                target_id: ctx.target_id.to_string(),
                inside_preview: inside,
                local_seconds,
                icon,
            };
            match marks.get(&frame) {
                // A selected entry keeps its frame against unselected newcomers.
                Some(existing) if existing.selected && !mark.selected => {}
                _ => {
                    marks.insert(frame, mark);
                }
            }
        }
    }
}
