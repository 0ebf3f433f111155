//! Unidirectional render pass.
//!
//! `build_scene` consumes the immutable project replica plus the
//! transient interaction state and produces a [`Scene`]: a plain data
//! model of everything the embedding view draws (track rows, clip and
//! transition rectangles, keyframe icons, ruler, playhead, cache
//! stripes, snap line). No DOM, no widgets — mutation happens only in
//! the pointer/RPC handlers, the scene is recomputed from state.

use crate::thumbs::ThumbnailSource;
use cutline_audio::{window_for_clip, WaveformWindow};
use cutline_common::{time, EngineConfig, ItemKind, Rational};
use cutline_interaction::{item_rect, BoundingBox, Rect, ResizeGesture};
use cutline_keyframes::{
    clip_keyframes, clip_signature, transition_keyframes, transition_signature, EffectPalette,
    IconSet, KeyframeCache, KeyframeMark,
};
use cutline_project::Project;

/// Everything the view needs to draw one frame.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Total drawable width, clamped to the renderer-safe maximum.
    pub canvas_width_px: f64,
    pub scroll_left_px: f64,
    pub viewport_width_px: f64,
    pub ruler: Ruler,
    pub tracks: Vec<TrackRow>,
    pub clips: Vec<ClipView>,
    pub transitions: Vec<TransitionView>,
    pub markers: Vec<MarkerView>,
    pub playhead_px: f64,
    /// Cached-frame stripes on the ruler, `(left_px, width_px)`.
    pub cache_stripes: Vec<(f64, f64)>,
    pub snapline_px: Option<f64>,
    pub marquee: Option<Rect>,
}

/// Ruler readout and tick marks.
#[derive(Clone, Debug, Default)]
pub struct Ruler {
    pub ticks: Vec<RulerTick>,
    /// `HH:MM:SS,frame` readout for the playhead.
    pub readout: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RulerTick {
    pub px: f64,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackRow {
    pub number: i32,
    pub label: String,
    pub y: f64,
    pub height: f64,
    pub locked: bool,
}

#[derive(Clone, Debug)]
pub struct ClipView {
    pub id: String,
    pub rect: Rect,
    pub selected: bool,
    pub label: String,
    pub thumbnail: Option<String>,
    pub waveform: Option<WaveformWindow>,
    pub keyframes: Vec<KeyframeIcon>,
}

#[derive(Clone, Debug)]
pub struct TransitionView {
    pub id: String,
    pub rect: Rect,
    pub selected: bool,
    pub keyframes: Vec<KeyframeIcon>,
}

#[derive(Clone, Debug)]
pub struct MarkerView {
    pub id: String,
    pub px: f64,
    pub icon: String,
    pub vector: String,
}

/// One keyframe glyph inside an entity element.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeIcon {
    pub frame: i64,
    /// Offset from the entity's left edge: `round(local_seconds · pps)`.
    pub left_px: i64,
    pub selected: bool,
    pub inside_preview: bool,
    pub icon: Option<String>,
}

/// Transient interaction state folded into the scene.
#[derive(Clone, Copy, Debug, Default)]
pub struct SceneOverlay<'a> {
    /// Live group-move geometry (elements render at their moved rects).
    pub bounding_box: Option<&'a BoundingBox>,
    /// Live resize slice for the resized item.
    pub resize: Option<&'a ResizeGesture>,
    pub snapline_px: Option<f64>,
    pub marquee: Option<Rect>,
    pub scroll_left_px: f64,
    pub viewport_width_px: f64,
}

/// Inputs that never change mid-frame.
pub struct SceneInputs<'a> {
    pub project: &'a Project,
    pub config: &'a EngineConfig,
    pub track_label_format: &'a str,
    pub property_filter: &'a str,
    pub revision: u64,
    pub thumbs: &'a ThumbnailSource,
}

/// Build the scene model.
pub fn build_scene(
    inputs: &SceneInputs<'_>,
    overlay: &SceneOverlay<'_>,
    kf_cache: &mut KeyframeCache,
    palette: &mut EffectPalette,
    icons: &mut IconSet,
) -> Scene {
    let project = inputs.project;
    let pps = project.pixels_per_second();
    let canvas_width_px = time::clamp_canvas_width(project.duration * pps);

    let mut scene = Scene {
        canvas_width_px,
        scroll_left_px: overlay.scroll_left_px,
        viewport_width_px: overlay.viewport_width_px,
        ruler: build_ruler(project, canvas_width_px),
        playhead_px: time::time_to_pixel(project.playhead_position, pps),
        snapline_px: overlay.snapline_px,
        marquee: overlay.marquee,
        ..Scene::default()
    };

    // Track rows, top to bottom.
    let mut rows: Vec<&cutline_project::Layer> = project.layers.iter().collect();
    rows.sort_by(|a, b| a.y.total_cmp(&b.y));
    scene.tracks = rows
        .into_iter()
        .map(|layer| TrackRow {
            number: layer.number,
            label: inputs
                .track_label_format
                .replace("%s", &layer.number.to_string()),
            y: layer.y,
            height: layer.height.max(inputs.config.default_track_height_px),
            locked: layer.lock,
        })
        .collect();

    let filter = (!inputs.property_filter.is_empty()).then_some(inputs.property_filter);

    for clip in &project.clips {
        let Some(mut rect) = item_rect(project, clip) else {
            continue;
        };
        apply_overlays(&mut rect, ItemKind::Clip, &clip.id, overlay, pps);

        // Waveform window: live slice during resizes, committed otherwise.
        let waveform = (!clip.ui.audio_data.is_empty()).then(|| {
            let (start, end, scaled) = match overlay.resize {
                Some(resize) if resize.id == clip.id => (
                    resize.live.start,
                    resize.live.end,
                    resize.timing_mode,
                ),
                _ => (clip.start, clip.end, false),
            };
            let (initial_start, initial_end) = match overlay.resize {
                Some(resize) if resize.id == clip.id => {
                    (resize.original.start, resize.original.end)
                }
                _ => (clip.start, clip.end),
            };
            window_for_clip(
                clip.ui.audio_data.len(),
                inputs.config.waveform_samples_per_second,
                start,
                end,
                initial_start,
                initial_end,
                scaled,
            )
        });

        let marks = kf_cache.get_or_compute(
            &clip.id,
            clip_signature(clip, inputs.property_filter, inputs.revision),
            || clip_keyframes(clip, project.fps, filter, &mut *palette, &mut *icons),
        );

        scene.clips.push(ClipView {
            id: clip.id.clone(),
            rect,
            selected: clip.selected,
            label: if clip.title.is_empty() {
                clip.id.clone()
            } else {
                clip.title.clone()
            },
            thumbnail: inputs.thumbs.url_for(clip),
            waveform,
            keyframes: icon_row(marks.values(), pps),
        });
    }

    for tran in &project.effects {
        let Some(mut rect) = item_rect(project, tran) else {
            continue;
        };
        apply_overlays(&mut rect, ItemKind::Transition, &tran.id, overlay, pps);

        let marks = kf_cache.get_or_compute(
            &tran.id,
            transition_signature(tran, inputs.property_filter, inputs.revision),
            || transition_keyframes(tran, project.fps, filter, &mut *icons),
        );

        scene.transitions.push(TransitionView {
            id: tran.id.clone(),
            rect,
            selected: tran.selected,
            keyframes: icon_row(marks.values(), pps),
        });
    }

    scene.markers = project
        .markers
        .iter()
        .map(|marker| MarkerView {
            id: marker.id.clone(),
            px: time::time_to_pixel(marker.position, pps),
            icon: marker.icon.clone(),
            vector: marker.vector.clone(),
        })
        .collect();

    scene.cache_stripes = cache_stripes(project, pps);
    scene
}

/// Shift an item rect by the live drag delta or replace it with the
/// live resize slice.
fn apply_overlays(
    rect: &mut Rect,
    kind: ItemKind,
    id: &str,
    overlay: &SceneOverlay<'_>,
    pps: f64,
) {
    if let Some(bbox) = overlay.bounding_box {
        if let Some(element) = bbox
            .elements
            .iter()
            .find(|e| e.kind == kind && e.id == id)
        {
            *rect = bbox.moved_rect(element);
            return;
        }
    }
    if let Some(resize) = overlay.resize {
        if resize.kind == kind && resize.id == id {
            rect.x = time::time_to_pixel(resize.live.position, pps);
            rect.w = (resize.live.duration().max(0.0)) * pps;
        }
    }
}

fn icon_row<'a>(marks: impl Iterator<Item = &'a KeyframeMark>, pps: f64) -> Vec<KeyframeIcon> {
    marks
        .map(|mark| KeyframeIcon {
            frame: mark.frame,
            left_px: (mark.local_seconds * pps).round() as i64,
            selected: mark.selected,
            inside_preview: mark.inside_preview,
            icon: mark.icon.clone(),
        })
        .collect()
}

fn build_ruler(project: &Project, canvas_width_px: f64) -> Ruler {
    let mut ticks = Vec::new();
    let tick_px = project.tick_pixels.max(1.0);
    let count = (canvas_width_px / tick_px).floor() as usize;
    for i in 0..=count {
        let px = i as f64 * tick_px;
        let seconds = i as f64 * project.scale;
        ticks.push(RulerTick {
            px,
            label: time::format_ruler_time(seconds, project.fps),
        });
    }
    Ruler {
        ticks,
        readout: time::format_ruler_time(project.playhead_position, project.fps),
    }
}

/// Cached-frame intervals converted to ruler pixel stripes.
fn cache_stripes(project: &Project, pps: f64) -> Vec<(f64, f64)> {
    let fps = project.fps;
    project
        .progress
        .ranges
        .iter()
        .filter(|range| range.end >= range.start)
        .map(|range| {
            let left = time::time_to_pixel(frame_seconds(range.start, fps), pps);
            let right = time::time_to_pixel(frame_seconds(range.end + 1, fps), pps);
            (left, (right - left).max(0.0))
        })
        .collect()
}

fn frame_seconds(frame: i64, fps: Rational) -> f64 {
    time::time_from_frame(frame, fps)
}
