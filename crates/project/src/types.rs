//! Project data model types — host-compatible JSON format.
//!
//! These types match the native host's project JSON field-for-field
//! (snake_case keys, `Points` arrays with `co.X/Y` control points,
//! integer interpolation codes), enabling the engine to hold a
//! read-mostly replica of the authoritative project and to echo full
//! entities back through `update_clip_data` / `update_transition_data`.
//!
//! Animatable property trees are flattened maps: each entry is either a
//! scalar keyframe track, a colour triple of scalar tracks, or an opaque
//! non-animated value. Enumeration and frame remapping walk the map
//! instead of reflecting over unknown JSON.

use cutline_common::{ItemKind, Rational};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Top-level project replica.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Project {
    /// Project frame rate.
    #[serde(default)]
    pub fps: Rational,
    /// Lower bound of the scrollable timeline, in seconds.
    #[serde(default)]
    pub duration: f64,
    /// Seconds per ruler tick.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Pixels per ruler tick.
    #[serde(default = "default_tick_pixels")]
    pub tick_pixels: f64,
    /// Playhead position in seconds, FPS-grid snapped, never negative.
    #[serde(default)]
    pub playhead_position: f64,
    /// Tracks, keyed by `number` (higher renders above).
    #[serde(default)]
    pub layers: Vec<Layer>,
    /// Clips, kept sorted by `position`.
    #[serde(default)]
    pub clips: Vec<Clip>,
    /// Transitions, kept sorted by `position`. The host calls this
    /// collection `effects` on the wire.
    #[serde(default)]
    pub effects: Vec<Transition>,
    /// Timeline markers.
    #[serde(default)]
    pub markers: Vec<Marker>,
    /// Cached-frame intervals for the ruler overlay.
    #[serde(default)]
    pub progress: CacheProgress,
}

fn default_scale() -> f64 {
    16.0
}

fn default_tick_pixels() -> f64 {
    100.0
}

impl Project {
    /// Current pixels-per-second conversion constant.
    pub fn pixels_per_second(&self) -> f64 {
        cutline_common::time::pixels_per_second(self.tick_pixels, self.scale)
    }
}

/// A horizontal track row. `y`/`height` are display-only and recomputed
/// from `number` order after every structural change.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Layer {
    #[serde(default)]
    pub id: String,
    pub number: i32,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub lock: bool,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub height: f64,
}

/// A placed instance of a media source: a trimmed source-time slice
/// (`start..end`, seconds into the media) at a timeline `position`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Clip {
    pub id: String,
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub layer: i32,
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub reader: Reader,
    #[serde(default)]
    pub effects: Vec<Effect>,
    /// Transient view state. Deserialized if present, never echoed back.
    #[serde(default, skip_serializing)]
    pub ui: UiState,
    /// Animatable property trees (`alpha`, `location_x`, `time`, ...).
    #[serde(flatten)]
    pub properties: BTreeMap<String, Property>,
}

impl Clip {
    /// Visible slice length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Timeline seconds of the right edge.
    pub fn right(&self) -> f64 {
        self.position + self.duration()
    }

    /// Whether the source is a still image (unbounded trim to the right,
    /// left overflow extends the duration instead of the in-point).
    pub fn is_single_image(&self) -> bool {
        self.reader.has_single_image || self.reader.media_type.eq_ignore_ascii_case("image")
    }

    /// Natural duration of the source media in seconds, if known.
    ///
    /// Prefers `reader.duration`, falls back to `video_length / fps`,
    /// then to the current slice length.
    pub fn reader_duration_seconds(&self) -> Option<f64> {
        if self.reader.duration > 0.0 {
            return Some(self.reader.duration);
        }
        let source_fps = self.reader.fps.as_f64();
        if self.reader.video_length > 0 && source_fps > 0.0 {
            return Some(self.reader.video_length as f64 / source_fps);
        }
        let span = self.duration();
        (span > 0.0).then_some(span)
    }

    /// Retimed natural duration derived from the `time` curve's frame
    /// span, if the clip carries one with at least two points.
    pub fn time_track_duration(&self, fps: Rational) -> Option<f64> {
        let f = fps.as_f64();
        if f <= 0.0 {
            return None;
        }
        let points = match self.properties.get("time") {
            Some(Property::Keyframes(track)) if track.points.len() > 1 => &track.points,
            _ => return None,
        };
        let min = points.iter().map(|p| p.co.x).fold(f64::INFINITY, f64::min);
        let max = points
            .iter()
            .map(|p| p.co.x)
            .fold(f64::NEG_INFINITY, f64::max);
        Some((max - min + 1.0) / f)
    }

    /// Whether a trim/retime keyframe preview is currently active.
    pub fn preview_active(&self) -> bool {
        self.ui.keyframe_preview.is_some()
    }
}

/// An overlap-region effect placed as an independent timeline entity.
/// `start` is always 0; `end` is the duration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    #[serde(default)]
    pub layer: i32,
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing)]
    pub ui: UiState,
    #[serde(flatten)]
    pub properties: BTreeMap<String, Property>,
}

impl Transition {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn right(&self) -> f64 {
        self.position + self.duration()
    }
}

/// An image/audio processing node nested in a clip. It has no timeline
/// position of its own; it inherits the parent clip's extent.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Effect {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(flatten)]
    pub properties: BTreeMap<String, Property>,
}

/// A timeline marker.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub vector: String,
}

/// Media reader descriptor attached to a clip.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reader {
    #[serde(default)]
    pub has_video: bool,
    #[serde(default)]
    pub has_audio: bool,
    #[serde(default)]
    pub fps: Rational,
    #[serde(default)]
    pub duration: f64,
    /// Source length in frames. The host serialises this as a string in
    /// some project versions, as a number in others.
    #[serde(default, deserialize_with = "de_flexible_i64")]
    pub video_length: i64,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub has_single_image: bool,
}

impl Default for Reader {
    fn default() -> Self {
        Self {
            has_video: true,
            has_audio: false,
            fps: Rational::default(),
            duration: 0.0,
            video_length: 0,
            media_type: "video".to_string(),
            has_single_image: false,
        }
    }
}

/// Cached-frame intervals, in frame numbers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CacheProgress {
    #[serde(default)]
    pub ranges: Vec<CacheRange>,
}

/// One cached interval `[start, end]` in frames.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheRange {
    pub start: i64,
    pub end: i64,
}

/// Transient per-entity view state, never serialised back to the host.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UiState {
    /// UI waveform samples for clips with audio.
    #[serde(default)]
    pub audio_data: Vec<f32>,
    /// Live trim/retime preview while the entity is being resized.
    #[serde(default)]
    pub keyframe_preview: Option<KeyframePreview>,
}

/// Parameters of a live trim/retime keyframe preview. The mapping
/// itself lives in `cutline-keyframes`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyframePreview {
    pub mode: PreviewMode,
    pub original_start: f64,
    pub original_end: f64,
    pub display_start: f64,
    pub display_end: f64,
    pub projected_start: f64,
    pub projected_end: f64,
    pub pixels_per_second: f64,
}

/// Preview transform kind: trims keep project-time keyframe positions,
/// retimes stretch them into the display window.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    Trim,
    Retime,
}

/// One animatable property slot on a clip, transition, or effect.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Property {
    /// A scalar keyframe track: `{ "Points": [...] }`.
    Keyframes(KeyframeTrack),
    /// A colour triple of parallel scalar tracks.
    Color(ColorTrack),
    /// Any non-animated value (numbers, strings, nested objects).
    Other(serde_json::Value),
}

impl Property {
    /// The points that contribute to keyframe enumeration: a scalar
    /// track's own points, or the `red` channel for colour properties.
    pub fn display_points(&self) -> Option<&[Point]> {
        match self {
            Self::Keyframes(track) => Some(&track.points),
            Self::Color(color) => Some(&color.red.points),
            Self::Other(_) => None,
        }
    }

    /// Every track held by this property (all three channels for colours).
    pub fn tracks_mut(&mut self) -> Vec<&mut KeyframeTrack> {
        match self {
            Self::Keyframes(track) => vec![track],
            Self::Color(color) => vec![&mut color.red, &mut color.green, &mut color.blue],
            Self::Other(_) => Vec::new(),
        }
    }

    /// A property is animated once it holds more than one point.
    pub fn is_animated(&self) -> bool {
        self.display_points().is_some_and(|p| p.len() > 1)
    }
}

/// A list of keyframe control points.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KeyframeTrack {
    #[serde(rename = "Points")]
    pub points: Vec<Point>,
}

/// Three parallel scalar tracks with a shared schema.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ColorTrack {
    pub red: KeyframeTrack,
    pub green: KeyframeTrack,
    pub blue: KeyframeTrack,
}

/// A keyframe control point. `co.X` is a 1-based frame number.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Point {
    pub co: Coord,
    #[serde(default)]
    pub interpolation: Interpolation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_left: Option<Coord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_right: Option<Coord>,
}

impl Point {
    /// Integer frame number of this point.
    pub fn frame(&self) -> i64 {
        self.co.x.round() as i64
    }
}

/// A 2D control coordinate (`X` = frame for `co`, value for handles).
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
}

/// Keyframe interpolation, encoded as `0 | 1 | 2` on the wire.
/// Unknown codes fall back to `Constant`, matching the original.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "f64", into = "u8")]
pub enum Interpolation {
    Bezier,
    Linear,
    #[default]
    Constant,
}

impl Interpolation {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bezier => "bezier",
            Self::Linear => "linear",
            Self::Constant => "constant",
        }
    }
}

impl From<f64> for Interpolation {
    fn from(value: f64) -> Self {
        match value.round() as i64 {
            0 => Self::Bezier,
            1 => Self::Linear,
            _ => Self::Constant,
        }
    }
}

impl From<Interpolation> for u8 {
    fn from(value: Interpolation) -> Self {
        match value {
            Interpolation::Bezier => 0,
            Interpolation::Linear => 1,
            Interpolation::Constant => 2,
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Common view of the two top-level timeline entities, so the selection
/// machine, bounding box, and scene builder can treat them uniformly.
pub trait TimelineItem {
    fn id(&self) -> &str;
    fn kind(&self) -> ItemKind;
    fn layer(&self) -> i32;
    /// Timeline extent `[left, right)` in seconds.
    fn time_extent(&self) -> (f64, f64);
    fn selected(&self) -> bool;
    fn set_selected(&mut self, selected: bool);
}

impl TimelineItem for Clip {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Clip
    }

    fn layer(&self) -> i32 {
        self.layer
    }

    fn time_extent(&self) -> (f64, f64) {
        (self.position, self.right())
    }

    fn selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

impl TimelineItem for Transition {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Transition
    }

    fn layer(&self) -> i32 {
        self.layer
    }

    fn time_extent(&self) -> (f64, f64) {
        (self.position, self.right())
    }

    fn selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

/// Accept an integer, float, or numeric string.
fn de_flexible_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct Flexible;

    impl de::Visitor<'_> for Flexible {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer, float, or numeric string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            Ok(v as i64)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            Ok(v.round() as i64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            v.trim()
                .parse::<f64>()
                .map(|f| f.round() as i64)
                .map_err(|_| E::custom(format!("invalid numeric string: {v:?}")))
        }
    }

    deserializer.deserialize_any(Flexible)
}
