//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the timeline engine, grouped in one place so hosts and
/// tests can override them wholesale.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Snap threshold in pixels; a candidate edge locks to a target when
    /// within this distance.
    pub snap_threshold_px: f64,
    /// Manhattan distance the pointer must travel before a press becomes
    /// a drag (unmoved drags commit nothing).
    pub drag_threshold_px: f64,
    /// Minimum timeline length requested from the host (seconds).
    pub min_timeline_len: f64,
    /// Padding appended past the right-most clip when autogrowing (seconds).
    pub timeline_pad: f64,
    /// Overlap proposals shorter than this are discarded (seconds).
    pub min_transition_len: f64,
    /// Proposals whose edge coincides with an existing transition within
    /// this epsilon are discarded (seconds).
    pub transition_edge_epsilon: f64,
    /// Resolution of the per-clip UI waveform sample array.
    pub waveform_samples_per_second: u32,
    /// Height of the ruler strip above the first track (pixels).
    pub ruler_height_px: f64,
    /// Fallback track height when a layer reports none (pixels).
    pub default_track_height_px: f64,
    /// Side length of a keyframe icon (pixels).
    pub keyframe_icon_size_px: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap_threshold_px: 12.0,
            drag_threshold_px: 10.0,
            min_timeline_len: 300.0,
            timeline_pad: 10.0,
            min_transition_len: 0.5,
            transition_edge_epsilon: 0.01,
            waveform_samples_per_second: 20,
            ruler_height_px: 32.0,
            default_track_height_px: 64.0,
            keyframe_icon_size_px: 12.0,
        }
    }
}
