//! Authoritative in-memory replica of the host's project.
//!
//! The host owns the real project; the engine holds this read-mostly
//! copy, mutates it optimistically during gestures, and reconciles via
//! JSON diffs (`diff` module) and full-replace loads. All modifications
//! go through controlled mutation methods that bump the store revision
//! (used to invalidate keyframe-enumeration caches).

use crate::types::{Clip, Effect, Layer, Marker, Project, Transition};
use cutline_common::{time, EngineConfig, ItemKind};

/// Project replica plus a monotonically increasing revision counter.
#[derive(Clone, Debug, Default)]
pub struct ProjectStore {
    pub project: Project,
    revision: u64,
}

impl ProjectStore {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            revision: 0,
        }
    }

    /// Monotonic revision; bumped by every mutation method here.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Record an out-of-band mutation (gesture handlers edit entities
    /// in place and then call this).
    pub fn bump(&mut self) {
        self.revision += 1;
    }

    /// Replace the whole project (host `loadJson`).
    pub fn load(&mut self, project: Project, config: &EngineConfig) {
        tracing::info!(
            clips = project.clips.len(),
            transitions = project.effects.len(),
            layers = project.layers.len(),
            "Loading project replica"
        );
        self.project = project;
        self.normalize(config);
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn find_clip(&self, id: &str) -> Option<&Clip> {
        self.project.clips.iter().find(|c| c.id == id)
    }

    pub fn find_clip_mut(&mut self, id: &str) -> Option<&mut Clip> {
        self.project.clips.iter_mut().find(|c| c.id == id)
    }

    pub fn find_transition(&self, id: &str) -> Option<&Transition> {
        self.project.effects.iter().find(|t| t.id == id)
    }

    pub fn find_transition_mut(&mut self, id: &str) -> Option<&mut Transition> {
        self.project.effects.iter_mut().find(|t| t.id == id)
    }

    pub fn find_marker(&self, id: &str) -> Option<&Marker> {
        self.project.markers.iter().find(|m| m.id == id)
    }

    /// Find a per-clip effect anywhere in the project, returning the
    /// owning clip id alongside it.
    pub fn find_clip_effect(&self, effect_id: &str) -> Option<(&Clip, &Effect)> {
        for clip in &self.project.clips {
            if let Some(effect) = clip.effects.iter().find(|e| e.id == effect_id) {
                return Some((clip, effect));
            }
        }
        None
    }

    pub fn find_layer(&self, number: i32) -> Option<&Layer> {
        self.project.layers.iter().find(|l| l.number == number)
    }

    pub fn layer_exists(&self, number: i32) -> bool {
        self.find_layer(number).is_some()
    }

    /// Track number at a vertical pixel position, scanning layers by
    /// their display `y`. Positions above the first track resolve to the
    /// top-most layer, positions below the last to the bottom-most.
    pub fn find_track_at_y(&self, y: f64) -> Option<i32> {
        let mut rows: Vec<&Layer> = self.project.layers.iter().collect();
        if rows.is_empty() {
            return None;
        }
        rows.sort_by(|a, b| a.y.total_cmp(&b.y));
        if y < rows[0].y {
            return Some(rows[0].number);
        }
        for layer in &rows {
            if y >= layer.y && y < layer.y + layer.height.max(1.0) {
                return Some(layer.number);
            }
        }
        rows.last().map(|l| l.number)
    }

    // -----------------------------------------------------------------------
    // Ordering and layout
    // -----------------------------------------------------------------------

    /// Re-sort clips, transitions, and layers, then re-index layer `y`
    /// values. Run after every structural change (deferred by the engine
    /// so the current handler returns first).
    pub fn normalize(&mut self, config: &EngineConfig) {
        self.project
            .clips
            .sort_by(|a, b| a.position.total_cmp(&b.position));
        self.project
            .effects
            .sort_by(|a, b| a.position.total_cmp(&b.position));
        self.project.layers.sort_by_key(|l| l.number);
        self.reindex_layers(config);
        self.bump();
    }

    /// Recompute display `y` for every layer: the highest `number`
    /// renders on top, directly under the ruler.
    pub fn reindex_layers(&mut self, config: &EngineConfig) {
        let mut order: Vec<usize> = (0..self.project.layers.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(self.project.layers[i].number));
        let mut y = config.ruler_height_px;
        for i in order {
            let layer = &mut self.project.layers[i];
            if layer.height <= 0.0 {
                layer.height = config.default_track_height_px;
            }
            layer.y = y;
            y += layer.height;
        }
    }

    // -----------------------------------------------------------------------
    // Playhead and duration
    // -----------------------------------------------------------------------

    /// Move the playhead: FPS-grid snapped and never negative.
    /// Returns the stored value.
    pub fn set_playhead(&mut self, seconds: f64) -> f64 {
        let snapped = time::snap_to_fps_grid(time::to_finite(seconds, 0.0), self.project.fps).max(0.0);
        self.project.playhead_position = snapped;
        snapped
    }

    /// Right edge of the right-most clip or transition, in seconds.
    pub fn max_right(&self) -> f64 {
        let clip_max = self
            .project
            .clips
            .iter()
            .map(|c| c.right())
            .fold(0.0_f64, f64::max);
        let tran_max = self
            .project
            .effects
            .iter()
            .map(|t| t.right())
            .fold(0.0_f64, f64::max);
        clip_max.max(tran_max)
    }

    /// Timeline length to request from the host after an edit, if the
    /// content has outgrown the current duration.
    pub fn required_duration(&self, config: &EngineConfig) -> Option<f64> {
        let max_right = self.max_right();
        if max_right > self.project.duration {
            Some(config.min_timeline_len.max(max_right + config.timeline_pad))
        } else {
            None
        }
    }

    // -----------------------------------------------------------------------
    // Bulk selection
    // -----------------------------------------------------------------------

    /// Deselect everything of one kind. `Effect` also clears every
    /// per-clip effect. Returns the ids that were deselected.
    pub fn clear_selected(&mut self, kind: ItemKind) -> Vec<String> {
        let mut cleared = Vec::new();
        match kind {
            ItemKind::Clip => {
                for clip in &mut self.project.clips {
                    if clip.selected {
                        clip.selected = false;
                        cleared.push(clip.id.clone());
                    }
                }
            }
            ItemKind::Transition => {
                for tran in &mut self.project.effects {
                    if tran.selected {
                        tran.selected = false;
                        cleared.push(tran.id.clone());
                    }
                }
            }
            ItemKind::Effect => {
                for tran in &mut self.project.effects {
                    if tran.selected {
                        tran.selected = false;
                        cleared.push(tran.id.clone());
                    }
                }
                for clip in &mut self.project.clips {
                    for effect in &mut clip.effects {
                        if effect.selected {
                            effect.selected = false;
                            cleared.push(effect.id.clone());
                        }
                    }
                }
            }
        }
        if !cleared.is_empty() {
            tracing::debug!(kind = %kind, count = cleared.len(), "Cleared selections");
            self.bump();
        }
        cleared
    }

    /// Select every clip and transition. Returns `(kind, id)` for each
    /// newly selected item so the host can be informed.
    pub fn select_all(&mut self) -> Vec<(ItemKind, String)> {
        let mut added = Vec::new();
        for clip in &mut self.project.clips {
            if !clip.selected {
                clip.selected = true;
                added.push((ItemKind::Clip, clip.id.clone()));
            }
        }
        for tran in &mut self.project.effects {
            if !tran.selected {
                tran.selected = true;
                added.push((ItemKind::Transition, tran.id.clone()));
            }
        }
        if !added.is_empty() {
            self.bump();
        }
        added
    }

    /// Currently selected clips and transitions as `(kind, id)` pairs,
    /// clips first.
    pub fn selected_items(&self) -> Vec<(ItemKind, String)> {
        let mut out = Vec::new();
        for clip in &self.project.clips {
            if clip.selected {
                out.push((ItemKind::Clip, clip.id.clone()));
            }
        }
        for tran in &self.project.effects {
            if tran.selected {
                out.push((ItemKind::Transition, tran.id.clone()));
            }
        }
        out
    }
}
