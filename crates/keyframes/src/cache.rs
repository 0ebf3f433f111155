//! Memoisation of keyframe enumeration results.
//!
//! Enumeration walks every property tree of an entity; a scope refresh
//! asks for the same entity many times per second. Results are cached
//! per entity id, keyed by a signature of everything that can change
//! the answer: selection state, effect selection, the property filter,
//! the preview window, and the store revision.

use crate::enumerate::KeyframeMark;
use cutline_project::{Clip, KeyframePreview, Transition};
use std::collections::{BTreeMap, HashMap};

/// Cache of the last enumeration result per entity.
#[derive(Clone, Debug, Default)]
pub struct KeyframeCache {
    entries: HashMap<String, CachedEntry>,
}

#[derive(Clone, Debug)]
struct CachedEntry {
    signature: String,
    marks: BTreeMap<i64, KeyframeMark>,
}

impl KeyframeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached marks for `entity_id` when the signature still
    /// matches, otherwise recompute via `compute` and store the result.
    pub fn get_or_compute(
        &mut self,
        entity_id: &str,
        signature: String,
        compute: impl FnOnce() -> BTreeMap<i64, KeyframeMark>,
    ) -> BTreeMap<i64, KeyframeMark> {
        if let Some(entry) = self.entries.get(entity_id) {
            if entry.signature == signature {
                return entry.marks.clone();
            }
        }
        let marks = compute();
        self.entries.insert(
            entity_id.to_string(),
            CachedEntry {
                signature,
                marks: marks.clone(),
            },
        );
        marks
    }

    /// Drop everything (project reload, theme change).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop one entity's entry.
    pub fn invalidate(&mut self, entity_id: &str) {
        self.entries.remove(entity_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build a clip's enumeration signature: selection, effect-selection
/// list, property filter, preview window, and store revision.
pub fn clip_signature(clip: &Clip, filter: &str, revision: u64) -> String {
    let effects: Vec<&str> = clip
        .effects
        .iter()
        .filter(|e| e.selected)
        .map(|e| e.id.as_str())
        .collect();
    format!(
        "r{revision}|s{}|e{}|f{filter}|p{}",
        clip.selected as u8,
        effects.join(","),
        preview_signature(clip.ui.keyframe_preview.as_ref()),
    )
}

/// Build a transition's enumeration signature.
pub fn transition_signature(transition: &Transition, filter: &str, revision: u64) -> String {
    format!(
        "r{revision}|s{}|f{filter}|p{}",
        transition.selected as u8,
        preview_signature(transition.ui.keyframe_preview.as_ref()),
    )
}

fn preview_signature(preview: Option<&KeyframePreview>) -> String {
    match preview {
        None => "-".to_string(),
        Some(p) => format!(
            "{:?}:{:.4}:{:.4}:{:.4}:{:.4}:{:.2}",
            p.mode, p.display_start, p.display_end, p.projected_start, p.projected_end,
            p.pixels_per_second,
        ),
    }
}
