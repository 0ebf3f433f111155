//! Selection state machine.
//!
//! Interprets modifier-augmented clicks over clips, transitions, and
//! effects, mutating `selected` flags on the replica and emitting the
//! host-sync events (`addSelection` / `removeSelection` / razor) the
//! engine relays to the bridge before returning to the caller.
//!
//! Dispatch order: empty-id clear, dragging guard, razor mode,
//! alt/forced ripple, shift range, then plain/toggle.

use cutline_common::ItemKind;
use cutline_project::{ProjectStore, TimelineItem};

/// Modifier keys captured from the click event.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

/// Host-visible side effects of a selection call, emitted in order.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionEvent {
    Added {
        kind: ItemKind,
        id: String,
        clear_others: bool,
    },
    Removed {
        kind: ItemKind,
        id: String,
    },
    /// Razor mode intercepted the click; the host slices at the cursor.
    Razor {
        clip_id: String,
        transition_id: String,
        seconds: f64,
    },
}

/// One selection request (a click over an item, or a bulk clear).
#[derive(Clone, Debug)]
pub struct SelectionRequest<'a> {
    pub id: &'a str,
    pub kind: ItemKind,
    /// Whether this interaction may replace the existing selection.
    pub clear_selections: bool,
    pub modifiers: Modifiers,
    /// Ripple selection without the alt key (context-menu driven).
    pub force_ripple: bool,
    /// Timeline seconds under the cursor (used by razor mode).
    pub cursor_seconds: f64,
}

/// The machine's persistent state: the anchor for shift-range clicks.
#[derive(Clone, Debug, Default)]
pub struct SelectionMachine {
    pub last_selected: Option<(ItemKind, String)>,
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one selection interaction against the replica.
    ///
    /// `dragging` skips the call entirely (selection must not race a
    /// drag); `razor_mode` redirects the click to the host's razor.
    pub fn select_item(
        &mut self,
        store: &mut ProjectStore,
        req: &SelectionRequest<'_>,
        razor_mode: bool,
        dragging: bool,
    ) -> Vec<SelectionEvent> {
        // Bulk clear of one type.
        if req.id.is_empty() {
            if !req.clear_selections {
                return Vec::new();
            }
            return store
                .clear_selected(req.kind)
                .into_iter()
                .map(|id| SelectionEvent::Removed { kind: req.kind, id })
                .collect();
        }

        if dragging {
            return Vec::new();
        }

        if razor_mode {
            let (clip_id, transition_id) = match req.kind {
                ItemKind::Clip => (req.id.to_string(), String::new()),
                ItemKind::Transition => (String::new(), req.id.to_string()),
                ItemKind::Effect => (String::new(), String::new()),
            };
            return vec![SelectionEvent::Razor {
                clip_id,
                transition_id,
                seconds: req.cursor_seconds,
            }];
        }

        let ripple = (req.modifiers.alt || req.force_ripple) && req.kind != ItemKind::Effect;
        if ripple {
            return self.select_ripple(store, req);
        }

        if req.modifiers.shift && req.kind != ItemKind::Effect {
            if let Some(anchor) = self.last_selected.clone() {
                return self.select_range(store, req, &anchor);
            }
        }

        self.select_plain(store, req)
    }

    /// Alt/ripple: everything on the anchor's layer at or after it.
    fn select_ripple(
        &mut self,
        store: &mut ProjectStore,
        req: &SelectionRequest<'_>,
    ) -> Vec<SelectionEvent> {
        let anchor = match req.kind {
            ItemKind::Clip => store
                .find_clip(req.id)
                .map(|c| (c.layer, c.position)),
            ItemKind::Transition => store
                .find_transition(req.id)
                .map(|t| (t.layer, t.position)),
            ItemKind::Effect => None,
        };
        let Some((layer, position)) = anchor else {
            tracing::debug!(id = %req.id, kind = %req.kind, "Ripple anchor not found");
            return Vec::new();
        };

        let mut events = Vec::new();
        let in_ripple = |item_layer: i32, item_position: f64| {
            item_layer == layer && item_position >= position
        };

        if !req.modifiers.ctrl && req.clear_selections {
            for clip in &mut store.project.clips {
                if clip.selected && !in_ripple(clip.layer, clip.position) {
                    clip.selected = false;
                    events.push(SelectionEvent::Removed {
                        kind: ItemKind::Clip,
                        id: clip.id.clone(),
                    });
                }
            }
            for tran in &mut store.project.effects {
                if tran.selected && !in_ripple(tran.layer, tran.position) {
                    tran.selected = false;
                    events.push(SelectionEvent::Removed {
                        kind: ItemKind::Transition,
                        id: tran.id.clone(),
                    });
                }
            }
        }

        for clip in &mut store.project.clips {
            if in_ripple(clip.layer, clip.position) && !clip.selected {
                clip.selected = true;
                events.push(SelectionEvent::Added {
                    kind: ItemKind::Clip,
                    id: clip.id.clone(),
                    clear_others: false,
                });
            }
        }
        for tran in &mut store.project.effects {
            if in_ripple(tran.layer, tran.position) && !tran.selected {
                tran.selected = true;
                events.push(SelectionEvent::Added {
                    kind: ItemKind::Transition,
                    id: tran.id.clone(),
                    clear_others: false,
                });
            }
        }

        // Ripple selection does not move the shift anchor.
        store.bump();
        events
    }

    /// Shift-range: every item fully contained by the rectangle spanned
    /// by the two anchors, in both time and layer.
    fn select_range(
        &mut self,
        store: &mut ProjectStore,
        req: &SelectionRequest<'_>,
        anchor: &(ItemKind, String),
    ) -> Vec<SelectionEvent> {
        let extent_of = |store: &ProjectStore, kind: ItemKind, id: &str| match kind {
            ItemKind::Clip => store.find_clip(id).map(|c| (c.time_extent(), c.layer)),
            ItemKind::Transition => store
                .find_transition(id)
                .map(|t| (t.time_extent(), t.layer)),
            ItemKind::Effect => None,
        };
        let Some(((a_start, a_end), a_layer)) = extent_of(store, anchor.0, &anchor.1) else {
            // The anchor is gone; fall back to a plain click.
            return self.select_plain(store, req);
        };
        let Some(((b_start, b_end), b_layer)) = extent_of(store, req.kind, req.id) else {
            tracing::debug!(id = %req.id, kind = %req.kind, "Range target not found");
            return Vec::new();
        };

        let t0 = a_start.min(b_start);
        let t1 = a_end.max(b_end);
        let l0 = a_layer.min(b_layer);
        let l1 = a_layer.max(b_layer);
        let contained = |(start, end): (f64, f64), layer: i32| {
            start >= t0 && end <= t1 && layer >= l0 && layer <= l1
        };

        let mut events = Vec::new();
        if !req.modifiers.ctrl && req.clear_selections {
            for id in store.clear_selected(ItemKind::Clip) {
                events.push(SelectionEvent::Removed {
                    kind: ItemKind::Clip,
                    id,
                });
            }
            for id in store.clear_selected(ItemKind::Transition) {
                events.push(SelectionEvent::Removed {
                    kind: ItemKind::Transition,
                    id,
                });
            }
        }

        for clip in &mut store.project.clips {
            if contained((clip.position, clip.right()), clip.layer) && !clip.selected {
                clip.selected = true;
                events.push(SelectionEvent::Added {
                    kind: ItemKind::Clip,
                    id: clip.id.clone(),
                    clear_others: false,
                });
            }
        }
        for tran in &mut store.project.effects {
            if contained((tran.position, tran.right()), tran.layer) && !tran.selected {
                tran.selected = true;
                events.push(SelectionEvent::Added {
                    kind: ItemKind::Transition,
                    id: tran.id.clone(),
                    clear_others: false,
                });
            }
        }

        store.bump();
        events
    }

    /// Plain / ctrl-toggle selection; updates the shift anchor.
    fn select_plain(
        &mut self,
        store: &mut ProjectStore,
        req: &SelectionRequest<'_>,
    ) -> Vec<SelectionEvent> {
        let mut events = Vec::new();
        let replacing = req.clear_selections && !req.modifiers.ctrl;
        if replacing {
            for kind in [ItemKind::Clip, ItemKind::Transition, ItemKind::Effect] {
                for id in store.clear_selected(kind) {
                    if id != req.id {
                        events.push(SelectionEvent::Removed { kind, id });
                    }
                }
            }
        }

        let Some(was_selected) = set_selected_flag(store, req.kind, req.id, None) else {
            tracing::debug!(id = %req.id, kind = %req.kind, "Selection target not found");
            return events;
        };

        if req.modifiers.ctrl && was_selected && !replacing {
            set_selected_flag(store, req.kind, req.id, Some(false));
            events.push(SelectionEvent::Removed {
                kind: req.kind,
                id: req.id.to_string(),
            });
        } else {
            set_selected_flag(store, req.kind, req.id, Some(true));
            events.push(SelectionEvent::Added {
                kind: req.kind,
                id: req.id.to_string(),
                clear_others: replacing,
            });
        }

        self.last_selected = Some((req.kind, req.id.to_string()));
        store.bump();
        events
    }
}

/// Read (and optionally write) the `selected` flag of any addressable
/// entity. Effects resolve against the global transition list first,
/// then every clip's nested effects. Returns the previous value, or
/// `None` when the id is unknown.
fn set_selected_flag(
    store: &mut ProjectStore,
    kind: ItemKind,
    id: &str,
    value: Option<bool>,
) -> Option<bool> {
    match kind {
        ItemKind::Clip => {
            let clip = store.find_clip_mut(id)?;
            let was = clip.selected;
            if let Some(v) = value {
                clip.selected = v;
            }
            Some(was)
        }
        ItemKind::Transition => {
            let tran = store.find_transition_mut(id)?;
            let was = tran.selected;
            if let Some(v) = value {
                tran.selected = v;
            }
            Some(was)
        }
        ItemKind::Effect => {
            if let Some(tran) = store.find_transition_mut(id) {
                let was = tran.selected;
                if let Some(v) = value {
                    tran.selected = v;
                }
                return Some(was);
            }
            for clip in &mut store.project.clips {
                if let Some(effect) = clip.effects.iter_mut().find(|e| e.id == id) {
                    let was = effect.selected;
                    if let Some(v) = value {
                        effect.selected = v;
                    }
                    return Some(was);
                }
            }
            None
        }
    }
}
