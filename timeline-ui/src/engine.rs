//! Timeline engine — the component facade.
//!
//! `TimelineEngine` owns the project replica, the interaction state,
//! and the bridge to the native host. The host drives it through the
//! inbound methods (project loads, JSON diffs, mode flags, scroll and
//! scale); the embedding view drives it through the pointer gesture
//! handlers and pulls a fresh [`crate::scene::Scene`] per frame.
//!
//! Everything runs on one cooperative event loop: pointer events, host
//! callbacks, and render ticks are serialised, and deferred work
//! (re-sorting, layer re-indexing) runs in `tick()` after the current
//! handler has returned.
//!
//! Before `enable_qt`, every method is safe and operates on built-in
//! demo data.

use crate::bridge::HostBridge;
use crate::scene::{build_scene, Scene, SceneInputs, SceneOverlay};
use crate::theme::Theme;
use crate::thumbs::ThumbnailSource;
use cutline_common::{time, EngineConfig, ItemKind, Rational, TransactionId};
use cutline_interaction::{
    begin_drag, collect_targets, finish_drag, keyframe_tolerance_px, missing_transition,
    update_drag, BoundingBox, Edge, InteractionContext, KeyframeDrag, KeyframeSnapTarget, Marquee,
    Modifiers, ResizeCommit, ResizeGesture, SelectionEvent, SelectionMachine, SelectionRequest,
    SnapEngine,
};
use cutline_keyframes::{
    clip_keyframes, clip_signature, EffectPalette, FrameScheduler, IconSet, KeyframeCache,
};
use cutline_project::{
    apply_actions, Clip, DiffAction, KeyframePreview, Layer, Marker, PreviewMode, Project,
    ProjectStore, Property, Transition,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

/// UI mode flags toggled by the host.
#[derive(Clone, Copy, Debug)]
pub struct Modes {
    pub snapping: bool,
    pub razor: bool,
    pub timing: bool,
    pub follow: bool,
}

impl Default for Modes {
    fn default() -> Self {
        Self {
            snapping: true,
            razor: false,
            timing: false,
            follow: false,
        }
    }
}

/// Work queued to run after the current handler returns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DeferredTask {
    /// Re-sort entities and re-index layer `y` values.
    Normalize,
}

/// The timeline controller and interaction engine.
pub struct TimelineEngine {
    store: ProjectStore,
    config: EngineConfig,
    bridge: Arc<dyn HostBridge>,
    selection: SelectionMachine,
    ctx: InteractionContext,
    snap: SnapEngine,
    kf_cache: KeyframeCache,
    icons: IconSet,
    palette: EffectPalette,
    modes: Modes,
    theme: Theme,
    thumbs: ThumbnailSource,
    property_filter: String,
    track_label: String,
    qt_ready: bool,
    scroll_left_px: f64,
    viewport_width_px: f64,
    snapline_px: Option<f64>,
    deferred: VecDeque<DeferredTask>,
    scheduler: FrameScheduler,
    resize: Option<ResizeGesture>,
    resize_kf_targets: Vec<KeyframeSnapTarget>,
    kf_drag: Option<KeyframeDrag>,
    marquee: Option<Marquee>,
}

impl TimelineEngine {
    /// Engine over demo data, ready for a host to attach.
    pub fn new(bridge: Arc<dyn HostBridge>) -> Self {
        let config = EngineConfig::default();
        let mut store = ProjectStore::default();
        store.load(demo_project(), &config);
        Self {
            store,
            config,
            bridge,
            selection: SelectionMachine::new(),
            ctx: InteractionContext::new(),
            snap: SnapEngine::new(),
            kf_cache: KeyframeCache::new(),
            icons: IconSet::with_defaults(),
            palette: EffectPalette::new(),
            modes: Modes::default(),
            theme: Theme::default(),
            thumbs: ThumbnailSource::new(),
            property_filter: String::new(),
            track_label: "Track %s".to_string(),
            qt_ready: false,
            scroll_left_px: 0.0,
            viewport_width_px: 1200.0,
            snapline_px: None,
            deferred: VecDeque::new(),
            scheduler: FrameScheduler::new(),
            resize: None,
            resize_kf_targets: Vec::new(),
            kf_drag: None,
            marquee: None,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn project(&self) -> &Project {
        &self.store.project
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn modes(&self) -> Modes {
        self.modes
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn is_dragging(&self) -> bool {
        self.ctx.dragging
    }

    /// Whether a native host has attached (`enable_qt`).
    pub fn is_host_bound(&self) -> bool {
        self.qt_ready
    }

    pub fn scroll_left_px(&self) -> f64 {
        self.scroll_left_px
    }

    fn fps(&self) -> Rational {
        self.store.project.fps
    }

    fn pps(&self) -> f64 {
        self.store.project.pixels_per_second()
    }

    fn canvas_width_px(&self) -> f64 {
        time::clamp_canvas_width(self.store.project.duration * self.pps())
    }

    // -----------------------------------------------------------------------
    // Inbound: lifecycle, theme, modes
    // -----------------------------------------------------------------------

    /// Bind to the native host: drop the demo data and report readiness.
    pub fn enable_qt(&mut self) {
        tracing::info!("Host attached; clearing demo data");
        self.qt_ready = true;
        self.store.load(Project::default(), &self.config);
        self.kf_cache.clear();
        self.selection = SelectionMachine::new();
        self.bridge.page_ready();
    }

    pub fn set_thumb_address(&mut self, url: &str) {
        self.thumbs.set_base(url);
    }

    pub fn set_theme_colors(&mut self, json: &str) {
        if self.theme.set_colors_json(json) {
            let colors = self.theme.effect_colors();
            if !colors.is_empty() {
                self.palette.set_colors(colors);
                self.kf_cache.clear();
            }
        }
    }

    /// Install a full stylesheet and reload the keyframe icon templates.
    pub fn set_theme(&mut self, css: &str) {
        self.theme.stylesheet = css.to_string();
        self.icons.install_defaults();
        self.kf_cache.clear();
    }

    pub fn set_track_label(&mut self, format: &str) {
        self.track_label = format.to_string();
    }

    pub fn set_snapping_mode(&mut self, enabled: bool) {
        self.modes.snapping = enabled;
        if !enabled {
            self.snapline_px = None;
        }
    }

    pub fn set_razor_mode(&mut self, enabled: bool) {
        self.modes.razor = enabled;
    }

    pub fn set_timing_mode(&mut self, enabled: bool) {
        self.modes.timing = enabled;
    }

    pub fn set_follow(&mut self, enabled: bool) {
        self.modes.follow = enabled;
    }

    pub fn set_property_filter(&mut self, filter: &str) {
        self.property_filter = filter.to_string();
    }

    /// External override of the dragging flag (host-driven drags).
    pub fn set_dragging(&mut self, dragging: bool) {
        self.ctx.dragging = dragging;
    }

    pub fn update_thumbnail(&mut self, clip_id: &str) {
        self.thumbs.bust(clip_id);
    }

    /// Recompute/redraw waveforms: windows are derived in the scene, so
    /// a revision bump is all that is needed to invalidate them.
    pub fn redraw_all_audio_data(&mut self) {
        self.store.bump();
    }

    /// Replace the cached-frame ranges for the progress overlay.
    pub fn render_cache(&mut self, json: &str) {
        match serde_json::from_str(json) {
            Ok(progress) => {
                self.store.project.progress = progress;
                self.store.bump();
            }
            Err(err) => tracing::warn!(error = %err, "Ignoring malformed cache ranges"),
        }
    }

    // -----------------------------------------------------------------------
    // Inbound: scroll and scale
    // -----------------------------------------------------------------------

    /// The host window tells us how wide the visible viewport is.
    pub fn set_viewport_width(&mut self, px: f64) {
        self.viewport_width_px = time::to_finite(px, self.viewport_width_px).max(0.0);
    }

    /// Change seconds-per-tick while keeping the time under the cursor
    /// fixed (or the playhead if visible, or the left edge).
    pub fn set_scale(&mut self, scale: f64, cursor_x: f64) {
        if !(scale.is_finite() && scale > 0.0) {
            tracing::warn!(scale, "Ignoring invalid scale");
            return;
        }
        let old_pps = self.pps();
        let (anchor_time, anchor_px) = if old_pps <= 0.0 {
            (0.0, 0.0)
        } else if cursor_x > 0.0 {
            (
                (self.scroll_left_px + cursor_x) / old_pps,
                cursor_x,
            )
        } else {
            let playhead_px = self.store.project.playhead_position * old_pps;
            let visible = playhead_px >= self.scroll_left_px
                && playhead_px <= self.scroll_left_px + self.viewport_width_px;
            if visible {
                (
                    self.store.project.playhead_position,
                    playhead_px - self.scroll_left_px,
                )
            } else {
                // Explicit fallback: anchor the left viewport edge.
                (self.scroll_left_px / old_pps, 0.0)
            }
        };

        self.store.project.scale = scale;
        self.store.bump();
        let new_pps = self.pps();
        self.scroll_left_px = (anchor_time * new_pps - anchor_px).max(0.0);
    }

    /// Absolute scroll position in `[0, 1]` of the total canvas width.
    pub fn set_scroll(&mut self, normalized: f64) {
        let span = (self.canvas_width_px() - self.viewport_width_px).max(0.0);
        self.scroll_left_px = time::to_finite(normalized, 0.0).clamp(0.0, 1.0) * span;
    }

    /// Relative horizontal scroll in pixels.
    pub fn scroll_left(&mut self, delta_px: f64) {
        self.scroll_left_px = (self.scroll_left_px + time::to_finite(delta_px, 0.0)).max(0.0);
    }

    /// Scroll so `seconds` sits at the viewport centre, clamped at the
    /// right edge.
    pub fn center_on_time(&mut self, seconds: f64) {
        let px = time::time_to_pixel(seconds.max(0.0), self.pps());
        let max_left = (self.canvas_width_px() - self.viewport_width_px).max(0.0);
        self.scroll_left_px = (px - self.viewport_width_px / 2.0).clamp(0.0, max_left);
    }

    pub fn center_on_playhead(&mut self) {
        self.center_on_time(self.store.project.playhead_position);
    }

    // -----------------------------------------------------------------------
    // Inbound: playhead and preview
    // -----------------------------------------------------------------------

    /// Move the playhead (FPS-grid snapped, clamped at zero). The DOM
    /// marker is positioned from the scene; no host call is made.
    pub fn move_playhead(&mut self, seconds: f64) {
        let stored = self.store.set_playhead(seconds);
        if self.modes.follow {
            let px = stored * self.pps();
            let outside = px < self.scroll_left_px
                || px > self.scroll_left_px + self.viewport_width_px;
            if outside {
                self.center_on_time(stored);
            }
        }
    }

    pub fn move_playhead_to_frame(&mut self, frame: i64) {
        self.move_playhead(time::time_from_frame(frame, self.fps()));
    }

    /// Report the frame under `seconds` for monitor preview.
    pub fn preview_frame(&self, seconds: f64) {
        self.bridge
            .playhead_moved(time::preview_frame(seconds, self.fps()));
    }

    /// Preview a frame of one clip. Rounds to the frame grid first to
    /// avoid inter-frame cuts.
    pub fn preview_clip_frame(&self, clip_id: &str, seconds: f64) {
        if self.store.find_clip(clip_id).is_none() {
            tracing::debug!(clip_id, "previewClipFrame: unknown clip");
            return;
        }
        let snapped = time::snap_to_fps_grid(seconds, self.fps());
        self.bridge
            .preview_clip_frame(clip_id, time::preview_frame(snapped, self.fps()));
    }

    // -----------------------------------------------------------------------
    // Inbound: project state
    // -----------------------------------------------------------------------

    /// Apply a host JSON-diff payload (array of `{type, key, value}`).
    pub fn apply_json_diff(&mut self, json: &str) {
        match serde_json::from_str::<Vec<DiffAction>>(json) {
            Ok(actions) => self.apply_diff(&actions),
            Err(err) => tracing::warn!(error = %err, "Ignoring malformed diff payload"),
        }
    }

    /// Apply already-parsed diff actions. Ordering work is deferred so
    /// the DOM tree the next event sees reflects the new order.
    pub fn apply_diff(&mut self, actions: &[DiffAction]) {
        let applied = apply_actions(&mut self.store.project, actions);
        tracing::debug!(applied, total = actions.len(), "Applied JSON diff");
        self.store.bump();
        self.schedule(DeferredTask::Normalize);
    }

    /// Replace the whole project (`loadJson`). Accepts both the wrapped
    /// `{value: {...}}` payload and a bare project object.
    pub fn load_json(&mut self, json: &str) {
        #[derive(serde::Deserialize)]
        struct Payload {
            value: Project,
        }
        let project = serde_json::from_str::<Payload>(json)
            .map(|p| p.value)
            .or_else(|_| serde_json::from_str::<Project>(json));
        match project {
            Ok(project) => {
                self.abort_gestures();
                self.store.load(project, &self.config);
                self.kf_cache.clear();
                self.selection = SelectionMachine::new();
            }
            Err(err) => tracing::warn!(error = %err, "Ignoring malformed project payload"),
        }
    }

    /// Force a view rebind: the next scene rebuild misses every cache.
    pub fn refresh_timeline(&mut self) {
        self.store.bump();
        self.kf_cache.clear();
    }

    /// Drain deferred work (the next-tick boundary).
    pub fn tick(&mut self) {
        while let Some(task) = self.deferred.pop_front() {
            match task {
                DeferredTask::Normalize => self.store.normalize(&self.config),
            }
        }
        self.scheduler.complete();
    }

    fn schedule(&mut self, task: DeferredTask) {
        if !self.deferred.contains(&task) {
            self.deferred.push_back(task);
        }
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Run the selection state machine for a click and sync the host.
    pub fn select_item(
        &mut self,
        id: &str,
        kind: ItemKind,
        clear_selections: bool,
        modifiers: Modifiers,
        force_ripple: bool,
        cursor_seconds: f64,
    ) {
        let request = SelectionRequest {
            id,
            kind,
            clear_selections,
            modifiers,
            force_ripple,
            cursor_seconds,
        };
        let events = self.selection.select_item(
            &mut self.store,
            &request,
            self.modes.razor,
            self.ctx.dragging,
        );
        self.relay_selection_events(&events);
    }

    pub fn select_all(&mut self) {
        for (kind, id) in self.store.select_all() {
            self.bridge.add_selection(&id, kind, false);
        }
    }

    pub fn clear_all_selections(&mut self) {
        for kind in [ItemKind::Clip, ItemKind::Transition, ItemKind::Effect] {
            for id in self.store.clear_selected(kind) {
                self.bridge.remove_selection(&id, kind);
            }
        }
        self.selection.last_selected = None;
    }

    fn relay_selection_events(&self, events: &[SelectionEvent]) {
        for event in events {
            match event {
                SelectionEvent::Added {
                    kind,
                    id,
                    clear_others,
                } => self.bridge.add_selection(id, *kind, *clear_others),
                SelectionEvent::Removed { kind, id } => self.bridge.remove_selection(id, *kind),
                SelectionEvent::Razor {
                    clip_id,
                    transition_id,
                    seconds,
                } => self
                    .bridge
                    .razor_slice_at_cursor(clip_id, transition_id, *seconds),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Gesture: group move
    // -----------------------------------------------------------------------

    /// Pointer-down on an item. In razor mode the click is forwarded to
    /// the host's razor; otherwise the item joins the selection (unless
    /// already in it) and a group drag arms.
    pub fn begin_item_drag(
        &mut self,
        id: &str,
        kind: ItemKind,
        pointer: (f64, f64),
        ctrl: bool,
    ) -> bool {
        if self.modes.razor {
            let seconds = time::pixel_to_time(pointer.0, self.pps());
            self.select_item(
                id,
                kind,
                false,
                Modifiers {
                    ctrl: false,
                    shift: false,
                    alt: false,
                },
                false,
                seconds,
            );
            return false;
        }

        let already_selected = match kind {
            ItemKind::Clip => self.store.find_clip(id).map(|c| c.selected),
            ItemKind::Transition => self.store.find_transition(id).map(|t| t.selected),
            ItemKind::Effect => None,
        };
        match already_selected {
            None => {
                tracing::debug!(id, kind = %kind, "Drag on unknown item");
                return false;
            }
            Some(false) => {
                self.select_item(
                    id,
                    kind,
                    !ctrl,
                    Modifiers {
                        ctrl,
                        shift: false,
                        alt: false,
                    },
                    false,
                    0.0,
                );
            }
            Some(true) => {}
        }

        begin_drag(&self.store, &mut self.ctx, &mut self.snap, pointer)
    }

    /// Pointer-move during a group drag.
    pub fn update_item_drag(&mut self, pointer: (f64, f64)) {
        let update = update_drag(
            &self.store,
            &mut self.ctx,
            &mut self.snap,
            pointer,
            self.modes.snapping,
            &self.config,
        );
        self.snapline_px = update.snapline_px;
        self.scheduler.request();
    }

    /// Pointer-up: commit the move and inform the host.
    pub fn finish_item_drag(&mut self) {
        let commit = finish_drag(&mut self.store, &mut self.ctx, &self.config);
        if let Some(commit) = commit {
            let total = commit.moves.len();
            for (index, moved) in commit.moves.iter().enumerate() {
                let ignore_refresh = index < total - 1;
                self.emit_update(
                    moved.kind,
                    &moved.id,
                    false,
                    false,
                    ignore_refresh,
                    Some(&commit.transaction),
                );
            }
            if let Some(proposal) = &commit.missing {
                match serde_json::to_value(proposal) {
                    Ok(json) => self.bridge.add_missing_transition(&json),
                    Err(err) => tracing::warn!(error = %err, "Proposal serialisation failed"),
                }
            }
            self.autogrow();
            self.schedule(DeferredTask::Normalize);
        }
        self.end_gesture();
    }

    // -----------------------------------------------------------------------
    // Gesture: host-driven manual move
    // -----------------------------------------------------------------------

    /// Pre-initialise the bounding box for an external drag.
    pub fn start_manual_move(&mut self, kind: ItemKind, ids: &[String]) {
        let items: Vec<(ItemKind, String)> =
            ids.iter().map(|id| (kind, id.clone())).collect();
        let Some(bbox) = BoundingBox::from_items(&self.store.project, &items) else {
            tracing::debug!("Manual move with no resolvable items");
            return;
        };
        self.ctx.begin((bbox.rect.x, bbox.rect.y));
        self.ctx.threshold_met = true;
        self.ctx.bounding_box = Some(bbox);
        self.snap.reset();
    }

    /// Continue an external drag: `x`/`y` address the box origin.
    pub fn move_item(&mut self, x: f64, y: f64) {
        let Some(bbox) = self.ctx.bounding_box.as_mut() else {
            return;
        };
        let dx = x - bbox.rect.x;
        let dy = y - bbox.rect.y;
        let outcome = if self.modes.snapping {
            let ignore = bbox.ignore_ids();
            let targets = collect_targets(&self.store.project, &ignore, &[]);
            bbox.propose(
                &self.store.project,
                dx,
                dy,
                Some((&mut self.snap, self.config.snap_threshold_px, &targets)),
            )
        } else {
            bbox.propose(&self.store.project, dx, dy, None)
        };
        if outcome.applied {
            self.ctx.moved = true;
        }
        self.snapline_px = outcome.snap.map(|hit| hit.target_px);
    }

    /// Finalise an external drag with a host-supplied transaction id.
    pub fn update_recent_item_json(
        &mut self,
        _kind: ItemKind,
        _ids: &[String],
        transaction_id: Option<&str>,
    ) {
        let Some(bbox) = self.ctx.bounding_box.take() else {
            return;
        };
        let transaction = transaction_id
            .map(|raw| TransactionId::from(raw.to_string()))
            .or_else(|| self.ctx.transaction.clone());
        let moves = bbox.committed_moves(&self.store);
        let total = moves.len();
        for (index, moved) in moves.iter().enumerate() {
            match moved.kind {
                ItemKind::Clip => {
                    if let Some(clip) = self.store.find_clip_mut(&moved.id) {
                        clip.position = moved.position;
                        clip.layer = moved.layer;
                    }
                }
                ItemKind::Transition => {
                    if let Some(tran) = self.store.find_transition_mut(&moved.id) {
                        tran.position = moved.position;
                        tran.layer = moved.layer;
                    }
                }
                ItemKind::Effect => {}
            }
            self.emit_update(
                moved.kind,
                &moved.id,
                false,
                false,
                index < total - 1,
                transaction.as_ref(),
            );
        }
        self.store.bump();
        self.autogrow();
        self.schedule(DeferredTask::Normalize);
        self.end_gesture();
    }

    // -----------------------------------------------------------------------
    // Gesture: resize / trim / retime
    // -----------------------------------------------------------------------

    /// Pointer-down on a resize handle.
    pub fn begin_item_resize(&mut self, id: &str, kind: ItemKind, edge: Edge) -> bool {
        self.snap.reset();
        let gesture = match kind {
            ItemKind::Clip => {
                let Some(clip) = self.store.find_clip(id) else {
                    tracing::debug!(id, "Resize on unknown clip");
                    return false;
                };
                Some(ResizeGesture::begin_clip(
                    clip,
                    edge,
                    self.modes.timing,
                    self.fps(),
                ))
            }
            ItemKind::Transition => self
                .store
                .find_transition(id)
                .map(|t| ResizeGesture::begin_transition(t, edge)),
            ItemKind::Effect => None,
        };
        let Some(gesture) = gesture else {
            return false;
        };

        self.ctx.begin((0.0, 0.0));
        self.ctx.threshold_met = true;
        self.bridge.add_selection(id, kind, false);
        let pps = self.pps();
        if let Some(clip) = self.store.find_clip_mut(id) {
            clip.selected = true;
            clip.ui.keyframe_preview =
                Some(make_preview(gesture.preview_mode(), &gesture, pps));
        } else if let Some(tran) = self.store.find_transition_mut(id) {
            tran.selected = true;
        }

        self.resize_kf_targets = if kind == ItemKind::Clip && !self.modes.timing {
            self.trim_keyframe_targets(id, edge)
        } else {
            Vec::new()
        };
        self.resize = Some(gesture);
        true
    }

    /// Pointer-move during a resize: snap the dragged edge, apply the
    /// slice constraints, refresh the keyframe preview window.
    pub fn update_item_resize(&mut self, cursor_px: f64) {
        let pps = self.pps();
        let fps = self.fps();
        let Some(gesture) = self.resize.as_mut() else {
            return;
        };

        let mut cursor_px = time::to_finite(cursor_px, 0.0);
        self.snapline_px = None;
        if self.modes.snapping {
            let label = match gesture.edge {
                Edge::Left => "edge-left",
                Edge::Right => "edge-right",
            };
            let ignore = std::iter::once(gesture.id.clone()).collect();
            let targets =
                collect_targets(&self.store.project, &ignore, &self.resize_kf_targets);
            if let Some(hit) = self.snap.best(
                label,
                &[cursor_px],
                self.config.snap_threshold_px,
                &targets,
            ) {
                cursor_px += hit.offset_px;
                self.snapline_px = Some(hit.target_px);
            }
        }

        let live = gesture.update(time::pixel_to_time(cursor_px, pps), fps);
        let edge = gesture.edge;
        let kind = gesture.kind;
        let id = gesture.id.clone();
        let timing = gesture.timing_mode;

        if kind == ItemKind::Clip {
            if let Some(clip) = self.store.find_clip_mut(&id) {
                if let Some(preview) = clip.ui.keyframe_preview.as_mut() {
                    let (display_start, display_end) = if timing {
                        (preview.original_start, preview.original_start + live.duration())
                    } else {
                        (live.start, live.end)
                    };
                    cutline_keyframes::update_window(preview, display_start, display_end);
                }
            }
            if !timing {
                // The monitor follows the trimmed edge.
                let edge_seconds = match edge {
                    Edge::Left => time::snap_to_fps_grid(live.start, fps),
                    Edge::Right => time::snap_to_fps_grid(live.end, fps),
                };
                self.bridge
                    .preview_clip_frame(&id, time::preview_frame(edge_seconds, fps));
            }
        }
        self.store.bump();
        self.scheduler.request();
    }

    /// Pointer-up: commit the trim or retime.
    pub fn finish_item_resize(&mut self) {
        let Some(gesture) = self.resize.take() else {
            self.end_gesture();
            return;
        };
        let fps = self.fps();
        let moved = gesture.moved;
        let transaction = self.ctx.transaction.clone();

        // Close the preview and restore icon offsets regardless.
        if let Some(clip) = self.store.find_clip_mut(&gesture.id) {
            clip.ui.keyframe_preview = None;
        }
        self.kf_cache.invalidate(&gesture.id);

        if moved {
            match gesture.finish(fps) {
                ResizeCommit::Trim { slice } => {
                    match gesture.kind {
                        ItemKind::Clip => {
                            if let Some(clip) = self.store.find_clip_mut(&gesture.id) {
                                clip.start = slice.start;
                                clip.end = slice.end;
                                clip.position = slice.position;
                            }
                        }
                        ItemKind::Transition => {
                            if let Some(tran) = self.store.find_transition_mut(&gesture.id) {
                                tran.start = 0.0;
                                tran.end = slice.end;
                                tran.position = slice.position;
                            }
                        }
                        ItemKind::Effect => {}
                    }
                    self.store.bump();
                    self.emit_update(
                        gesture.kind,
                        &gesture.id,
                        false,
                        false,
                        false,
                        transaction.as_ref(),
                    );
                }
                ResizeCommit::Retime {
                    end,
                    position,
                    original_duration,
                    new_duration,
                } => {
                    if let Some(clip) = self.store.find_clip_mut(&gesture.id) {
                        clip.end = end;
                        clip.position = position;
                        if !clip.ui.audio_data.is_empty() {
                            clip.ui.audio_data = cutline_audio::resample_for_retime(
                                &clip.ui.audio_data,
                                original_duration,
                                new_duration,
                            );
                        }
                    }
                    self.store.bump();
                    // The host recomputes the `time` curve.
                    self.bridge.retime_clip(&gesture.id, end, position);
                }
            }
            // A resized clip can newly overlap a neighbour, same as a
            // single-clip drop.
            if gesture.kind == ItemKind::Clip {
                if let Some(proposal) =
                    missing_transition(&self.store.project, &gesture.id, &self.config)
                {
                    match serde_json::to_value(&proposal) {
                        Ok(json) => self.bridge.add_missing_transition(&json),
                        Err(err) => tracing::warn!(error = %err, "Proposal serialisation failed"),
                    }
                }
            }
            self.autogrow();
            self.schedule(DeferredTask::Normalize);
        }
        self.resize_kf_targets.clear();
        self.end_gesture();
    }

    /// Snap targets from the resized clip's visible keyframes. For left
    /// trims the keyframe at the clip's first frame is skipped so the
    /// edge does not re-lock onto its own in-point.
    fn trim_keyframe_targets(&mut self, clip_id: &str, edge: Edge) -> Vec<KeyframeSnapTarget> {
        let fps = self.fps();
        let pps = self.pps();
        let Some(clip) = self.store.find_clip(clip_id) else {
            return Vec::new();
        };
        let marks = self.kf_cache.get_or_compute(
            clip_id,
            clip_signature(clip, &self.property_filter, self.store.revision()),
            || {
                clip_keyframes(
                    clip,
                    fps,
                    (!self.property_filter.is_empty()).then_some(self.property_filter.as_str()),
                    &mut self.palette,
                    &mut self.icons,
                )
            },
        );
        let frame_len = if fps.as_f64() > 0.0 {
            1.0 / fps.as_f64()
        } else {
            0.0
        };
        let tolerance_sec = if pps > 0.0 {
            Some(keyframe_tolerance_px(fps.as_f64(), pps, self.config.snap_threshold_px) / pps)
        } else {
            None
        };
        marks
            .values()
            .filter(|mark| !(edge == Edge::Left && mark.local_seconds <= frame_len + 1e-9))
            .map(|mark| KeyframeSnapTarget {
                seconds: clip.position + mark.local_seconds,
                tolerance: tolerance_sec,
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Gesture: keyframe drag
    // -----------------------------------------------------------------------

    /// Pointer-down on a keyframe icon.
    pub fn begin_keyframe_drag(
        &mut self,
        target_kind: ItemKind,
        target_id: &str,
        owner_kind: ItemKind,
        owner_id: &str,
        frame: i64,
        pointer: (f64, f64),
    ) -> bool {
        let slice = match target_kind {
            ItemKind::Clip => self
                .store
                .find_clip(target_id)
                .map(|c| (c.start, c.end, c.position)),
            ItemKind::Transition => self
                .store
                .find_transition(target_id)
                .map(|t| (t.start, t.end, t.position)),
            ItemKind::Effect => None,
        };
        let Some((start, end, position)) = slice else {
            tracing::debug!(target_id, "Keyframe drag on unknown entity");
            return false;
        };
        self.ctx.begin(pointer);
        self.ctx.threshold_met = true;
        self.kf_drag = Some(KeyframeDrag::new(
            target_kind,
            target_id,
            owner_kind,
            owner_id,
            frame,
            start,
            end,
            position,
        ));
        true
    }

    /// Pointer-move during a keyframe drag.
    pub fn update_keyframe_drag(&mut self, cursor_px: f64) {
        let fps = self.fps();
        let seconds = time::pixel_to_time(time::to_finite(cursor_px, 0.0), self.pps());
        let Some(drag) = self.kf_drag.as_mut() else {
            return;
        };
        let update = drag.propose(seconds, fps);
        if update.needs_transaction {
            if let Some(tx) = self.ctx.transaction.clone() {
                self.bridge
                    .start_keyframe_drag(drag.target_kind, &drag.target_id, &tx);
                drag.started = true;
            }
        }
        self.bridge.seek_to_keyframe(update.seek_frame);
        self.scheduler.request();
    }

    /// Pointer-up: remap the frame across every property tree and
    /// commit, or treat the gesture as a click.
    pub fn finish_keyframe_drag(&mut self) {
        let Some(drag) = self.kf_drag.take() else {
            self.end_gesture();
            return;
        };
        let transaction = self.ctx.transaction.clone();

        if drag.started {
            if drag.changed() {
                let moved = match (drag.target_kind, drag.owner_kind) {
                    (ItemKind::Clip, ItemKind::Effect) => self
                        .store
                        .find_clip_mut(&drag.target_id)
                        .map(|clip| {
                            cutline_keyframes::commit::remap_effect_frames(
                                clip,
                                &drag.owner_id,
                                drag.original_frame,
                                drag.pending_frame,
                            )
                        })
                        .unwrap_or(0),
                    (ItemKind::Clip, _) => self
                        .store
                        .find_clip_mut(&drag.target_id)
                        .map(|clip| {
                            cutline_keyframes::commit::remap_clip_frames(
                                clip,
                                drag.original_frame,
                                drag.pending_frame,
                            )
                        })
                        .unwrap_or(0),
                    (ItemKind::Transition, _) => self
                        .store
                        .find_transition_mut(&drag.target_id)
                        .map(|tran| {
                            cutline_keyframes::commit::remap_transition_frames(
                                tran,
                                drag.original_frame,
                                drag.pending_frame,
                            )
                        })
                        .unwrap_or(0),
                    _ => 0,
                };
                if moved > 0 {
                    self.store.bump();
                    self.kf_cache.invalidate(&drag.target_id);
                    self.emit_update(
                        drag.target_kind,
                        &drag.target_id,
                        false,
                        true,
                        false,
                        transaction.as_ref(),
                    );
                }
            }
            self.bridge
                .finalize_keyframe_drag(drag.target_kind, &drag.target_id);
        } else {
            // A click: select the owner and seek to the keyframe.
            let owner_kind = drag.owner_kind;
            let owner_id = drag.owner_id.clone();
            let seek = drag.seek_frame(drag.original_frame, self.fps());
            self.select_item(
                &owner_id,
                owner_kind,
                true,
                Modifiers::default(),
                false,
                0.0,
            );
            self.bridge.seek_to_keyframe(seek);
        }
        self.end_gesture();
    }

    // -----------------------------------------------------------------------
    // Gesture: marquee
    // -----------------------------------------------------------------------

    /// Start a rubber-band selection over empty timeline surface.
    pub fn begin_marquee(&mut self, pointer: (f64, f64), ctrl: bool) {
        if !ctrl {
            self.clear_all_selections();
        }
        self.marquee = Some(Marquee::begin(pointer, ctrl));
    }

    pub fn update_marquee(&mut self, pointer: (f64, f64)) {
        if let Some(marquee) = self.marquee.as_mut() {
            marquee.update(pointer);
        }
    }

    /// Finish the rubber band: every intersecting item joins the
    /// selection and the host is informed.
    pub fn finish_marquee(&mut self) {
        let Some(marquee) = self.marquee.take() else {
            return;
        };
        for (kind, id) in marquee.items_intersecting(&self.store.project) {
            let newly = match kind {
                ItemKind::Clip => self.store.find_clip_mut(&id).map(|c| {
                    let was = c.selected;
                    c.selected = true;
                    !was
                }),
                ItemKind::Transition => self.store.find_transition_mut(&id).map(|t| {
                    let was = t.selected;
                    t.selected = true;
                    !was
                }),
                ItemKind::Effect => None,
            };
            if newly == Some(true) {
                self.bridge.add_selection(&id, kind, false);
            }
        }
        self.store.bump();
    }

    // -----------------------------------------------------------------------
    // Context menus
    // -----------------------------------------------------------------------

    /// Right-click on a clip body.
    pub fn open_clip_menu(&self, id: &str) {
        if self.store.find_clip(id).is_none() {
            tracing::debug!(id, "Clip menu for unknown clip");
            return;
        }
        self.bridge.show_clip_menu(id);
    }

    /// Right-click on an effect badge: a transition-level effect or a
    /// per-clip effect, resolved like the selection machine does.
    pub fn open_effect_menu(&self, id: &str) {
        if self.store.find_transition(id).is_none() && self.store.find_clip_effect(id).is_none() {
            tracing::debug!(id, "Effect menu for unknown effect");
            return;
        }
        self.bridge.show_effect_menu(id);
    }

    /// Right-click on a transition body.
    pub fn open_transition_menu(&self, id: &str) {
        if self.store.find_transition(id).is_none() {
            tracing::debug!(id, "Transition menu for unknown transition");
            return;
        }
        self.bridge.show_transition_menu(id);
    }

    /// Right-click on a track header.
    pub fn open_track_menu(&self, number: i32) {
        if !self.store.layer_exists(number) {
            tracing::debug!(number, "Track menu for unknown layer");
            return;
        }
        self.bridge.show_track_menu(number);
    }

    /// Right-click on a marker glyph.
    pub fn open_marker_menu(&self, id: &str) {
        if self.store.find_marker(id).is_none() {
            tracing::debug!(id, "Marker menu for unknown marker");
            return;
        }
        self.bridge.show_marker_menu(id);
    }

    /// Right-click on the playhead marker.
    pub fn open_playhead_menu(&self) {
        self.bridge
            .show_playhead_menu(self.store.project.playhead_position);
    }

    /// Right-click on empty timeline surface.
    pub fn open_timeline_menu(&self, x_px: f64, y_px: f64) {
        let seconds = time::pixel_to_time(x_px, self.pps());
        let layer = self.store.find_track_at_y(y_px).unwrap_or_default();
        self.bridge.show_timeline_menu(seconds, layer);
    }

    // -----------------------------------------------------------------------
    // Scene
    // -----------------------------------------------------------------------

    /// Build the render model for the embedding view.
    pub fn scene(&mut self) -> Scene {
        let inputs = SceneInputs {
            project: &self.store.project,
            config: &self.config,
            track_label_format: &self.track_label,
            property_filter: &self.property_filter,
            revision: self.store.revision(),
            thumbs: &self.thumbs,
        };
        let overlay = SceneOverlay {
            bounding_box: self.ctx.bounding_box.as_ref(),
            resize: self.resize.as_ref(),
            snapline_px: self.snapline_px,
            marquee: self.marquee.as_ref().map(|m| m.rect()),
            scroll_left_px: self.scroll_left_px,
            viewport_width_px: self.viewport_width_px,
        };
        build_scene(
            &inputs,
            &overlay,
            &mut self.kf_cache,
            &mut self.palette,
            &mut self.icons,
        )
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Serialise an entity and emit the matching update call.
    fn emit_update(
        &self,
        kind: ItemKind,
        id: &str,
        allow_keyframes: bool,
        force_json_diff: bool,
        ignore_refresh: bool,
        transaction: Option<&TransactionId>,
    ) {
        let json: Option<Value> = match kind {
            ItemKind::Clip => self
                .store
                .find_clip(id)
                .and_then(|c| serde_json::to_value(c).ok()),
            ItemKind::Transition => self
                .store
                .find_transition(id)
                .and_then(|t| serde_json::to_value(t).ok()),
            ItemKind::Effect => None,
        };
        let Some(json) = json else {
            tracing::debug!(id, kind = %kind, "Nothing to commit for unknown entity");
            return;
        };
        match kind {
            ItemKind::Clip => self.bridge.update_clip_data(
                &json,
                allow_keyframes,
                force_json_diff,
                ignore_refresh,
                transaction,
            ),
            ItemKind::Transition => self.bridge.update_transition_data(
                &json,
                force_json_diff,
                ignore_refresh,
                transaction,
            ),
            ItemKind::Effect => {}
        }
    }

    /// Request a longer timeline from the host when content outgrew it.
    fn autogrow(&self) {
        if let Some(wanted) = self.store.required_duration(&self.config) {
            tracing::debug!(seconds = wanted, "Requesting timeline resize");
            self.bridge.resize_timeline(wanted);
        }
    }

    /// Shared gesture teardown: the snap line must always disappear.
    fn end_gesture(&mut self) {
        self.snap.reset();
        self.snapline_px = None;
        self.ctx.end();
    }

    fn abort_gestures(&mut self) {
        self.resize = None;
        self.kf_drag = None;
        self.marquee = None;
        self.resize_kf_targets.clear();
        self.end_gesture();
    }
}

fn make_preview(mode: PreviewMode, gesture: &ResizeGesture, pps: f64) -> KeyframePreview {
    match mode {
        PreviewMode::Trim => {
            cutline_keyframes::trim_preview(gesture.original.start, gesture.original.end, pps)
        }
        PreviewMode::Retime => {
            cutline_keyframes::retime_preview(gesture.original.start, gesture.original.end, pps)
        }
    }
}

/// Built-in sample project shown until a host attaches.
fn demo_project() -> Project {
    let mut clip_a = Clip {
        id: "demo-clip-1".into(),
        file_id: "demo-file-1".into(),
        layer: 2,
        position: 1.0,
        start: 0.0,
        end: 8.0,
        title: "Beach".into(),
        ..Clip::default()
    };
    clip_a.reader.duration = 30.0;
    clip_a.reader.has_audio = true;
    clip_a.properties.insert(
        "alpha".into(),
        Property::Keyframes(cutline_project::KeyframeTrack {
            points: vec![
                cutline_project::Point {
                    co: cutline_project::Coord { x: 1.0, y: 0.0 },
                    interpolation: cutline_project::Interpolation::Linear,
                    handle_left: None,
                    handle_right: None,
                },
                cutline_project::Point {
                    co: cutline_project::Coord { x: 73.0, y: 1.0 },
                    interpolation: cutline_project::Interpolation::Linear,
                    handle_left: None,
                    handle_right: None,
                },
            ],
        }),
    );

    let mut clip_b = Clip {
        id: "demo-clip-2".into(),
        file_id: "demo-file-2".into(),
        layer: 1,
        position: 6.0,
        start: 2.0,
        end: 12.0,
        title: "Interview".into(),
        ..Clip::default()
    };
    clip_b.reader.duration = 45.0;

    Project {
        fps: Rational::FPS_30,
        duration: 300.0,
        layers: vec![
            Layer {
                id: "demo-layer-1".into(),
                number: 1,
                label: "Track 1".into(),
                height: 64.0,
                ..Layer::default()
            },
            Layer {
                id: "demo-layer-2".into(),
                number: 2,
                label: "Track 2".into(),
                height: 64.0,
                ..Layer::default()
            },
        ],
        clips: vec![clip_a, clip_b],
        effects: vec![Transition {
            id: "demo-transition-1".into(),
            layer: 1,
            position: 6.0,
            start: 0.0,
            end: 3.0,
            title: "Fade".into(),
            ..Transition::default()
        }],
        markers: vec![Marker {
            id: "demo-marker-1".into(),
            position: 12.0,
            icon: "blue.png".into(),
            vector: "blue".into(),
        }],
        ..Project::default()
    }
}
