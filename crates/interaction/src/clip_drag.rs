//! Group move gesture for clips and transitions.
//!
//! Wraps the bounding-box engine in a begin/update/finish state machine
//! driven by the engine's pointer handlers. The replica is only touched
//! at `finish`; while the drag is live, the scene reads positions from
//! the bounding box overlay so a refused or abandoned drag leaves the
//! model untouched.

use crate::bounding_box::{BoundingBox, CommittedMove};
use crate::context::InteractionContext;
use crate::overlap::{missing_transition, TransitionProposal};
use crate::snap::{collect_targets, SnapEngine};
use cutline_common::{EngineConfig, ItemKind, TransactionId};
use cutline_project::ProjectStore;

/// Per-frame feedback for the view.
#[derive(Clone, Debug, Default)]
pub struct DragUpdate {
    /// False while the pointer is still inside the drag threshold, or
    /// when the move was refused by a locked layer.
    pub applied: bool,
    /// Where to draw the snap line, if a target locked.
    pub snapline_px: Option<f64>,
}

/// Everything the engine must report to the host at drag-stop.
#[derive(Clone, Debug)]
pub struct DragCommit {
    pub moves: Vec<CommittedMove>,
    pub transaction: TransactionId,
    /// Overlap proposal, probed only for single-clip moves.
    pub missing: Option<TransitionProposal>,
}

/// Start a group move over the current selection. Returns `false` (and
/// leaves the context idle) when nothing is selected, geometry is
/// unavailable, or the selection already straddles a locked layer.
pub fn begin_drag(
    store: &ProjectStore,
    ctx: &mut InteractionContext,
    snap: &mut SnapEngine,
    pointer: (f64, f64),
) -> bool {
    snap.reset();
    let Some(bbox) = BoundingBox::from_selection(&store.project) else {
        tracing::debug!("Drag ignored: empty selection");
        return false;
    };
    if let Some(layer) = bbox.locked_layer_in_path(&store.project, 0.0) {
        tracing::debug!(layer, "Drag refused: selection touches a locked layer");
        return false;
    }
    ctx.begin(pointer);
    ctx.grab_offset = (pointer.0 - bbox.rect.x, pointer.1 - bbox.rect.y);
    ctx.bounding_box = Some(bbox);
    true
}

/// Advance the drag to a new pointer position.
pub fn update_drag(
    store: &ProjectStore,
    ctx: &mut InteractionContext,
    snap: &mut SnapEngine,
    pointer: (f64, f64),
    snapping: bool,
    config: &EngineConfig,
) -> DragUpdate {
    if !ctx.meets_threshold(pointer, config.drag_threshold_px) {
        return DragUpdate::default();
    }
    let Some(bbox) = ctx.bounding_box.as_mut() else {
        return DragUpdate::default();
    };

    let dx = (pointer.0 - ctx.grab_offset.0) - bbox.rect.x;
    let dy = (pointer.1 - ctx.grab_offset.1) - bbox.rect.y;

    let outcome = if snapping {
        let ignore = bbox.ignore_ids();
        let targets = collect_targets(&store.project, &ignore, &[]);
        bbox.propose(
            &store.project,
            dx,
            dy,
            Some((snap, config.snap_threshold_px, &targets)),
        )
    } else {
        bbox.propose(&store.project, dx, dy, None)
    };

    if outcome.applied && (outcome.dx.abs() > 1e-9 || outcome.dy.abs() > 1e-9) {
        ctx.moved = true;
    }
    ctx.previous = pointer;

    DragUpdate {
        applied: outcome.applied,
        snapline_px: outcome.snap.map(|hit| hit.target_px),
    }
}

/// Stop the drag: write the FPS-snapped positions and layers into the
/// replica and package the host commit. Returns `None` for unmoved
/// drags. The caller ends the context and clears the snap line either
/// way.
pub fn finish_drag(
    store: &mut ProjectStore,
    ctx: &mut InteractionContext,
    config: &EngineConfig,
) -> Option<DragCommit> {
    let bbox = ctx.bounding_box.take()?;
    if !ctx.moved {
        return None;
    }
    let transaction = ctx.transaction.clone()?;

    let moves = bbox.committed_moves(store);
    for m in &moves {
        match m.kind {
            ItemKind::Clip => {
                if let Some(clip) = store.find_clip_mut(&m.id) {
                    clip.position = m.position;
                    clip.layer = m.layer;
                } else {
                    tracing::debug!(id = %m.id, "Moved clip vanished before commit");
                }
            }
            ItemKind::Transition => {
                if let Some(tran) = store.find_transition_mut(&m.id) {
                    tran.position = m.position;
                    tran.layer = m.layer;
                } else {
                    tracing::debug!(id = %m.id, "Moved transition vanished before commit");
                }
            }
            ItemKind::Effect => {}
        }
    }
    store.bump();

    // Overlap proposals are only probed for single-item moves.
    let missing = match moves.as_slice() {
        [only] if only.kind == ItemKind::Clip => {
            missing_transition(&store.project, &only.id, config)
        }
        _ => None,
    };

    tracing::debug!(
        moved = moves.len(),
        transaction = %transaction,
        "Drag committed"
    );
    Some(DragCommit {
        moves,
        transaction,
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_common::Rational;
    use cutline_project::{Clip, Layer};

    fn make_store() -> ProjectStore {
        let mut store = ProjectStore::default();
        store.project.fps = Rational::FPS_24;
        store.project.scale = 1.0;
        store.project.tick_pixels = 100.0;
        store.project.layers = vec![
            Layer {
                id: "L1".into(),
                number: 1,
                height: 64.0,
                ..Layer::default()
            },
            Layer {
                id: "L2".into(),
                number: 2,
                height: 64.0,
                ..Layer::default()
            },
        ];
        store.project.clips = vec![
            Clip {
                id: "a".into(),
                layer: 1,
                position: 0.0,
                start: 0.0,
                end: 5.0,
                ..Clip::default()
            },
            Clip {
                id: "b".into(),
                layer: 1,
                position: 8.0,
                start: 0.0,
                end: 6.0,
                selected: true,
                ..Clip::default()
            },
        ];
        store.normalize(&EngineConfig::default());
        store
    }

    #[test]
    fn begin_requires_selection() {
        let mut store = make_store();
        store.clear_selected(ItemKind::Clip);
        let mut ctx = InteractionContext::new();
        let mut snap = SnapEngine::new();
        assert!(!begin_drag(&store, &mut ctx, &mut snap, (0.0, 0.0)));
        assert!(!ctx.dragging);
    }

    #[test]
    fn unmoved_drag_commits_nothing() {
        let mut store = make_store();
        let mut ctx = InteractionContext::new();
        let mut snap = SnapEngine::new();
        assert!(begin_drag(&store, &mut ctx, &mut snap, (820.0, 100.0)));
        // Pointer wiggles inside the threshold.
        update_drag(
            &store,
            &mut ctx,
            &mut snap,
            (823.0, 101.0),
            true,
            &EngineConfig::default(),
        );
        assert!(finish_drag(&mut store, &mut ctx, &EngineConfig::default()).is_none());
        assert!((store.find_clip("b").unwrap().position - 8.0).abs() < 1e-9);
    }

    #[test]
    fn single_clip_drag_commits_and_probes_overlap() {
        let mut store = make_store();
        let mut ctx = InteractionContext::new();
        let mut snap = SnapEngine::new();
        let config = EngineConfig::default();

        // Clip "b" starts at 800px (8.0s); drag it left to ~4.0s where it
        // overlaps clip "a" ([0, 5]).
        assert!(begin_drag(&store, &mut ctx, &mut snap, (820.0, 100.0)));
        let update = update_drag(&store, &mut ctx, &mut snap, (420.0, 100.0), false, &config);
        assert!(update.applied);

        let commit = finish_drag(&mut store, &mut ctx, &config).expect("commit");
        assert_eq!(commit.moves.len(), 1);
        let b = store.find_clip("b").unwrap();
        assert!((b.position - 4.0).abs() < 1e-9);
        assert_eq!(b.layer, 1);

        let missing = commit.missing.expect("overlap proposal");
        assert!((missing.position - 4.0).abs() < 1e-9);
        assert!((missing.end - 1.0).abs() < 1e-9);
    }

    #[test]
    fn group_drag_skips_overlap_probe() {
        let mut store = make_store();
        store.find_clip_mut("a").unwrap().selected = true;
        let mut ctx = InteractionContext::new();
        let mut snap = SnapEngine::new();
        let config = EngineConfig::default();

        assert!(begin_drag(&store, &mut ctx, &mut snap, (20.0, 100.0)));
        update_drag(&store, &mut ctx, &mut snap, (120.0, 100.0), false, &config);
        let commit = finish_drag(&mut store, &mut ctx, &config).expect("commit");
        assert_eq!(commit.moves.len(), 2);
        assert!(commit.missing.is_none());
        // Relative offset preserved: b - a stays 8s apart.
        let a = store.find_clip("a").unwrap().position;
        let b = store.find_clip("b").unwrap().position;
        assert!((b - a - 8.0).abs() < 1e-9);
    }

    #[test]
    fn locked_layer_blocks_begin() {
        let mut store = make_store();
        store.project.layers[0].lock = true; // layer 1 carries the selection
        store.normalize(&EngineConfig::default());
        let mut ctx = InteractionContext::new();
        let mut snap = SnapEngine::new();
        assert!(!begin_drag(&store, &mut ctx, &mut snap, (820.0, 100.0)));
    }
}
