//! Selection bounding box and constrained group moves.
//!
//! When a drag begins on any selected item, a bounding box is built
//! around every selected clip and transition, remembering each
//! element's starting rectangle. During the drag a single delta is
//! applied uniformly to every element (preserving relative offsets),
//! corrected by the snap engine, clamped to the timeline start, and
//! refused entirely when the moved box would cross a locked layer.

use crate::geometry::{item_rect, Rect};
use crate::snap::{SnapEngine, SnapHit, SnapTarget};
use cutline_common::{time, ItemKind};
use cutline_project::{Project, ProjectStore};
use std::collections::HashSet;

/// One element participating in a group move.
#[derive(Clone, Debug)]
pub struct BoundingElement {
    pub kind: ItemKind,
    pub id: String,
    /// The element's rectangle when the gesture began.
    pub start: Rect,
}

/// The minimal rectangle enclosing the current multi-selection, plus
/// the per-element start geometry and the delta applied so far.
#[derive(Clone, Debug)]
pub struct BoundingBox {
    /// United rectangle at gesture start.
    pub rect: Rect,
    pub elements: Vec<BoundingElement>,
    /// The snap-corrected delta currently applied (pixels).
    pub delta: (f64, f64),
}

/// Result of a proposed move.
#[derive(Clone, Debug)]
pub struct MoveOutcome {
    /// False when the move was refused (locked layer): the pointer
    /// follows but the elements stay put.
    pub applied: bool,
    pub dx: f64,
    pub dy: f64,
    pub snap: Option<SnapHit>,
}

/// Final `(position, layer)` for one element at drag-stop.
#[derive(Clone, Debug, PartialEq)]
pub struct CommittedMove {
    pub kind: ItemKind,
    pub id: String,
    pub position: f64,
    pub layer: i32,
}

impl BoundingBox {
    /// Build the box around every currently selected clip and
    /// transition. Returns `None` when nothing selected has geometry.
    pub fn from_selection(project: &Project) -> Option<Self> {
        let mut elements = Vec::new();
        for clip in project.clips.iter().filter(|c| c.selected) {
            if let Some(rect) = item_rect(project, clip) {
                elements.push(BoundingElement {
                    kind: ItemKind::Clip,
                    id: clip.id.clone(),
                    start: rect,
                });
            }
        }
        for tran in project.effects.iter().filter(|t| t.selected) {
            if let Some(rect) = item_rect(project, tran) {
                elements.push(BoundingElement {
                    kind: ItemKind::Transition,
                    id: tran.id.clone(),
                    start: rect,
                });
            }
        }
        Self::from_elements(elements)
    }

    /// Build the box around an explicit item list (host-driven manual
    /// moves), regardless of selection flags.
    pub fn from_items(project: &Project, items: &[(ItemKind, String)]) -> Option<Self> {
        let mut elements = Vec::new();
        for (kind, id) in items {
            let rect = match kind {
                ItemKind::Clip => project
                    .clips
                    .iter()
                    .find(|c| &c.id == id)
                    .and_then(|c| item_rect(project, c)),
                ItemKind::Transition => project
                    .effects
                    .iter()
                    .find(|t| &t.id == id)
                    .and_then(|t| item_rect(project, t)),
                ItemKind::Effect => None,
            };
            match rect {
                Some(rect) => elements.push(BoundingElement {
                    kind: *kind,
                    id: id.clone(),
                    start: rect,
                }),
                None => tracing::debug!(kind = %kind, id = %id, "Manual move item has no geometry"),
            }
        }
        Self::from_elements(elements)
    }

    fn from_elements(elements: Vec<BoundingElement>) -> Option<Self> {
        let mut rects = elements.iter().map(|e| e.start);
        let first = rects.next()?;
        let rect = rects.fold(first, |acc, r| acc.united(&r));
        Some(Self {
            rect,
            elements,
            delta: (0.0, 0.0),
        })
    }

    /// Ids participating in the move; the snap engine must ignore them.
    pub fn ignore_ids(&self) -> HashSet<String> {
        self.elements.iter().map(|e| e.id.clone()).collect()
    }

    /// An element's rectangle with the current delta applied.
    pub fn moved_rect(&self, element: &BoundingElement) -> Rect {
        Rect {
            x: element.start.x + self.delta.0,
            y: element.start.y + self.delta.1,
            ..element.start
        }
    }

    /// First locked layer the vertically shifted box would overlap.
    pub fn locked_layer_in_path(&self, project: &Project, dy: f64) -> Option<i32> {
        let top = self.rect.y + dy;
        let bottom = self.rect.bottom() + dy;
        project
            .layers
            .iter()
            .find(|layer| {
                layer.lock && layer.y < bottom && layer.y + layer.height.max(1.0) > top
            })
            .map(|layer| layer.number)
    }

    /// Propose a pointer delta. Applies snap correction to `dx`, clamps
    /// the group to the timeline start, and refuses layer-crossing into
    /// locked tracks (the snap line still reports, the elements do not
    /// move).
    pub fn propose(
        &mut self,
        project: &Project,
        dx: f64,
        dy: f64,
        snap: Option<(&mut SnapEngine, f64, &[SnapTarget])>,
    ) -> MoveOutcome {
        let mut dx = time::to_finite(dx, 0.0);
        let dy = time::to_finite(dy, 0.0);

        let mut hit = None;
        if let Some((engine, threshold_px, targets)) = snap {
            let candidates = [self.rect.x + dx, self.rect.right() + dx];
            hit = engine.best("drag-box", &candidates, threshold_px, targets);
            if let Some(h) = hit {
                dx += h.offset_px;
            }
        }

        // The whole group stays inside the timeline.
        let min_x = self
            .elements
            .iter()
            .map(|e| e.start.x)
            .fold(f64::INFINITY, f64::min);
        if min_x.is_finite() && min_x + dx < 0.0 {
            dx = -min_x;
        }

        if let Some(locked) = self.locked_layer_in_path(project, dy) {
            tracing::debug!(layer = locked, "Group move refused: locked layer in path");
            return MoveOutcome {
                applied: false,
                dx: self.delta.0,
                dy: self.delta.1,
                snap: hit,
            };
        }

        self.delta = (dx, dy);
        MoveOutcome {
            applied: true,
            dx,
            dy,
            snap: hit,
        }
    }

    /// Convert the final element rectangles into FPS-snapped timeline
    /// positions and target layer numbers.
    pub fn committed_moves(&self, store: &ProjectStore) -> Vec<CommittedMove> {
        let project = &store.project;
        let pps = project.pixels_per_second();
        let mut moves = Vec::new();
        for element in &self.elements {
            let rect = self.moved_rect(element);
            let seconds = time::pixel_to_time(rect.x, pps).max(0.0);
            let position = time::snap_to_fps_grid(seconds, project.fps).max(0.0);
            let center_y = rect.y + rect.h / 2.0;
            let layer = store.find_track_at_y(center_y).unwrap_or_else(|| {
                match element.kind {
                    ItemKind::Clip => project
                        .clips
                        .iter()
                        .find(|c| c.id == element.id)
                        .map(|c| c.layer)
                        .unwrap_or_default(),
                    _ => project
                        .effects
                        .iter()
                        .find(|t| t.id == element.id)
                        .map(|t| t.layer)
                        .unwrap_or_default(),
                }
            });
            moves.push(CommittedMove {
                kind: element.kind,
                id: element.id.clone(),
                position,
                layer,
            });
        }
        moves
    }
}
