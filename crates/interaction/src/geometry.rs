//! Pixel geometry for timeline items.
//!
//! Converts entities to view rectangles using the project's
//! pixels-per-second constant and the display `y`/`height` of their
//! layers. Items on unknown layers have no geometry.

use cutline_common::ItemKind;
use cutline_project::{Project, TimelineItem};

/// An axis-aligned rectangle in view pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle spanning two corner points, normalised.
    pub fn from_points(a: (f64, f64), b: (f64, f64)) -> Self {
        let x = a.0.min(b.0);
        let y = a.1.min(b.1);
        Self {
            x,
            y,
            w: (a.0 - b.0).abs(),
            h: (a.1 - b.1).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Smallest rectangle containing both.
    pub fn united(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            w: self.right().max(other.right()) - x,
            h: self.bottom().max(other.bottom()) - y,
        }
    }
}

/// View rectangle for any clip or transition implementing [`TimelineItem`].
pub fn item_rect<T: TimelineItem>(project: &Project, item: &T) -> Option<Rect> {
    let pps = project.pixels_per_second();
    if pps <= 0.0 {
        return None;
    }
    let layer = project.layers.iter().find(|l| l.number == item.layer())?;
    let (left, right) = item.time_extent();
    Some(Rect {
        x: left * pps,
        y: layer.y,
        w: (right - left).max(0.0) * pps,
        h: layer.height.max(1.0),
    })
}

/// View rectangle for an item addressed by kind and id.
pub fn find_item_rect(project: &Project, kind: ItemKind, id: &str) -> Option<Rect> {
    match kind {
        ItemKind::Clip => project
            .clips
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| item_rect(project, c)),
        ItemKind::Transition => project
            .effects
            .iter()
            .find(|t| t.id == id)
            .and_then(|t| item_rect(project, t)),
        ItemKind::Effect => None,
    }
}
