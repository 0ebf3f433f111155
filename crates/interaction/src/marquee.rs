//! Rubber-band (marquee) selection.
//!
//! A drag over empty timeline surface spans a rectangle; on release,
//! every clip and transition whose geometry intersects it joins the
//! selection. Cancellation regions (menus, effect containers, resize
//! handles) are the engine's concern: it simply never starts a marquee
//! from those hit targets.

use crate::geometry::{item_rect, Rect};
use cutline_common::ItemKind;
use cutline_project::{Project, TimelineItem};

/// An in-flight rubber-band selection.
#[derive(Clone, Debug)]
pub struct Marquee {
    pub origin: (f64, f64),
    pub current: (f64, f64),
    /// Ctrl held at start: add to the selection instead of replacing.
    pub additive: bool,
}

impl Marquee {
    pub fn begin(origin: (f64, f64), additive: bool) -> Self {
        Self {
            origin,
            current: origin,
            additive,
        }
    }

    pub fn update(&mut self, pointer: (f64, f64)) {
        self.current = pointer;
    }

    /// The normalised selection rectangle.
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.origin, self.current)
    }

    /// Clips and transitions intersecting the rectangle, clips first.
    pub fn items_intersecting(&self, project: &Project) -> Vec<(ItemKind, String)> {
        let rect = self.rect();
        let mut items = Vec::new();
        for clip in &project.clips {
            if let Some(r) = item_rect(project, clip) {
                if r.intersects(&rect) {
                    items.push((ItemKind::Clip, clip.id.clone()));
                }
            }
        }
        for tran in &project.effects {
            if let Some(r) = item_rect(project, tran) {
                if r.intersects(&rect) {
                    items.push((ItemKind::Transition, tran.id.clone()));
                }
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_project::{Clip, Layer, Transition};

    fn make_project() -> Project {
        Project {
            scale: 1.0,
            tick_pixels: 100.0,
            layers: vec![
                Layer {
                    id: "L2".into(),
                    number: 2,
                    y: 32.0,
                    height: 64.0,
                    ..Layer::default()
                },
                Layer {
                    id: "L1".into(),
                    number: 1,
                    y: 96.0,
                    height: 64.0,
                    ..Layer::default()
                },
            ],
            clips: vec![
                Clip {
                    id: "c1".into(),
                    layer: 2,
                    position: 1.0,
                    start: 0.0,
                    end: 2.0,
                    ..Clip::default()
                },
                Clip {
                    id: "c2".into(),
                    layer: 1,
                    position: 6.0,
                    start: 0.0,
                    end: 2.0,
                    ..Clip::default()
                },
            ],
            effects: vec![Transition {
                id: "t1".into(),
                layer: 2,
                position: 2.5,
                end: 1.0,
                ..Transition::default()
            }],
            ..Project::default()
        }
    }

    #[test]
    fn rect_normalises_any_drag_direction() {
        let mut marquee = Marquee::begin((300.0, 90.0), false);
        marquee.update((100.0, 40.0));
        let rect = marquee.rect();
        assert_eq!((rect.x, rect.y), (100.0, 40.0));
        assert_eq!((rect.w, rect.h), (200.0, 50.0));
    }

    #[test]
    fn intersecting_items_of_both_kinds_are_collected() {
        let project = make_project();
        // c1 spans [100, 300] on y [32, 96]; t1 spans [250, 350].
        let mut marquee = Marquee::begin((90.0, 30.0), false);
        marquee.update((260.0, 50.0));
        let items = marquee.items_intersecting(&project);
        assert!(items.contains(&(ItemKind::Clip, "c1".into())));
        assert!(items.contains(&(ItemKind::Transition, "t1".into())));
        assert!(!items.iter().any(|(_, id)| id == "c2"));
    }

    #[test]
    fn distant_box_selects_nothing() {
        let project = make_project();
        let mut marquee = Marquee::begin((5000.0, 30.0), true);
        marquee.update((5100.0, 200.0));
        assert!(marquee.items_intersecting(&project).is_empty());
        assert!(marquee.additive);
    }
}
