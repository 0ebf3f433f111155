//! `timeline-ui` — the Cutline timeline engine facade.
//!
//! Ties the engine crates together behind two surfaces:
//!
//! - **Inbound**: [`TimelineEngine`] methods the native host invokes
//!   (project loads, JSON diffs, mode flags, scroll/scale, playhead),
//!   plus the pointer gesture handlers the embedding view drives.
//! - **Outbound**: the [`HostBridge`] trait carrying every call back to
//!   the host (selection sync, entity commits, keyframe transactions,
//!   razor, menus, proposals).
//!
//! The view itself is host-owned: each frame it pulls a [`Scene`] — an
//! immutable render model — instead of the engine touching any widgets.

pub mod bridge;
pub mod engine;
pub mod scene;
pub mod theme;
pub mod thumbs;

pub use bridge::{HostBridge, HostCall, NullBridge, RecordingBridge};
pub use cutline_common::{ItemKind, TransactionId};
pub use cutline_interaction::{Edge, Modifiers};
pub use engine::{Modes, TimelineEngine};
pub use scene::{
    ClipView, KeyframeIcon, MarkerView, Ruler, RulerTick, Scene, TrackRow, TransitionView,
};
pub use theme::Theme;
pub use thumbs::ThumbnailSource;
