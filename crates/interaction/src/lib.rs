//! `cutline-interaction` — Snap engine, bounding box, selection machine,
//! and the pointer gesture state machines of the Cutline timeline.
//!
//! Everything here is replica-in, outcome-out: gestures mutate the
//! `cutline-project` replica only at commit points and return outcome
//! structs (moves, slices, proposals, host-sync events) that the engine
//! facade translates into bridge calls. The modules map one-to-one onto
//! the interaction concerns of the timeline:
//!
//! - **geometry**: pixel rects for items and layers
//! - **snap**: sticky nearest-feature matching with an ignore set
//! - **bounding_box**: group moves with locked-track refusal
//! - **selection**: plain / toggle / range / ripple / razor semantics
//! - **context**: per-gesture transient state (one gesture at a time)
//! - **clip_drag / resize / keyframe_drag**: the three directives
//! - **overlap**: missing-transition proposals
//! - **marquee**: rubber-band selection

pub mod bounding_box;
pub mod clip_drag;
pub mod context;
pub mod geometry;
pub mod keyframe_drag;
pub mod marquee;
pub mod overlap;
pub mod resize;
pub mod selection;
pub mod snap;

pub use bounding_box::{BoundingBox, BoundingElement, CommittedMove, MoveOutcome};
pub use clip_drag::{begin_drag, finish_drag, update_drag, DragCommit, DragUpdate};
pub use context::InteractionContext;
pub use geometry::{find_item_rect, item_rect, Rect};
pub use keyframe_drag::{KeyframeDrag, KeyframeDragUpdate};
pub use marquee::Marquee;
pub use overlap::{missing_transition, TransitionProposal};
pub use resize::{Edge, ResizeCommit, ResizeGesture, SliceState};
pub use selection::{Modifiers, SelectionEvent, SelectionMachine, SelectionRequest};
pub use snap::{
    collect_targets, keyframe_tolerance_px, KeyframeSnapTarget, SnapEngine, SnapHit, SnapTarget,
    SnapTargetKind,
};
