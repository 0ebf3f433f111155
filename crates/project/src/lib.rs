//! `cutline-project` — Project data model, store, and JSON-diff
//! application for the Cutline timeline engine.
//!
//! The host owns the authoritative project; this crate holds the
//! engine's read-mostly replica:
//!
//! - **Types**: wire-compatible serde model (`Project`, `Clip`,
//!   `Transition`, `Effect`, `Marker`, keyframe `Point`s)
//! - **Store**: lookups, ordering, layer layout, playhead, autogrow
//! - **Diff**: id-addressed `{type, key, value}` patch application

pub mod diff;
pub mod error;
pub mod store;
pub mod types;

pub use diff::{apply_actions, DiffAction, DiffOp, KeySegment};
pub use error::{ProjectError, ProjectResult};
pub use store::ProjectStore;
pub use types::{
    CacheProgress, CacheRange, Clip, ColorTrack, Coord, Effect, Interpolation, KeyframePreview,
    KeyframeTrack, Layer, Marker, Point, PreviewMode, Project, Property, Reader, TimelineItem,
    Transition, UiState,
};
