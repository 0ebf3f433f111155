//! `cutline-keyframes` — Keyframe enumeration, preview retime mapping,
//! frame remapping, and icon colouring.
//!
//! Given entities from `cutline-project`, this crate answers "which
//! keyframes are visible, where, and how do they move while the user is
//! resizing the entity":
//!
//! - **enumerate**: visible keyframes per entity (selection gate,
//!   property filter, colour channels, collisions)
//! - **preview**: the live trim/retime mapping and repaint throttle
//! - **commit**: `co.X` rewriting for drag commits and time-curve edits
//! - **cache**: signature-memoised enumeration results
//! - **icons**: per-interpolation SVG glyphs colourised per effect

pub mod cache;
pub mod commit;
pub mod enumerate;
pub mod icons;
pub mod preview;

pub use cache::{clip_signature, transition_signature, KeyframeCache};
pub use enumerate::{clip_keyframes, transition_keyframes, KeyframeMark};
pub use icons::{EffectPalette, IconSet};
pub use preview::{
    icon_left_px, inside_window, mapped_seconds, retime_preview, trim_preview, update_window,
    FrameScheduler, PREVIEW_EPSILON,
};
