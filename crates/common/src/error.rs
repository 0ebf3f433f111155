//! Central error types for the engine (thiserror-based).

use crate::types::ItemKind;
use thiserror::Error;

/// Top-level timeline engine error.
///
/// Host input is untrusted; most of these are recovered at the inbound
/// boundary (logged, operation skipped) rather than surfaced.
#[derive(Error, Debug)]
pub enum TimelineError {
    #[error("unknown {kind} id: {id}")]
    UnknownEntity { kind: ItemKind, id: String },

    #[error("unknown layer number: {0}")]
    UnknownLayer(i32),

    #[error("layer {0} is locked")]
    LockedLayer(i32),

    #[error("no selection for gesture")]
    EmptySelection,

    #[error("invalid frame rate")]
    InvalidFrameRate,
}

/// Convenience Result type for engine operations.
pub type TimelineResult<T> = Result<T, TimelineError>;
